use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::events::{AdminTransferred, GovernanceConfigUpdated, RegistryDeactivated};
use crate::state::{GovernanceConfig, Registry};

#[derive(Accounts)]
pub struct AdminOnly<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
        constraint = registry.is_admin(&admin.key()) @ BadgeError::Unauthorized,
    )]
    pub registry: Account<'info, Registry>,
}

fn update_config(
    registry: &mut Registry,
    update: impl FnOnce(&mut GovernanceConfig),
) -> Result<()> {
    let mut config = registry.config();
    update(&mut config);
    registry.apply_config(config)?;

    emit!(GovernanceConfigUpdated {
        proposal_cost: config.proposal_cost,
        vote_min_balance: config.vote_min_balance,
        proposal_ttl: config.proposal_ttl,
        removal_cooldown: config.removal_cooldown,
    });
    Ok(())
}

pub fn set_proposal_cost(ctx: Context<AdminOnly>, cost: u64) -> Result<()> {
    update_config(&mut ctx.accounts.registry, |c| c.proposal_cost = cost)?;

    msg!("Set proposal cost to {}", cost);
    Ok(())
}

pub fn set_vote_min_balance(ctx: Context<AdminOnly>, min_balance: u64) -> Result<()> {
    update_config(&mut ctx.accounts.registry, |c| c.vote_min_balance = min_balance)?;

    msg!("Set vote minimum balance to {}", min_balance);
    Ok(())
}

pub fn set_proposal_ttl(ctx: Context<AdminOnly>, ttl: i64) -> Result<()> {
    update_config(&mut ctx.accounts.registry, |c| c.proposal_ttl = ttl)?;

    msg!("Set proposal ttl to {}s", ttl);
    Ok(())
}

pub fn set_removal_cooldown(ctx: Context<AdminOnly>, cooldown: i64) -> Result<()> {
    update_config(&mut ctx.accounts.registry, |c| c.removal_cooldown = cooldown)?;

    msg!("Set team removal cooldown to {}s", cooldown);
    Ok(())
}

pub fn transfer_admin(ctx: Context<AdminOnly>, new_admin: Pubkey) -> Result<()> {
    require!(new_admin != Pubkey::default(), BadgeError::InvalidAuthority);

    let registry = &mut ctx.accounts.registry;
    let previous = registry.admin;
    registry.admin = new_admin;

    emit!(AdminTransferred {
        previous,
        new: new_admin,
    });

    msg!("Transferred registry admin from {} to {}", previous, new_admin);
    Ok(())
}

/// Terminal: nothing is cleared, every later instruction fails `Deactivated`
pub fn revoke_all(ctx: Context<AdminOnly>) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.deactivate()?;

    emit!(RegistryDeactivated {
        admin: registry.admin,
    });

    msg!(
        "Registry deactivated by {} after {} badges and {} proposals",
        registry.admin,
        registry.badge_count,
        registry.proposal_nonce.saturating_sub(1)
    );
    Ok(())
}
