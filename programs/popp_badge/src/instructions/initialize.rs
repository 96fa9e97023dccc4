use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::events::GovernanceConfigUpdated;
use crate::state::{GovernanceConfig, Registry};

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Becomes the registry administrator
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        init,
        payer = admin,
        space = Registry::SIZE,
        seeds = [Registry::SEED],
        bump,
    )]
    pub registry: Account<'info, Registry>,

    /// Governance token used for stakes and vote gating
    pub governance_mint: Account<'info, Mint>,

    /// Escrow vault for proposal stakes, owned by the registry PDA
    #[account(
        init,
        payer = admin,
        seeds = [Registry::VAULT_SEED],
        bump,
        token::mint = governance_mint,
        token::authority = registry,
    )]
    pub escrow_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, config: GovernanceConfig) -> Result<()> {
    let registry = &mut ctx.accounts.registry;

    registry.admin = ctx.accounts.admin.key();
    registry.governance_mint = ctx.accounts.governance_mint.key();
    registry.escrow_vault = ctx.accounts.escrow_vault.key();
    registry.apply_config(config)?;
    registry.badge_count = 0;
    registry.proposal_nonce = 1;
    registry.deactivated = false;
    registry.bump = ctx.bumps.registry;
    registry.vault_bump = ctx.bumps.escrow_vault;

    emit!(GovernanceConfigUpdated {
        proposal_cost: config.proposal_cost,
        vote_min_balance: config.vote_min_balance,
        proposal_ttl: config.proposal_ttl,
        removal_cooldown: config.removal_cooldown,
    });

    msg!(
        "Initialized badge registry (admin: {}, governance mint: {})",
        registry.admin,
        registry.governance_mint
    );
    msg!(
        "Proposal cost: {}, vote minimum: {}, ttl: {}s, removal cooldown: {}s",
        config.proposal_cost,
        config.vote_min_balance,
        config.proposal_ttl,
        config.removal_cooldown
    );

    Ok(())
}
