use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::events::BadgeMinted;
use crate::state::{
    ensure_not_pending, ensure_unreserved, load_optional, EmployerIdentity, IdentityKey,
    KeyReservation, ProposerRecord, Registry, TeamMembership,
};

// =============================================================================
// MINT BADGE INSTRUCTION
// =============================================================================
//
// Direct path: the registry admin mints a badge for an employer wallet.
// Governance path: `conclude` reaches `issue_badge` for a passed proposal.
// There is no other way to create a badge.
// =============================================================================

#[derive(Accounts)]
#[instruction(identity_key: IdentityKey)]
pub struct MintBadge<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
        constraint = registry.is_admin(&admin.key()) @ BadgeError::Unauthorized,
    )]
    pub registry: Account<'info, Registry>,

    /// The wallet receiving the badge
    /// CHECK: Used as identifier
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = admin,
        space = EmployerIdentity::SIZE,
        seeds = [EmployerIdentity::SEED, identity_key.as_ref()],
        bump,
    )]
    pub employer: Box<Account<'info, EmployerIdentity>>,

    #[account(
        init_if_needed,
        payer = admin,
        space = TeamMembership::SIZE,
        seeds = [TeamMembership::SEED, recipient.key().as_ref()],
        bump,
    )]
    pub membership: Account<'info, TeamMembership>,

    /// Held while a proposal asks for the same key
    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [KeyReservation::SEED, identity_key.as_ref()], bump)]
    pub reservation: UncheckedAccount<'info>,

    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [ProposerRecord::SEED, recipient.key().as_ref()], bump)]
    pub recipient_record: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(mut ctx: Context<MintBadge>, identity_key: IdentityKey, uri: String) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = &mut ctx.accounts;

    ensure_unreserved(load_optional::<KeyReservation>(&accounts.reservation)?.as_ref())?;
    ensure_not_pending(load_optional::<ProposerRecord>(&accounts.recipient_record)?.as_ref())?;

    issue_badge(
        &mut accounts.registry,
        &mut accounts.employer,
        ctx.bumps.employer,
        &mut accounts.membership,
        ctx.bumps.membership,
        accounts.recipient.key(),
        &uri,
        identity_key,
        now,
    )?;

    Ok(())
}

/// Registers `identity_key` to `recipient`, binds the recipient as its first
/// member with balance 1, and assigns the next badge id.
#[allow(clippy::too_many_arguments)]
pub fn issue_badge(
    registry: &mut Registry,
    employer: &mut EmployerIdentity,
    employer_bump: u8,
    membership: &mut TeamMembership,
    membership_bump: u8,
    recipient: Pubkey,
    uri: &str,
    identity_key: IdentityKey,
    now: i64,
) -> Result<u64> {
    registry.ensure_active()?;
    require!(!employer.is_registered(), BadgeError::AlreadyExists);
    require!(!membership.is_bound(), BadgeError::AlreadyBound);

    let badge_id = registry.next_badge_id()?;
    employer.register(identity_key, recipient, uri, badge_id, now, employer_bump)?;
    membership.bind(
        recipient,
        identity_key,
        badge_id,
        now,
        registry.removal_cooldown,
        membership_bump,
    )?;

    emit!(BadgeMinted {
        identity_key,
        wallet: recipient,
        badge_id,
    });

    msg!(
        "Minted employer badge #{} for '{}' to {}",
        badge_id,
        identity_key,
        recipient
    );

    Ok(badge_id)
}
