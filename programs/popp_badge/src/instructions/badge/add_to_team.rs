use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::events::TeamMemberAdded;
use crate::state::{
    ensure_not_pending, load_optional, EmployerIdentity, IdentityKey, ProposerRecord, Registry,
    TeamMembership,
};

// =============================================================================
// ADD TO TEAM INSTRUCTION
// =============================================================================
//
// One entry point for both "add to my team" (the employer's owner) and
// "add to team by key" (the registry admin). The team is named by identity
// key or by badge id.
// =============================================================================

#[derive(Accounts)]
#[instruction(identity_key: IdentityKey)]
pub struct AddToTeam<'info> {
    /// Registry admin or the employer's owner
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [EmployerIdentity::SEED, employer.key.as_ref()],
        bump = employer.bump,
        constraint = employer.is_addressed_by(&identity_key) @ BadgeError::UnknownIdentity,
        constraint = registry.is_admin(&authority.key())
            || employer.is_owner(&authority.key()) @ BadgeError::Unauthorized,
    )]
    pub employer: Box<Account<'info, EmployerIdentity>>,

    /// The wallet joining the team
    /// CHECK: Used as identifier
    pub new_member: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = authority,
        space = TeamMembership::SIZE,
        seeds = [TeamMembership::SEED, new_member.key().as_ref()],
        bump,
    )]
    pub membership: Account<'info, TeamMembership>,

    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [ProposerRecord::SEED, new_member.key().as_ref()], bump)]
    pub new_member_record: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<AddToTeam>, _identity_key: IdentityKey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let cooldown = ctx.accounts.registry.removal_cooldown;
    let wallet = ctx.accounts.new_member.key();
    let record = load_optional::<ProposerRecord>(&ctx.accounts.new_member_record)?;

    join_team(
        &mut ctx.accounts.employer,
        &mut ctx.accounts.membership,
        record.as_ref(),
        wallet,
        now,
        cooldown,
        ctx.bumps.membership,
    )?;

    let identity_key = ctx.accounts.employer.key;
    emit!(TeamMemberAdded {
        identity_key,
        wallet,
    });

    msg!(
        "Added {} to team '{}' ({} members)",
        wallet,
        identity_key,
        ctx.accounts.employer.members.len()
    );

    Ok(())
}

pub fn join_team(
    employer: &mut EmployerIdentity,
    membership: &mut TeamMembership,
    record: Option<&ProposerRecord>,
    wallet: Pubkey,
    now: i64,
    cooldown: i64,
    bump: u8,
) -> Result<()> {
    ensure_not_pending(record)?;
    membership.bind(wallet, employer.key, employer.badge_id, now, cooldown, bump)?;
    employer.add_member(wallet)
}
