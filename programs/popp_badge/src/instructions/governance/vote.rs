use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

use crate::errors::BadgeError;
use crate::events::VoteCast;
use crate::state::{Proposal, Registry, TeamMembership, VoteChoice};

// =============================================================================
// VOTE INSTRUCTION
// =============================================================================
//
// Badge holders with at least `vote_min_balance` governance tokens vote once
// per open proposal. Vote order is kept: it decides who gets the remainder
// when the stake is split.
// =============================================================================

#[derive(Accounts)]
#[instruction(proposal_id: u64)]
pub struct Vote<'info> {
    pub voter: Signer<'info>,

    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [Proposal::SEED, &proposal_id.to_le_bytes()],
        bump = proposal.bump,
    )]
    pub proposal: Box<Account<'info, Proposal>>,

    /// CHECK: May be uninitialized, read through `TeamMembership::load_if_bound`
    #[account(seeds = [TeamMembership::SEED, voter.key().as_ref()], bump)]
    pub voter_membership: UncheckedAccount<'info>,

    /// Governance-token balance checked against `vote_min_balance`
    #[account(
        constraint = voter_tokens.owner == voter.key() @ BadgeError::InvalidTokenAccount,
        constraint = voter_tokens.mint == registry.governance_mint
            @ BadgeError::InvalidTokenAccount,
    )]
    pub voter_tokens: Account<'info, TokenAccount>,
}

pub fn handler(ctx: Context<Vote>, proposal_id: u64, choice: VoteChoice) -> Result<()> {
    let voter = ctx.accounts.voter.key();
    let has_badge = TeamMembership::load_if_bound(&ctx.accounts.voter_membership)?.is_some();
    let balance = ctx.accounts.voter_tokens.amount;
    let min_balance = ctx.accounts.registry.vote_min_balance;
    let proposal = &mut ctx.accounts.proposal;

    cast_vote(proposal, voter, choice, has_badge, balance, min_balance)?;

    emit!(VoteCast {
        proposal_id,
        voter,
        choice,
    });

    msg!(
        "Vote cast on proposal #{}. Current tally: {} yes, {} no",
        proposal_id,
        proposal.yes_voters.len(),
        proposal.no_voters.len()
    );

    Ok(())
}

/// Proposal-level checks run before the voter's own eligibility
pub fn cast_vote(
    proposal: &mut Proposal,
    voter: Pubkey,
    choice: VoteChoice,
    has_badge: bool,
    balance: u64,
    min_balance: u64,
) -> Result<()> {
    proposal.ensure_can_vote(&voter)?;
    require!(has_badge, BadgeError::Unauthorized);
    require!(balance >= min_balance, BadgeError::InsufficientStake);
    proposal.record_vote(voter, choice)
}
