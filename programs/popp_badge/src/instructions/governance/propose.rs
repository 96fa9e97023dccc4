use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::BadgeError;
use crate::escrow::StakeEscrow;
use crate::events::ProposalCreated;
use crate::state::{
    load_optional, EmployerIdentity, IdentityKey, KeyReservation, Proposal, ProposerRecord,
    Registry, TeamMembership,
};

// =============================================================================
// PROPOSE INSTRUCTION
// =============================================================================
//
// A wallet without a badge stakes `proposal_cost` governance tokens to ask the
// badge holders for one. The stake stays in the registry's escrow vault until
// `conclude` pays it out. The requested identity key is reserved for the
// proposal's lifetime, and must be a name: numeric keys are assigned at mint.
// =============================================================================

#[derive(Accounts)]
#[instruction(uri: String, identity_key: IdentityKey)]
pub struct Propose<'info> {
    #[account(mut)]
    pub proposer: Signer<'info>,

    #[account(
        mut,
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Box<Account<'info, Registry>>,

    /// CHECK: May be uninitialized, read through `TeamMembership::load_if_bound`
    #[account(seeds = [TeamMembership::SEED, proposer.key().as_ref()], bump)]
    pub proposer_membership: UncheckedAccount<'info>,

    /// Employer the badge would be registered under
    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [EmployerIdentity::SEED, identity_key.as_ref()], bump)]
    pub employer: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = proposer,
        space = ProposerRecord::SIZE,
        seeds = [ProposerRecord::SEED, proposer.key().as_ref()],
        bump,
    )]
    pub proposer_record: Account<'info, ProposerRecord>,

    #[account(
        init_if_needed,
        payer = proposer,
        space = KeyReservation::SIZE,
        seeds = [KeyReservation::SEED, identity_key.as_ref()],
        bump,
    )]
    pub reservation: Account<'info, KeyReservation>,

    #[account(
        init,
        payer = proposer,
        space = Proposal::SIZE,
        seeds = [Proposal::SEED, &registry.proposal_nonce.to_le_bytes()],
        bump,
    )]
    pub proposal: Box<Account<'info, Proposal>>,

    /// Source of the stake
    #[account(
        mut,
        constraint = proposer_tokens.owner == proposer.key() @ BadgeError::InvalidTokenAccount,
        constraint = proposer_tokens.mint == registry.governance_mint
            @ BadgeError::InvalidTokenAccount,
    )]
    pub proposer_tokens: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [Registry::VAULT_SEED],
        bump = registry.vault_bump,
    )]
    pub escrow_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(mut ctx: Context<Propose>, uri: String, identity_key: IdentityKey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let proposer = ctx.accounts.proposer.key();

    let credentialed =
        TeamMembership::load_if_bound(&ctx.accounts.proposer_membership)?.is_some();
    let key_taken = load_optional::<EmployerIdentity>(&ctx.accounts.employer)?
        .map_or(false, |e| e.is_registered());

    let accounts = &mut ctx.accounts;
    let stake = accounts.registry.proposal_cost;
    let proposal_id = open_proposal(
        &mut accounts.registry,
        &mut accounts.proposer_record,
        ctx.bumps.proposer_record,
        &mut accounts.proposal,
        ctx.bumps.proposal,
        &mut accounts.reservation,
        ctx.bumps.reservation,
        Applicant {
            wallet: proposer,
            credentialed,
            key_taken,
        },
        &uri,
        identity_key,
        now,
    )?;

    let escrow = StakeEscrow::new(
        accounts.token_program.to_account_info(),
        accounts.escrow_vault.to_account_info(),
        accounts.registry.to_account_info(),
        accounts.registry.bump,
    );
    escrow.take_stake(
        accounts.proposer_tokens.to_account_info(),
        accounts.proposer.to_account_info(),
        stake,
    )?;

    emit!(ProposalCreated {
        proposal_id,
        proposer,
        uri: uri.clone(),
    });

    msg!(
        "Proposal #{} opened by {} for '{}' ({}), stake {}",
        proposal_id,
        proposer,
        identity_key,
        uri,
        stake
    );

    Ok(())
}

/// What `propose` knows about the caller before opening a proposal
pub struct Applicant {
    pub wallet: Pubkey,
    /// Caller already holds a badge
    pub credentialed: bool,
    /// Requested identity key is already registered
    pub key_taken: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn open_proposal(
    registry: &mut Registry,
    record: &mut ProposerRecord,
    record_bump: u8,
    proposal: &mut Proposal,
    proposal_bump: u8,
    reservation: &mut KeyReservation,
    reservation_bump: u8,
    applicant: Applicant,
    uri: &str,
    identity_key: IdentityKey,
    now: i64,
) -> Result<u64> {
    registry.ensure_active()?;
    require!(!applicant.credentialed, BadgeError::AlreadyCredentialed);
    require!(!record.has_open_proposal(), BadgeError::DuplicateProposal);
    require!(
        !applicant.key_taken && !reservation.is_held(),
        BadgeError::AlreadyExists
    );
    require!(identity_key.name().is_some(), BadgeError::InvalidIdentityKey);

    let proposal_id = registry.take_proposal_id()?;
    proposal.open(
        proposal_id,
        applicant.wallet,
        uri,
        identity_key,
        registry.proposal_cost,
        now,
        proposal_bump,
    )?;
    record.open(applicant.wallet, proposal_id, record_bump)?;
    reservation.hold(identity_key, proposal_id, reservation_bump)?;

    Ok(proposal_id)
}
