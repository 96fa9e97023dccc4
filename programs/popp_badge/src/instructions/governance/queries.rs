use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::state::{load_optional, Proposal, ProposalView, ProposerRecord, Registry, VoteChoice};

#[derive(Accounts)]
#[instruction(proposal_id: u64)]
pub struct ProposalQuery<'info> {
    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [Proposal::SEED, &proposal_id.to_le_bytes()], bump)]
    pub proposal: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(wallet: Pubkey)]
pub struct ProposerQuery<'info> {
    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    /// CHECK: May be uninitialized, read through `load_optional`
    #[account(seeds = [ProposerRecord::SEED, wallet.as_ref()], bump)]
    pub proposer_record: UncheckedAccount<'info>,

    /// The wallet's open proposal, checked against the record in the handler
    /// CHECK: May be uninitialized, read through `load_optional`
    pub proposal: UncheckedAccount<'info>,
}

fn load_proposal(info: &AccountInfo) -> Result<Proposal> {
    load_optional::<Proposal>(info)?.ok_or_else(|| error!(BadgeError::NotFound))
}

pub fn get_proposal(ctx: Context<ProposalQuery>, _proposal_id: u64) -> Result<ProposalView> {
    Ok(load_proposal(&ctx.accounts.proposal)?.view())
}

pub fn get_votes(
    ctx: Context<ProposalQuery>,
    _proposal_id: u64,
    choice: VoteChoice,
) -> Result<Vec<Pubkey>> {
    Ok(load_proposal(&ctx.accounts.proposal)?.votes(choice).to_vec())
}

pub fn my_proposal(ctx: Context<ProposerQuery>, wallet: Pubkey) -> Result<ProposalView> {
    let open_id = load_optional::<ProposerRecord>(&ctx.accounts.proposer_record)?
        .filter(ProposerRecord::has_open_proposal)
        .map(|r| r.open_proposal);
    let Some(open_id) = open_id else {
        msg!("{} has no open proposal", wallet);
        return err!(BadgeError::NotFound);
    };

    require_keys_eq!(
        ctx.accounts.proposal.key(),
        proposal_address(open_id).0,
        BadgeError::NotFound
    );
    Ok(load_proposal(&ctx.accounts.proposal)?.view())
}

pub fn proposal_address(proposal_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[Proposal::SEED, &proposal_id.to_le_bytes()], &crate::ID)
}
