use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::BadgeError;
use crate::escrow::StakeEscrow;
use crate::events::{ProposalConcluded, StakeSettled};
use crate::instructions::badge::mint_badge::issue_badge;
use crate::state::{
    EmployerIdentity, KeyReservation, Proposal, ProposerRecord, Registry, TeamMembership,
};

// =============================================================================
// CONCLUDE INSTRUCTION
// =============================================================================
//
// Anyone can conclude a proposal once its ttl has passed:
//
// 1. Tally: yes wins only with a strict majority
// 2. If yes won, mint the badge to the proposer
// 3. Pay the stake to the winning side, or refund it if nobody voted for it
// 4. Mark the proposal concluded, free the proposer's slot and release the
//    identity key reservation
//
// Winner token accounts are passed as remaining accounts, in vote order.
// =============================================================================

#[derive(Accounts)]
#[instruction(proposal_id: u64)]
pub struct Conclude<'info> {
    /// Anyone; pays rent for the badge accounts when the proposal passes
    #[account(mut)]
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [Proposal::SEED, &proposal_id.to_le_bytes()],
        bump = proposal.bump,
    )]
    pub proposal: Box<Account<'info, Proposal>>,

    #[account(
        mut,
        seeds = [ProposerRecord::SEED, proposal.proposer.as_ref()],
        bump = proposer_record.bump,
    )]
    pub proposer_record: Account<'info, ProposerRecord>,

    #[account(
        mut,
        seeds = [KeyReservation::SEED, proposal.identity_key.as_ref()],
        bump = reservation.bump,
    )]
    pub reservation: Account<'info, KeyReservation>,

    /// Required when yes wins
    #[account(
        init_if_needed,
        payer = caller,
        space = EmployerIdentity::SIZE,
        seeds = [EmployerIdentity::SEED, proposal.identity_key.as_ref()],
        bump,
    )]
    pub employer: Option<Box<Account<'info, EmployerIdentity>>>,

    /// Required when yes wins
    #[account(
        init_if_needed,
        payer = caller,
        space = TeamMembership::SIZE,
        seeds = [TeamMembership::SEED, proposal.proposer.as_ref()],
        bump,
    )]
    pub proposer_membership: Option<Account<'info, TeamMembership>>,

    /// Refund target when nobody voted for the winning side
    #[account(
        mut,
        constraint = proposer_tokens.owner == proposal.proposer @ BadgeError::InvalidTokenAccount,
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

/// Result of tallying an expired proposal
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    pub passed: bool,
    /// Voters on the winning side, in vote order
    pub winners: Vec<Pubkey>,
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, '_, 'info, Conclude<'info>>,
    proposal_id: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = &mut ctx.accounts;

    let outcome = decide(&accounts.proposal, now, accounts.registry.proposal_ttl)?;
    let proposer = accounts.proposal.proposer;
    let stake = accounts.proposal.stake_amount;

    if outcome.passed {
        let (Some(employer), Some(membership)) = (
            accounts.employer.as_mut(),
            accounts.proposer_membership.as_mut(),
        ) else {
            return err!(BadgeError::MissingBadgeAccounts);
        };
        let identity_key = accounts.proposal.identity_key;
        let (_, employer_bump) = Pubkey::find_program_address(
            &[EmployerIdentity::SEED, identity_key.as_ref()],
            &crate::ID,
        );
        let (_, membership_bump) = Pubkey::find_program_address(
            &[TeamMembership::SEED, proposer.as_ref()],
            &crate::ID,
        );

        issue_badge(
            &mut accounts.registry,
            employer,
            employer_bump,
            membership,
            membership_bump,
            proposer,
            &accounts.proposal.uri(),
            identity_key,
            now,
        )?;
    }

    let escrow = StakeEscrow::new(
        accounts.token_program.to_account_info(),
        accounts.escrow_vault.to_account_info(),
        accounts.registry.to_account_info(),
        accounts.registry.bump,
    );
    let recipients = escrow.settle(
        &accounts.registry.governance_mint,
        &outcome.winners,
        ctx.remaining_accounts,
        accounts.proposer_tokens.to_account_info(),
        proposer,
        stake,
    )?;

    finish(
        &mut accounts.proposal,
        &mut accounts.proposer_record,
        &mut accounts.reservation,
        outcome.passed,
        now,
    )?;

    emit!(StakeSettled {
        proposal_id,
        recipients: recipients.clone(),
        total: stake,
    });
    emit!(ProposalConcluded {
        proposal_id,
        passed: outcome.passed,
    });

    if outcome.passed {
        msg!(
            "Proposal #{} passed. Badge minted to {}, stake of {} split across {} yes voters",
            proposal_id,
            proposer,
            stake,
            recipients.len()
        );
    } else if outcome.winners.is_empty() {
        msg!(
            "Proposal #{} rejected with no votes against. Stake of {} refunded to {}",
            proposal_id,
            stake,
            proposer
        );
    } else {
        msg!(
            "Proposal #{} rejected. Stake of {} split across {} no voters",
            proposal_id,
            stake,
            recipients.len()
        );
    }

    Ok(())
}

/// Tallies an expired, still open proposal. `ttl` is the registry's current
/// value, not the one in force when the proposal was opened.
pub fn decide(proposal: &Proposal, now: i64, ttl: i64) -> Result<Outcome> {
    require!(!proposal.concluded, BadgeError::AlreadyConcluded);
    proposal.ensure_expired(now, ttl)?;

    let passed = proposal.tally();
    Ok(Outcome {
        passed,
        winners: proposal.winners(passed).to_vec(),
    })
}

/// Closes the round: the proposal is concluded, the proposer may propose again
/// and the key may be proposed or minted again unless it was just registered.
pub fn finish(
    proposal: &mut Proposal,
    record: &mut ProposerRecord,
    reservation: &mut KeyReservation,
    passed: bool,
    now: i64,
) -> Result<()> {
    proposal.conclude(passed, now)?;
    record.close(proposal.id);
    reservation.release(proposal.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_badge_err;
    use crate::escrow::split_stake;
    use crate::instructions::badge::add_to_team::join_team;
    use crate::instructions::governance::propose::{open_proposal, Applicant};
    use crate::instructions::governance::vote::cast_vote;
    use crate::state::{ensure_unreserved, IdentityKey, VoteChoice};
    use crate::test_fixtures::{
        blank_employer, blank_membership, blank_proposal, blank_proposer_record,
        blank_reservation, registry,
    };

    const TTL: i64 = 7 * 86400;

    struct Round {
        registry: Registry,
        record: ProposerRecord,
        proposal: Proposal,
        reservation: KeyReservation,
        proposer: Pubkey,
    }

    fn initech() -> IdentityKey {
        IdentityKey::from_name("initech").unwrap()
    }

    fn applicant(wallet: Pubkey, key_taken: bool) -> Applicant {
        Applicant {
            wallet,
            credentialed: false,
            key_taken,
        }
    }

    fn open_round() -> Round {
        let mut registry = registry();
        let mut record = blank_proposer_record();
        let mut proposal = blank_proposal();
        let mut reservation = blank_reservation();
        let proposer = Pubkey::new_unique();
        open_proposal(
            &mut registry,
            &mut record,
            0,
            &mut proposal,
            0,
            &mut reservation,
            0,
            applicant(proposer, false),
            "test.json",
            initech(),
            0,
        )
        .unwrap();
        Round {
            registry,
            record,
            proposal,
            reservation,
            proposer,
        }
    }

    fn vote(round: &mut Round, choice: VoteChoice) -> Pubkey {
        let voter = Pubkey::new_unique();
        cast_vote(&mut round.proposal, voter, choice, true, 100, 100).unwrap();
        voter
    }

    fn mint_to_proposer(
        round: &mut Round,
        employer: &mut EmployerIdentity,
        membership: &mut TeamMembership,
    ) -> Result<u64> {
        issue_badge(
            &mut round.registry,
            employer,
            0,
            membership,
            0,
            round.proposer,
            &round.proposal.uri(),
            round.proposal.identity_key,
            TTL,
        )
    }

    #[test]
    fn cannot_conclude_before_ttl() {
        let round = open_round();
        assert_badge_err(decide(&round.proposal, TTL - 1, TTL), BadgeError::NotYetExpired);
        assert!(decide(&round.proposal, TTL, TTL).is_ok());
    }

    #[test]
    fn ttl_change_applies_to_open_proposals() {
        let round = open_round();
        assert_badge_err(decide(&round.proposal, 60, TTL), BadgeError::NotYetExpired);
        assert!(decide(&round.proposal, 60, 60).is_ok());
    }

    #[test]
    fn single_yes_voter_takes_whole_stake_and_proposer_gets_badge() {
        let mut round = open_round();
        let alice = vote(&mut round, VoteChoice::Yes);

        let outcome = decide(&round.proposal, TTL, TTL).unwrap();
        assert_eq!(
            outcome,
            Outcome {
                passed: true,
                winners: vec![alice],
            }
        );
        assert_eq!(split_stake(round.proposal.stake_amount, outcome.winners.len()), vec![100]);

        let mut employer = blank_employer();
        let mut membership = blank_membership();
        mint_to_proposer(&mut round, &mut employer, &mut membership).unwrap();
        finish(
            &mut round.proposal,
            &mut round.record,
            &mut round.reservation,
            outcome.passed,
            TTL,
        )
        .unwrap();

        assert_eq!(membership.balance_of(&round.proposal.identity_key), 1);
        assert_eq!(employer.uri(), "test.json");
        assert!(round.proposal.view().concluded);
        assert!(!round.record.has_open_proposal());
        assert!(!round.reservation.is_held());
    }

    #[test]
    fn no_votes_refunds_proposer() {
        let round = open_round();
        let outcome = decide(&round.proposal, TTL, TTL).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.winners.is_empty());
    }

    #[test]
    fn tie_goes_to_no_voters() {
        let mut round = open_round();
        vote(&mut round, VoteChoice::Yes);
        let carol = vote(&mut round, VoteChoice::No);

        let outcome = decide(&round.proposal, TTL, TTL).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.winners, vec![carol]);
    }

    #[test]
    fn majority_no_splits_among_no_voters_in_vote_order() {
        let mut round = open_round();
        vote(&mut round, VoteChoice::Yes);
        let first = vote(&mut round, VoteChoice::No);
        let second = vote(&mut round, VoteChoice::No);
        let third = vote(&mut round, VoteChoice::No);

        let outcome = decide(&round.proposal, TTL, TTL).unwrap();
        assert_eq!(outcome.winners, vec![first, second, third]);
        assert_eq!(split_stake(100, outcome.winners.len()), vec![34, 33, 33]);
    }

    #[test]
    fn concluded_proposal_cannot_be_concluded_again() {
        let mut round = open_round();
        finish(
            &mut round.proposal,
            &mut round.record,
            &mut round.reservation,
            false,
            TTL,
        )
        .unwrap();
        assert_badge_err(decide(&round.proposal, TTL * 2, TTL), BadgeError::AlreadyConcluded);
    }

    #[test]
    fn proposer_can_propose_again_after_conclusion() {
        let mut round = open_round();
        decide(&round.proposal, TTL, TTL).unwrap();
        finish(
            &mut round.proposal,
            &mut round.record,
            &mut round.reservation,
            false,
            TTL,
        )
        .unwrap();

        let id = open_proposal(
            &mut round.registry,
            &mut round.record,
            0,
            &mut blank_proposal(),
            0,
            &mut round.reservation,
            0,
            applicant(round.proposer, false),
            "retry.json",
            initech(),
            TTL,
        )
        .unwrap();
        assert_eq!(id, 2);
        assert_eq!(round.reservation.proposal_id, 2);
    }

    #[test]
    fn two_proposals_for_the_same_key_cannot_both_be_open() {
        let mut round = open_round();
        let carol = Pubkey::new_unique();
        let mut carol_record = blank_proposer_record();

        let res = open_proposal(
            &mut round.registry,
            &mut carol_record,
            0,
            &mut blank_proposal(),
            0,
            &mut round.reservation,
            0,
            applicant(carol, false),
            "carol.json",
            initech(),
            10,
        );
        assert_badge_err(res, BadgeError::AlreadyExists);
        assert!(!carol_record.has_open_proposal());

        // The admin cannot take the key from under the open proposal either
        assert_badge_err(
            ensure_unreserved(Some(&round.reservation)),
            BadgeError::AlreadyExists,
        );

        // So the first proposal still mints and settles
        vote(&mut round, VoteChoice::Yes);
        let outcome = decide(&round.proposal, TTL, TTL).unwrap();
        let mut employer = blank_employer();
        let mut membership = blank_membership();
        mint_to_proposer(&mut round, &mut employer, &mut membership).unwrap();
        finish(
            &mut round.proposal,
            &mut round.record,
            &mut round.reservation,
            outcome.passed,
            TTL,
        )
        .unwrap();

        // Released, but the key is now registered
        assert!(ensure_unreserved(Some(&round.reservation)).is_ok());
        let res = open_proposal(
            &mut round.registry,
            &mut carol_record,
            0,
            &mut blank_proposal(),
            0,
            &mut round.reservation,
            0,
            applicant(carol, employer.is_registered()),
            "carol.json",
            initech(),
            TTL + 1,
        );
        assert_badge_err(res, BadgeError::AlreadyExists);
    }

    #[test]
    fn pending_proposer_cannot_be_bound_elsewhere() {
        let mut round = open_round();
        let mut other = blank_employer();
        other
            .register(
                IdentityKey::from_name("globex").unwrap(),
                Pubkey::new_unique(),
                "globex.json",
                1,
                0,
                0,
            )
            .unwrap();
        let mut membership = blank_membership();

        let res = join_team(
            &mut other,
            &mut membership,
            Some(&round.record),
            round.proposer,
            10,
            0,
            0,
        );
        assert_badge_err(res, BadgeError::PendingProposal);

        vote(&mut round, VoteChoice::Yes);
        decide(&round.proposal, TTL, TTL).unwrap();
        let mut employer = blank_employer();
        assert!(mint_to_proposer(&mut round, &mut employer, &mut membership).is_ok());
    }
}
