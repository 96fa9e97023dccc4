use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::state::identity::{decode_uri, encode_uri, IdentityKey, MAX_URI_LEN};

/// Maximum recorded voters per side of a proposal
pub const MAX_VOTERS: usize = 64;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    pub fn from_bool(yes: bool) -> Self {
        if yes {
            VoteChoice::Yes
        } else {
            VoteChoice::No
        }
    }
}

// =============================================================================
// PROPOSAL ACCOUNT
// =============================================================================
// Open -> Concluded. There is no separate rejected state: a rejected proposal
// is a concluded one with `passed == false`.
// =============================================================================

#[account]
#[derive(Debug)]
pub struct Proposal {
    /// Sequential id, starting at 1
    pub id: u64,
    /// Wallet that staked and proposed
    pub proposer: Pubkey,
    /// Metadata uri for the proposed badge
    pub uri: [u8; MAX_URI_LEN],
    /// Employer key the badge is registered under if the proposal passes
    pub identity_key: IdentityKey,
    /// Tokens held in escrow for this proposal
    pub stake_amount: u64,
    /// When the proposal was opened
    pub created_at: i64,
    /// Voters in the order their votes were cast
    pub yes_voters: Vec<Pubkey>,
    pub no_voters: Vec<Pubkey>,

    // === Resolution ===
    pub concluded: bool,
    /// Only meaningful once concluded
    pub passed: bool,
    pub concluded_at: Option<i64>,

    /// PDA bump seed
    pub bump: u8,
}

impl Proposal {
    pub const SEED: &'static [u8] = b"proposal";

    pub const SIZE: usize = 8 +     // discriminator
        8 +                          // id
        32 +                         // proposer
        MAX_URI_LEN +                // uri
        IdentityKey::SIZE +          // identity_key
        8 +                          // stake_amount
        8 +                          // created_at
        4 + 32 * MAX_VOTERS +        // yes_voters
        4 + 32 * MAX_VOTERS +        // no_voters
        1 +                          // concluded
        1 +                          // passed
        9 +                          // concluded_at
        1;                           // bump

    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        id: u64,
        proposer: Pubkey,
        uri: &str,
        identity_key: IdentityKey,
        stake_amount: u64,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        identity_key.validate()?;
        self.id = id;
        self.proposer = proposer;
        self.uri = encode_uri(uri)?;
        self.identity_key = identity_key;
        self.stake_amount = stake_amount;
        self.created_at = now;
        self.yes_voters = Vec::new();
        self.no_voters = Vec::new();
        self.concluded = false;
        self.passed = false;
        self.concluded_at = None;
        self.bump = bump;
        Ok(())
    }

    pub fn uri(&self) -> String {
        decode_uri(&self.uri)
    }

    pub fn has_voted(&self, voter: &Pubkey) -> bool {
        self.yes_voters.contains(voter) || self.no_voters.contains(voter)
    }

    pub fn votes(&self, choice: VoteChoice) -> &[Pubkey] {
        match choice {
            VoteChoice::Yes => &self.yes_voters,
            VoteChoice::No => &self.no_voters,
        }
    }

    /// Checks that only depend on the proposal itself
    pub fn ensure_can_vote(&self, voter: &Pubkey) -> Result<()> {
        require!(!self.concluded, BadgeError::NotFound);
        require_keys_neq!(*voter, self.proposer, BadgeError::SelfVote);
        require!(!self.has_voted(voter), BadgeError::AlreadyVoted);
        Ok(())
    }

    pub fn record_vote(&mut self, voter: Pubkey, choice: VoteChoice) -> Result<()> {
        self.ensure_can_vote(&voter)?;
        let side = match choice {
            VoteChoice::Yes => &mut self.yes_voters,
            VoteChoice::No => &mut self.no_voters,
        };
        require!(side.len() < MAX_VOTERS, BadgeError::TooManyVoters);
        side.push(voter);
        Ok(())
    }

    pub fn expires_at(&self, ttl: i64) -> Result<i64> {
        self.created_at
            .checked_add(ttl)
            .ok_or_else(|| error!(BadgeError::Overflow))
    }

    pub fn ensure_expired(&self, now: i64, ttl: i64) -> Result<()> {
        require!(now >= self.expires_at(ttl)?, BadgeError::NotYetExpired);
        Ok(())
    }

    /// Strict majority of cast votes. Ties, including no votes at all, fail.
    pub fn tally(&self) -> bool {
        self.yes_voters.len() > self.no_voters.len()
    }

    /// Wallets that share the stake for the given outcome
    pub fn winners(&self, passed: bool) -> &[Pubkey] {
        self.votes(VoteChoice::from_bool(passed))
    }

    pub fn conclude(&mut self, passed: bool, now: i64) -> Result<()> {
        require!(!self.concluded, BadgeError::AlreadyConcluded);
        self.concluded = true;
        self.passed = passed;
        self.concluded_at = Some(now);
        Ok(())
    }

    pub fn view(&self) -> ProposalView {
        ProposalView {
            id: self.id,
            proposer: self.proposer,
            uri: self.uri(),
            identity_key: self.identity_key,
            stake_amount: self.stake_amount,
            created_at: self.created_at,
            yes_votes: self.yes_voters.len() as u32,
            no_votes: self.no_voters.len() as u32,
            concluded: self.concluded,
            passed: self.passed,
        }
    }
}

/// Query result for `get_proposal` and `my_proposal`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct ProposalView {
    pub id: u64,
    pub proposer: Pubkey,
    pub uri: String,
    pub identity_key: IdentityKey,
    pub stake_amount: u64,
    pub created_at: i64,
    pub yes_votes: u32,
    pub no_votes: u32,
    pub concluded: bool,
    pub passed: bool,
}

// =============================================================================
// PROPOSER RECORD
// =============================================================================
// One per proposer wallet; tracks the single open proposal allowed at a time.
// =============================================================================

#[account]
pub struct ProposerRecord {
    pub proposer: Pubkey,
    /// Open proposal id, 0 when none
    pub open_proposal: u64,
    /// Proposals ever opened by this wallet
    pub total_proposals: u64,
    pub bump: u8,
}

impl ProposerRecord {
    pub const SEED: &'static [u8] = b"proposer";

    pub const SIZE: usize = 8 + 32 + 8 + 8 + 1;

    pub fn has_open_proposal(&self) -> bool {
        self.open_proposal != 0
    }

    pub fn open(&mut self, proposer: Pubkey, proposal_id: u64, bump: u8) -> Result<()> {
        require!(!self.has_open_proposal(), BadgeError::DuplicateProposal);
        self.proposer = proposer;
        self.open_proposal = proposal_id;
        self.total_proposals = self
            .total_proposals
            .checked_add(1)
            .ok_or(BadgeError::Overflow)?;
        self.bump = bump;
        Ok(())
    }

    pub fn close(&mut self, proposal_id: u64) {
        if self.open_proposal == proposal_id {
            self.open_proposal = 0;
        }
    }
}

/// A wallet waiting on its own proposal cannot be bound by another path, so
/// a passing proposal can always mint to it.
pub fn ensure_not_pending(record: Option<&ProposerRecord>) -> Result<()> {
    require!(
        !record.map_or(false, ProposerRecord::has_open_proposal),
        BadgeError::PendingProposal
    );
    Ok(())
}

// =============================================================================
// KEY RESERVATION
// =============================================================================
// One per identity key. Held by the open proposal that asked for the key and
// released when it concludes, whatever the outcome.
// =============================================================================

#[account]
pub struct KeyReservation {
    pub key: IdentityKey,
    /// Holding proposal id, 0 when free
    pub proposal_id: u64,
    pub bump: u8,
}

impl KeyReservation {
    pub const SEED: &'static [u8] = b"reserved";

    pub const SIZE: usize = 8 + IdentityKey::SIZE + 8 + 1;

    pub fn is_held(&self) -> bool {
        self.proposal_id != 0
    }

    pub fn hold(&mut self, key: IdentityKey, proposal_id: u64, bump: u8) -> Result<()> {
        require!(!self.is_held(), BadgeError::AlreadyExists);
        self.key = key;
        self.proposal_id = proposal_id;
        self.bump = bump;
        Ok(())
    }

    pub fn release(&mut self, proposal_id: u64) {
        if self.proposal_id == proposal_id {
            self.proposal_id = 0;
        }
    }
}

pub fn ensure_unreserved(reservation: Option<&KeyReservation>) -> Result<()> {
    require!(
        !reservation.map_or(false, KeyReservation::is_held),
        BadgeError::AlreadyExists
    );
    Ok(())
}
