use anchor_lang::prelude::*;

use crate::state::{IdentityKey, VoteChoice};

// Field order is part of the indexer contract; append only.

#[event]
pub struct BadgeMinted {
    pub identity_key: IdentityKey,
    pub wallet: Pubkey,
    pub badge_id: u64,
}

#[event]
pub struct TeamMemberAdded {
    pub identity_key: IdentityKey,
    pub wallet: Pubkey,
}

#[event]
pub struct TeamMemberRemoved {
    pub identity_key: IdentityKey,
    pub wallet: Pubkey,
}

#[event]
pub struct ProposalCreated {
    pub proposal_id: u64,
    pub proposer: Pubkey,
    pub uri: String,
}

#[event]
pub struct VoteCast {
    pub proposal_id: u64,
    pub voter: Pubkey,
    pub choice: VoteChoice,
}

#[event]
pub struct ProposalConcluded {
    pub proposal_id: u64,
    pub passed: bool,
}

#[event]
pub struct StakeSettled {
    pub proposal_id: u64,
    pub recipients: Vec<Pubkey>,
    pub total: u64,
}

#[event]
pub struct AdminTransferred {
    pub previous: Pubkey,
    pub new: Pubkey,
}

#[event]
pub struct RegistryDeactivated {
    pub admin: Pubkey,
}

#[event]
pub struct GovernanceConfigUpdated {
    pub proposal_cost: u64,
    pub vote_min_balance: u64,
    pub proposal_ttl: i64,
    pub removal_cooldown: i64,
}
