use anchor_lang::prelude::*;

use crate::state::{
    EmployerIdentity, GovernanceConfig, IdentityKey, KeyReservation, Proposal, ProposerRecord,
    Registry, TeamMembership, MAX_URI_LEN,
};

pub fn registry() -> Registry {
    let config = GovernanceConfig::default();
    Registry {
        admin: Pubkey::new_unique(),
        governance_mint: Pubkey::new_unique(),
        escrow_vault: Pubkey::new_unique(),
        proposal_cost: config.proposal_cost,
        vote_min_balance: config.vote_min_balance,
        proposal_ttl: config.proposal_ttl,
        removal_cooldown: config.removal_cooldown,
        badge_count: 0,
        proposal_nonce: 1,
        deactivated: false,
        bump: 255,
        vault_bump: 255,
    }
}

/// Freshly allocated (all-zero) employer account
pub fn blank_employer() -> EmployerIdentity {
    EmployerIdentity {
        key: IdentityKey::default(),
        owner_wallet: Pubkey::default(),
        credential_uri: [0u8; MAX_URI_LEN],
        badge_id: 0,
        created_at: 0,
        members: Vec::new(),
        bump: 0,
    }
}

pub fn blank_membership() -> TeamMembership {
    TeamMembership {
        wallet: Pubkey::default(),
        identity: IdentityKey::default(),
        badge_id: 0,
        balance: 0,
        joined_at: 0,
        removable_after: 0,
        bump: 0,
    }
}

pub fn blank_proposal() -> Proposal {
    Proposal {
        id: 0,
        proposer: Pubkey::default(),
        uri: [0u8; MAX_URI_LEN],
        identity_key: IdentityKey::default(),
        stake_amount: 0,
        created_at: 0,
        yes_voters: Vec::new(),
        no_voters: Vec::new(),
        concluded: false,
        passed: false,
        concluded_at: None,
        bump: 0,
    }
}

pub fn blank_proposer_record() -> ProposerRecord {
    ProposerRecord {
        proposer: Pubkey::default(),
        open_proposal: 0,
        total_proposals: 0,
        bump: 0,
    }
}

pub fn blank_reservation() -> KeyReservation {
    KeyReservation {
        key: IdentityKey::default(),
        proposal_id: 0,
        bump: 0,
    }
}
