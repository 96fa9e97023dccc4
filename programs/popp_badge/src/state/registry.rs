use anchor_lang::prelude::*;

use crate::errors::BadgeError;

/// Default stake required to open a proposal (governance token base units)
pub const DEFAULT_PROPOSAL_COST: u64 = 100;

/// Default token balance a badge holder needs to vote
pub const DEFAULT_VOTE_MIN_BALANCE: u64 = 100;

/// Default proposal time-to-live: 7 days
pub const DEFAULT_PROPOSAL_TTL: i64 = 7 * 86400;

/// Admin-tunable governance parameters
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct GovernanceConfig {
    pub proposal_cost: u64,
    pub vote_min_balance: u64,
    pub proposal_ttl: i64,
    pub removal_cooldown: i64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            proposal_cost: DEFAULT_PROPOSAL_COST,
            vote_min_balance: DEFAULT_VOTE_MIN_BALANCE,
            proposal_ttl: DEFAULT_PROPOSAL_TTL,
            removal_cooldown: 0,
        }
    }
}

impl GovernanceConfig {
    pub fn validate(&self) -> Result<()> {
        require!(self.proposal_ttl >= 0, BadgeError::InvalidConfig);
        require!(self.removal_cooldown >= 0, BadgeError::InvalidConfig);
        Ok(())
    }
}

// =============================================================================
// REGISTRY ACCOUNT
// =============================================================================
// Process-wide singleton. Holds the administrator role, the governance
// parameters and the sequential counters for badges and proposals.
// =============================================================================

#[account]
pub struct Registry {
    /// Privileged administrator
    pub admin: Pubkey,
    /// SPL mint of the governance token used for stakes and vote gating
    pub governance_mint: Pubkey,
    /// Token account holding staked tokens for open proposals
    pub escrow_vault: Pubkey,

    // === Governance Config ===
    /// Stake required to propose
    pub proposal_cost: u64,
    /// Minimum governance-token balance required to vote
    pub vote_min_balance: u64,
    /// Seconds a proposal stays open before it can be concluded
    pub proposal_ttl: i64,
    /// Seconds a new team member must wait before being removable
    pub removal_cooldown: i64,

    // === Counters ===
    /// Last issued badge id (ids start at 1)
    pub badge_count: u64,
    /// Id the next proposal will take (starts at 1, also its PDA seed)
    pub proposal_nonce: u64,

    /// Terminal flag set by `revoke_all`
    pub deactivated: bool,

    /// PDA bump seeds
    pub bump: u8,
    pub vault_bump: u8,
}

impl Registry {
    pub const SEED: &'static [u8] = b"registry";
    pub const VAULT_SEED: &'static [u8] = b"escrow_vault";

    pub const SIZE: usize = 8 +  // discriminator
        32 +                     // admin
        32 +                     // governance_mint
        32 +                     // escrow_vault
        8 +                      // proposal_cost
        8 +                      // vote_min_balance
        8 +                      // proposal_ttl
        8 +                      // removal_cooldown
        8 +                      // badge_count
        8 +                      // proposal_nonce
        1 +                      // deactivated
        1 +                      // bump
        1;                       // vault_bump

    pub fn next_badge_id(&mut self) -> Result<u64> {
        self.badge_count = self
            .badge_count
            .checked_add(1)
            .ok_or(BadgeError::Overflow)?;
        Ok(self.badge_count)
    }

    /// Returns the current nonce as the new proposal's id and advances it
    pub fn take_proposal_id(&mut self) -> Result<u64> {
        let id = self.proposal_nonce;
        self.proposal_nonce = id.checked_add(1).ok_or(BadgeError::Overflow)?;
        Ok(id)
    }

    pub fn config(&self) -> GovernanceConfig {
        GovernanceConfig {
            proposal_cost: self.proposal_cost,
            vote_min_balance: self.vote_min_balance,
            proposal_ttl: self.proposal_ttl,
            removal_cooldown: self.removal_cooldown,
        }
    }

    pub fn apply_config(&mut self, config: GovernanceConfig) -> Result<()> {
        self.ensure_active()?;
        config.validate()?;
        self.proposal_cost = config.proposal_cost;
        self.vote_min_balance = config.vote_min_balance;
        self.proposal_ttl = config.proposal_ttl;
        self.removal_cooldown = config.removal_cooldown;
        Ok(())
    }

    pub fn is_admin(&self, key: &Pubkey) -> bool {
        self.admin == *key
    }

    pub fn is_active(&self) -> bool {
        !self.deactivated
    }

    pub fn ensure_active(&self) -> Result<()> {
        require!(self.is_active(), BadgeError::Deactivated);
        Ok(())
    }

    /// Active -> Deactivated. Nothing is cleared.
    pub fn deactivate(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.deactivated = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::registry;

    #[test]
    fn ids_are_sequential_and_one_based() {
        let mut r = registry();
        assert_eq!(r.next_badge_id().unwrap(), 1);
        assert_eq!(r.next_badge_id().unwrap(), 2);
        assert_eq!(r.take_proposal_id().unwrap(), 1);
        assert_eq!(r.take_proposal_id().unwrap(), 2);
        assert_eq!(r.proposal_nonce, 3);
        assert_eq!(r.badge_count, 2);
    }

    #[test]
    fn counter_overflow_is_an_error() {
        let mut r = registry();
        r.badge_count = u64::MAX;
        assert!(r.next_badge_id().is_err());
        assert_eq!(r.badge_count, u64::MAX);
    }

    #[test]
    fn negative_durations_are_rejected() {
        let mut r = registry();
        let bad_ttl = GovernanceConfig {
            proposal_ttl: -1,
            ..r.config()
        };
        crate::errors::assert_badge_err(r.apply_config(bad_ttl), BadgeError::InvalidConfig);

        let bad_cooldown = GovernanceConfig {
            removal_cooldown: -5,
            ..r.config()
        };
        crate::errors::assert_badge_err(r.apply_config(bad_cooldown), BadgeError::InvalidConfig);
        assert_eq!(r.config(), GovernanceConfig::default());
    }

    #[test]
    fn apply_config_replaces_every_field() {
        let mut r = registry();
        let config = GovernanceConfig {
            proposal_cost: 5,
            vote_min_balance: 0,
            proposal_ttl: 0,
            removal_cooldown: 3600,
        };
        r.apply_config(config).unwrap();
        assert_eq!(r.config(), config);
    }

    #[test]
    fn deactivation_is_terminal() {
        let mut r = registry();
        r.deactivate().unwrap();

        assert!(!r.is_active());
        crate::errors::assert_badge_err(r.ensure_active(), BadgeError::Deactivated);
        crate::errors::assert_badge_err(r.deactivate(), BadgeError::Deactivated);
        crate::errors::assert_badge_err(
            r.apply_config(GovernanceConfig::default()),
            BadgeError::Deactivated,
        );
    }

    #[test]
    fn size_matches_serialized_layout() {
        let r = registry();
        let mut buf = Vec::new();
        r.serialize(&mut buf).unwrap();
        assert_eq!(buf.len() + 8, Registry::SIZE);
    }
}
