use anchor_lang::prelude::*;
use std::fmt;

use crate::errors::BadgeError;
use crate::state::load_optional;

// =============================================================================
// IDENTITY LEDGER
// =============================================================================
//
// wallet -> IdentityKey      (TeamMembership, one PDA per wallet)
// IdentityKey -> employer    (EmployerIdentity, one PDA per key)
//
// Employers were first keyed by an auto-incrementing badge id and later by a
// human-chosen string. IdentityKey carries either form in the same 32 bytes
// so both schemes share one account layout.
// =============================================================================

/// Maximum wallets on one employer's team, owner included
pub const MAX_TEAM_SIZE: usize = 32;

/// Maximum stored credential uri length in bytes
pub const MAX_URI_LEN: usize = 128;

/// Scheme prepended to stored uris by `credential_uri`
pub const URI_PREFIX: &str = "ipfs://";

/// Width of an identity key in bytes
pub const IDENTITY_KEY_LEN: usize = 32;

/// Opaque, immutable employer identity key.
///
/// Numeric keys are 24 zero bytes followed by the big-endian badge id.
/// Name keys are the UTF-8 name, zero padded; a name never starts with NUL so
/// the two forms cannot collide.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IdentityKey {
    pub bytes: [u8; IDENTITY_KEY_LEN],
}

impl IdentityKey {
    pub const SIZE: usize = IDENTITY_KEY_LEN;

    pub fn from_badge_id(badge_id: u64) -> Self {
        let mut bytes = [0u8; IDENTITY_KEY_LEN];
        bytes[IDENTITY_KEY_LEN - 8..].copy_from_slice(&badge_id.to_be_bytes());
        Self { bytes }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let raw = name.as_bytes();
        require!(
            !raw.is_empty() && raw.len() <= IDENTITY_KEY_LEN && !raw.contains(&0),
            BadgeError::InvalidIdentityKey
        );
        let mut bytes = [0u8; IDENTITY_KEY_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self { bytes })
    }

    pub fn badge_id(&self) -> Option<u64> {
        if self.bytes[..IDENTITY_KEY_LEN - 8].iter().any(|b| *b != 0) {
            return None;
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.bytes[IDENTITY_KEY_LEN - 8..]);
        match u64::from_be_bytes(id) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn name(&self) -> Option<&str> {
        if self.bytes[0] == 0 {
            return None;
        }
        let end = self
            .bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(IDENTITY_KEY_LEN);
        // Padding must be trailing only
        if self.bytes[end..].iter().any(|b| *b != 0) {
            return None;
        }
        std::str::from_utf8(&self.bytes[..end]).ok()
    }

    /// True when this key, used as a lookup, names the employer registered
    /// under `key` with sequential id `badge_id`. A numeric key also reaches
    /// name-keyed employers through their badge id.
    pub fn refers_to(&self, key: &IdentityKey, badge_id: u64) -> bool {
        self == key || self.badge_id() == Some(badge_id)
    }

    /// Well-formed keys are exactly the ones the two constructors produce
    pub fn validate(&self) -> Result<()> {
        require!(
            self.badge_id().is_some() || self.name().is_some(),
            BadgeError::InvalidIdentityKey
        );
        Ok(())
    }
}

impl AsRef<[u8]> for IdentityKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            write!(f, "{}", name)
        } else if let Some(id) = self.badge_id() {
            write!(f, "#{}", id)
        } else {
            write!(f, "<unset>")
        }
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({})", self)
    }
}

pub fn encode_uri(uri: &str) -> Result<[u8; MAX_URI_LEN]> {
    let raw = uri.as_bytes();
    require!(raw.len() <= MAX_URI_LEN, BadgeError::UriTooLong);
    let mut bytes = [0u8; MAX_URI_LEN];
    bytes[..raw.len()].copy_from_slice(raw);
    Ok(bytes)
}

pub fn decode_uri(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

// =============================================================================
// EMPLOYER IDENTITY ACCOUNT
// =============================================================================

#[account]
#[derive(Debug)]
pub struct EmployerIdentity {
    /// Key this employer is registered under (also the PDA seed)
    pub key: IdentityKey,
    /// Wallet that received the badge directly
    pub owner_wallet: Pubkey,
    /// Off-chain metadata pointer, zero padded
    pub credential_uri: [u8; MAX_URI_LEN],
    /// Sequential id assigned at mint
    pub badge_id: u64,
    /// When the badge was minted
    pub created_at: i64,
    /// Current team, owner first
    pub members: Vec<Pubkey>,
    /// PDA bump seed
    pub bump: u8,
}

impl EmployerIdentity {
    pub const SEED: &'static [u8] = b"employer";

    pub const SIZE: usize = 8 +     // discriminator
        IdentityKey::SIZE +          // key
        32 +                         // owner_wallet
        MAX_URI_LEN +                // credential_uri
        8 +                          // badge_id
        8 +                          // created_at
        4 + 32 * MAX_TEAM_SIZE +     // members
        1;                           // bump

    pub fn is_registered(&self) -> bool {
        self.owner_wallet != Pubkey::default()
    }

    /// Unregistered -> Active. There is no path back.
    pub fn register(
        &mut self,
        key: IdentityKey,
        owner_wallet: Pubkey,
        uri: &str,
        badge_id: u64,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        require!(!self.is_registered(), BadgeError::AlreadyExists);
        key.validate()?;
        // A numeric key is only ever the employer's own badge id
        if let Some(id) = key.badge_id() {
            require!(id == badge_id, BadgeError::InvalidIdentityKey);
        }
        let credential_uri = encode_uri(uri)?;

        self.key = key;
        self.owner_wallet = owner_wallet;
        self.credential_uri = credential_uri;
        self.badge_id = badge_id;
        self.created_at = now;
        self.members = vec![owner_wallet];
        self.bump = bump;
        Ok(())
    }

    pub fn uri(&self) -> String {
        decode_uri(&self.credential_uri)
    }

    /// Lookup by identity key or by badge id
    pub fn is_addressed_by(&self, query: &IdentityKey) -> bool {
        self.is_registered() && query.refers_to(&self.key, self.badge_id)
    }

    pub fn is_owner(&self, wallet: &Pubkey) -> bool {
        self.is_registered() && self.owner_wallet == *wallet
    }

    pub fn has_member(&self, wallet: &Pubkey) -> bool {
        self.members.contains(wallet)
    }

    pub fn add_member(&mut self, wallet: Pubkey) -> Result<()> {
        require!(!self.has_member(&wallet), BadgeError::AlreadyBound);
        require!(self.members.len() < MAX_TEAM_SIZE, BadgeError::TeamFull);
        self.members.push(wallet);
        Ok(())
    }

    pub fn remove_member(&mut self, wallet: &Pubkey) -> Result<()> {
        let index = self
            .members
            .iter()
            .position(|m| m == wallet)
            .ok_or(BadgeError::NotBound)?;
        self.members.remove(index);
        Ok(())
    }
}

// =============================================================================
// TEAM MEMBERSHIP ACCOUNT
// =============================================================================
// One per wallet, so a wallet can belong to at most one employer. The account
// is kept after removal with a zero balance and reused on the next bind.
// =============================================================================

#[account]
pub struct TeamMembership {
    /// The member wallet (also the PDA seed)
    pub wallet: Pubkey,
    /// Employer the wallet is bound to; unset when unbound
    pub identity: IdentityKey,
    /// That employer's badge id, 0 when unbound
    pub badge_id: u64,
    /// Credential balance: 1 while bound, 0 otherwise
    pub balance: u64,
    /// When the current binding was made
    pub joined_at: i64,
    /// Earliest time the binding may be removed
    pub removable_after: i64,
    /// PDA bump seed
    pub bump: u8,
}

impl TeamMembership {
    pub const SEED: &'static [u8] = b"membership";

    pub const SIZE: usize = 8 + 32 + IdentityKey::SIZE + 8 + 8 + 8 + 8 + 1;

    pub fn is_bound(&self) -> bool {
        self.balance > 0
    }

    pub fn bind(
        &mut self,
        wallet: Pubkey,
        identity: IdentityKey,
        badge_id: u64,
        now: i64,
        cooldown: i64,
        bump: u8,
    ) -> Result<()> {
        require!(!self.is_bound(), BadgeError::AlreadyBound);

        self.wallet = wallet;
        self.identity = identity;
        self.badge_id = badge_id;
        self.balance = 1;
        self.joined_at = now;
        self.removable_after = now.checked_add(cooldown).ok_or(BadgeError::Overflow)?;
        self.bump = bump;
        Ok(())
    }

    /// Clears the binding and returns the key it pointed at
    pub fn unbind(&mut self) -> Result<IdentityKey> {
        let identity = self.identity_of()?;
        self.identity = IdentityKey::default();
        self.badge_id = 0;
        self.balance = 0;
        self.joined_at = 0;
        self.removable_after = 0;
        Ok(identity)
    }

    pub fn identity_of(&self) -> Result<IdentityKey> {
        require!(self.is_bound(), BadgeError::NotBound);
        Ok(self.identity)
    }

    /// `query` is an identity key or a badge id
    pub fn balance_of(&self, query: &IdentityKey) -> u64 {
        if self.is_bound() && query.refers_to(&self.identity, self.badge_id) {
            self.balance
        } else {
            0
        }
    }

    pub fn ensure_removable(&self, now: i64) -> Result<()> {
        require!(now >= self.removable_after, BadgeError::TooEarly);
        Ok(())
    }

    /// Reads a membership PDA that may not exist yet. Returns `None` for an
    /// empty account or a cleared binding.
    pub fn load_if_bound(info: &AccountInfo) -> Result<Option<TeamMembership>> {
        Ok(load_optional::<TeamMembership>(info)?.filter(TeamMembership::is_bound))
    }
}
