// =============================================================================
// POPP BADGE STATE MODULE
// =============================================================================
//
// - Registry: admin role, governance config, counters, deactivation flag
// - EmployerIdentity / TeamMembership: the identity ledger
// - Proposal / ProposerRecord: stake-and-vote badge issuance
// =============================================================================

pub mod identity;
pub mod proposal;
pub mod registry;

pub use identity::*;
pub use proposal::*;
pub use registry::*;

use anchor_lang::prelude::*;

use crate::errors::BadgeError;

/// Reads a program account that may not have been created yet.
/// An empty account is `None`; anything else must be ours and well formed.
pub fn load_optional<T>(info: &AccountInfo) -> Result<Option<T>>
where
    T: AccountDeserialize,
{
    if info.data_is_empty() {
        return Ok(None);
    }
    require_keys_eq!(*info.owner, crate::ID, BadgeError::Unauthorized);
    let data = info.try_borrow_data()?;
    Ok(Some(T::try_deserialize(&mut &data[..])?))
}
