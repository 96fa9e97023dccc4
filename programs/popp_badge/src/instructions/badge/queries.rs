use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::state::{
    load_optional, EmployerIdentity, IdentityKey, Registry, TeamMembership, URI_PREFIX,
};

// =============================================================================
// BADGE QUERIES
// =============================================================================
//
// Read-only instructions; results come back as Anchor return data. A
// membership PDA that was never created reads as an unbound wallet. Employers
// are named by identity key or by badge id.
// =============================================================================

#[derive(Accounts)]
#[instruction(wallet: Pubkey)]
pub struct WalletQuery<'info> {
    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    /// CHECK: May be uninitialized, read through `TeamMembership::load_if_bound`
    #[account(seeds = [TeamMembership::SEED, wallet.as_ref()], bump)]
    pub membership: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct EmployerQuery<'info> {
    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    /// Checked against the requested key or badge id in `load_employer`
    /// CHECK: May be uninitialized, read through `load_optional`
    pub employer: UncheckedAccount<'info>,
}

/// Membership PDAs for `balance_of_batch` arrive as remaining accounts
#[derive(Accounts)]
pub struct RegistryQuery<'info> {
    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,
}

pub fn balance_of(
    ctx: Context<WalletQuery>,
    _wallet: Pubkey,
    identity_key: IdentityKey,
) -> Result<u64> {
    let membership = TeamMembership::load_if_bound(&ctx.accounts.membership)?;
    Ok(membership.map_or(0, |m| m.balance_of(&identity_key)))
}

pub fn balance_of_batch(
    ctx: Context<RegistryQuery>,
    wallets: Vec<Pubkey>,
    identity_keys: Vec<IdentityKey>,
) -> Result<Vec<u64>> {
    let accounts = ctx.remaining_accounts;
    require!(
        wallets.len() == identity_keys.len() && wallets.len() == accounts.len(),
        BadgeError::BatchLengthMismatch
    );

    wallets
        .iter()
        .zip(identity_keys.iter())
        .zip(accounts.iter())
        .map(|((wallet, key), info)| {
            ensure_membership_account(wallet, info.key)?;
            let membership = TeamMembership::load_if_bound(info)?;
            Ok(membership.map_or(0, |m| m.balance_of(key)))
        })
        .collect()
}

pub fn identity_of(ctx: Context<WalletQuery>, wallet: Pubkey) -> Result<IdentityKey> {
    match TeamMembership::load_if_bound(&ctx.accounts.membership)? {
        Some(membership) => membership.identity_of(),
        None => {
            msg!("{} is not on any team", wallet);
            err!(BadgeError::NotBound)
        }
    }
}

pub fn credential_uri(ctx: Context<EmployerQuery>, identity_key: IdentityKey) -> Result<String> {
    let employer = load_employer(&ctx.accounts.employer, &identity_key)?;
    Ok(with_uri_prefix(&employer.uri()))
}

pub fn team_members(
    ctx: Context<EmployerQuery>,
    identity_key: IdentityKey,
) -> Result<Vec<Pubkey>> {
    Ok(load_employer(&ctx.accounts.employer, &identity_key)?.members)
}

fn load_employer(info: &AccountInfo, query: &IdentityKey) -> Result<EmployerIdentity> {
    let employer = load_optional::<EmployerIdentity>(info)?;
    resolve_employer(employer, query)
}

/// The registered employer `query` names, or `UnknownIdentity`
pub fn resolve_employer(
    employer: Option<EmployerIdentity>,
    query: &IdentityKey,
) -> Result<EmployerIdentity> {
    match employer.filter(|e| e.is_addressed_by(query)) {
        Some(employer) => Ok(employer),
        None => {
            msg!("No employer registered under '{}'", query);
            err!(BadgeError::UnknownIdentity)
        }
    }
}

pub fn membership_address(wallet: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[TeamMembership::SEED, wallet.as_ref()], &crate::ID)
}

pub fn ensure_membership_account(wallet: &Pubkey, account: &Pubkey) -> Result<()> {
    let (expected, _) = membership_address(wallet);
    require_keys_eq!(*account, expected, BadgeError::MembershipAccountMismatch);
    Ok(())
}

pub fn with_uri_prefix(uri: &str) -> String {
    format!("{}{}", URI_PREFIX, uri)
}
