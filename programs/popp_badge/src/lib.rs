use anchor_lang::prelude::*;

pub mod errors;
pub mod escrow;
pub mod events;
pub mod instructions;
pub mod state;

#[cfg(test)]
mod test_fixtures;

use instructions::*;
use state::{GovernanceConfig, IdentityKey, ProposalView, VoteChoice};

declare_id!("6bacGUFLXp6DyzcrtXYTPy1F7JhZwCgydGzcnBy9ronT");

#[program]
pub mod popp_badge {
    use super::*;

    // === Registry Setup ===

    /// Create the registry and escrow vault; the signer becomes admin
    pub fn initialize(ctx: Context<Initialize>, config: GovernanceConfig) -> Result<()> {
        instructions::initialize::handler(ctx, config)
    }

    // === Administration ===

    pub fn set_proposal_cost(ctx: Context<AdminOnly>, cost: u64) -> Result<()> {
        instructions::admin::set_proposal_cost(ctx, cost)
    }

    pub fn set_vote_min_balance(ctx: Context<AdminOnly>, min_balance: u64) -> Result<()> {
        instructions::admin::set_vote_min_balance(ctx, min_balance)
    }

    pub fn set_proposal_ttl(ctx: Context<AdminOnly>, ttl: i64) -> Result<()> {
        instructions::admin::set_proposal_ttl(ctx, ttl)
    }

    pub fn set_removal_cooldown(ctx: Context<AdminOnly>, cooldown: i64) -> Result<()> {
        instructions::admin::set_removal_cooldown(ctx, cooldown)
    }

    /// Hand the admin role to another wallet
    pub fn transfer_admin(ctx: Context<AdminOnly>, new_admin: Pubkey) -> Result<()> {
        instructions::admin::transfer_admin(ctx, new_admin)
    }

    /// Permanently deactivate the registry
    pub fn revoke_all(ctx: Context<AdminOnly>) -> Result<()> {
        instructions::admin::revoke_all(ctx)
    }

    // === Employer Badges ===

    /// Admin mint of an employer badge to `recipient`
    pub fn mint_badge(
        ctx: Context<MintBadge>,
        identity_key: IdentityKey,
        uri: String,
    ) -> Result<()> {
        instructions::badge::mint_badge::handler(ctx, identity_key, uri)
    }

    /// Add a wallet to an employer's team (admin or employer owner)
    pub fn add_to_team(ctx: Context<AddToTeam>, identity_key: IdentityKey) -> Result<()> {
        instructions::badge::add_to_team::handler(ctx, identity_key)
    }

    /// Remove a wallet from an employer's team (admin, owner, or the wallet itself)
    pub fn remove_from_team(
        ctx: Context<RemoveFromTeam>,
        identity_key: IdentityKey,
    ) -> Result<()> {
        instructions::badge::remove_from_team::handler(ctx, identity_key)
    }

    /// Always fails: badges are non-transferable
    pub fn transfer_badge(
        ctx: Context<TransferBadge>,
        identity_key: IdentityKey,
        amount: u64,
    ) -> Result<()> {
        instructions::badge::transfer_badge::handler(ctx, identity_key, amount)
    }

    // === Badge Queries ===

    pub fn balance_of(
        ctx: Context<WalletQuery>,
        wallet: Pubkey,
        identity_key: IdentityKey,
    ) -> Result<u64> {
        instructions::badge::queries::balance_of(ctx, wallet, identity_key)
    }

    /// Membership PDAs for each wallet go in remaining accounts
    pub fn balance_of_batch(
        ctx: Context<RegistryQuery>,
        wallets: Vec<Pubkey>,
        identity_keys: Vec<IdentityKey>,
    ) -> Result<Vec<u64>> {
        instructions::badge::queries::balance_of_batch(ctx, wallets, identity_keys)
    }

    pub fn identity_of(ctx: Context<WalletQuery>, wallet: Pubkey) -> Result<IdentityKey> {
        instructions::badge::queries::identity_of(ctx, wallet)
    }

    pub fn credential_uri(
        ctx: Context<EmployerQuery>,
        identity_key: IdentityKey,
    ) -> Result<String> {
        instructions::badge::queries::credential_uri(ctx, identity_key)
    }

    pub fn team_members(
        ctx: Context<EmployerQuery>,
        identity_key: IdentityKey,
    ) -> Result<Vec<Pubkey>> {
        instructions::badge::queries::team_members(ctx, identity_key)
    }

    // === Governance ===

    /// Stake `proposal_cost` tokens to request a badge
    pub fn propose(ctx: Context<Propose>, uri: String, identity_key: IdentityKey) -> Result<()> {
        instructions::governance::propose::handler(ctx, uri, identity_key)
    }

    pub fn vote(ctx: Context<Vote>, proposal_id: u64, choice: VoteChoice) -> Result<()> {
        instructions::governance::vote::handler(ctx, proposal_id, choice)
    }

    /// Resolve an expired proposal. Winner token accounts go in remaining
    /// accounts, in vote order.
    pub fn conclude<'info>(
        ctx: Context<'_, '_, '_, 'info, Conclude<'info>>,
        proposal_id: u64,
    ) -> Result<()> {
        instructions::governance::conclude::handler(ctx, proposal_id)
    }

    // === Governance Queries ===

    pub fn get_proposal(ctx: Context<ProposalQuery>, proposal_id: u64) -> Result<ProposalView> {
        instructions::governance::queries::get_proposal(ctx, proposal_id)
    }

    pub fn get_votes(
        ctx: Context<ProposalQuery>,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<Vec<Pubkey>> {
        instructions::governance::queries::get_votes(ctx, proposal_id, choice)
    }

    pub fn my_proposal(ctx: Context<ProposerQuery>, wallet: Pubkey) -> Result<ProposalView> {
        instructions::governance::queries::my_proposal(ctx, wallet)
    }
}
