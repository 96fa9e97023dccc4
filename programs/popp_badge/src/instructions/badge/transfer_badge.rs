use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::state::{IdentityKey, Registry};

// Badges are soulbound: every transfer is rejected, whoever asks.

#[derive(Accounts)]
pub struct TransferBadge<'info> {
    pub from: Signer<'info>,

    /// CHECK: Never written
    pub to: UncheckedAccount<'info>,

    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,
}

pub fn handler(
    ctx: Context<TransferBadge>,
    identity_key: IdentityKey,
    amount: u64,
) -> Result<()> {
    reject_transfer(
        &ctx.accounts.from.key(),
        &ctx.accounts.to.key(),
        &identity_key,
        amount,
    )
}

pub fn reject_transfer(
    from: &Pubkey,
    to: &Pubkey,
    identity_key: &IdentityKey,
    amount: u64,
) -> Result<()> {
    msg!(
        "Rejected transfer of {} '{}' badge(s) from {} to {}",
        amount,
        identity_key,
        from,
        to
    );
    err!(BadgeError::NonTransferable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_badge_err;

    #[test]
    fn every_transfer_is_rejected() {
        let owner = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();
        let key = IdentityKey::from_badge_id(1);

        for (from, to) in [(owner, stranger), (stranger, owner), (owner, owner)] {
            for amount in [0, 1, u64::MAX] {
                assert_badge_err(
                    reject_transfer(&from, &to, &key, amount),
                    BadgeError::NonTransferable,
                );
            }
        }
    }
}
