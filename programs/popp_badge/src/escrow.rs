use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::errors::BadgeError;
use crate::state::Registry;

// =============================================================================
// STAKE ESCROW
// =============================================================================
//
// Proposal stakes sit in a single SPL token vault owned by the registry PDA.
// Token accounting (balances, delegate allowances) stays with the token
// program; failures from it propagate unchanged and revert the instruction.
// =============================================================================

/// Even split of `total` across `recipients`. The remainder goes one unit at a
/// time to the earliest recipients, so the shares always sum to `total`.
pub fn split_stake(total: u64, recipients: usize) -> Vec<u64> {
    if recipients == 0 {
        return Vec::new();
    }
    let n = recipients as u64;
    let base = total / n;
    let remainder = (total % n) as usize;
    (0..recipients)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// One transfer out of the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub recipient: Pubkey,
    /// Index into the winner token accounts; `None` pays the refund account
    pub winner_index: Option<usize>,
    pub amount: u64,
}

/// Transfers that settle `total`: the even split across `winners`, or a
/// refund to `proposer` when nobody won. Zero amounts are left out, so the
/// plan may be shorter than `winners`.
pub fn payout_plan(winners: &[Pubkey], total: u64, proposer: Pubkey) -> Vec<Payout> {
    if winners.is_empty() {
        return Some(Payout {
            recipient: proposer,
            winner_index: None,
            amount: total,
        })
        .filter(|p| p.amount > 0)
        .into_iter()
        .collect();
    }

    winners
        .iter()
        .zip(split_stake(total, winners.len()))
        .enumerate()
        .filter(|(_, (_, share))| *share > 0)
        .map(|(i, (winner, share))| Payout {
            recipient: *winner,
            winner_index: Some(i),
            amount: share,
        })
        .collect()
}

pub fn ensure_winner_accounts(winners: usize, accounts: usize) -> Result<()> {
    require!(winners == accounts, BadgeError::WinnerAccountMismatch);
    Ok(())
}

/// `holder` and `mint` are read off the token account passed for `winner`
pub fn check_winner_account(
    holder: &Pubkey,
    mint: &Pubkey,
    winner: &Pubkey,
    governance_mint: &Pubkey,
) -> Result<()> {
    require_keys_eq!(*holder, *winner, BadgeError::WinnerAccountMismatch);
    require_keys_eq!(*mint, *governance_mint, BadgeError::WinnerAccountMismatch);
    Ok(())
}

pub struct StakeEscrow<'info> {
    token_program: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    /// Registry PDA, signs for the vault
    authority: AccountInfo<'info>,
    authority_bump: u8,
}

impl<'info> StakeEscrow<'info> {
    pub fn new(
        token_program: AccountInfo<'info>,
        vault: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        authority_bump: u8,
    ) -> Self {
        Self {
            token_program,
            vault,
            authority,
            authority_bump,
        }
    }

    /// Moves `amount` from the staker's token account into the vault
    pub fn take_stake(
        &self,
        from: AccountInfo<'info>,
        owner: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let accounts = Transfer {
            from,
            to: self.vault.clone(),
            authority: owner,
        };
        token::transfer(
            CpiContext::new(self.token_program.clone(), accounts),
            amount,
        )
    }

    fn pay(&self, to: AccountInfo<'info>, amount: u64) -> Result<()> {
        let bump = [self.authority_bump];
        let seeds: &[&[u8]] = &[Registry::SEED, &bump];
        let signer = &[seeds];
        let accounts = Transfer {
            from: self.vault.clone(),
            to,
            authority: self.authority.clone(),
        };
        token::transfer(
            CpiContext::new_with_signer(self.token_program.clone(), accounts, signer),
            amount,
        )
    }

    /// Pays `total` out to `winners`, or back to `refund_to` when nobody won.
    ///
    /// `winner_accounts[i]` must be a governance token account owned by
    /// `winners[i]`. Returns the wallets that received tokens.
    pub fn settle(
        &self,
        governance_mint: &Pubkey,
        winners: &[Pubkey],
        winner_accounts: &[AccountInfo<'info>],
        refund_to: AccountInfo<'info>,
        refund_owner: Pubkey,
        total: u64,
    ) -> Result<Vec<Pubkey>> {
        if !winners.is_empty() {
            ensure_winner_accounts(winners.len(), winner_accounts.len())?;
            for (winner, info) in winners.iter().zip(winner_accounts) {
                verify_token_account(info, winner, governance_mint)?;
            }
        }

        let plan = payout_plan(winners, total, refund_owner);
        for payout in &plan {
            let to = match payout.winner_index {
                Some(i) => winner_accounts[i].clone(),
                None => refund_to.clone(),
            };
            self.pay(to, payout.amount)?;
        }

        Ok(plan.iter().map(|p| p.recipient).collect())
    }
}

fn verify_token_account(info: &AccountInfo, winner: &Pubkey, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(*info.owner, token::ID, BadgeError::WinnerAccountMismatch);
    let data = info.try_borrow_data()?;
    let account = TokenAccount::try_deserialize(&mut &data[..])?;
    check_winner_account(&account.owner, &account.mint, winner, mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sole_winner_takes_everything() {
        assert_eq!(split_stake(100, 1), vec![100]);
    }

    #[test]
    fn two_winners_split_evenly() {
        assert_eq!(split_stake(100, 2), vec![50, 50]);
    }

    #[test]
    fn remainder_goes_to_earliest_winners() {
        assert_eq!(split_stake(100, 3), vec![34, 33, 33]);
        assert_eq!(split_stake(5, 4), vec![2, 1, 1, 1]);
        assert_eq!(split_stake(2, 5), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn no_winners_means_no_shares() {
        assert!(split_stake(100, 0).is_empty());
    }

    fn paid(plan: &[Payout]) -> u128 {
        plan.iter().map(|p| p.amount as u128).sum()
    }

    #[test]
    fn nobody_won_refunds_proposer() {
        let proposer = Pubkey::new_unique();
        let plan = payout_plan(&[], 100, proposer);
        assert_eq!(
            plan,
            vec![Payout {
                recipient: proposer,
                winner_index: None,
                amount: 100,
            }]
        );
    }

    #[test]
    fn sole_yes_voter_is_paid_the_full_stake() {
        let alice = Pubkey::new_unique();
        let plan = payout_plan(&[alice], 100, Pubkey::new_unique());
        assert_eq!(
            plan,
            vec![Payout {
                recipient: alice,
                winner_index: Some(0),
                amount: 100,
            }]
        );
    }

    #[test]
    fn zero_shares_are_not_transferred() {
        let winners: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        let plan = payout_plan(&winners, 2, Pubkey::new_unique());

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].winner_index, Some(0));
        assert_eq!(plan[1].winner_index, Some(1));
        assert_eq!(paid(&plan), 2);

        assert!(payout_plan(&[], 0, Pubkey::new_unique()).is_empty());
    }

    #[test]
    fn payout_plan_conserves_stake_for_zero_to_max_winners() {
        let proposer = Pubkey::new_unique();
        for total in [0u64, 1, 7, 100, 999, u64::MAX] {
            for n in 0..=crate::state::MAX_VOTERS {
                let winners: Vec<Pubkey> = (0..n).map(|_| Pubkey::new_unique()).collect();
                let plan = payout_plan(&winners, total, proposer);
                assert_eq!(paid(&plan), total as u128, "total {} across {}", total, n);
                for payout in &plan {
                    match payout.winner_index {
                        Some(i) => assert_eq!(payout.recipient, winners[i]),
                        None => assert_eq!(payout.recipient, proposer),
                    }
                }
            }
        }
    }

    #[test]
    fn winner_accounts_must_line_up() {
        assert!(ensure_winner_accounts(3, 3).is_ok());
        crate::errors::assert_badge_err(
            ensure_winner_accounts(3, 2),
            BadgeError::WinnerAccountMismatch,
        );

        let winner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert!(check_winner_account(&winner, &mint, &winner, &mint).is_ok());
        crate::errors::assert_badge_err(
            check_winner_account(&Pubkey::new_unique(), &mint, &winner, &mint),
            BadgeError::WinnerAccountMismatch,
        );
        crate::errors::assert_badge_err(
            check_winner_account(&winner, &Pubkey::new_unique(), &winner, &mint),
            BadgeError::WinnerAccountMismatch,
        );
    }

    #[test]
    fn stake_is_conserved_for_every_winner_count() {
        for total in [0u64, 1, 7, 100, 999, u64::MAX] {
            for n in 1..=crate::state::MAX_VOTERS {
                let shares = split_stake(total, n);
                assert_eq!(shares.len(), n);
                let paid: u128 = shares.iter().map(|s| *s as u128).sum();
                assert_eq!(paid, total as u128, "total {} across {}", total, n);
            }
        }
    }
}
