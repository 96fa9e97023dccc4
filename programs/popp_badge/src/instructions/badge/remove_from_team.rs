use anchor_lang::prelude::*;

use crate::errors::BadgeError;
use crate::events::TeamMemberRemoved;
use crate::state::{EmployerIdentity, IdentityKey, Registry, TeamMembership};

// =============================================================================
// REMOVE FROM TEAM INSTRUCTION
// =============================================================================
//
// The team is named by identity key or by badge id. Allowed for the registry
// admin, the employer's owner, or the member removing themselves. Removal is
// gated by the member's `removable_after`, which the program set when the
// wallet was bound.
// =============================================================================

#[derive(Accounts)]
#[instruction(identity_key: IdentityKey)]
pub struct RemoveFromTeam<'info> {
    pub authority: Signer<'info>,

    #[account(
        seeds = [Registry::SEED],
        bump = registry.bump,
        constraint = registry.is_active() @ BadgeError::Deactivated,
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [EmployerIdentity::SEED, employer.key.as_ref()],
        bump = employer.bump,
        constraint = employer.is_addressed_by(&identity_key) @ BadgeError::UnknownIdentity,
    )]
    pub employer: Box<Account<'info, EmployerIdentity>>,

    /// The wallet leaving the team
    /// CHECK: Used as identifier
    pub member: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [TeamMembership::SEED, member.key().as_ref()],
        bump = membership.bump,
    )]
    pub membership: Account<'info, TeamMembership>,
}

pub fn handler(ctx: Context<RemoveFromTeam>, _identity_key: IdentityKey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let authority = ctx.accounts.authority.key();
    let wallet = ctx.accounts.member.key();

    require!(
        may_remove(&ctx.accounts.registry, &ctx.accounts.employer, &authority, &wallet),
        BadgeError::Unauthorized
    );

    leave_team(&mut ctx.accounts.employer, &mut ctx.accounts.membership, now)?;

    let identity_key = ctx.accounts.employer.key;
    emit!(TeamMemberRemoved {
        identity_key,
        wallet,
    });

    msg!(
        "Removed {} from team '{}' ({} members remain)",
        wallet,
        identity_key,
        ctx.accounts.employer.members.len()
    );

    Ok(())
}

/// Admin, employer owner, or self-removal
pub fn may_remove(
    registry: &Registry,
    employer: &EmployerIdentity,
    authority: &Pubkey,
    wallet: &Pubkey,
) -> bool {
    registry.is_admin(authority) || employer.is_owner(authority) || authority == wallet
}

/// Zeroes the wallet's balance and drops it from the team
pub fn leave_team(
    employer: &mut EmployerIdentity,
    membership: &mut TeamMembership,
    now: i64,
) -> Result<()> {
    require!(
        membership.is_bound() && membership.identity == employer.key,
        BadgeError::NotBound
    );
    membership.ensure_removable(now)?;

    membership.unbind()?;
    employer.remove_member(&membership.wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_badge_err;
    use crate::instructions::badge::add_to_team::join_team;
    use crate::instructions::badge::mint_badge::issue_badge;
    use crate::test_fixtures::{blank_employer, blank_membership, registry};

    struct Team {
        registry: Registry,
        employer: EmployerIdentity,
        owner: TeamMembership,
    }

    fn team(cooldown: i64) -> Team {
        let mut registry = registry();
        registry.removal_cooldown = cooldown;
        let mut employer = blank_employer();
        let mut owner = blank_membership();
        issue_badge(
            &mut registry,
            &mut employer,
            0,
            &mut owner,
            0,
            Pubkey::new_unique(),
            "TOKEN_URI",
            IdentityKey::from_badge_id(1),
            1_000,
        )
        .unwrap();
        Team {
            registry,
            employer,
            owner,
        }
    }

    #[test]
    fn admin_owner_and_self_may_remove() {
        let t = team(0);
        let member = Pubkey::new_unique();
        let outsider = Pubkey::new_unique();

        assert!(may_remove(&t.registry, &t.employer, &t.registry.admin, &member));
        assert!(may_remove(&t.registry, &t.employer, &t.employer.owner_wallet, &member));
        assert!(may_remove(&t.registry, &t.employer, &member, &member));
        assert!(!may_remove(&t.registry, &t.employer, &outsider, &member));
    }

    #[test]
    fn owner_can_remove_themselves() {
        let mut t = team(0);
        leave_team(&mut t.employer, &mut t.owner, 1_000).unwrap();

        assert_eq!(t.owner.balance_of(&t.employer.key), 0);
        assert!(t.employer.members.is_empty());
        // The employer record itself stays registered
        assert!(t.employer.is_registered());
    }

    #[test]
    fn removal_waits_for_cooldown() {
        let mut t = team(3_600);
        let mut member = blank_membership();
        let cooldown = t.registry.removal_cooldown;
        let wallet = Pubkey::new_unique();
        join_team(&mut t.employer, &mut member, None, wallet, 2_000, cooldown, 0).unwrap();

        assert_badge_err(
            leave_team(&mut t.employer, &mut member, 5_599),
            BadgeError::TooEarly,
        );
        assert_eq!(member.balance, 1);

        leave_team(&mut t.employer, &mut member, 5_600).unwrap();
        assert_eq!(member.balance, 0);
        assert_eq!(t.employer.members.len(), 1);
    }

    #[test]
    fn removing_from_wrong_team_is_not_bound() {
        let mut t = team(0);
        let mut other = blank_employer();
        issue_badge(
            &mut t.registry,
            &mut other,
            0,
            &mut blank_membership(),
            0,
            Pubkey::new_unique(),
            "",
            IdentityKey::from_badge_id(2),
            0,
        )
        .unwrap();

        assert_badge_err(
            leave_team(&mut other, &mut t.owner, 2_000),
            BadgeError::NotBound,
        );
        assert_eq!(t.owner.balance, 1);
    }

    #[test]
    fn second_removal_is_not_bound() {
        let mut t = team(0);
        leave_team(&mut t.employer, &mut t.owner, 1_000).unwrap();
        assert_badge_err(
            leave_team(&mut t.employer, &mut t.owner, 1_000),
            BadgeError::NotBound,
        );
    }
}
