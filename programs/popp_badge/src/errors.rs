use anchor_lang::prelude::*;

#[error_code]
pub enum BadgeError {
    #[msg("Unauthorized: caller lacks the required role for this action")]
    Unauthorized,

    #[msg("Employer identity already exists for this key")]
    AlreadyExists,

    #[msg("No employer is registered under this identity key")]
    UnknownIdentity,

    #[msg("Wallet already apart of a team")]
    AlreadyBound,

    #[msg("Wallet is not bound to this employer")]
    NotBound,

    #[msg("Employer badges are non-transferable")]
    NonTransferable,

    #[msg("Team member cannot be removed before their cooldown has elapsed")]
    TooEarly,

    #[msg("Registry has been deactivated")]
    Deactivated,

    #[msg("Team has reached its maximum size")]
    TeamFull,

    #[msg("Invalid identity key: must be 1-32 bytes with no NUL")]
    InvalidIdentityKey,

    #[msg("Credential uri exceeds the maximum length")]
    UriTooLong,

    #[msg("Invalid authority: cannot set zero address as authority")]
    InvalidAuthority,

    #[msg("Invalid governance configuration value")]
    InvalidConfig,

    #[msg("You already have an employer badge")]
    AlreadyCredentialed,

    #[msg("You already have a proposal")]
    DuplicateProposal,

    #[msg("Wallet has an open badge proposal")]
    PendingProposal,

    #[msg("Proposal does not exist")]
    NotFound,

    #[msg("You cannot vote on your own proposal")]
    SelfVote,

    #[msg("You already voted")]
    AlreadyVoted,

    #[msg("Voter balance is below the minimum required to vote")]
    InsufficientStake,

    #[msg("Proposal has reached its maximum number of voters")]
    TooManyVoters,

    #[msg("Proposal has already been concluded")]
    AlreadyConcluded,

    #[msg("Proposal has not reached its time-to-live")]
    NotYetExpired,

    #[msg("Token account is not owned by the signer or is not for the governance mint")]
    InvalidTokenAccount,

    #[msg("Winner token accounts do not match the winning voters")]
    WinnerAccountMismatch,

    #[msg("Employer and membership accounts are required to mint a passed proposal")]
    MissingBadgeAccounts,

    #[msg("Batch wallets, identity keys and accounts differ in length")]
    BatchLengthMismatch,

    #[msg("Membership account is not the PDA of the requested wallet")]
    MembershipAccountMismatch,

    #[msg("Arithmetic overflow")]
    Overflow,
}

#[cfg(test)]
pub(crate) fn assert_badge_err<T: std::fmt::Debug>(res: Result<T>, expected: BadgeError) {
    assert_eq!(res.unwrap_err(), anchor_lang::error::Error::from(expected));
}
