pub mod admin;
pub mod initialize;

// Employer badges and teams
pub mod badge;
// Stake-and-vote issuance
pub mod governance;

pub use admin::*;
pub use initialize::*;
pub use badge::*;
pub use governance::*;
