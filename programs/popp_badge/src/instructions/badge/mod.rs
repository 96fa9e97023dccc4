pub mod add_to_team;
pub mod mint_badge;
pub mod queries;
pub mod remove_from_team;
pub mod transfer_badge;

pub use add_to_team::*;
pub use mint_badge::*;
pub use queries::*;
pub use remove_from_team::*;
pub use transfer_badge::*;
