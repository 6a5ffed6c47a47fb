pub mod directory;
pub mod identity;

pub use directory::{ChatDirectory, PostgresChatDirectory};
pub use identity::{IdentityService, PostgresIdentityService};
