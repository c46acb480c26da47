pub mod commands;
pub mod controller;
pub mod identity;
pub mod session;

pub use controller::{NavigationEngine, NavigationError, NavigationOutcome};
pub use identity::{CallerIdentity, IdentityError};
pub use session::{CallSession, SessionError, SessionRecord};
