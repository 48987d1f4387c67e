//! Credentials, the explicit client session, and typed identifiers used by API calls.

pub mod id;
pub mod session;
pub mod token;

pub use id::*;
pub use session::*;
pub use token::{pair::*, secret::*};
