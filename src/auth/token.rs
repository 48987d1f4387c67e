//! Bearer credential models.

pub mod pair;
pub mod secret;
