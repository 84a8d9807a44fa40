//! Credential models: redacted secrets, access/refresh pairs, JWT claim inspection, and refresh
//! outcomes.

pub mod credential;
pub mod jwt;
pub mod secret;

pub use credential::*;
pub use jwt::*;
pub use secret::*;
