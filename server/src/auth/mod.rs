//! Authentication Boundary
//!
//! Resolves the caller's user ID from a bearer token. Credential checks and
//! token issuance belong to the identity service.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult};
pub use middleware::{require_auth, AuthUser};
