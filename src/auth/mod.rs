pub mod policy;
pub mod token;

use uuid::Uuid;

pub use policy::{Owned, check_ownership, ensure_owner};
pub use token::{Claims, IssuedToken, TokenError, TokenService};

/// Identity attached to a request by the auth middleware; lives for that call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub account_id: Uuid,
}
