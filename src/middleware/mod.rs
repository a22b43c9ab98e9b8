mod auth;
mod error_handler;

pub use auth::{LEGACY_TOKEN_HEADER, auth_middleware, extract_token};
pub use error_handler::log_errors;
