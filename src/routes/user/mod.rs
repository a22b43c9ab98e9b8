mod handler;
pub mod model;

pub use handler::{admin_login, login, me, register, register_admin};
