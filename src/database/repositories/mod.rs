mod account;
mod post;
mod profile;

use sqlx::PgPool;

pub use account::AccountRepository;
pub use post::PostRepository;
pub use profile::ProfileRepository;

/// Postgres implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
