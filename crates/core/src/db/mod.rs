//! Storage layer (SPEC_FULL.md §4.1, component C1).
//!
//! [`Store`] is the only thing in this crate that talks to the database;
//! every other component reaches state exclusively through its methods, each
//! running inside a single committed transaction unless documented
//! otherwise (§3 "Ownership model").

mod audit;
mod consent;
mod images;
mod participants;
mod payments;
mod rewards;
pub mod schema;
mod stats;
mod submissions;

pub use participants::CreateOutcome;
pub use payments::ConfirmOutcome;
pub use rewards::SelectOutcome;
pub use submissions::RecordOutcome;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::CoreResult;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        Ok(Store { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Store { pool }
    }

    pub async fn migrate(&self) -> CoreResult<()> {
        schema::migrate(&self.pool).await
    }

    pub async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
