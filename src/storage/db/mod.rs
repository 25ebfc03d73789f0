//! Database backend.
//!
//! SQLite only; the samples table is small and append-only.
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::connect(Path::new("data/blockchain.db")).await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::SqlitePool;
