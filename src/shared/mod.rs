// Shared kernel: error taxonomy, database pool, configuration, utilities

pub mod config;
pub mod database;
pub mod errors;
pub mod utils;

pub use config::AppConfig;
pub use database::{Database, DbConnection, DbPool};
pub use utils::{RateLimiter, RetryPolicy};
