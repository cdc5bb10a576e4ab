pub mod modules;
pub mod schema;
pub mod shared;

pub use modules::catalog;
pub use modules::enrichment;
pub use modules::jobs;
pub use modules::notify;
pub use modules::scraper;
pub use shared::errors::{AppError, AppResult};
