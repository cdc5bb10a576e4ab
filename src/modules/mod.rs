pub mod catalog;
pub mod enrichment;
pub mod jobs;
pub mod notify;
pub mod scraper;
