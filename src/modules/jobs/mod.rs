pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{JobService, JobSubmission, ScrapePipeline, WorkerPool};
pub use domain::{JobQueue, JobSpec, JobStats, JobStatus, ScrapeJob, ScrapeTarget};
pub use infrastructure::PgJobQueue;
