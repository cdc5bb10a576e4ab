pub mod job;
pub mod queue;

pub use job::{JobSpec, JobStats, JobStatus, ScrapeJob, ScrapeTarget};
pub use queue::{JobQueue, RetryDisposition};
