pub mod pipeline;
pub mod service;
pub mod worker;

pub use pipeline::ScrapePipeline;
pub use service::{JobService, JobSubmission};
pub use worker::WorkerPool;
