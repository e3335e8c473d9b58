pub mod config;
pub mod logging;

pub mod aggregate;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod partition;
pub mod timer;

pub use aggregate::{OutcomeKey, ResultAggregator, ResultHistogram};
pub use config::RunConfig;
pub use error::{FetchError, RunError};
pub use executor::{Backend, Executor, RunReport, WorkerFault};
pub use fetcher::{CurlFetcher, CurlOptions, FailureKind, Fetch, FetchOutcome};
pub use partition::{partition, IdBatch, Partition};
