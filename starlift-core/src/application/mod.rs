// starlift-core/src/application/mod.rs

pub mod load;
pub mod pipeline;
pub mod quality;
pub mod retry;
pub mod stage;

pub use load::load;
pub use pipeline::{PipelineRunResult, TaskOutcome, TaskStatus, run_pipeline};
pub use quality::{decide, run_suite};
pub use retry::{RetryPolicy, run_with_retry};
pub use stage::stage;
