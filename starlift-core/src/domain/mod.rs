// starlift-core/src/domain/mod.rs

pub mod context;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod quality;
pub mod warehouse;

pub use context::{RunContext, resolve_template};
pub use dataset::Dataset;
pub use error::DomainError;
pub use warehouse::{LoadMode, LoadSpec};
