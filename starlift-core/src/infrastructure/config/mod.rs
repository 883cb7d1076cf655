// starlift-core/src/infrastructure/config/mod.rs

pub mod pipeline;

pub use pipeline::{PipelineConfig, build_graph, load_pipeline_config};
