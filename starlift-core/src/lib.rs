// starlift-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// The QueryExecutor contract every warehouse adapter implements.
pub mod ports;

// 2. Domain (pure logic)
// Run context, datasets, load specs, quality checks, the task graph.
// Depends on nothing else (no infra, no application).
pub mod domain;

// 3. Infrastructure (Adapters)
// Configuration files, the DuckDB executor.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Stage / load / quality-gate behaviors, retry policy, pipeline orchestration.
// Depends on Domain, Infra and Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::StarliftError;
