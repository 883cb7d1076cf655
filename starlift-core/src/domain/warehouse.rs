// starlift-core/src/domain/warehouse.rs

use serde::{Deserialize, Serialize};

/// Load semantics for a fact or dimension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Delete-all-then-insert. Dimensions default here: they are small
    /// enough that a full replace keeps them consistent with the latest
    /// staging snapshot.
    Replace,
    /// Insert-only. Facts default here: they are usually too large to
    /// truncate every run.
    Append,
}

/// Binds a target table to an opaque transformation query and a load mode.
///
/// The query is a caller-supplied black-box row producer (it typically reads
/// from staging tables, deduplicating and joining on the way).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadSpec {
    pub table: String,
    pub query: String,
    pub mode: LoadMode,
}
