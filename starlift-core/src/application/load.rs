// starlift-core/src/application/load.rs

use tracing::info;

use crate::domain::warehouse::{LoadMode, LoadSpec};
use crate::error::StarliftError;
use crate::ports::executor::QueryExecutor;

/// Transform staged rows into a fact or dimension table.
///
/// One component for both roles: the only difference between the fact and
/// dimension loaders is the default mode, which the configuration layer
/// already resolved into the load spec. An insert that produces zero rows is a
/// success here; whether an empty table is acceptable is the quality gate's
/// call.
pub async fn load(spec: &LoadSpec, executor: &dyn QueryExecutor) -> Result<(), StarliftError> {
    if spec.mode == LoadMode::Replace {
        info!(table = %spec.table, "Clearing target table before load");
        executor
            .execute(&format!("DELETE FROM {}", spec.table))
            .await
            .map_err(|e| StarliftError::Load {
                stage: "clear",
                table: spec.table.clone(),
                source: Box::new(e),
            })?;
    }

    info!(table = %spec.table, mode = ?spec.mode, "Loading target table");
    executor
        .execute(&format!("INSERT INTO {} {}", spec.table, spec.query))
        .await
        .map_err(|e| StarliftError::Load {
            stage: "insert",
            table: spec.table.clone(),
            source: Box::new(e),
        })?;

    Ok(())
}
