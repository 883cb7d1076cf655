// starlift-core/src/domain/dataset.rs

use serde::{Deserialize, Serialize};

/// A named source of JSON records sitting in object storage, bound to the
/// staging table it lands in.
///
/// The key template may contain `{placeholder}`s resolved against the run
/// context, which is how timestamped partitions and backfills are addressed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dataset {
    pub name: String,
    pub bucket: String,
    pub key_template: String,
    /// Destination staging table. Its structure is a precondition, not
    /// something the stage loader manages.
    pub table: String,
    /// Explicit JSON-path mapping file; columns are inferred when absent.
    #[serde(default)]
    pub json_mapping: Option<String>,
    /// Free-form format options (date format, compression, ...), passed
    /// through opaquely.
    #[serde(default)]
    pub options: Option<String>,
}

impl Dataset {
    /// The format descriptor handed to the bulk load statement.
    pub fn json_descriptor(&self) -> &str {
        self.json_mapping.as_deref().unwrap_or("auto")
    }
}
