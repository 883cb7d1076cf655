// starlift-core/src/infrastructure/config/pipeline.rs

// Typed pipeline configuration. Everything is validated here, at
// graph-construction time, so misconfiguration surfaces before any task
// runs instead of mid-retry with a missing-key lookup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::application::retry::RetryPolicy;
use crate::domain::dataset::Dataset;
use crate::domain::error::DomainError;
use crate::domain::graph::{TaskKind, TaskSpec};
use crate::domain::quality::CheckSpec;
use crate::domain::warehouse::{LoadMode, LoadSpec};
use crate::error::StarliftError;
use crate::infrastructure::error::InfrastructureError;

#[derive(Debug, Deserialize, Validate)]
pub struct PipelineConfig {
    pub name: String,
    /// Authorization reference handed to bulk load statements (e.g. an IAM
    /// role ARN). Opaque to the core.
    pub auth_ref: String,
    #[serde(default = "default_target_path")]
    pub target_path: String,
    /// SQL file with the DDL run before any staging. Statements split on ';'.
    #[serde(default)]
    pub schema_file: Option<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    pub fact: LoadConfig,
    #[serde(default)]
    pub dimensions: Vec<LoadConfig>,
    #[serde(default)]
    #[validate(nested)]
    pub quality: SuiteConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_parallelism")]
    pub max_parallelism: usize,
}

fn default_target_path() -> String {
    "target".to_string()
}

fn default_parallelism() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct LoadConfig {
    pub table: String,
    /// Inline transformation query...
    #[serde(default)]
    pub query: Option<String>,
    /// ...or a file holding it, relative to the project dir.
    #[serde(default)]
    pub query_file: Option<String>,
    /// Defaults per role: append for the fact, replace for dimensions.
    #[serde(default)]
    pub mode: Option<LoadMode>,
}

impl LoadConfig {
    fn to_spec(
        &self,
        project_dir: &Path,
        default_mode: LoadMode,
    ) -> Result<LoadSpec, StarliftError> {
        if self.table.trim().is_empty() {
            return Err(DomainError::InvalidConfig {
                scope: "load".into(),
                reason: "target table name is empty".into(),
            }
            .into());
        }
        let query = match (&self.query, &self.query_file) {
            (Some(q), None) => q.clone(),
            (None, Some(file)) => fs::read_to_string(project_dir.join(file)).map_err(|e| {
                InfrastructureError::ConfigError(format!(
                    "Could not read query file '{file}' for table '{}': {e}",
                    self.table
                ))
            })?,
            _ => {
                return Err(InfrastructureError::ConfigError(format!(
                    "Load for table '{}' needs exactly one of 'query' or 'query_file'",
                    self.table
                ))
                .into());
            }
        };
        Ok(LoadSpec {
            table: self.table.clone(),
            query: query.trim().to_string(),
            mode: self.mode.unwrap_or(default_mode),
        })
    }
}

/// Declarative quality suite. Entry order is declaration order, which is
/// also the order results appear in the report.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SuiteConfig {
    #[serde(default)]
    pub row_count_check: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub null_ratio_check: Vec<NullRatioEntry>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NullRatioEntry {
    pub table: String,
    #[validate(nested)]
    pub columns: Vec<NullRatioColumn>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NullRatioColumn {
    pub column: String,
    /// Percent of null rows at which the column fails. No hidden default:
    /// every column names its own tolerance.
    #[validate(range(min = 0.0, exclusive_max = 100.0))]
    pub threshold: f64,
}

impl SuiteConfig {
    pub fn to_checks(&self) -> Vec<CheckSpec> {
        let mut checks = Vec::new();
        for table in &self.row_count_check {
            checks.push(CheckSpec::RowCount {
                table: table.clone(),
            });
        }
        for entry in &self.null_ratio_check {
            for col in &entry.columns {
                checks.push(CheckSpec::NullRatio {
                    table: entry.table.clone(),
                    column: col.column.clone(),
                    threshold: col.threshold,
                });
            }
        }
        checks
    }
}

#[derive(Debug, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    300
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_secs(self.retry_delay_secs))
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_pipeline_config(project_dir: &Path) -> Result<PipelineConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading pipeline configuration");

    let content = fs::read_to_string(&config_path)?;
    let mut config: PipelineConfig = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut config);

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["starlift.yml", "pipeline.yml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

fn apply_env_overrides(config: &mut PipelineConfig) {
    // Layering: STARLIFT_AUTH_REF=arn:... starlift run
    if let Ok(val) = std::env::var("STARLIFT_AUTH_REF") {
        info!("Overriding auth reference via ENV");
        config.auth_ref = val;
    }
    if let Ok(val) = std::env::var("STARLIFT_MAX_PARALLELISM") {
        match val.parse::<usize>() {
            Ok(n) if n > 0 => {
                info!(old = config.max_parallelism, new = n, "Overriding parallelism via ENV");
                config.max_parallelism = n;
            }
            _ => warn!(value = %val, "Ignoring invalid STARLIFT_MAX_PARALLELISM"),
        }
    }
}

// --- GRAPH CONSTRUCTION ---

/// Wire the canonical star-schema topology from the validated configuration:
/// Create Schema -> {stages} -> fact -> {dimensions} -> quality gate.
///
/// All `ConfigError`s come out of here, before anything executes.
pub fn build_graph(
    config: &PipelineConfig,
    project_dir: &Path,
) -> Result<Vec<TaskSpec>, StarliftError> {
    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    if config.datasets.is_empty() {
        return Err(InfrastructureError::ConfigError(
            "At least one dataset must be declared".into(),
        )
        .into());
    }
    for dataset in &config.datasets {
        for (field, value) in [
            ("name", &dataset.name),
            ("bucket", &dataset.bucket),
            ("key_template", &dataset.key_template),
            ("table", &dataset.table),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidConfig {
                    scope: format!("dataset '{}'", dataset.name),
                    reason: format!("'{field}' is empty"),
                }
                .into());
            }
        }
    }

    let mut tasks: Vec<TaskSpec> = Vec::new();
    let mut stage_deps: Vec<String> = Vec::new();

    if let Some(schema_file) = &config.schema_file {
        let ddl = fs::read_to_string(project_dir.join(schema_file)).map_err(|e| {
            InfrastructureError::ConfigError(format!(
                "Could not read schema file '{schema_file}': {e}"
            ))
        })?;
        let statements: Vec<String> = ddl
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        tasks.push(TaskSpec {
            id: "create_schema".into(),
            kind: TaskKind::CreateSchema { statements },
            depends_on: vec![],
        });
        stage_deps.push("create_schema".into());
    }

    let mut fact_deps: Vec<String> = Vec::new();
    for dataset in &config.datasets {
        let id = format!("stage_{}", dataset.name);
        tasks.push(TaskSpec {
            id: id.clone(),
            kind: TaskKind::Stage(dataset.clone()),
            depends_on: stage_deps.clone(),
        });
        fact_deps.push(id);
    }

    let fact_spec = config.fact.to_spec(project_dir, LoadMode::Append)?;
    let fact_id = format!("load_{}", fact_spec.table);
    tasks.push(TaskSpec {
        id: fact_id.clone(),
        kind: TaskKind::Load(fact_spec),
        depends_on: fact_deps,
    });

    let mut gate_deps: Vec<String> = Vec::new();
    for dim in &config.dimensions {
        let spec = dim.to_spec(project_dir, LoadMode::Replace)?;
        let id = format!("load_{}", spec.table);
        tasks.push(TaskSpec {
            id: id.clone(),
            kind: TaskKind::Load(spec),
            depends_on: vec![fact_id.clone()],
        });
        gate_deps.push(id);
    }
    if gate_deps.is_empty() {
        gate_deps.push(fact_id);
    }

    let checks = config.quality.to_checks();
    if !checks.is_empty() {
        tasks.push(TaskSpec {
            id: "quality_gate".into(),
            kind: TaskKind::QualityGate(checks),
            depends_on: gate_deps,
        });
    }

    Ok(tasks)
}
