// starlift-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Unresolved placeholder '{placeholder}' in key template '{template}'")]
    #[diagnostic(
        code(starlift::domain::template),
        help(
            "Add the placeholder to the run parameters, or use a builtin ({{run_date}}, {{run_ts}}, {{year}}, {{month}}, {{day}}, {{hour}})."
        )
    )]
    UnresolvedPlaceholder {
        placeholder: String,
        template: String,
    },

    #[error("Circular dependency detected. Resolved {resolved}/{total} tasks.")]
    #[diagnostic(
        code(starlift::domain::cycle),
        help("Check the depends_on edges of your tasks.")
    )]
    CircularDependency { resolved: usize, total: usize },

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    #[diagnostic(code(starlift::domain::unknown_dependency))]
    UnknownDependency { task: String, dependency: String },

    #[error("Duplicate task id '{0}' in graph")]
    #[diagnostic(code(starlift::domain::duplicate_task))]
    DuplicateTask(String),

    #[error("Invalid configuration for '{scope}': {reason}")]
    #[diagnostic(code(starlift::domain::config))]
    InvalidConfig { scope: String, reason: String },
}
