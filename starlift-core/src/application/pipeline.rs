// starlift-core/src/application/pipeline.rs

use std::collections::{HashMap, HashSet};

use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::load::load;
use crate::application::quality::{decide, run_suite};
use crate::application::retry::{RetryPolicy, run_with_retry};
use crate::application::stage::stage;
use crate::domain::context::RunContext;
use crate::domain::graph::{GraphSolver, TaskKind, TaskSpec};
use crate::domain::quality::{RunReport, render_failures, render_summary};
use crate::error::StarliftError;
use crate::ports::executor::QueryExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
    /// Never executed: an upstream dependency exhausted its retries.
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct TaskOutcome {
    pub task: String,
    pub status: TaskStatus,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PipelineRunResult {
    pub success: bool,
    pub outcomes: Vec<TaskOutcome>,
    /// The quality gate's report, when the gate ran (pass or fail).
    pub report: Option<RunReport>,
}

/// Execute the whole task graph: plan layers, run each layer with bounded
/// concurrency, retry each task under the policy, and skip everything
/// downstream of a permanent failure.
///
/// There is no partial "amber" state: the run succeeds iff every task
/// succeeded.
pub async fn run_pipeline(
    tasks: &[TaskSpec],
    ctx: &RunContext,
    executor: &dyn QueryExecutor,
    policy: &RetryPolicy,
    auth_ref: &str,
    max_parallelism: usize,
) -> Result<PipelineRunResult, StarliftError> {
    println!("🚀 Starting pipeline run for {}", ctx.scheduled_at.format("%Y-%m-%d %H:%M"));

    // 1. DAG SCHEDULING (plan-time validation: duplicates, unknown deps, cycles)
    let layers = GraphSolver::plan_execution(tasks)?;
    let by_id: HashMap<&str, &TaskSpec> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    let total: usize = layers.iter().map(|l| l.len()).sum();
    println!("📝 Execution plan: {} tasks in {} layers", total, layers.len());

    // 2. EXECUTION LOOP (parallelized layers)
    let mut failed: HashSet<String> = HashSet::new();
    let mut outcomes: Vec<TaskOutcome> = Vec::new();
    let mut report: Option<RunReport> = None;

    for (i, layer) in layers.iter().enumerate() {
        if layer.is_empty() {
            continue;
        }
        println!("  🔹 Executing layer {} ({} tasks)...", i + 1, layer.len());

        // Tasks below a permanently failed upstream never execute.
        let mut runnable: Vec<&TaskSpec> = Vec::new();
        for id in layer {
            let Some(task) = by_id.get(id.as_str()).copied() else {
                continue;
            };
            if task.depends_on.iter().any(|dep| failed.contains(dep)) {
                warn!(task = %task.id, "Skipping task: upstream dependency failed");
                failed.insert(task.id.clone());
                outcomes.push(TaskOutcome {
                    task: task.id.clone(),
                    status: TaskStatus::Skipped,
                    error: None,
                });
            } else {
                runnable.push(task);
            }
        }

        let futures = runnable.into_iter().map(|task| async move {
            let result = execute_task(task, ctx, executor, policy, auth_ref).await;
            (task.id.clone(), result)
        });

        // All tasks of this layer finish before the next layer starts.
        let stream = futures::stream::iter(futures).buffer_unordered(max_parallelism.max(1));
        let results: Vec<_> = stream.collect().await;

        for (task_id, result) in results {
            match result {
                Ok(gate_report) => {
                    println!("    ✅ Task succeeded: {}", task_id);
                    if let Some(r) = gate_report {
                        println!("{}", render_summary(&r));
                        report = Some(r);
                    }
                    outcomes.push(TaskOutcome {
                        task: task_id,
                        status: TaskStatus::Succeeded,
                        error: None,
                    });
                }
                Err(e) => {
                    eprintln!("    ❌ Task failed: {}: {}", task_id, e);
                    if let StarliftError::Quality(qf) = &e {
                        println!("{}", render_summary(&qf.report));
                        eprintln!("{}", render_failures(&qf.report));
                        report = Some(qf.report.clone());
                    }
                    failed.insert(task_id.clone());
                    outcomes.push(TaskOutcome {
                        task: task_id,
                        status: TaskStatus::Failed,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
    }

    let success = failed.is_empty();
    info!(success, tasks = outcomes.len(), "Pipeline run finished");

    Ok(PipelineRunResult {
        success,
        outcomes,
        report,
    })
}

/// Run one task to completion under the retry policy. Only the quality gate
/// produces a report.
async fn execute_task(
    task: &TaskSpec,
    ctx: &RunContext,
    executor: &dyn QueryExecutor,
    policy: &RetryPolicy,
    auth_ref: &str,
) -> Result<Option<RunReport>, StarliftError> {
    match &task.kind {
        TaskKind::CreateSchema { statements } => {
            run_with_retry(policy, &task.id, || create_schema(statements, executor)).await?;
            Ok(None)
        }
        TaskKind::Stage(dataset) => {
            run_with_retry(policy, &task.id, || stage(dataset, auth_ref, ctx, executor)).await?;
            Ok(None)
        }
        TaskKind::Load(spec) => {
            run_with_retry(policy, &task.id, || load(spec, executor)).await?;
            Ok(None)
        }
        // The gate keeps its own loop: a passing report must survive the
        // retry wrapper, and a transient upstream data issue may self-resolve
        // on reload.
        TaskKind::QualityGate(suite) => {
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                let report = run_suite(suite, executor).await;
                match decide(&report) {
                    Ok(()) => return Ok(Some(report)),
                    Err(failure) if attempt > policy.retries => {
                        return Err(failure.into());
                    }
                    Err(failure) => {
                        warn!(
                            task = %task.id,
                            attempt,
                            failed = failure.report.failed_count(),
                            "Quality gate failed, will retry"
                        );
                        tokio::time::sleep(policy.delay).await;
                    }
                }
            }
        }
    }
}

async fn create_schema(
    statements: &[String],
    executor: &dyn QueryExecutor,
) -> Result<(), StarliftError> {
    for statement in statements {
        executor.execute(statement).await?;
    }
    Ok(())
}
