// starlift-core/src/domain/graph/dag.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::dataset::Dataset;
use crate::domain::error::DomainError;
use crate::domain::quality::CheckSpec;
use crate::domain::warehouse::LoadSpec;

/// What a task does when its turn comes. Tagged variants instead of an
/// operator class hierarchy: the four behaviors share nothing but the
/// executor they are handed.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// DDL statements run before any staging (table structure is a
    /// precondition for every loader).
    CreateSchema { statements: Vec<String> },
    Stage(Dataset),
    Load(LoadSpec),
    QualityGate(Vec<CheckSpec>),
}

/// One node of the pipeline graph: an id, a behavior, and the upstream task
/// ids that must succeed before it starts.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: String,
    pub kind: TaskKind,
    pub depends_on: Vec<String>,
}

pub struct GraphSolver;

impl GraphSolver {
    /// Calculates the execution order of tasks (Topological Sort with Layers).
    /// Returns a list of layers, where each layer contains tasks that can be
    /// executed in parallel. Layer N depends only on layers 0..N-1.
    pub fn plan_execution(tasks: &[TaskSpec]) -> Result<Vec<Vec<String>>, DomainError> {
        let mut in_degree: HashMap<String, usize> = HashMap::new();
        let mut adj_list: HashMap<String, Vec<String>> = HashMap::new();
        let mut known: HashSet<&str> = HashSet::new();

        // 1. Initialization: every id must be unique and known up front
        for task in tasks {
            if !known.insert(&task.id) {
                return Err(DomainError::DuplicateTask(task.id.clone()));
            }
            in_degree.insert(task.id.clone(), 0);
            adj_list.insert(task.id.clone(), Vec::new());
        }

        // 2. Graph Construction (Dependency Inversion)
        for task in tasks {
            for dep in &task.depends_on {
                if !known.contains(dep.as_str()) {
                    return Err(DomainError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                adj_list
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
                *in_degree.entry(task.id.clone()).or_insert(0) += 1;
            }
        }

        // 3. Kahn's Algorithm (Layered)
        let mut layers: Vec<Vec<String>> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for (id, &degree) in &in_degree {
            if degree == 0 {
                queue.push_back(id.clone());
            }
        }

        let mut total_resolved = 0;

        while !queue.is_empty() {
            let mut current_layer = Vec::new();
            // Everything currently queued is ready now and forms one layer.
            let layer_size = queue.len();

            for _ in 0..layer_size {
                if let Some(current) = queue.pop_front() {
                    current_layer.push(current.clone());
                    total_resolved += 1;

                    if let Some(neighbors) = adj_list.get(&current) {
                        for neighbor in neighbors {
                            if let Some(degree) = in_degree.get_mut(neighbor) {
                                *degree -= 1;
                                if *degree == 0 {
                                    queue.push_back(neighbor.clone());
                                }
                            }
                        }
                    }
                }
            }
            layers.push(current_layer);
        }

        // 4. Cycle Detection
        if total_resolved != tasks.len() {
            return Err(DomainError::CircularDependency {
                resolved: total_resolved,
                total: tasks.len(),
            });
        }

        Ok(layers)
    }
}
