//! Sequential execution of a stepped plan
//!
//! Each step issues a sketch call and then a removal call that consumes the
//! sketch just created. Step `i + 1` is never issued before both calls of
//! step `i` have returned successfully. Nothing is rolled back or retried.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use super::plan::SteppedGeometryPlan;
use crate::service::{BodyReference, ServiceClient, ServiceError};

/// Which call of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPhase {
    Sketch,
    Removal,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepPhase::Sketch => f.write_str("sketch"),
            StepPhase::Removal => f.write_str("removal"),
        }
    }
}

/// A create call that failed inside the driver
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("Step {step} {phase} call failed: {source}")]
pub struct RemoteMutationError {
    /// 0-based index of the failing step
    pub step: usize,
    pub phase: StepPhase,
    /// Sketch of the failing step that exists remotely but has no removal
    pub orphaned_sketch_id: Option<String>,
    #[source]
    #[serde(rename = "error", serialize_with = "display_string")]
    pub source: ServiceError,
}

fn display_string<S: Serializer>(error: &ServiceError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Why an execution stopped before completing every step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StopReason {
    Failed(RemoteMutationError),
    Cancelled {
        /// Step that was not (fully) issued
        at_step: usize,
        orphaned_sketch_id: Option<String>,
    },
}

/// Outcome of one execution attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub plan_id: Uuid,
    /// (sketch, removal) pairs of fully completed steps, in step order
    pub created_feature_ids: Vec<String>,
    /// Index of the first failed step
    pub failed_at_step: Option<usize>,
    /// Some but not all steps completed
    pub partial_success: bool,
    pub stop: Option<StopReason>,
}

impl ExecutionResult {
    /// Every step completed
    pub fn is_complete(&self) -> bool {
        self.stop.is_none()
    }

    /// Number of fully completed steps
    pub fn completed_steps(&self) -> usize {
        self.created_feature_ids.len() / 2
    }

    /// The failure, if the execution stopped on one
    pub fn error(&self) -> Option<&RemoteMutationError> {
        match &self.stop {
            Some(StopReason::Failed(err)) => Some(err),
            _ => None,
        }
    }
}

/// Cooperative cancellation flag, checked before every remote call
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that no further calls be issued
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execute a plan against a body
pub fn execute(
    plan: &SteppedGeometryPlan,
    client: &dyn ServiceClient,
    body: &BodyReference,
) -> ExecutionResult {
    execute_with_cancel(plan, client, body, &CancelToken::new())
}

/// Execute a plan, stopping early if `cancel` is set
///
/// Remote failures are reported in the result rather than as an error so the
/// caller keeps the identifiers of what was already created.
pub fn execute_with_cancel(
    plan: &SteppedGeometryPlan,
    client: &dyn ServiceClient,
    body: &BodyReference,
    cancel: &CancelToken,
) -> ExecutionResult {
    let total = plan.len();
    let mut created = Vec::with_capacity(total * 2);

    tracing::info!(
        "Executing plan {} ({} steps) on {} via {}",
        plan.id(),
        total,
        body,
        client.name()
    );

    let stop = run_steps(plan, client, body, cancel, &mut created);

    let completed = created.len() / 2;
    let failed_at_step = match &stop {
        Some(StopReason::Failed(err)) => Some(err.step),
        _ => None,
    };
    let partial_success = stop.is_some() && completed > 0 && completed < total;

    match &stop {
        None => tracing::info!("Plan {} completed: {} features", plan.id(), created.len()),
        Some(StopReason::Failed(err)) => {
            tracing::warn!("Plan {} stopped after {} steps: {}", plan.id(), completed, err)
        }
        Some(StopReason::Cancelled { at_step, .. }) => {
            tracing::warn!("Plan {} cancelled before step {}", plan.id(), at_step)
        }
    }

    ExecutionResult {
        plan_id: plan.id(),
        created_feature_ids: created,
        failed_at_step,
        partial_success,
        stop,
    }
}

fn run_steps(
    plan: &SteppedGeometryPlan,
    client: &dyn ServiceClient,
    body: &BodyReference,
    cancel: &CancelToken,
    created: &mut Vec<String>,
) -> Option<StopReason> {
    for step in plan.planned_steps() {
        let index = step.index;

        if cancel.is_cancelled() {
            return Some(StopReason::Cancelled {
                at_step: index,
                orphaned_sketch_id: None,
            });
        }

        tracing::debug!("Step {}: creating '{}'", index, step.sketch.name());
        let sketch_id = match client.create_feature(body, &step.sketch) {
            Ok(id) => id,
            Err(source) => {
                return Some(StopReason::Failed(RemoteMutationError {
                    step: index,
                    phase: StepPhase::Sketch,
                    orphaned_sketch_id: None,
                    source,
                }));
            }
        };

        if cancel.is_cancelled() {
            return Some(StopReason::Cancelled {
                at_step: index,
                orphaned_sketch_id: Some(sketch_id),
            });
        }

        let mut removal = step.removal;
        let resolved = removal.resolve_preceding_sketch(&sketch_id);
        debug_assert!(resolved, "removal must reference the preceding sketch");

        tracing::debug!("Step {}: creating '{}'", index, removal.name());
        let removal_id = match client.create_feature(body, &removal) {
            Ok(id) => id,
            Err(source) => {
                return Some(StopReason::Failed(RemoteMutationError {
                    step: index,
                    phase: StepPhase::Removal,
                    orphaned_sketch_id: Some(sketch_id),
                    source,
                }));
            }
        };

        tracing::info!(
            "Step {} done: sketch {}, removal {}",
            index,
            sketch_id,
            removal_id
        );
        created.push(sketch_id);
        created.push(removal_id);
    }

    None
}
