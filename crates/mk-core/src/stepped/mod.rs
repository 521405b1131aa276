//! Stepped feature building
//!
//! Turns one high-level stepped-geometry request (e.g. a counterbore with
//! several diameters and depths) into an ordered chain of dependent remote
//! calls.

mod driver;
mod plan;

pub use driver::{
    CancelToken, ExecutionResult, RemoteMutationError, StepPhase, StopReason, execute,
    execute_with_cancel,
};
pub use plan::{
    PlanOptions, PlanStep, PlanValidationError, PlannedStep, SteppedGeometryPlan, plan, plan_with,
};
