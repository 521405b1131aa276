//! Stepped geometry planning
//!
//! Validates a stepped-geometry request and normalizes it into an ordered,
//! immutable plan of sketch + removal steps.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::MIN_STEPS;
use crate::feature::{FeatureDefinition, RegionRef, SketchPlane};

/// Caller input errors, raised before any remote call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanValidationError {
    #[error("Number of radii ({radii}) must match number of depths ({depths})")]
    LengthMismatch { radii: usize, depths: usize },

    #[error("At least {min} steps required for stepped geometry, got {count}", min = MIN_STEPS)]
    InsufficientSteps { count: usize },

    #[error("Invalid sketch plane: '{0}' (expected Top, Front or Right)")]
    InvalidPlane(String),

    #[error("Depth {depth} of step {step} is shallower than the previous step ({previous})")]
    DecreasingDepth {
        step: usize,
        depth: f64,
        previous: f64,
    },
}

impl PlanValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PlanValidationError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            PlanValidationError::InsufficientSteps { .. } => "INSUFFICIENT_STEPS",
            PlanValidationError::InvalidPlane(_) => "INVALID_PLANE",
            PlanValidationError::DecreasingDepth { .. } => "DECREASING_DEPTH",
        }
    }
}

/// Optional planner checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Reject cumulative depths that decrease once steps are ordered by radius
    pub strict_depths: bool,
}

/// One diameter of a stepped geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub radius: f64,
    /// Cumulative distance from the sketch plane
    pub depth: f64,
}

/// The remote calls for one step, in issue order
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    /// 0-based step index
    pub index: usize,
    /// Single-circle sketch
    pub sketch: FeatureDefinition,
    /// Removal referencing the sketch above through a placeholder
    pub removal: FeatureDefinition,
}

/// Validated stepped-geometry request
///
/// Steps are sorted by descending radius; equal radii keep input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteppedGeometryPlan {
    id: Uuid,
    center: DVec2,
    steps: Vec<PlanStep>,
    plane: SketchPlane,
    name_prefix: String,
}

impl SteppedGeometryPlan {
    /// Unique ID of this plan (for log correlation)
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Steps, largest radius first
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn plane(&self) -> SketchPlane {
        self.plane
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a validated plan
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Feature definitions for every step, in plan order
    ///
    /// Names are 1-based: `"{prefix} Sketch {n}"` and `"{prefix} {n}"`.
    pub fn planned_steps(&self) -> Vec<PlannedStep> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let n = index + 1;
                PlannedStep {
                    index,
                    sketch: FeatureDefinition::circle_sketch(
                        format!("{} Sketch {}", self.name_prefix, n),
                        self.plane,
                        self.center,
                        step.radius,
                    ),
                    removal: FeatureDefinition::remove_extrude(
                        format!("{} {}", self.name_prefix, n),
                        RegionRef::PrecedingSketch,
                        step.depth,
                    ),
                }
            })
            .collect()
    }
}

/// Build a plan with default (permissive) options
pub fn plan(
    center: DVec2,
    radii: &[f64],
    depths: &[f64],
    plane_name: &str,
    name_prefix: &str,
) -> Result<SteppedGeometryPlan, PlanValidationError> {
    plan_with(
        center,
        radii,
        depths,
        plane_name,
        name_prefix,
        PlanOptions::default(),
    )
}

/// Build a plan
///
/// Pairs radii and depths positionally, then stable-sorts the pairs by
/// descending radius. Physical feasibility is not checked.
pub fn plan_with(
    center: DVec2,
    radii: &[f64],
    depths: &[f64],
    plane_name: &str,
    name_prefix: &str,
    options: PlanOptions,
) -> Result<SteppedGeometryPlan, PlanValidationError> {
    if radii.len() != depths.len() {
        return Err(PlanValidationError::LengthMismatch {
            radii: radii.len(),
            depths: depths.len(),
        });
    }

    if radii.len() < MIN_STEPS {
        return Err(PlanValidationError::InsufficientSteps { count: radii.len() });
    }

    let plane: SketchPlane = plane_name
        .parse()
        .map_err(|_| PlanValidationError::InvalidPlane(plane_name.to_string()))?;

    let mut steps: Vec<PlanStep> = radii
        .iter()
        .zip(depths)
        .map(|(&radius, &depth)| PlanStep { radius, depth })
        .collect();
    steps.sort_by(|a, b| b.radius.total_cmp(&a.radius));

    if options.strict_depths {
        for (step, pair) in steps.windows(2).enumerate() {
            if pair[1].depth < pair[0].depth {
                return Err(PlanValidationError::DecreasingDepth {
                    step: step + 1,
                    depth: pair[1].depth,
                    previous: pair[0].depth,
                });
            }
        }
    }

    let plan = SteppedGeometryPlan {
        id: Uuid::new_v4(),
        center,
        steps,
        plane,
        name_prefix: name_prefix.to_string(),
    };
    tracing::debug!(
        "Planned {} steps for '{}' on {} plane",
        plan.len(),
        plan.name_prefix,
        plan.plane
    );
    Ok(plan)
}
