//! Remote Modeling Core
//!
//! This crate provides:
//! - An explicit service capability trait for a remote parametric modeler
//! - Typed feature definitions (sketch, extrude, fillet) with deferred references
//! - Edge topology discovery, classification and tolerance-based matching
//! - Stepped (counterbore) planning and strictly sequential execution

pub mod constants;
pub mod feature;
pub mod service;
pub mod stepped;
pub mod topology;

// Re-exports for convenience
pub use feature::{
    ExtrudeOperation, FeatureDefinition, FeatureError, FeatureResult, RegionRef, SketchCircle,
    SketchPlane,
};
pub use service::{
    BodyReference, NullClient, RawEdgeRecord, ServiceClient, ServiceError, ServiceResult,
};
pub use stepped::{
    CancelToken, ExecutionResult, PlanOptions, PlanStep, PlanValidationError, PlannedStep,
    RemoteMutationError, StepPhase, SteppedGeometryPlan, StopReason, execute,
    execute_with_cancel, plan, plan_with,
};
pub use topology::{
    EdgeCatalog, EdgeDescriptor, EdgePredicate, FindEdgesError, GeometryType, MatchValidationError,
    RemoteQueryError, TopologyQuery, find_circular_edges, find_edges_by_feature, match_edges,
    matching_edges,
};
