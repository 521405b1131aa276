//! Global constants for mk-core

/// Default absolute tolerance when matching a measured radius against a target
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Curve parameter at which edge geometry and curvature are sampled
pub const EDGE_SAMPLE_PARAMETER: f64 = 0.5;

/// Minimum number of (radius, depth) pairs for a stepped geometry
pub const MIN_STEPS: usize = 2;
