//! Feature Definitions
//!
//! Typed payloads for the mutating calls the core issues: sketches,
//! extrudes and fillets. Encoding them for a concrete service is the
//! binding's job.

use std::fmt;
use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feature-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Invalid sketch plane: '{0}' (expected Top, Front or Right)")]
    InvalidPlane(String),

    #[error("Invalid {name}: {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("At least one edge must be selected")]
    EmptySelection,
}

/// Result type for feature construction
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Standard sketch plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SketchPlane {
    #[default]
    Top,
    Front,
    Right,
}

impl SketchPlane {
    /// All recognized planes
    pub const ALL: [SketchPlane; 3] = [SketchPlane::Top, SketchPlane::Front, SketchPlane::Right];

    /// Display name as the modeler labels it
    pub fn label(&self) -> &'static str {
        match self {
            SketchPlane::Top => "Top",
            SketchPlane::Front => "Front",
            SketchPlane::Right => "Right",
        }
    }
}

impl fmt::Display for SketchPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SketchPlane {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SketchPlane::ALL
            .into_iter()
            .find(|plane| plane.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FeatureError::InvalidPlane(s.to_string()))
    }
}

/// Extrude operation with respect to existing bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrudeOperation {
    /// Create new body
    #[default]
    New,
    /// Add to existing body
    Add,
    /// Remove material from existing body
    Remove,
    /// Keep only intersection
    Intersect,
}

impl ExtrudeOperation {
    /// Service enum label
    pub fn label(&self) -> &'static str {
        match self {
            ExtrudeOperation::New => "NEW",
            ExtrudeOperation::Add => "ADD",
            ExtrudeOperation::Remove => "REMOVE",
            ExtrudeOperation::Intersect => "INTERSECT",
        }
    }
}

/// A full circle in sketch coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchCircle {
    pub center: DVec2,
    pub radius: f64,
}

/// Which sketch's regions an extrude consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionRef {
    /// A sketch that already exists remotely
    Sketch(String),
    /// The sketch created by the immediately preceding call of a plan;
    /// must be resolved before the definition is sent
    PrecedingSketch,
}

/// A single feature creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureDefinition {
    /// Sketch containing circles
    Sketch {
        /// Name of the feature
        name: String,
        /// Plane the sketch lies on
        plane: SketchPlane,
        /// Circles to draw
        circles: Vec<SketchCircle>,
    },

    /// Extrude the regions of a sketch
    Extrude {
        /// Name of the feature
        name: String,
        /// Source sketch
        region: RegionRef,
        /// Extrusion depth
        depth: f64,
        /// Body operation
        operation: ExtrudeOperation,
        /// Flip the extrusion direction
        #[serde(default)]
        opposite_direction: bool,
    },

    /// Fillet edges
    Fillet {
        /// Name of the feature
        name: String,
        /// Deterministic IDs of the edges to round
        edges: Vec<String>,
        /// Fillet radius
        radius: f64,
    },
}

impl FeatureDefinition {
    /// Create a sketch holding a single circle
    pub fn circle_sketch(
        name: impl Into<String>,
        plane: SketchPlane,
        center: DVec2,
        radius: f64,
    ) -> Self {
        FeatureDefinition::Sketch {
            name: name.into(),
            plane,
            circles: vec![SketchCircle { center, radius }],
        }
    }

    /// Create a material-removal extrude
    pub fn remove_extrude(name: impl Into<String>, region: RegionRef, depth: f64) -> Self {
        FeatureDefinition::Extrude {
            name: name.into(),
            region,
            depth,
            operation: ExtrudeOperation::Remove,
            opposite_direction: false,
        }
    }

    /// Create a fillet on the given deterministic edge IDs
    pub fn fillet(
        name: impl Into<String>,
        edges: Vec<String>,
        radius: f64,
    ) -> FeatureResult<Self> {
        if edges.is_empty() {
            return Err(FeatureError::EmptySelection);
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(FeatureError::InvalidDimension {
                name: "fillet radius",
                value: radius,
            });
        }
        Ok(FeatureDefinition::Fillet {
            name: name.into(),
            edges,
            radius,
        })
    }

    /// Get the name of this feature
    pub fn name(&self) -> &str {
        match self {
            FeatureDefinition::Sketch { name, .. } => name,
            FeatureDefinition::Extrude { name, .. } => name,
            FeatureDefinition::Fillet { name, .. } => name,
        }
    }

    /// Get the type name of this feature
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureDefinition::Sketch { .. } => "Sketch",
            FeatureDefinition::Extrude { .. } => "Extrude",
            FeatureDefinition::Fillet { .. } => "Fillet",
        }
    }

    /// Whether a preceding-sketch placeholder is still present
    pub fn has_unresolved_reference(&self) -> bool {
        matches!(
            self,
            FeatureDefinition::Extrude {
                region: RegionRef::PrecedingSketch,
                ..
            }
        )
    }

    /// Substitute the preceding-sketch placeholder with a concrete sketch ID
    ///
    /// Returns `true` if a placeholder was replaced.
    pub fn resolve_preceding_sketch(&mut self, sketch_id: &str) -> bool {
        match self {
            FeatureDefinition::Extrude { region, .. } if *region == RegionRef::PrecedingSketch => {
                *region = RegionRef::Sketch(sketch_id.to_string());
                true
            }
            _ => false,
        }
    }
}
