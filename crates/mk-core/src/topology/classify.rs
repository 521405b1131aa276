//! Geometry classification of raw edge records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::service::RawEdgeRecord;

/// Geometric type of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeometryType {
    Line,
    Circle,
    Arc,
    Spline,
    Other,
}

impl GeometryType {
    /// Whether edges of this type can report a radius
    pub fn carries_radius(&self) -> bool {
        !matches!(self, GeometryType::Line)
    }

    /// Upper-case label
    pub fn label(&self) -> &'static str {
        match self {
            GeometryType::Line => "LINE",
            GeometryType::Circle => "CIRCLE",
            GeometryType::Arc => "ARC",
            GeometryType::Spline => "SPLINE",
            GeometryType::Other => "OTHER",
        }
    }

    /// Classify a service label; unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LINE" => GeometryType::Line,
            "CIRCLE" => GeometryType::Circle,
            "ARC" => GeometryType::Arc,
            "SPLINE" | "BSPLINE" => GeometryType::Spline,
            _ => GeometryType::Other,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GeometryType {
    type Err = String;

    /// Strict parse for user input; unlike [`GeometryType::from_label`]
    /// an unrecognized name is an error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match GeometryType::from_label(s) {
            GeometryType::Other if !s.trim().eq_ignore_ascii_case("other") => {
                Err(format!("unknown geometry type '{}'", s))
            }
            ty => Ok(ty),
        }
    }
}

/// A classified edge of one catalog snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    /// Valid only within the snapshot that produced it
    pub transient_id: Option<String>,
    /// Stable across regeneration; always non-empty
    pub deterministic_id: String,
    pub geometry_type: GeometryType,
    /// Present only for curved geometry
    pub radius: Option<f64>,
    /// Feature whose creation produced this edge, when known
    pub origin_feature_id: Option<String>,
}

/// Outcome of classifying one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Usable edge
    Edge(EdgeDescriptor),
    /// Only a transient ID was resolved; the edge cannot be referenced later
    Skipped { transient_id: String },
    /// Neither identifier present
    Malformed,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl EdgeDescriptor {
    /// Turn a raw record into a typed edge description
    pub fn from_record(record: RawEdgeRecord) -> Classified {
        let transient_id = non_empty(record.transient_id);
        let deterministic_id = match non_empty(record.deterministic_id) {
            Some(id) => id,
            None => {
                return match transient_id {
                    Some(transient_id) => Classified::Skipped { transient_id },
                    None => Classified::Malformed,
                };
            }
        };

        let geometry_type = record
            .geometry_type
            .as_deref()
            .map(GeometryType::from_label)
            .unwrap_or(GeometryType::Other);

        // Unusable curvature samples are dropped, never fatal
        let radius = record
            .radius
            .filter(|r| geometry_type.carries_radius() && r.is_finite() && *r >= 0.0);

        Classified::Edge(EdgeDescriptor {
            transient_id,
            deterministic_id,
            geometry_type,
            radius,
            origin_feature_id: non_empty(record.origin_feature_id),
        })
    }

    /// Whether this edge has a sampled radius
    pub fn is_curved(&self) -> bool {
        self.radius.is_some()
    }
}
