//! Edge matching over a catalog snapshot

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{EdgeCatalog, RemoteQueryError, TopologyQuery};
use super::classify::{EdgeDescriptor, GeometryType};
use crate::constants::DEFAULT_TOLERANCE;
use crate::service::{BodyReference, ServiceClient};

/// Malformed predicate errors, reported before any matching happens
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchValidationError {
    #[error("Tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),

    #[error("Radius predicate cannot apply to {0} edges")]
    RadiusOnStraightGeometry(GeometryType),
}

/// Errors from the fetch-and-match conveniences
#[derive(Debug, Clone, Error)]
pub enum FindEdgesError {
    #[error(transparent)]
    Query(#[from] RemoteQueryError),

    #[error(transparent)]
    Predicate(#[from] MatchValidationError),
}

/// Closed set of edge predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgePredicate {
    /// Geometry type equality
    GeometryType(GeometryType),
    /// Any edge with a sampled radius (circles, arcs, curved splines)
    Curved,
    /// Radius within `[target - tolerance, target + tolerance]`
    Radius { target: f64, tolerance: f64 },
    /// Created by the given feature
    OriginFeature(String),
    /// Logical AND of all inner predicates; empty matches everything
    All(Vec<EdgePredicate>),
}

impl EdgePredicate {
    /// Radius predicate with the default tolerance
    pub fn radius(target: f64) -> Self {
        EdgePredicate::Radius {
            target,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Radius predicate with an explicit tolerance
    pub fn radius_within(target: f64, tolerance: f64) -> Self {
        EdgePredicate::Radius { target, tolerance }
    }

    /// Conjunction with another predicate, flattening nested `All`s
    pub fn and(self, other: EdgePredicate) -> Self {
        let mut terms = match self {
            EdgePredicate::All(terms) => terms,
            single => vec![single],
        };
        match other {
            EdgePredicate::All(more) => terms.extend(more),
            single => terms.push(single),
        }
        EdgePredicate::All(terms)
    }

    /// Check the predicate is well formed
    pub fn validate(&self) -> Result<(), MatchValidationError> {
        let mut has_radius = false;
        let mut straight = None;
        self.visit(&mut |term: &EdgePredicate| match term {
            EdgePredicate::Radius { tolerance, .. } => {
                if tolerance.is_nan() || *tolerance < 0.0 {
                    return Err(MatchValidationError::NegativeTolerance(*tolerance));
                }
                has_radius = true;
                Ok(())
            }
            EdgePredicate::Curved => {
                has_radius = true;
                Ok(())
            }
            EdgePredicate::GeometryType(ty) if !ty.carries_radius() => {
                straight = Some(*ty);
                Ok(())
            }
            _ => Ok(()),
        })?;

        match straight {
            Some(ty) if has_radius => Err(MatchValidationError::RadiusOnStraightGeometry(ty)),
            _ => Ok(()),
        }
    }

    fn visit<F>(&self, f: &mut F) -> Result<(), MatchValidationError>
    where
        F: FnMut(&EdgePredicate) -> Result<(), MatchValidationError>,
    {
        match self {
            EdgePredicate::All(terms) => terms.iter().try_for_each(|t| t.visit(f)),
            term => f(term),
        }
    }

    /// Evaluate against one edge (assumes a validated predicate)
    pub fn matches(&self, edge: &EdgeDescriptor) -> bool {
        match self {
            EdgePredicate::GeometryType(ty) => edge.geometry_type == *ty,
            EdgePredicate::Curved => edge.is_curved(),
            EdgePredicate::Radius { target, tolerance } => edge
                .radius
                .is_some_and(|r| r >= target - tolerance && r <= target + tolerance),
            EdgePredicate::OriginFeature(id) => edge.origin_feature_id.as_deref() == Some(id),
            EdgePredicate::All(terms) => terms.iter().all(|t| t.matches(edge)),
        }
    }
}

/// Matching edges in catalog order
pub fn matching_edges<'a>(
    catalog: &'a EdgeCatalog,
    predicate: &EdgePredicate,
) -> Result<Vec<&'a EdgeDescriptor>, MatchValidationError> {
    predicate.validate()?;
    Ok(catalog.iter().filter(|e| predicate.matches(e)).collect())
}

/// Deterministic IDs of matching edges, in catalog order
///
/// Zero matches is an empty result, not an error.
pub fn match_edges(
    catalog: &EdgeCatalog,
    predicate: &EdgePredicate,
) -> Result<Vec<String>, MatchValidationError> {
    let ids: Vec<String> = matching_edges(catalog, predicate)?
        .into_iter()
        .map(|e| e.deterministic_id.clone())
        .collect();
    tracing::debug!("{} of {} edges match {:?}", ids.len(), catalog.len(), predicate);
    Ok(ids)
}

/// Fetch a body's edges and return those carrying a radius, optionally
/// restricted to one radius
///
/// Full circles and arcs both qualify.
pub fn find_circular_edges(
    client: &dyn ServiceClient,
    body: &BodyReference,
    radius: Option<f64>,
    tolerance: f64,
) -> Result<Vec<String>, FindEdgesError> {
    let mut predicate = EdgePredicate::Curved;
    if let Some(target) = radius {
        predicate = predicate.and(EdgePredicate::radius_within(target, tolerance));
    }
    // Validate before touching the service
    predicate.validate()?;

    let catalog = EdgeCatalog::fetch(client, body)?;
    Ok(match_edges(&catalog, &predicate)?)
}

/// Fetch a body's edges and return those created by one feature
pub fn find_edges_by_feature(
    client: &dyn ServiceClient,
    body: &BodyReference,
    feature_id: &str,
) -> Result<Vec<String>, FindEdgesError> {
    let query = TopologyQuery::new(body.clone()).with_origin_features([feature_id]);
    let catalog = EdgeCatalog::fetch_query(client, &query)?;
    Ok(match_edges(
        &catalog,
        &EdgePredicate::OriginFeature(feature_id.to_string()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RawEdgeRecord;

    fn catalog(edges: &[(&str, &str, Option<f64>, Option<&str>)]) -> EdgeCatalog {
        EdgeCatalog::from_records(edges.iter().map(|(id, kind, radius, origin)| {
            RawEdgeRecord {
                transient_id: Some(format!("t-{}", id)),
                deterministic_id: Some(id.to_string()),
                geometry_type: Some(kind.to_string()),
                radius: *radius,
                origin_feature_id: origin.map(String::from),
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_radius_tolerance_is_closed_interval() {
        let cat = catalog(&[
            ("exact", "CIRCLE", Some(0.125), None),
            ("near", "CIRCLE", Some(0.1251), None),
        ]);

        let wide = match_edges(&cat, &EdgePredicate::radius_within(0.125, 0.001)).unwrap();
        assert_eq!(wide, ["exact", "near"]);

        let tight = match_edges(&cat, &EdgePredicate::radius_within(0.125, 0.00001)).unwrap();
        assert_eq!(tight, ["exact"]);

        let zero = match_edges(&cat, &EdgePredicate::radius_within(0.125, 0.0)).unwrap();
        assert_eq!(zero, ["exact"]);
    }

    #[test]
    fn test_default_tolerance() {
        assert_eq!(
            EdgePredicate::radius(0.5),
            EdgePredicate::Radius {
                target: 0.5,
                tolerance: DEFAULT_TOLERANCE
            }
        );
    }

    #[test]
    fn test_no_matches_is_empty() {
        let cat = catalog(&[("a", "LINE", None, None), ("b", "LINE", None, None)]);
        let ids = match_edges(&cat, &EdgePredicate::GeometryType(GeometryType::Circle)).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_order_follows_catalog() {
        let cat = catalog(&[
            ("big", "CIRCLE", Some(0.5), None),
            ("line", "LINE", None, None),
            ("small", "CIRCLE", Some(0.25), None),
            ("arc", "ARC", Some(0.25), None),
        ]);
        let circles = match_edges(&cat, &EdgePredicate::GeometryType(GeometryType::Circle)).unwrap();
        assert_eq!(circles, ["big", "small"]);

        let quarter = match_edges(&cat, &EdgePredicate::radius(0.25)).unwrap();
        assert_eq!(quarter, ["small", "arc"]);
    }

    #[test]
    fn test_conjunction() {
        let cat = catalog(&[
            ("a", "CIRCLE", Some(0.25), Some("F1")),
            ("b", "CIRCLE", Some(0.25), Some("F2")),
            ("c", "ARC", Some(0.25), Some("F1")),
        ]);
        let predicate = EdgePredicate::GeometryType(GeometryType::Circle)
            .and(EdgePredicate::radius(0.25))
            .and(EdgePredicate::OriginFeature("F1".into()));
        assert!(matches!(&predicate, EdgePredicate::All(terms) if terms.len() == 3));
        assert_eq!(match_edges(&cat, &predicate).unwrap(), ["a"]);

        assert_eq!(
            match_edges(&cat, &EdgePredicate::All(vec![])).unwrap(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_validation_errors() {
        let cat = catalog(&[("a", "CIRCLE", Some(0.25), None)]);

        assert_eq!(
            match_edges(&cat, &EdgePredicate::radius_within(0.25, -0.1)),
            Err(MatchValidationError::NegativeTolerance(-0.1))
        );
        assert!(matches!(
            match_edges(&cat, &EdgePredicate::radius_within(0.25, f64::NAN)),
            Err(MatchValidationError::NegativeTolerance(_))
        ));

        let line_radius =
            EdgePredicate::GeometryType(GeometryType::Line).and(EdgePredicate::radius(0.25));
        assert_eq!(
            match_edges(&cat, &line_radius),
            Err(MatchValidationError::RadiusOnStraightGeometry(GeometryType::Line))
        );
    }

    #[test]
    fn test_curved_includes_arcs() {
        let cat = catalog(&[
            ("circle", "CIRCLE", Some(0.125), None),
            ("line", "LINE", None, None),
            ("arc", "ARC", Some(0.125), None),
            ("flat", "SPLINE", None, None),
        ]);
        assert_eq!(
            match_edges(&cat, &EdgePredicate::Curved).unwrap(),
            ["circle", "arc"]
        );

        let curved_line =
            EdgePredicate::Curved.and(EdgePredicate::GeometryType(GeometryType::Line));
        assert_eq!(
            match_edges(&cat, &curved_line),
            Err(MatchValidationError::RadiusOnStraightGeometry(GeometryType::Line))
        );
    }

    #[test]
    fn test_radius_ignores_edges_without_radius() {
        let cat = catalog(&[("a", "OTHER", None, None)]);
        assert!(match_edges(&cat, &EdgePredicate::radius(0.0)).unwrap().is_empty());
    }
}
