//! Edge catalog: one immutable snapshot of a body's edges

use thiserror::Error;

use super::classify::{Classified, EdgeDescriptor};
use crate::constants::EDGE_SAMPLE_PARAMETER;
use crate::service::{BodyReference, ServiceClient, ServiceError};

/// Errors raised while fetching a catalog
#[derive(Debug, Clone, Error)]
pub enum RemoteQueryError {
    #[error("Topology query failed: {0}")]
    Remote(#[from] ServiceError),

    #[error("Topology record {index} has neither a transient nor a deterministic identifier")]
    MalformedRecord { index: usize },
}

/// Read-only request for every edge of a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyQuery {
    /// Body to enumerate
    pub body: BodyReference,
    /// Features whose created edges should be tagged with their origin
    pub origin_features: Vec<String>,
}

impl TopologyQuery {
    /// Query every edge of a body, without origin tagging
    pub fn new(body: BodyReference) -> Self {
        Self {
            body,
            origin_features: Vec::new(),
        }
    }

    /// Tag edges created by the given features
    pub fn with_origin_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin_features
            .extend(features.into_iter().map(Into::into));
        self
    }

    /// Render the query script sent to the service
    ///
    /// Each edge is classified and its curvature sampled at the same curve
    /// parameter. Curvature evaluation is wrapped per edge so that an
    /// undefined curvature only drops that edge's radius.
    pub fn script(&self) -> String {
        let edge_query = match &self.body.part_id {
            Some(part) => format!(
                "qOwnedByBody(qTransient(\"{}\"), EntityType.EDGE)",
                escape(part)
            ),
            None => "qEverything(EntityType.EDGE)".to_string(),
        };
        let origins = self
            .origin_features
            .iter()
            .map(|id| format!("\"{}\"", escape(id)))
            .collect::<Vec<_>>()
            .join(", ");
        let t = EDGE_SAMPLE_PARAMETER;

        format!(
            r#"function(context is Context, queries) {{
    var origins = {{}};
    for (var fid in [{origins}]) {{
        for (var created in evaluateQuery(context, qCreatedBy(makeId(fid), EntityType.EDGE))) {{
            origins[transientQueriesToStrings(created)] = fid;
        }}
    }}
    var edges = [];
    for (var edge in evaluateQuery(context, {edge_query})) {{
        const tid = transientQueriesToStrings(edge);
        var info = {{ "transientId" : tid }};
        const did = try silent(toString(qDeterministicIdQuery(edge)));
        if (did != undefined) {{
            info.deterministicId = did;
        }}
        const tangent = try silent(evEdgeTangentLine(context, {{ "edge" : edge, "parameter" : {t} }}));
        const curve = try silent(evCurveDefinition(context, {{ "edge" : edge }}));
        var kind = "OTHER";
        if (curve is Line) {{
            kind = "LINE";
        }} else if (curve is Circle) {{
            const ends = evEdgeTangentLines(context, {{ "edge" : edge, "parameters" : [0, 1] }});
            kind = tolerantEquals(ends[0].origin, ends[1].origin) ? "CIRCLE" : "ARC";
        }} else if (curve is BSplineCurve) {{
            kind = "SPLINE";
        }}
        info.geometryType = kind;
        if (kind != "LINE" && tangent != undefined) {{
            const curvature = try silent(evEdgeCurvature(context, {{ "edge" : edge, "parameter" : {t} }}));
            if (curvature != undefined && abs(curvature.curvature * meter) > 1e-12) {{
                info.radius = 1 / (curvature.curvature * meter);
            }}
        }}
        if (origins[tid] != undefined) {{
            info.originFeatureId = origins[tid];
        }}
        edges = append(edges, info);
    }}
    return edges;
}}"#
        )
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Immutable, ordered snapshot of a body's edges
///
/// Order is the insertion order of the remote query. A new fetch always
/// produces a new catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeCatalog {
    edges: Vec<EdgeDescriptor>,
    skipped: usize,
}

impl EdgeCatalog {
    /// Fetch every edge of a body with one remote evaluation
    pub fn fetch(
        client: &dyn ServiceClient,
        body: &BodyReference,
    ) -> Result<Self, RemoteQueryError> {
        Self::fetch_query(client, &TopologyQuery::new(body.clone()))
    }

    /// Fetch using a prepared query (e.g. with origin tagging)
    pub fn fetch_query(
        client: &dyn ServiceClient,
        query: &TopologyQuery,
    ) -> Result<Self, RemoteQueryError> {
        tracing::debug!("Evaluating topology query on {} via {}", query.body, client.name());

        let records = client.evaluate_topology_query(&query.body, &query.script())?;
        let catalog = Self::from_records(records)?;

        tracing::info!(
            "Fetched {} edges from {} ({} skipped)",
            catalog.len(),
            query.body,
            catalog.skipped
        );
        Ok(catalog)
    }

    /// Build a catalog from already-fetched records
    pub fn from_records<I>(records: I) -> Result<Self, RemoteQueryError>
    where
        I: IntoIterator<Item = crate::service::RawEdgeRecord>,
    {
        let mut edges = Vec::new();
        let mut skipped = 0;

        for (index, record) in records.into_iter().enumerate() {
            match EdgeDescriptor::from_record(record) {
                Classified::Edge(edge) => edges.push(edge),
                Classified::Skipped { transient_id } => {
                    tracing::warn!(
                        "Edge {} has no deterministic identifier, skipping",
                        transient_id
                    );
                    skipped += 1;
                }
                Classified::Malformed => {
                    return Err(RemoteQueryError::MalformedRecord { index });
                }
            }
        }

        Ok(Self { edges, skipped })
    }

    /// All edges, in query order
    pub fn edges(&self) -> &[EdgeDescriptor] {
        &self.edges
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Records dropped because they could not be referenced
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Look up an edge by deterministic ID
    pub fn get(&self, deterministic_id: &str) -> Option<&EdgeDescriptor> {
        self.edges
            .iter()
            .find(|e| e.deterministic_id == deterministic_id)
    }

    /// Iterate over edges
    pub fn iter(&self) -> std::slice::Iter<'_, EdgeDescriptor> {
        self.edges.iter()
    }
}

impl<'a> IntoIterator for &'a EdgeCatalog {
    type Item = &'a EdgeDescriptor;
    type IntoIter = std::slice::Iter<'a, EdgeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RawEdgeRecord;
    use crate::topology::GeometryType;

    fn raw(tid: &str, did: &str, kind: &str, radius: Option<f64>) -> RawEdgeRecord {
        RawEdgeRecord {
            transient_id: Some(tid.into()),
            deterministic_id: Some(did.into()),
            geometry_type: Some(kind.into()),
            radius,
            origin_feature_id: None,
        }
    }

    #[test]
    fn test_script_shape() {
        let body = BodyReference::new("d", "w", "e");
        let script = TopologyQuery::new(body).script();
        assert!(script.contains("qEverything(EntityType.EDGE)"));
        assert!(script.contains("\"parameter\" : 0.5"));
        assert!(script.contains("try silent(evEdgeCurvature"));
    }

    #[test]
    fn test_script_part_and_origins() {
        let body = BodyReference::new("d", "w", "e").with_part("JHD");
        let script = TopologyQuery::new(body)
            .with_origin_features(["FcB", "Fq\"x"])
            .script();
        assert!(script.contains("qOwnedByBody(qTransient(\"JHD\"), EntityType.EDGE)"));
        assert!(script.contains("[\"FcB\", \"Fq\\\"x\"]"));
    }

    #[test]
    fn test_from_records_preserves_order() {
        let catalog = EdgeCatalog::from_records(vec![
            raw("t1", "d1", "LINE", None),
            raw("t2", "d2", "CIRCLE", Some(0.25)),
            raw("t3", "d3", "ARC", Some(0.1)),
        ])
        .unwrap();

        let ids: Vec<_> = catalog.iter().map(|e| e.deterministic_id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2", "d3"]);
        assert_eq!(catalog.get("d2").unwrap().geometry_type, GeometryType::Circle);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_malformed_record_fails() {
        let result = EdgeCatalog::from_records(vec![
            raw("t1", "d1", "LINE", None),
            RawEdgeRecord::default(),
        ]);
        assert!(matches!(
            result,
            Err(RemoteQueryError::MalformedRecord { index: 1 })
        ));
    }

    #[test]
    fn test_transient_only_records_are_skipped() {
        let catalog = EdgeCatalog::from_records(vec![
            RawEdgeRecord {
                transient_id: Some("t0".into()),
                ..Default::default()
            },
            raw("t1", "d1", "CIRCLE", Some(0.5)),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped(), 1);
    }
}
