//! In-memory modeling service for integration tests

#![allow(dead_code)]

use mk_core::{
    BodyReference, CancelToken, FeatureDefinition, RawEdgeRecord, ServiceClient, ServiceError,
    ServiceResult,
};
use parking_lot::Mutex;

/// A call received by the fake modeler
#[derive(Debug, Clone)]
pub enum Call {
    Query { body: BodyReference, script: String },
    Create(FeatureDefinition),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    created: usize,
    edges: Vec<RawEdgeRecord>,
    fail_on_create: Option<usize>,
    fail_query: bool,
    cancel_after: Option<(usize, CancelToken)>,
    filleted: Vec<Vec<RawEdgeRecord>>,
}

/// Records every call; create calls return `F1`, `F2`, ...
#[derive(Default)]
pub struct FakeModeler {
    state: Mutex<State>,
}

impl FakeModeler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edges(edges: Vec<RawEdgeRecord>) -> Self {
        let modeler = Self::default();
        modeler.state.lock().edges = edges;
        modeler
    }

    /// Make the n-th create call (0-based) fail with a service status
    pub fn fail_on_create(self, n: usize) -> Self {
        self.state.lock().fail_on_create = Some(n);
        self
    }

    /// Cancel `token` once `n` create calls have returned
    pub fn cancel_after_creates(self, n: usize, token: CancelToken) -> Self {
        self.state.lock().cancel_after = Some((n, token));
        self
    }

    pub fn fail_queries(self) -> Self {
        self.state.lock().fail_query = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn created_definitions(&self) -> Vec<FeatureDefinition> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(def) => Some(def),
                Call::Query { .. } => None,
            })
            .collect()
    }

    /// Edges each fillet call resolved to
    pub fn filleted(&self) -> Vec<Vec<RawEdgeRecord>> {
        self.state.lock().filleted.clone()
    }

    /// Simulate a regeneration that renumbers deterministic identifiers
    pub fn regenerate(&self) {
        for edge in &mut self.state.lock().edges {
            if let Some(id) = &mut edge.deterministic_id {
                id.push_str("-r");
            }
        }
    }
}

impl ServiceClient for FakeModeler {
    fn name(&self) -> &str {
        "fake"
    }

    fn evaluate_topology_query(
        &self,
        body: &BodyReference,
        script: &str,
    ) -> ServiceResult<Vec<RawEdgeRecord>> {
        let mut state = self.state.lock();
        state.calls.push(Call::Query {
            body: body.clone(),
            script: script.to_string(),
        });
        if state.fail_query {
            return Err(ServiceError::Transport("connection reset".into()));
        }
        Ok(state.edges.clone())
    }

    fn create_feature(
        &self,
        _body: &BodyReference,
        definition: &FeatureDefinition,
    ) -> ServiceResult<String> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create(definition.clone()));

        let n = state.created;
        state.created += 1;
        if state.fail_on_create == Some(n) {
            return Err(ServiceError::Status {
                code: 400,
                body: "regeneration failed".into(),
            });
        }
        if definition.has_unresolved_reference() {
            return Err(ServiceError::UnresolvedReference(definition.name().into()));
        }

        if let FeatureDefinition::Fillet { edges, .. } = definition {
            let mut resolved = Vec::new();
            for id in edges {
                let edge = state
                    .edges
                    .iter()
                    .find(|e| e.deterministic_id.as_deref() == Some(id.as_str()))
                    .cloned()
                    .ok_or_else(|| ServiceError::Rejected {
                        feature: definition.name().into(),
                        status: format!("unknown edge {}", id),
                    })?;
                resolved.push(edge);
            }
            state.filleted.push(resolved);
        }

        if let Some((after, token)) = &state.cancel_after
            && *after == state.created
        {
            token.cancel();
        }

        Ok(format!("F{}", n + 1))
    }
}

pub fn body() -> BodyReference {
    BodyReference::new("doc", "ws", "elem")
}

pub fn edge(id: &str, kind: &str, radius: Option<f64>) -> RawEdgeRecord {
    RawEdgeRecord {
        transient_id: Some(format!("T{}", id)),
        deterministic_id: Some(id.to_string()),
        geometry_type: Some(kind.to_string()),
        radius,
        origin_feature_id: None,
    }
}
