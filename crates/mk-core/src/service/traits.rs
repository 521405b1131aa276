//! Service trait definitions
//!
//! These types define the interface every Remote Modeling Service binding
//! must implement.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::FeatureDefinition;

/// Addresses the part studio (and optionally a single part) a call targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyReference {
    /// Document ID
    pub document_id: String,
    /// Workspace ID
    pub workspace_id: String,
    /// Part studio element ID
    pub element_id: String,
    /// Restrict topology queries to one part of the studio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
}

impl BodyReference {
    /// Create a reference to a whole part studio
    pub fn new(
        document_id: impl Into<String>,
        workspace_id: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            workspace_id: workspace_id.into(),
            element_id: element_id.into(),
            part_id: None,
        }
    }

    /// Restrict this reference to a single part
    pub fn with_part(mut self, part_id: impl Into<String>) -> Self {
        self.part_id = Some(part_id.into());
        self
    }
}

impl fmt::Display for BodyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "d/{}/w/{}/e/{}",
            self.document_id, self.workspace_id, self.element_id
        )?;
        if let Some(part) = &self.part_id {
            write!(f, "#{}", part)?;
        }
        Ok(())
    }
}

/// One edge as returned by a topology evaluation, before classification
///
/// Every field is optional: the service reports what it could resolve and
/// the classifier decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdgeRecord {
    #[serde(default)]
    pub transient_id: Option<String>,
    #[serde(default)]
    pub deterministic_id: Option<String>,
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub origin_feature_id: Option<String>,
}

/// Error type for Remote Modeling Service calls
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Service returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Feature '{feature}' was rejected by the service: {status}")]
    Rejected { feature: String, status: String },

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Query script failed: {0}")]
    ScriptFailed(String),

    #[error("Definition '{0}' still references an unresolved sketch")]
    UnresolvedReference(String),

    #[error("Service not available: {0}")]
    Unavailable(String),
}

/// Result type for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The Remote Modeling Service capability
///
/// Implementations wrap a concrete transport. Calls are blocking; timeout
/// policy belongs to the implementation, not to callers of this trait.
pub trait ServiceClient: Send + Sync {
    /// Get the name of this binding
    fn name(&self) -> &str;

    /// Evaluate a read-only topology query script against a body
    ///
    /// Must not mutate model state. Returns one record per edge.
    ///
    /// # Arguments
    /// * `body` - The part studio to evaluate in
    /// * `script` - The opaque query script
    fn evaluate_topology_query(
        &self,
        body: &BodyReference,
        script: &str,
    ) -> ServiceResult<Vec<RawEdgeRecord>>;

    /// Create a single feature and return its identifier
    ///
    /// Not idempotent: a call that may have succeeded must never be reissued
    /// by the caller without first confirming that it failed.
    ///
    /// # Arguments
    /// * `body` - The part studio to add the feature to
    /// * `definition` - A fully resolved feature definition
    fn create_feature(
        &self,
        body: &BodyReference,
        definition: &FeatureDefinition,
    ) -> ServiceResult<String>;
}

/// A null client that always returns errors (used when no service is configured)
#[derive(Debug, Default)]
pub struct NullClient;

impl ServiceClient for NullClient {
    fn name(&self) -> &str {
        "null"
    }

    fn evaluate_topology_query(
        &self,
        _body: &BodyReference,
        _script: &str,
    ) -> ServiceResult<Vec<RawEdgeRecord>> {
        Err(ServiceError::Unavailable(
            "No modeling service configured".into(),
        ))
    }

    fn create_feature(
        &self,
        _body: &BodyReference,
        _definition: &FeatureDefinition,
    ) -> ServiceResult<String> {
        Err(ServiceError::Unavailable(
            "No modeling service configured".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_reference_display() {
        let body = BodyReference::new("d1", "w1", "e1");
        assert_eq!(body.to_string(), "d/d1/w/w1/e/e1");

        let part = body.with_part("JHD");
        assert_eq!(part.to_string(), "d/d1/w/w1/e/e1#JHD");
    }

    #[test]
    fn test_raw_record_partial_json() {
        let record: RawEdgeRecord =
            serde_json::from_str(r#"{"transientId": "JHW", "geometryType": "LINE"}"#).unwrap();
        assert_eq!(record.transient_id.as_deref(), Some("JHW"));
        assert!(record.deterministic_id.is_none());
        assert!(record.radius.is_none());
    }

    #[test]
    fn test_null_client_unavailable() {
        let client = NullClient;
        let body = BodyReference::new("d", "w", "e");
        let result = client.evaluate_topology_query(&body, "");
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }
}
