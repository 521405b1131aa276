//! Blocking HTTP client for the Onshape REST API

use std::time::Duration;

use base64::Engine;
use mk_core::{
    BodyReference, FeatureDefinition, RawEdgeRecord, ServiceClient, ServiceError, ServiceResult,
};
use serde_json::{Value, json};

use crate::config::OnshapeConfig;
use crate::decode::decode_edge_records;
use crate::wire::encode_feature;

/// API version prefix
const API_PREFIX: &str = "/api/v6";

/// Maximum number of characters of an error body kept in errors
const ERROR_BODY_LIMIT: usize = 500;

/// [`ServiceClient`] over the Onshape REST API
pub struct OnshapeClient {
    agent: ureq::Agent,
    config: OnshapeConfig,
    authorization: Option<String>,
}

impl std::fmt::Debug for OnshapeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnshapeClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.authorization.is_some())
            .finish()
    }
}

impl OnshapeClient {
    /// Create a client; the timeout from `config` applies to every request
    pub fn new(config: OnshapeConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        let authorization = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => {
                let token = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", access, secret));
                Some(format!("Basic {}", token))
            }
            _ => {
                tracing::warn!("No Onshape API keys configured; requests are unauthenticated");
                None
            }
        };

        Self {
            agent,
            config,
            authorization,
        }
    }

    /// Client configured from `ONSHAPE_*` environment variables
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        Ok(Self::new(OnshapeConfig::from_env()?))
    }

    pub fn config(&self) -> &OnshapeConfig {
        &self.config
    }

    /// URL of a part studio endpoint
    pub fn part_studio_url(&self, body: &BodyReference, endpoint: &str) -> String {
        format!(
            "{}{}/partstudios/d/{}/w/{}/e/{}/{}",
            self.config.base_url,
            API_PREFIX,
            body.document_id,
            body.workspace_id,
            body.element_id,
            endpoint
        )
    }

    fn post_json(&self, url: &str, payload: &Value) -> ServiceResult<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self
            .agent
            .post(url)
            .header("Accept", "application/json;charset=UTF-8; qs=0.09")
            .header(
                "User-Agent",
                concat!("mk/", env!("CARGO_PKG_VERSION")),
            );
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth.as_str());
        }

        let response = request
            .send_json(payload)
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        let mut body = response.into_body();
        if !status.is_success() {
            let text = body.read_to_string().unwrap_or_default();
            let text: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            tracing::warn!("API error {}: {}", status.as_u16(), text);
            return Err(ServiceError::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        body.read_json::<Value>()
            .map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }
}

/// Extract the created feature ID from an add-feature response
///
/// A response whose feature state reports an error is a rejection even
/// though the call itself succeeded.
pub fn feature_id_from_response(name: &str, response: &Value) -> ServiceResult<String> {
    if let Some(status) = response["featureState"]["featureStatus"].as_str()
        && status.eq_ignore_ascii_case("ERROR")
    {
        return Err(ServiceError::Rejected {
            feature: name.to_string(),
            status: status.to_string(),
        });
    }

    response["feature"]["featureId"]
        .as_str()
        .or_else(|| response["featureId"].as_str())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::MalformedResponse(format!("no featureId for '{}'", name)))
}

impl ServiceClient for OnshapeClient {
    fn name(&self) -> &str {
        "onshape"
    }

    fn evaluate_topology_query(
        &self,
        body: &BodyReference,
        script: &str,
    ) -> ServiceResult<Vec<RawEdgeRecord>> {
        let url = self.part_studio_url(body, "featurescript");
        let response = self.post_json(&url, &json!({ "script": script, "queries": [] }))?;
        decode_edge_records(&response, self.config.units)
    }

    fn create_feature(
        &self,
        body: &BodyReference,
        definition: &FeatureDefinition,
    ) -> ServiceResult<String> {
        let payload = encode_feature(definition, self.config.units)?;
        let url = self.part_studio_url(body, "features");
        let response = self.post_json(&url, &payload)?;
        let id = feature_id_from_response(definition.name(), &response)?;
        tracing::debug!("Created {} '{}' as {}", definition.type_name(), definition.name(), id);
        Ok(id)
    }
}
