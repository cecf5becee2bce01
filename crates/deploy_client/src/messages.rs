//! Wire types for the deploy endpoints. Client → server JSON request frame,
//! server → client `{"command": ...}` records.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Base URL used when the config does not name one.
pub const DEFAULT_BASE_URL: &str = "ws://localhost:8000";

/// Base path sent with a redeploy when none is given.
pub const DEFAULT_BASE_PATH: &str = ".";

/// Which remote job a session drives. Each flow has its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Deploy,
    Redeploy,
}

impl Flow {
    /// Endpoint path relative to the server base URL.
    pub fn path(self) -> &'static str {
        match self {
            Flow::Deploy => "deploy",
            Flow::Redeploy => "redeploy",
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Join `base_url` and the flow's endpoint path.
pub fn endpoint_url(base_url: &str, flow: Flow) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), flow.path())
}

/// Fields shared by both flows. Serialized with the server's field names.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DeployPayload {
    #[serde(rename = "github_repo")]
    pub repository_url: String,
    #[serde(rename = "hostname")]
    pub host_address: String,
    pub username: String,
    #[serde(rename = "key")]
    pub private_key: String,
    #[serde(rename = "env_file")]
    pub env_file_contents: String,
}

// Key material and env files stay out of logs.
impl std::fmt::Debug for DeployPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployPayload")
            .field("repository_url", &self.repository_url)
            .field("host_address", &self.host_address)
            .field("username", &self.username)
            .field("private_key", &"<redacted>")
            .field("env_file_contents", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct RedeployFrame<'a> {
    #[serde(flatten)]
    payload: &'a DeployPayload,
    base_path: &'a str,
}

/// The single request frame of a session. Built once from user input and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployRequest {
    Deploy(DeployPayload),
    Redeploy {
        payload: DeployPayload,
        base_path: String,
    },
}

impl DeployRequest {
    /// Build a fresh-deploy request.
    pub fn deploy(payload: DeployPayload) -> Result<Self, ClientError> {
        validate(&payload)?;
        Ok(DeployRequest::Deploy(payload))
    }

    /// Build a redeploy request. A missing or blank `base_path` becomes `"."`.
    pub fn redeploy(payload: DeployPayload, base_path: Option<String>) -> Result<Self, ClientError> {
        validate(&payload)?;
        let base_path = base_path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
        Ok(DeployRequest::Redeploy { payload, base_path })
    }

    pub fn flow(&self) -> Flow {
        match self {
            DeployRequest::Deploy(_) => Flow::Deploy,
            DeployRequest::Redeploy { .. } => Flow::Redeploy,
        }
    }

    pub fn payload(&self) -> &DeployPayload {
        match self {
            DeployRequest::Deploy(payload) | DeployRequest::Redeploy { payload, .. } => payload,
        }
    }

    /// Serialize to the JSON text frame sent on connect.
    pub fn to_frame(&self) -> Result<String, ClientError> {
        let json = match self {
            DeployRequest::Deploy(payload) => serde_json::to_string(payload)?,
            DeployRequest::Redeploy { payload, base_path } => {
                serde_json::to_string(&RedeployFrame { payload, base_path })?
            }
        };
        Ok(json)
    }
}

fn validate(payload: &DeployPayload) -> Result<(), ClientError> {
    if payload.repository_url.trim().is_empty() {
        return Err(ClientError::InvalidRequest(
            "repository URL must not be empty".into(),
        ));
    }
    Ok(())
}

/// Server → client: a command echoed back by the remote job.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    pub command: String,
}
