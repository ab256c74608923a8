use serde::{Deserialize, Serialize};
use crate::models::domain::MatchResult;

/// Envelope returned by every engine adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub engine: String,
    pub count: usize,
    pub results: Vec<MatchResult>,
}

impl MatchResponse {
    pub fn new(engine: &str, results: Vec<MatchResult>) -> Self {
        Self {
            engine: engine.to_string(),
            count: results.len(),
            results,
        }
    }
}

/// Readiness of a single engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub name: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "rosterSize")]
    pub roster_size: usize,
    pub engines: Vec<EngineStatus>,
}

/// One entry of the engine listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub description: String,
}

/// Response for the engine listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginesResponse {
    #[serde(rename = "default")]
    pub default_engine: String,
    pub engines: Vec<EngineInfo>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
