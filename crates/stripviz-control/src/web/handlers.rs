//! HTTP request and response bodies

use serde::{Deserialize, Serialize};
use stripviz_core::ModeInfo;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// System status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub channel_count: usize,
    pub mode: ModeInfo,
}

/// Mode change request
#[derive(Debug, Serialize, Deserialize)]
pub struct SetModeRequest {
    pub id: String,
}

impl SetModeRequest {
    /// Trimmed id, or an error message for an empty one
    pub fn validate(&self) -> Result<&str, String> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err("Mode id must not be empty".to_string());
        }
        Ok(id)
    }
}
