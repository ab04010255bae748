use serde::{Deserialize, Serialize};

/// Response of every transfer endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    pub success: bool,
    pub message: String,
    pub file: String,
}

impl BridgeResponse {
    pub fn success(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            file: file.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            file: String::new(),
        }
    }

    pub fn error_for(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            file: file.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProjectsResponse {
    pub projects: Vec<String>,
    pub count: usize,
}

impl ProjectsResponse {
    pub fn new(projects: Vec<String>) -> Self {
        let count = projects.len();
        Self { projects, count }
    }
}
