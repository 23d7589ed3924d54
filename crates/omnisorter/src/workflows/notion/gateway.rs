use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a page created in a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Schema view returned when a database is read directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
    pub id: String,
    pub property_names: Vec<String>,
}

/// Storage abstraction so the request service can be exercised without the network.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn create_record(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError>;

    /// Returns every page matching `filter`, following pagination cursors.
    async fn query_records(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError>;

    async fn read_database(&self, database_id: &str) -> Result<DatabaseSummary, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("NOTION_API_KEY is not configured")]
    MissingApiKey,
    #[error("api key rejected")]
    Unauthorized,
    #[error("database or page not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Short classification used by connection diagnostics.
    pub fn summary(&self) -> String {
        match self {
            GatewayError::MissingApiKey => "api key missing".to_string(),
            GatewayError::Unauthorized => "unauthorized".to_string(),
            GatewayError::NotFound(_) => "not found".to_string(),
            GatewayError::Status { status, .. } => format!("status {status}"),
            GatewayError::Transport(_) => "transport error".to_string(),
            GatewayError::Decode(_) => "malformed response".to_string(),
        }
    }
}
