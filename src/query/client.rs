//! Answering backend client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spoken when the backend cannot answer
pub const APOLOGY: &str = "Sorry, there was an error processing your request.";

/// Payload sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Session identifier (document name)
    pub name: String,
    /// Captured utterance
    pub query: String,
}

/// Backend response body
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Any failure to obtain an answer
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(u16),
}

/// Remote collaborator that answers queries
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, request: &QueryRequest) -> Result<String, QueryError>;
}

/// Posts queries to `{base_url}/query`
pub struct HttpAnswerService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnswerService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/query", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, request: &QueryRequest) -> Result<String, QueryError> {
        debug!(endpoint = %self.endpoint, name = %request.name, "posting query");

        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Status(status.as_u16()));
        }

        let body: QueryResponse = response.json().await?;
        Ok(body.response)
    }
}
