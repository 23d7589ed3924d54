use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::gateway::{DatabaseSummary, GatewayError, PageRef, RecordGateway};
use crate::config::NotionConfig;

const PAGE_SIZE: u32 = 100;

/// HTTP client for the Notion REST API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    version: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            version: config.version.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, target: &str) -> Result<Value, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        let response = request
            .bearer_auth(api_key)
            .header("Notion-Version", self.version.as_str())
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(GatewayError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(GatewayError::NotFound(target.to_string())),
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                });
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

#[async_trait]
impl RecordGateway for NotionClient {
    async fn create_record(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        let page = self
            .send(self.http.post(self.url("/pages")).json(&body), database_id)
            .await?;

        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Decode("created page has no id".to_string()))?;

        Ok(PageRef {
            id: id.to_string(),
            url: page.get("url").and_then(Value::as_str).map(str::to_string),
        })
    }

    async fn query_records(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        let url = self.url(&format!("/databases/{database_id}/query"));
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = Map::new();
            body.insert("page_size".to_string(), json!(PAGE_SIZE));
            if let Some(filter) = &filter {
                body.insert("filter".to_string(), filter.clone());
            }
            if let Some(cursor) = cursor.take() {
                body.insert("start_cursor".to_string(), Value::String(cursor));
            }

            let response = self
                .send(self.http.post(&url).json(&Value::Object(body)), database_id)
                .await?;
            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| GatewayError::Decode("query response has no results".to_string()))?;
            pages.extend(results.iter().cloned());

            let has_more = response
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            cursor = response
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }

        debug!(database_id, pages = pages.len(), "database query complete");
        Ok(pages)
    }

    async fn read_database(&self, database_id: &str) -> Result<DatabaseSummary, GatewayError> {
        let database = self
            .send(
                self.http.get(self.url(&format!("/databases/{database_id}"))),
                database_id,
            )
            .await?;

        let property_names = database
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();

        Ok(DatabaseSummary {
            id: database_id.to_string(),
            property_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> NotionConfig {
        NotionConfig {
            api_key: api_key.map(str::to_string),
            api_base: "https://notion.invalid/v1/".to_string(),
            ..NotionConfig::default()
        }
    }

    #[test]
    fn base_url_is_normalised() {
        let client = NotionClient::new(&config(Some("secret"))).expect("client builds");
        assert_eq!(
            client.url("/databases/abc"),
            "https://notion.invalid/v1/databases/abc"
        );
    }

    #[tokio::test]
    async fn requests_fail_fast_without_api_key() {
        let client = NotionClient::new(&config(None)).expect("client builds");
        let error = client
            .read_database("abc")
            .await
            .expect_err("missing key is rejected");
        assert!(matches!(error, GatewayError::MissingApiKey));

        let error = client
            .create_record("abc", Map::new())
            .await
            .expect_err("missing key is rejected");
        assert_eq!(error.summary(), "api key missing");
    }
}
