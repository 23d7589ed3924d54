use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use omnisorter::config::{AppConfig, AppEnvironment};
use omnisorter::error::AppError;
use omnisorter::workflows::notion::{
    DatabaseSummary, GatewayError, NotionClient, PageRef, RecordGateway,
};
use omnisorter::workflows::request::{HiddenFieldPolicy, RequestService};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in store used in development when no Notion key is configured.
#[derive(Default)]
pub(crate) struct InMemoryRecordGateway {
    databases: Mutex<BTreeMap<String, Vec<Value>>>,
}

impl InMemoryRecordGateway {
    pub(crate) fn records(&self, database_id: &str) -> Vec<Value> {
        let guard = self.databases.lock().expect("gateway mutex poisoned");
        guard.get(database_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl RecordGateway for InMemoryRecordGateway {
    async fn create_record(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError> {
        let mut guard = self.databases.lock().expect("gateway mutex poisoned");
        let pages = guard.entry(database_id.to_string()).or_default();
        let id = format!("{database_id}-{:04}", pages.len() + 1);
        pages.push(serde_json::json!({ "id": id, "properties": properties }));
        Ok(PageRef { id, url: None })
    }

    async fn query_records(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        let pages = self.records(database_id);
        Ok(match filter {
            Some(filter) => pages
                .into_iter()
                .filter(|page| matches_filter(page, &filter))
                .collect(),
            None => pages,
        })
    }

    async fn read_database(&self, database_id: &str) -> Result<DatabaseSummary, GatewayError> {
        let property_names = self
            .records(database_id)
            .first()
            .and_then(|page| page.get("properties"))
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();
        Ok(DatabaseSummary {
            id: database_id.to_string(),
            property_names,
        })
    }
}

/// Evaluates the `relation.contains` filter used for project lookups. Filters
/// of any other shape match every page.
fn matches_filter(page: &Value, filter: &Value) -> bool {
    let (Some(property), Some(wanted)) = (
        filter.get("property").and_then(Value::as_str),
        filter.pointer("/relation/contains").and_then(Value::as_str),
    ) else {
        return true;
    };

    page.get("properties")
        .and_then(|properties| properties.get(property))
        .and_then(|value| value.get("relation"))
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .any(|link| link.get("id").and_then(Value::as_str) == Some(wanted))
        })
        .unwrap_or(false)
}

/// Gateway chosen at startup.
pub(crate) enum Gateway {
    Notion(NotionClient),
    InMemory(InMemoryRecordGateway),
}

#[async_trait]
impl RecordGateway for Gateway {
    async fn create_record(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError> {
        match self {
            Gateway::Notion(client) => client.create_record(database_id, properties).await,
            Gateway::InMemory(store) => store.create_record(database_id, properties).await,
        }
    }

    async fn query_records(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        match self {
            Gateway::Notion(client) => client.query_records(database_id, filter).await,
            Gateway::InMemory(store) => store.query_records(database_id, filter).await,
        }
    }

    async fn read_database(&self, database_id: &str) -> Result<DatabaseSummary, GatewayError> {
        match self {
            Gateway::Notion(client) => client.read_database(database_id).await,
            Gateway::InMemory(store) => store.read_database(database_id).await,
        }
    }
}

/// The in-memory store replaces Notion only in development without an api key.
pub(crate) fn build_gateway(config: &AppConfig) -> Result<Gateway, AppError> {
    if config.notion.api_key.is_none() && config.environment == AppEnvironment::Development {
        warn!("NOTION_API_KEY not set; requests are kept in memory");
        return Ok(Gateway::InMemory(InMemoryRecordGateway::default()));
    }
    Ok(Gateway::Notion(NotionClient::new(&config.notion)?))
}

pub(crate) fn build_request_service(
    config: &AppConfig,
) -> Result<Arc<RequestService<Gateway>>, AppError> {
    let gateway = build_gateway(config)?;
    Ok(Arc::new(RequestService::new(
        Arc::new(gateway),
        config.notion.databases(),
        config.properties.clone(),
        config.form.hidden_fields,
    )))
}

pub(crate) fn parse_policy(raw: &str) -> Result<HiddenFieldPolicy, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn in_memory_gateway_round_trips_pages() {
        let gateway = InMemoryRecordGateway::default();
        let mut properties = Map::new();
        properties.insert("会社名".to_string(), json!({ "title": [] }));

        let page = gateway
            .create_record("customers", properties)
            .await
            .expect("stored");
        assert_eq!(page.id, "customers-0001");

        let pages = gateway
            .query_records("customers", None)
            .await
            .expect("listed");
        assert_eq!(pages.len(), 1);

        let summary = gateway.read_database("customers").await.expect("read");
        assert_eq!(summary.property_names, vec!["会社名".to_string()]);
    }

    #[tokio::test]
    async fn in_memory_gateway_applies_relation_filter() {
        let gateway = InMemoryRecordGateway::default();
        for customer in ["c-1", "c-2", "c-1"] {
            let mut properties = Map::new();
            properties.insert(
                "顧客企業".to_string(),
                json!({ "relation": [{ "id": customer }] }),
            );
            gateway
                .create_record("projects", properties)
                .await
                .expect("stored");
        }
        gateway
            .create_record("projects", Map::new())
            .await
            .expect("stored");

        let filter = json!({ "property": "顧客企業", "relation": { "contains": "c-1" } });
        let pages = gateway
            .query_records("projects", Some(filter))
            .await
            .expect("listed");
        let ids: Vec<&str> = pages
            .iter()
            .filter_map(|page| page["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["projects-0001", "projects-0003"]);

        let all = gateway
            .query_records("projects", Some(json!({ "and": [] })))
            .await
            .expect("listed");
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn policy_argument_parses() {
        assert_eq!(parse_policy("retain"), Ok(HiddenFieldPolicy::Retain));
        assert!(parse_policy("maybe").is_err());
    }
}
