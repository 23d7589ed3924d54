use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::workflows::notion::{DatabaseSummary, GatewayError, PageRef, RecordGateway};
use crate::workflows::request::schema::{GRID_TYPE_FIXED_SHELF, YES};
use crate::workflows::request::{
    DatabaseIds, FieldKey, FieldValueMap, HiddenFieldPolicy, PropertyMapping, RequestService,
};

pub(super) const REQUESTS_DB: &str = "db-requests";
pub(super) const CUSTOMERS_DB: &str = "db-customers";
pub(super) const PROJECTS_DB: &str = "db-projects";

#[derive(Debug, Clone)]
pub(super) struct CreatedRecord {
    pub(super) database_id: String,
    pub(super) properties: Map<String, Value>,
}

/// In-memory gateway recording writes and answering queries from seeded pages.
#[derive(Default)]
pub(super) struct MemoryGateway {
    pub(super) created: Mutex<Vec<CreatedRecord>>,
    pub(super) pages: Mutex<BTreeMap<String, Vec<Value>>>,
    pub(super) filters: Mutex<Vec<Option<Value>>>,
}

impl MemoryGateway {
    pub(super) fn seed(&self, database_id: &str, pages: Vec<Value>) {
        self.pages
            .lock()
            .expect("pages mutex poisoned")
            .insert(database_id.to_string(), pages);
    }

    pub(super) fn created(&self) -> Vec<CreatedRecord> {
        self.created.lock().expect("created mutex poisoned").clone()
    }

    pub(super) fn filters(&self) -> Vec<Option<Value>> {
        self.filters.lock().expect("filters mutex poisoned").clone()
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn create_record(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError> {
        let mut created = self.created.lock().expect("created mutex poisoned");
        created.push(CreatedRecord {
            database_id: database_id.to_string(),
            properties,
        });
        let id = format!("page-{:03}", created.len());
        Ok(PageRef {
            url: Some(format!("https://notion.invalid/{id}")),
            id,
        })
    }

    async fn query_records(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        self.filters
            .lock()
            .expect("filters mutex poisoned")
            .push(filter);
        let pages = self.pages.lock().expect("pages mutex poisoned");
        pages
            .get(database_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(database_id.to_string()))
    }

    async fn read_database(&self, database_id: &str) -> Result<DatabaseSummary, GatewayError> {
        if database_id == PROJECTS_DB {
            return Err(GatewayError::Unauthorized);
        }
        Ok(DatabaseSummary {
            id: database_id.to_string(),
            property_names: vec!["依頼名".to_string(), "OS機種".to_string()],
        })
    }
}

/// Gateway whose every call fails upstream.
pub(super) struct FailingGateway;

#[async_trait]
impl RecordGateway for FailingGateway {
    async fn create_record(
        &self,
        _database_id: &str,
        _properties: Map<String, Value>,
    ) -> Result<PageRef, GatewayError> {
        Err(GatewayError::Status {
            status: 500,
            body: "internal".to_string(),
        })
    }

    async fn query_records(
        &self,
        _database_id: &str,
        _filter: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        Err(GatewayError::Transport("connection reset".to_string()))
    }

    async fn read_database(&self, _database_id: &str) -> Result<DatabaseSummary, GatewayError> {
        Err(GatewayError::MissingApiKey)
    }
}

pub(super) fn all_databases() -> DatabaseIds {
    DatabaseIds {
        requests: Some(REQUESTS_DB.to_string()),
        customers: Some(CUSTOMERS_DB.to_string()),
        projects: Some(PROJECTS_DB.to_string()),
    }
}

pub(super) fn request_only() -> DatabaseIds {
    DatabaseIds {
        requests: Some(REQUESTS_DB.to_string()),
        ..DatabaseIds::default()
    }
}

pub(super) fn build_service(
    databases: DatabaseIds,
) -> (Arc<RequestService<MemoryGateway>>, Arc<MemoryGateway>) {
    let gateway = Arc::new(MemoryGateway::default());
    let service = Arc::new(RequestService::new(
        gateway.clone(),
        databases,
        PropertyMapping::default(),
        HiddenFieldPolicy::Purge,
    ));
    (service, gateway)
}

pub(super) fn sample_values() -> FieldValueMap {
    let mut values = FieldValueMap::new();
    values.insert(FieldKey::MODEL, "S");
    values.insert(FieldKey::ROWS, "4");
    values.insert(FieldKey::COLUMNS, "3");
    values.insert(FieldKey::CELL_BLOCKS, "2");
    values.insert(FieldKey::GRID_TYPE, GRID_TYPE_FIXED_SHELF);
    values.insert(FieldKey::DAS, YES);
    values
}

pub(super) fn customer_page(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "properties": {
            "会社名": { "type": "title", "title": [{ "plain_text": name }] }
        }
    })
}

pub(super) fn project_page(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "properties": {
            "案件名": { "type": "title", "title": [{ "plain_text": name }] },
            "顧客企業": { "type": "relation", "relation": [] }
        }
    })
}

/// Text content of a rich_text or title property in a created record.
pub(super) fn text_of(record: &CreatedRecord, property: &str) -> String {
    let value = record
        .properties
        .get(property)
        .unwrap_or_else(|| panic!("property {property} missing"));
    value
        .get("rich_text")
        .or_else(|| value.get("title"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["text"]["content"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
