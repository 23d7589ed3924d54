use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tracing::{debug, info, warn};

use super::composer::RequestDocument;
use super::derivation::DerivedQuantities;
use super::domain::{DocumentKind, FieldKey};
use super::mapping::PropertyMapping;
use super::session::{HiddenFieldPolicy, RequestSession};
use super::values::FieldValueMap;
use crate::workflows::notion::properties;
use crate::workflows::notion::{GatewayError, MasterRecord, PageRef, RecordGateway};

pub const REQUEST_DATABASE_LABEL: &str = "OmniSorter依頼DB";
pub const CUSTOMER_DATABASE_LABEL: &str = "顧客企業マスタ";
pub const PROJECT_DATABASE_LABEL: &str = "案件管理データベース";

/// Database ids; the customer and project masters are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseIds {
    pub requests: Option<String>,
    pub customers: Option<String>,
    pub projects: Option<String>,
}

impl DatabaseIds {
    pub fn master_data_enabled(&self) -> bool {
        self.customers.is_some() && self.projects.is_some()
    }
}

/// How a request names its customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CustomerLink {
    #[default]
    None,
    /// Free-text customer name stored on the request itself.
    Simple {
        customer_name: String,
        #[serde(default)]
        project_name: Option<String>,
    },
    /// Relations to pages in the customer and project masters.
    MasterData {
        customer_id: String,
        #[serde(default)]
        project_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSubmission {
    pub values: FieldValueMap,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default)]
    pub customer: CustomerLink,
    #[serde(default)]
    pub submitted_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredRequest {
    pub page: PageRef,
    pub title: String,
    pub derived: DerivedQuantities,
    pub quotation: String,
    pub drawing: String,
}

/// Everything a form needs to redraw after an edit.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPreview {
    pub values: FieldValueMap,
    pub derived: DerivedQuantities,
    pub quotation_fields: Vec<String>,
    pub drawing_fields: Vec<String>,
    pub stale_fields: Vec<String>,
    pub cart_options: Vec<String>,
    pub tote_options: Vec<String>,
    pub quotation: String,
    pub drawing: String,
    pub documents: Vec<RequestDocument>,
}

/// Result of a get-or-create call against a master database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterEntry {
    Existing(MasterRecord),
    Created(MasterRecord),
}

impl MasterEntry {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn record(&self) -> &MasterRecord {
        match self {
            Self::Existing(record) | Self::Created(record) => record,
        }
    }

    pub fn into_record(self) -> MasterRecord {
        match self {
            Self::Existing(record) | Self::Created(record) => record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected { property_names: Vec<String> },
    NotConfigured,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseCheck {
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(flatten)]
    pub status: ConnectionStatus,
}

/// Result of probing every configured database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub ok: bool,
    pub databases: Vec<DatabaseCheck>,
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.databases {
            match &check.status {
                ConnectionStatus::Connected { property_names } => writeln!(
                    f,
                    "[ok] {}: connected ({})",
                    check.label,
                    property_names.join(", ")
                )?,
                ConnectionStatus::NotConfigured => {
                    writeln!(f, "[--] {}: not configured", check.label)?
                }
                ConnectionStatus::Failed { reason } => {
                    writeln!(f, "[ng] {}: {}", check.label, reason)?
                }
            }
        }
        Ok(())
    }
}

/// Service turning value maps into stored requests and serving master data.
pub struct RequestService<G> {
    gateway: Arc<G>,
    databases: DatabaseIds,
    mapping: PropertyMapping,
    policy: HiddenFieldPolicy,
}

impl<G> RequestService<G>
where
    G: RecordGateway + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        databases: DatabaseIds,
        mapping: PropertyMapping,
        policy: HiddenFieldPolicy,
    ) -> Self {
        Self {
            gateway,
            databases,
            mapping,
            policy,
        }
    }

    pub fn databases(&self) -> &DatabaseIds {
        &self.databases
    }

    pub fn policy(&self) -> HiddenFieldPolicy {
        self.policy
    }

    /// Normalises `values` the way a live form session would and renders both documents.
    pub fn preview(&self, values: FieldValueMap) -> RequestPreview {
        let session = RequestSession::from_values(values, self.policy);
        let keys = |kind: DocumentKind| -> Vec<String> {
            session
                .visible_fields(kind)
                .iter()
                .map(|field| field.key.to_string())
                .collect()
        };

        RequestPreview {
            quotation_fields: keys(DocumentKind::Quotation),
            drawing_fields: keys(DocumentKind::Drawing),
            stale_fields: session
                .stale_fields()
                .iter()
                .map(FieldKey::to_string)
                .collect(),
            derived: session.derived(),
            cart_options: session.cart_options(),
            tote_options: session.tote_options(),
            quotation: session.quotation(),
            drawing: session.drawing(),
            documents: DocumentKind::ordered()
                .into_iter()
                .map(|kind| session.document(kind))
                .collect(),
            values: session.values().clone(),
        }
    }

    /// Store one request with both documents and a snapshot of the values.
    pub async fn submit(
        &self,
        submission: RequestSubmission,
    ) -> Result<StoredRequest, RequestServiceError> {
        let database_id = self
            .databases
            .requests
            .as_deref()
            .ok_or(RequestServiceError::NotConfigured("NOTION_DATABASE_ID"))?;

        if let CustomerLink::MasterData { customer_id, .. } = &submission.customer {
            if !self.databases.master_data_enabled() {
                return Err(RequestServiceError::MasterDataDisabled);
            }
            if customer_id.trim().is_empty() {
                return Err(RequestServiceError::InvalidSubmission(
                    "customer_id must not be blank".to_string(),
                ));
            }
        }

        // Checked after normalising: purged hidden values do not count.
        let session = RequestSession::from_values(submission.values, self.policy);
        if session.values().iter().all(|(_, value)| value.is_blank()) {
            return Err(RequestServiceError::InvalidSubmission(
                "no specification values were provided".to_string(),
            ));
        }
        let title = request_title(session.values(), &submission.customer);
        let quotation = session.quotation();
        let drawing = session.drawing();
        let submitted_on = submission
            .submitted_on
            .unwrap_or_else(|| Local::now().date_naive());

        let mut record = Map::new();
        let mapping = &self.mapping;
        record.insert(mapping.title.clone(), properties::title(&title));
        if let Some(model) = session.values().literal(&FieldKey::MODEL) {
            record.insert(mapping.model.clone(), properties::select(model));
        }
        if let Some(requester) = submission
            .requester
            .as_deref()
            .map(str::trim)
            .filter(|requester| !requester.is_empty())
        {
            record.insert(mapping.requester.clone(), properties::rich_text(requester));
        }
        match &submission.customer {
            CustomerLink::None => {}
            CustomerLink::Simple { customer_name, .. } => {
                record.insert(
                    mapping.customer_name.clone(),
                    properties::rich_text(customer_name.trim()),
                );
            }
            CustomerLink::MasterData {
                customer_id,
                project_id,
            } => {
                record.insert(
                    mapping.customer_relation.clone(),
                    properties::relation([customer_id.as_str()]),
                );
                if let Some(project_id) = project_id.as_deref().filter(|id| !id.is_empty()) {
                    record.insert(
                        mapping.project_relation.clone(),
                        properties::relation([project_id]),
                    );
                }
            }
        }
        record.insert(mapping.quotation.clone(), properties::rich_text(&quotation));
        record.insert(mapping.drawing.clone(), properties::rich_text(&drawing));
        record.insert(
            mapping.snapshot.clone(),
            properties::rich_text(&serde_json::to_string(session.values())?),
        );
        record.insert(
            mapping.submitted_on.clone(),
            properties::date(submitted_on),
        );

        let page = self
            .gateway
            .create_record(database_id, record)
            .await
            .map_err(|error| {
                warn!(%error, "failed to store omnisorter request");
                error
            })?;

        info!(page_id = %page.id, %title, "stored omnisorter request");

        Ok(StoredRequest {
            page,
            title,
            derived: session.derived(),
            quotation,
            drawing,
        })
    }

    pub async fn customers(&self) -> Result<Vec<MasterRecord>, RequestServiceError> {
        let database_id = self.master_database(&self.databases.customers)?;
        let pages = self.gateway.query_records(database_id, None).await?;

        let customers: Vec<MasterRecord> = pages
            .iter()
            .filter_map(|page| MasterRecord::from_page(page, Some(self.mapping.customer_title.as_str())))
            .collect();
        debug!(count = customers.len(), "loaded customers");
        Ok(customers)
    }

    /// Projects, optionally restricted to those related to `customer_id`.
    /// Projects without a title are skipped.
    pub async fn projects(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<MasterRecord>, RequestServiceError> {
        let database_id = self.master_database(&self.databases.projects)?;
        let filter = customer_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                json!({
                    "property": self.mapping.project_customer_relation,
                    "relation": { "contains": id },
                })
            });
        let pages = self.gateway.query_records(database_id, filter).await?;

        let projects: Vec<MasterRecord> = pages
            .iter()
            .filter_map(|page| MasterRecord::from_page(page, None))
            .filter(|project| !project.name.is_empty())
            .collect();
        debug!(count = projects.len(), "loaded projects");
        Ok(projects)
    }

    pub async fn create_customer(&self, name: &str) -> Result<MasterRecord, RequestServiceError> {
        let database_id = self.master_database(&self.databases.customers)?;
        let name = required_name(name, "customer")?;

        let mut record = Map::new();
        record.insert(self.mapping.customer_title.clone(), properties::title(name));
        let page = self.gateway.create_record(database_id, record).await?;

        info!(page_id = %page.id, customer = name, "created customer");
        Ok(MasterRecord {
            id: page.id,
            name: name.to_string(),
        })
    }

    pub async fn create_project(
        &self,
        name: &str,
        customer_id: Option<&str>,
    ) -> Result<MasterRecord, RequestServiceError> {
        let database_id = self.master_database(&self.databases.projects)?;
        let name = required_name(name, "project")?;

        let mut record = Map::new();
        record.insert(self.mapping.project_title.clone(), properties::title(name));
        if let Some(customer_id) = customer_id.map(str::trim).filter(|id| !id.is_empty()) {
            record.insert(
                self.mapping.project_customer_relation.clone(),
                properties::relation([customer_id]),
            );
        }
        let page = self.gateway.create_record(database_id, record).await?;

        info!(page_id = %page.id, project = name, "created project");
        Ok(MasterRecord {
            id: page.id,
            name: name.to_string(),
        })
    }

    /// Existing customer with the same (trimmed) name, or a newly created one.
    pub async fn ensure_customer(&self, name: &str) -> Result<MasterEntry, RequestServiceError> {
        let wanted = required_name(name, "customer")?;
        let existing = self.customers().await?;
        match existing.into_iter().find(|customer| customer.name == wanted) {
            Some(customer) => Ok(MasterEntry::Existing(customer)),
            None => self.create_customer(wanted).await.map(MasterEntry::Created),
        }
    }

    /// Looks for the name among the customer's projects before creating one.
    pub async fn ensure_project(
        &self,
        name: &str,
        customer_id: Option<&str>,
    ) -> Result<MasterEntry, RequestServiceError> {
        let wanted = required_name(name, "project")?;
        let existing = self.projects(customer_id).await?;
        match existing.into_iter().find(|project| project.name == wanted) {
            Some(project) => Ok(MasterEntry::Existing(project)),
            None => self
                .create_project(wanted, customer_id)
                .await
                .map(MasterEntry::Created),
        }
    }

    /// Reads each database. The report is ok when at least one connects.
    pub async fn diagnose(&self) -> ConnectionReport {
        let targets = [
            (REQUEST_DATABASE_LABEL, &self.databases.requests),
            (CUSTOMER_DATABASE_LABEL, &self.databases.customers),
            (PROJECT_DATABASE_LABEL, &self.databases.projects),
        ];

        let mut databases = Vec::with_capacity(targets.len());
        for (label, database_id) in targets {
            let status = match database_id {
                None => ConnectionStatus::NotConfigured,
                Some(id) => match self.gateway.read_database(id).await {
                    Ok(summary) => ConnectionStatus::Connected {
                        property_names: summary.property_names,
                    },
                    Err(error) => {
                        warn!(database = label, %error, "database check failed");
                        ConnectionStatus::Failed {
                            reason: error.summary(),
                        }
                    }
                },
            };
            databases.push(DatabaseCheck {
                label,
                database_id: database_id.clone(),
                status,
            });
        }

        let ok = databases
            .iter()
            .any(|check| matches!(check.status, ConnectionStatus::Connected { .. }));
        ConnectionReport { ok, databases }
    }

    fn master_database<'a>(
        &self,
        database_id: &'a Option<String>,
    ) -> Result<&'a str, RequestServiceError> {
        if !self.databases.master_data_enabled() {
            return Err(RequestServiceError::MasterDataDisabled);
        }
        database_id
            .as_deref()
            .ok_or(RequestServiceError::MasterDataDisabled)
    }
}

fn required_name<'a>(name: &'a str, what: &str) -> Result<&'a str, RequestServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RequestServiceError::InvalidSubmission(format!(
            "{what} name must not be blank"
        )));
    }
    Ok(name)
}

/// Record title: customer and project names (when typed in) followed by the model.
pub fn request_title(values: &FieldValueMap, customer: &CustomerLink) -> String {
    let model = values.literal(&FieldKey::MODEL).unwrap_or("-");
    let subject = format!("OmniSorter {model} 見積・図面依頼");

    let names: Vec<&str> = match customer {
        CustomerLink::Simple {
            customer_name,
            project_name,
        } => [Some(customer_name.as_str()), project_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    if names.is_empty() {
        subject
    } else {
        format!("{} - {subject}", names.join(" / "))
    }
}

/// Error raised by the request service.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("customer and project master databases are not configured")]
    MasterDataDisabled,
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("failed to encode specification snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
