use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::DocumentKind;
use super::schema::FieldSchema;
use super::service::{MasterEntry, RequestService, RequestServiceError, RequestSubmission};
use super::values::FieldValueMap;
use crate::workflows::notion::{GatewayError, RecordGateway};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FieldsQuery {
    #[serde(default)]
    pub(crate) kind: Option<DocumentKind>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    #[serde(default)]
    pub(crate) values: FieldValueMap,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProjectsQuery {
    #[serde(default)]
    pub(crate) customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewCustomer {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewProject {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) customer_id: Option<String>,
}

/// Router builder exposing the field catalog, previews, submission, and master data.
pub fn request_router<G>(service: Arc<RequestService<G>>) -> Router
where
    G: RecordGateway + 'static,
{
    Router::new()
        .route("/api/v1/fields", get(fields_handler))
        .route("/api/v1/requests", post(submit_handler::<G>))
        .route("/api/v1/requests/preview", post(preview_handler::<G>))
        .route(
            "/api/v1/customers",
            get(customers_handler::<G>).post(ensure_customer_handler::<G>),
        )
        .route(
            "/api/v1/projects",
            get(projects_handler::<G>).post(ensure_project_handler::<G>),
        )
        .route("/api/v1/diagnostics", get(diagnostics_handler::<G>))
        .with_state(service)
}

fn error_response(error: RequestServiceError) -> Response {
    let status = match &error {
        RequestServiceError::InvalidSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RequestServiceError::MasterDataDisabled => StatusCode::NOT_IMPLEMENTED,
        RequestServiceError::NotConfigured(_)
        | RequestServiceError::Gateway(GatewayError::MissingApiKey) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RequestServiceError::Gateway(_) => StatusCode::BAD_GATEWAY,
        RequestServiceError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn fields_handler(Query(query): Query<FieldsQuery>) -> Response {
    let views = FieldSchema::standard().views(query.kind);
    (StatusCode::OK, Json(views)).into_response()
}

pub(crate) async fn preview_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
    Json(request): Json<PreviewRequest>,
) -> Response
where
    G: RecordGateway + 'static,
{
    let preview = service.preview(request.values);
    (StatusCode::OK, Json(preview)).into_response()
}

pub(crate) async fn submit_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
    Json(submission): Json<RequestSubmission>,
) -> Response
where
    G: RecordGateway + 'static,
{
    match service.submit(submission).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn customers_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
) -> Response
where
    G: RecordGateway + 'static,
{
    match service.customers().await {
        Ok(customers) => (StatusCode::OK, Json(customers)).into_response(),
        Err(error) => error_response(error),
    }
}

fn master_entry_response(entry: MasterEntry) -> Response {
    let status = if entry.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(entry.into_record())).into_response()
}

/// Get-or-create: an existing customer with the same name is returned with 200.
pub(crate) async fn ensure_customer_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
    Json(request): Json<NewCustomer>,
) -> Response
where
    G: RecordGateway + 'static,
{
    match service.ensure_customer(&request.name).await {
        Ok(entry) => master_entry_response(entry),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn projects_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
    Query(query): Query<ProjectsQuery>,
) -> Response
where
    G: RecordGateway + 'static,
{
    match service.projects(query.customer_id.as_deref()).await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ensure_project_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
    Json(request): Json<NewProject>,
) -> Response
where
    G: RecordGateway + 'static,
{
    match service
        .ensure_project(&request.name, request.customer_id.as_deref())
        .await
    {
        Ok(entry) => master_entry_response(entry),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn diagnostics_handler<G>(
    State(service): State<Arc<RequestService<G>>>,
) -> Response
where
    G: RecordGateway + 'static,
{
    let report = service.diagnose().await;
    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}
