use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::request::{
    request_router, DatabaseIds, HiddenFieldPolicy, PropertyMapping, RequestService,
};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn sample_body() -> Value {
    json!({
        "OS機種": { "-": "S" },
        "本体構成": { "段": "4", "列": "3", "ブロック": "2", "間口タイプ": "固定（棚）式" },
        "オプション": { "DAS": "有" }
    })
}

#[tokio::test]
async fn fields_route_filters_by_document() {
    let (service, _) = build_service(request_only());
    let response = request_router(service)
        .oneshot(get("/api/v1/fields?kind=quotation"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let fields = body.as_array().expect("array");
    assert_eq!(fields.len(), 15);
    assert_eq!(fields[0]["key"], "OS機種/-");
    assert_eq!(fields[0]["choices"], json!(["S", "M", "L", "mini"]));
}

#[tokio::test]
async fn preview_route_returns_documents_and_options() {
    let (service, gateway) = build_service(request_only());
    let response = request_router(service)
        .oneshot(post_json(
            "/api/v1/requests/preview",
            json!({ "values": sample_body() }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["derived"]["grid_count"], 48);
    assert_eq!(body["values"]["本体構成"]["間口数"], 48);
    assert_eq!(body["tote_options"][2], "48個 (1倍)");
    assert!(body["drawing"]
        .as_str()
        .expect("drawing text")
        .contains("DAS: Yes"));
    assert_eq!(body["documents"][1]["kind"], "drawing");
    assert_eq!(
        body["documents"][0]["sections"][0],
        json!({ "category": "OS機種", "entries": [{ "value": "S" }] })
    );
    assert!(gateway.created().is_empty());
}

#[tokio::test]
async fn submit_route_creates_record() {
    let (service, gateway) = build_service(request_only());
    let response = request_router(service)
        .oneshot(post_json(
            "/api/v1/requests",
            json!({
                "values": sample_body(),
                "requester": "佐藤",
                "customer": { "mode": "simple", "customer_name": "Acme物流" }
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["page"]["id"], "page-001");
    assert_eq!(body["title"], "Acme物流 - OmniSorter S 見積・図面依頼");
    assert_eq!(gateway.created().len(), 1);
}

#[tokio::test]
async fn submit_route_maps_service_errors() {
    let (service, _) = build_service(request_only());
    let response = request_router(service)
        .oneshot(post_json("/api/v1/requests", json!({ "values": {} })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (service, _) = build_service(DatabaseIds::default());
    let response = request_router(service)
        .oneshot(post_json(
            "/api/v1/requests",
            json!({ "values": sample_body() }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NOTION_DATABASE_ID is not configured");

    let failing = Arc::new(RequestService::new(
        Arc::new(FailingGateway),
        request_only(),
        PropertyMapping::default(),
        HiddenFieldPolicy::Purge,
    ));
    let response = request_router(failing)
        .oneshot(post_json(
            "/api/v1/requests",
            json!({ "values": sample_body() }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn master_data_routes() {
    let (service, gateway) = build_service(all_databases());
    gateway.seed(CUSTOMERS_DB, vec![customer_page("c-1", "Acme物流")]);
    gateway.seed(PROJECTS_DB, vec![project_page("p-1", "東京DC")]);
    let router = request_router(service);

    let response = router
        .clone()
        .oneshot(get("/api/v1/customers"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([{ "id": "c-1", "name": "Acme物流" }])
    );

    let response = router
        .clone()
        .oneshot(get("/api/v1/projects?customer_id=c-1"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await[0]["name"], "東京DC");

    let response = router
        .clone()
        .oneshot(post_json("/api/v1/customers", json!({ "name": " Acme物流 " })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], "c-1");
    assert!(gateway.created().is_empty());

    let response = router
        .oneshot(post_json(
            "/api/v1/projects",
            json!({ "name": "大阪DC", "customer_id": "c-1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(gateway.created()[0].database_id, PROJECTS_DB);
}

#[tokio::test]
async fn master_data_routes_report_disabled_feature() {
    let (service, _) = build_service(request_only());
    let response = request_router(service)
        .oneshot(post_json("/api/v1/customers", json!({ "name": "Acme" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn diagnostics_route_reflects_overall_status() {
    let (service, _) = build_service(DatabaseIds {
        requests: Some(PROJECTS_DB.to_string()),
        ..DatabaseIds::default()
    });
    let response = request_router(service)
        .oneshot(get("/api/v1/diagnostics"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["databases"][0]["status"], "failed");
    assert_eq!(body["databases"][1]["status"], "not_configured");
}
