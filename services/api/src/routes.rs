use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use omnisorter::workflows::notion::RecordGateway;
use omnisorter::workflows::request::{request_router, RequestService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_request_routes<G>(service: Arc<RequestService<G>>) -> axum::Router
where
    G: RecordGateway + 'static,
{
    request_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryRecordGateway;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use omnisorter::workflows::request::{DatabaseIds, HiddenFieldPolicy, PropertyMapping};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> (axum::Router, Arc<InMemoryRecordGateway>) {
        let gateway = Arc::new(InMemoryRecordGateway::default());
        let service = Arc::new(RequestService::new(
            gateway.clone(),
            DatabaseIds {
                requests: Some("requests".to_string()),
                ..DatabaseIds::default()
            },
            PropertyMapping::default(),
            HiddenFieldPolicy::Purge,
        ));
        (with_request_routes(service).layer(Extension(state)), gateway)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let flag = state(false);
        let response = readiness_endpoint(Extension(flag.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        flag.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(flag)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_metrics_are_served() {
        let (router, _) = app(state(true));
        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn requests_are_stored_through_the_full_router() {
        let (router, gateway) = app(state(true));
        let body = json!({
            "values": { "OS機種": { "-": "L" }, "オプション": { "DAS": "無" } },
            "customer": { "mode": "simple", "customer_name": "Gamma" }
        });
        let response = router
            .oneshot(
                Request::post("/api/v1/requests")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).expect("json")))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let stored = body_json(response).await;
        assert_eq!(stored["page"]["id"], "requests-0001");
        assert!(stored["drawing"]
            .as_str()
            .expect("drawing")
            .contains("DAS: No"));
        assert_eq!(gateway.records("requests").len(), 1);
    }
}
