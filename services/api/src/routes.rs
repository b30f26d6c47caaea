use crate::infra::{AppState, SharedService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use gradebook::submissions::submission_router;
use serde_json::json;

pub(crate) fn with_submission_routes(service: SharedService) -> axum::Router {
    submission_router(service)
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
    use crate::infra::{submission_service, SharedStore};
    use axum::body::Body;
    use axum::http::Request;
    use gradebook::config::{StoreBackend, StoreConfig};
    use gradebook::submissions::MemoryRecordStore;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn memory_service() -> SharedService {
        let store: SharedStore = Arc::new(MemoryRecordStore::default());
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            database_path: "unused.db".into(),
            busy_timeout: Duration::from_millis(100),
            request_timeout: Duration::from_secs(2),
        };
        submission_service(store, &config)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn submission_routes_are_mounted_alongside_operational_routes() {
        let router = with_submission_routes(memory_service()).layer(Extension(app_state(true)));
        let year = current_year();
        let payload = json!({
            "studentId": format!("{year}QA0001"),
            "bornDate": "2001",
            "firstName": "Katherine",
            "lastName": "Johnson",
            "assignment1": 100,
            "assignment2": 100,
            "assignment3": 100,
            "midterm1": 100,
            "midterm2": 100,
            "final": 100,
        });

        let created = router
            .clone()
            .oneshot(
                Request::post("/api/v1/submissions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(body_json(created).await["gpa"], json!(4.0));

        let health = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);
    }

    fn current_year() -> i32 {
        gradebook::submissions::SubmissionValidator::current().reference_year()
    }
}
