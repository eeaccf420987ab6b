use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::certificates::flags::FeatureFlagSnapshot;
use crate::workflows::certificates::processor::QueueBatch;
use crate::workflows::certificates::router::{batch_handler, certificate_router};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn batch_route_reports_failed_messages() {
    let Harness {
        processor, store, ..
    } = harness(MemoryReference::default(), FeatureFlagSnapshot::default());
    let router = certificate_router(Arc::new(processor));

    let mut bad_id = annual_record("psv", "pass");
    bad_id["testResultId"] = json!("abc");
    let batch = QueueBatch {
        records: vec![
            message("m-1", "INSERT", annual_record("psv", "pass")),
            message("m-2", "INSERT", bad_id),
        ],
    };

    let response = router
        .oneshot(
            Request::post("/api/v1/certificates/batch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&batch).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "batchItemFailures": [{ "itemIdentifier": "m-2" }] })
    );
    assert_eq!(store.uploads().len(), 1);
}

#[tokio::test]
async fn batch_handler_rejects_empty_batches() {
    let Harness { processor, .. } =
        harness(MemoryReference::default(), FeatureFlagSnapshot::default());

    let response = batch_handler(State(Arc::new(processor)), axum::Json(QueueBatch::default())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "batch contains no records");
}

#[tokio::test]
async fn batch_route_requires_json() {
    let Harness { processor, .. } =
        harness(MemoryReference::default(), FeatureFlagSnapshot::default());
    let router = certificate_router(Arc::new(processor));

    let response = router
        .oneshot(
            Request::post("/api/v1/certificates/batch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"Records\": 7}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
