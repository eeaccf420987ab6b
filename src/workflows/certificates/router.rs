use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::delivery::{CertificateStore, DocumentRenderer};
use super::processor::{BatchError, CertificateRequestProcessor, QueueBatch};

/// Router exposing queue-batch intake over HTTP.
pub fn certificate_router<D, S>(processor: Arc<CertificateRequestProcessor<D, S>>) -> Router
where
    D: DocumentRenderer + 'static,
    S: CertificateStore + 'static,
{
    Router::new()
        .route("/api/v1/certificates/batch", post(batch_handler::<D, S>))
        .with_state(processor)
}

pub(crate) async fn batch_handler<D, S>(
    State(processor): State<Arc<CertificateRequestProcessor<D, S>>>,
    axum::Json(batch): axum::Json<QueueBatch>,
) -> Response
where
    D: DocumentRenderer + 'static,
    S: CertificateStore + 'static,
{
    match processor.process_batch(&batch).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error @ BatchError::Empty) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}
