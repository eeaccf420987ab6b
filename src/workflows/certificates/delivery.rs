//! Outbound contracts: the document renderer and the certificate store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{CertificateOrder, TestOutcome};
use super::payload::CertificatePayload;

/// One render call: which document to fill and with what.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub document_name: String,
    pub document_directory: String,
    pub payload: CertificatePayload,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer rejected {document}: {reason}")]
    Rejected { document: String, reason: String },
    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Returns the rendered document bytes.
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError>;
}

/// A rendered certificate plus the metadata stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCertificate {
    pub test_result_id: String,
    pub file_name: String,
    pub vrm: Option<String>,
    pub test_type_name: String,
    pub test_type_result: TestOutcome,
    pub date_of_issue: String,
    pub certificate_type: String,
    pub file_format: String,
    pub file_size: String,
    pub certificate_order: CertificateOrder,
    pub email: Option<String>,
    pub should_email_certificate: String,
    #[serde(skip)]
    pub certificate: Vec<u8>,
}

/// Withdrawal of every certificate issued for a cancelled test record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalRequest {
    pub test_result_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("certificate store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn upload(&self, certificate: &GeneratedCertificate) -> Result<(), StoreError>;
    async fn remove(&self, request: &RemovalRequest) -> Result<(), StoreError>;
}
