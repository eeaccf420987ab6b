use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::{Uuid, Variant};

use super::delivery::{
    CertificateStore, DocumentRenderer, GeneratedCertificate, RemovalRequest, RenderError,
    StoreError,
};
use super::domain::{CompositeTestRecord, TestStatus, TestUnit};
use super::intake::{eligible_units, expand_record};
use super::payload::GenerationError;
use super::service::CertificateGenerationService;

/// One queue message carrying a change-data-capture event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl BatchResponse {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|failure| failure.item_identifier.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ChangeEvent {
    #[serde(rename = "eventName", default)]
    event_name: String,
    #[serde(default)]
    dynamodb: Option<ChangeImage>,
}

#[derive(Debug, Deserialize)]
struct ChangeImage {
    #[serde(rename = "NewImage", default)]
    new_image: Option<Value>,
}

/// Feed-level switches applied before a record is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorSettings {
    pub process_modify_events: bool,
}

/// What happened to one change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The event type is not processed.
    Skipped,
    Removed(RemovalRequest),
    Issued(Vec<GeneratedCertificate>),
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("malformed change record: {0}")]
    MalformedMessage(#[from] serde_json::Error),
    #[error("record does not have a valid testResultId for certificate generation: {0}")]
    InvalidRecord(String),
    #[error("no document registered for template {0}")]
    UnknownTemplate(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("batch contains no records")]
    Empty,
}

/// Drives change records through expansion, generation and storage.
pub struct CertificateRequestProcessor<D, S> {
    generator: CertificateGenerationService<D>,
    store: Arc<S>,
    settings: ProcessorSettings,
}

impl<D, S> CertificateRequestProcessor<D, S>
where
    D: DocumentRenderer + 'static,
    S: CertificateStore + 'static,
{
    pub fn new(
        generator: CertificateGenerationService<D>,
        store: Arc<S>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            generator,
            store,
            settings,
        }
    }

    /// Processes every message of a batch, returning the ids that must be redelivered.
    pub async fn process_batch(&self, batch: &QueueBatch) -> Result<BatchResponse, BatchError> {
        if batch.records.is_empty() {
            error!("received a batch without records");
            return Err(BatchError::Empty);
        }

        let mut response = BatchResponse::default();
        for message in &batch.records {
            match self.process_message(&message.body).await {
                Ok(outcome) => debug!(
                    message_id = %message.message_id,
                    outcome = outcome_label(&outcome),
                    "record processed"
                ),
                Err(err) => {
                    error!(
                        message_id = %message.message_id,
                        error = %err,
                        "failed to process record"
                    );
                    response.batch_item_failures.push(BatchItemFailure {
                        item_identifier: message.message_id.clone(),
                    });
                }
            }
        }

        info!(
            records = batch.records.len(),
            failures = response.batch_item_failures.len(),
            "batch processed"
        );
        Ok(response)
    }

    pub async fn process_message(&self, body: &str) -> Result<RecordOutcome, ProcessingError> {
        match self.decode(body)? {
            Some(record) => self.process_record(&record).await,
            None => Ok(RecordOutcome::Skipped),
        }
    }

    /// Extracts the new image of an event, or `None` when the event is not processed.
    pub fn decode(&self, body: &str) -> Result<Option<CompositeTestRecord>, ProcessingError> {
        let event: ChangeEvent = serde_json::from_str(body)?;

        let wanted = match event.event_name.as_str() {
            "INSERT" => true,
            "MODIFY" => self.settings.process_modify_events,
            _ => false,
        };
        if !wanted {
            debug!(event = %event.event_name, "skipping change event");
            return Ok(None);
        }

        let Some(image) = event.dynamodb.and_then(|change| change.new_image) else {
            debug!(event = %event.event_name, "change event has no new image");
            return Ok(None);
        };

        Ok(Some(serde_json::from_value(image)?))
    }

    /// Cancelled records are withdrawn; anything else is expanded and issued.
    pub async fn process_record(
        &self,
        record: &CompositeTestRecord,
    ) -> Result<RecordOutcome, ProcessingError> {
        let test_result_id = &record.header.test_result_id;

        if record.header.test_status == TestStatus::Cancelled {
            let request = RemovalRequest {
                test_result_id: test_result_id.clone(),
            };
            self.store.remove(&request).await?;
            info!(test_result_id = %test_result_id, "withdrew certificates for cancelled test");
            return Ok(RecordOutcome::Removed(request));
        }

        if !is_valid_test_result_id(test_result_id) {
            return Err(ProcessingError::InvalidRecord(test_result_id.clone()));
        }

        let flags = self.generator.flags().effective().await;
        let units = eligible_units(expand_record(record), &flags, self.generator.catalog());
        debug!(
            test_result_id = %test_result_id,
            eligible = units.len(),
            "expanded test record"
        );

        let results = join_all(units.iter().map(|unit| self.process_unit(unit))).await;

        let mut issued = Vec::with_capacity(results.len());
        let mut first_failure = None;
        for result in results {
            match result {
                Ok(certificate) => issued.push(certificate),
                Err(err) => {
                    error!(test_result_id = %test_result_id, error = %err, "test unit failed");
                    first_failure.get_or_insert(err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(RecordOutcome::Issued(issued)),
        }
    }

    async fn process_unit(&self, unit: &TestUnit) -> Result<GeneratedCertificate, ProcessingError> {
        let certificate = self.generator.generate(unit).await?;
        self.store.upload(&certificate).await?;
        Ok(certificate)
    }
}

/// Hyphenated UUID with an RFC 4122 variant and a version of 1 to 8, or the nil/max UUID.
fn is_valid_test_result_id(raw: &str) -> bool {
    if raw.len() != 36 {
        return false;
    }
    let Ok(id) = Uuid::try_parse(raw) else {
        return false;
    };

    if id.is_nil() || id.as_u128() == u128::MAX {
        return true;
    }
    (1..=8).contains(&id.get_version_num()) && id.get_variant() == Variant::RFC4122
}

fn outcome_label(outcome: &RecordOutcome) -> &'static str {
    match outcome {
        RecordOutcome::Skipped => "skipped",
        RecordOutcome::Removed(_) => "removed",
        RecordOutcome::Issued(_) => "issued",
    }
}
