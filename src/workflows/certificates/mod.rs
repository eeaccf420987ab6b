//! Certificate generation for vehicle test results.
//!
//! A change record is expanded into one unit per test type, filtered for eligibility,
//! classified into a certificate family and assembled into a renderer payload. Cancelled
//! records withdraw previously issued certificates instead.

pub mod catalog;
pub mod classification;
pub mod defects;
pub mod delivery;
pub mod domain;
pub mod flags;
pub mod formatting;
pub mod intake;
pub mod payload;
pub mod processor;
pub mod reference;
pub mod router;
pub mod service;
pub mod templates;

#[cfg(test)]
mod tests;

pub use catalog::TestTypeCatalog;
pub use classification::{classify, CertificateCategory};
pub use defects::policy::{PrsPolicy, StandardPrsPolicy};
pub use defects::{categorize, CategorizedDefectSet, DefectContribution};
pub use delivery::{
    CertificateStore, DocumentRenderer, GeneratedCertificate, RemovalRequest, RenderError,
    RenderRequest, StoreError,
};
pub use domain::{CompositeTestRecord, TestOutcome, TestStatus, TestUnit, VehicleType};
pub use flags::{FeatureFlagCache, FeatureFlagSnapshot, FeatureFlagSource, StaticFlagSource};
pub use intake::{eligible_units, expand_record, is_eligible};
pub use payload::{CertificatePayload, PayloadAssembler};
pub use processor::{
    BatchError, BatchItemFailure, BatchResponse, CertificateRequestProcessor, ProcessingError,
    ProcessorSettings, QueueBatch, QueueMessage, RecordOutcome,
};
pub use reference::{LookupError, ReferenceData};
pub use router::certificate_router;
pub use service::CertificateGenerationService;
