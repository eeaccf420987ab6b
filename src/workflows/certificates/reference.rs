//! Contracts for the reference data the certificate pipeline reads.
//!
//! Only the shape of each answer is fixed here; how a lookup reaches its backing store is
//! up to the adapter.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::defects::translation::DefectParent;
use super::domain::{TestOutcome, TestStatus, TestUnit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeAndModel {
    #[serde(rename = "Make")]
    pub make: String,
    #[serde(rename = "Model")]
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightDetails {
    pub dgvw: u32,
    /// Design gross train weight for HGVs, design total axle weight for trailers.
    pub weight2: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailerRegistration {
    #[serde(rename = "Trn")]
    pub trn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdrDetails {
    #[serde(default)]
    pub vehicle_details_type: Option<String>,
    #[serde(default)]
    pub permitted_dangerous_goods: Vec<String>,
    #[serde(default)]
    pub brake_endurance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStation {
    pub test_station_p_number: String,
    #[serde(default)]
    pub test_station_country: Option<String>,
}

impl TestStation {
    pub fn is_welsh(&self) -> bool {
        self.test_station_country
            .as_deref()
            .is_some_and(|country| country.trim().eq_ignore_ascii_case("wales"))
    }
}

/// Earlier test of the same vehicle, as returned by the test-results service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricTestResult {
    pub test_status: TestStatus,
    pub test_end_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub odometer_reading: Option<u32>,
    #[serde(default)]
    pub odometer_reading_units: Option<String>,
    #[serde(default)]
    pub test_types: Vec<HistoricTestType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricTestType {
    pub test_type_classification: String,
    pub test_result: TestOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{service} lookup failed: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },
    #[error("{service} has no record for {key}")]
    NotFound { service: &'static str, key: String },
    #[error("{service} returned bad data: {reason}")]
    BadData {
        service: &'static str,
        reason: String,
    },
}

#[async_trait]
pub trait TechRecordService: Send + Sync {
    async fn make_and_model(&self, unit: &TestUnit) -> Result<MakeAndModel, LookupError>;
    async fn weight_details(&self, unit: &TestUnit) -> Result<WeightDetails, LookupError>;
    async fn adr_details(&self, unit: &TestUnit) -> Result<Option<AdrDetails>, LookupError>;
}

#[async_trait]
pub trait TrailerRegistry: Send + Sync {
    async fn registration(
        &self,
        vin: &str,
        make: &str,
    ) -> Result<Option<TrailerRegistration>, LookupError>;
}

#[async_trait]
pub trait TestStationDirectory: Send + Sync {
    async fn station(&self, p_number: &str) -> Result<TestStation, LookupError>;
}

#[async_trait]
pub trait TestResultHistory: Send + Sync {
    async fn test_results(&self, system_number: &str)
        -> Result<Vec<HistoricTestResult>, LookupError>;
}

#[async_trait]
pub trait DefectCatalogue: Send + Sync {
    async fn defects(&self) -> Result<Vec<DefectParent>, LookupError>;
}

/// Bundle of reference-data collaborators handed to the payload generators.
#[derive(Clone)]
pub struct ReferenceData {
    pub tech_records: Arc<dyn TechRecordService>,
    pub trailers: Arc<dyn TrailerRegistry>,
    pub stations: Arc<dyn TestStationDirectory>,
    pub history: Arc<dyn TestResultHistory>,
    pub defects: Arc<dyn DefectCatalogue>,
}

impl fmt::Debug for ReferenceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceData").finish_non_exhaustive()
    }
}
