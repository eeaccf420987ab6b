use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Classification of test types that always produce an annual certificate.
pub const ANNUAL_WITH_CERTIFICATE: &str = "Annual With Certificate";
pub const IVA_WITH_CERTIFICATE: &str = "IVA With Certificate";
pub const MSVA_WITH_CERTIFICATE: &str = "MSVA With Certificate";

/// Lifecycle status of the parent test record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Submitted,
    Cancelled,
    #[serde(other)]
    Other,
}

/// Result recorded against a single test type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Pass,
    Fail,
    Prs,
    Abandoned,
    #[serde(other)]
    Other,
}

impl TestOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            TestOutcome::Pass => "pass",
            TestOutcome::Fail => "fail",
            TestOutcome::Prs => "prs",
            TestOutcome::Abandoned => "abandoned",
            TestOutcome::Other => "other",
        }
    }

    /// Whether the result can carry a pass, fail or PRS certificate.
    pub const fn is_certifiable(self) -> bool {
        matches!(self, TestOutcome::Pass | TestOutcome::Fail | TestOutcome::Prs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Psv,
    Hgv,
    Trl,
    Car,
    Lgv,
    Motorcycle,
    #[serde(other)]
    Other,
}

impl VehicleType {
    pub const fn label(self) -> &'static str {
        match self {
            VehicleType::Psv => "psv",
            VehicleType::Hgv => "hgv",
            VehicleType::Trl => "trl",
            VehicleType::Car => "car",
            VehicleType::Lgv => "lgv",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Other => "other",
        }
    }

    pub const fn is_heavy_goods(self) -> bool {
        matches!(self, VehicleType::Hgv | VehicleType::Trl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyType {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Vehicle and test-level fields shared by every test type of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecordHeader {
    pub test_result_id: String,
    #[serde(default)]
    pub system_number: String,
    #[serde(default)]
    pub vin: String,
    #[serde(default)]
    pub vrm: Option<String>,
    #[serde(default)]
    pub trailer_id: Option<String>,
    pub vehicle_type: VehicleType,
    pub test_status: TestStatus,
    #[serde(default)]
    pub test_station_name: String,
    #[serde(default)]
    pub test_station_p_number: String,
    #[serde(default)]
    pub tester_name: String,
    #[serde(default)]
    pub tester_email_address: Option<String>,
    #[serde(default)]
    pub created_by_email_address: Option<String>,
    pub test_end_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub odometer_reading: Option<u32>,
    #[serde(default)]
    pub odometer_reading_units: Option<String>,
    #[serde(default)]
    pub eu_vehicle_category: Option<String>,
    #[serde(default)]
    pub country_of_registration: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub body_type: Option<BodyType>,
    #[serde(default)]
    pub should_email_certificate: Option<String>,
}

/// One vehicle test event as delivered by the change feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeTestRecord {
    #[serde(flatten)]
    pub header: TestRecordHeader,
    /// `None` when the feed delivered something other than a sequence.
    #[serde(default, deserialize_with = "sequence_or_none")]
    pub test_types: Option<Vec<TestType>>,
}

fn sequence_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<TestType>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestType {
    pub test_type_id: String,
    #[serde(default)]
    pub test_type_name: String,
    #[serde(default)]
    pub test_type_classification: String,
    #[serde(default)]
    pub test_number: String,
    #[serde(default)]
    pub certificate_number: Option<String>,
    pub test_result: TestOutcome,
    pub test_type_start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub test_type_end_timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub test_expiry_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub test_anniversary_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub number_of_seatbelts_fitted: Option<u32>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub last_seatbelt_installation_check_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seatbelt_installation_check_date: Option<bool>,
    #[serde(default)]
    pub reason_for_abandoning: Option<String>,
    #[serde(default)]
    pub additional_comments_for_abandon: Option<String>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub reapplication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub defects: Vec<DefectRecord>,
    #[serde(default)]
    pub required_standards: Option<Vec<RequiredStandard>>,
    #[serde(default)]
    pub custom_defects: Option<Vec<CustomDefect>>,
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| parse_timestamp(&value).map_err(serde::de::Error::custom))
        .transpose()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|err| format!("failed to parse '{raw}' as a timestamp ({err})"))
}

/// Severity buckets a defect can be recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefectSeverity {
    Dangerous,
    Major,
    Minor,
    Advisory,
}

impl DefectSeverity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dangerous" => Some(Self::Dangerous),
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            "advisory" => Some(Self::Advisory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRecord {
    #[serde(default)]
    pub im_number: Option<u32>,
    #[serde(default)]
    pub im_description: Option<String>,
    #[serde(default)]
    pub item_number: Option<u32>,
    #[serde(default)]
    pub item_description: Option<String>,
    pub deficiency_ref: String,
    pub deficiency_category: String,
    #[serde(default)]
    pub deficiency_text: Option<String>,
    #[serde(default)]
    pub prs: bool,
    #[serde(default)]
    pub additional_information: AdditionalInformation,
}

impl DefectRecord {
    pub fn severity(&self) -> Option<DefectSeverity> {
        DefectSeverity::parse(&self.deficiency_category)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInformation {
    #[serde(default)]
    pub location: Option<DefectLocation>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectLocation {
    #[serde(default)]
    pub vertical: Option<String>,
    #[serde(default)]
    pub horizontal: Option<String>,
    #[serde(default)]
    pub lateral: Option<String>,
    #[serde(default)]
    pub longitudinal: Option<String>,
    #[serde(default)]
    pub row_number: Option<u32>,
    #[serde(default)]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub axle_number: Option<u32>,
}

/// Checklist entry attached to IVA and MSVA inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredStandard {
    #[serde(default)]
    pub section_number: String,
    #[serde(default)]
    pub section_description: String,
    #[serde(default)]
    pub rs_number: u32,
    #[serde(default)]
    pub required_standard: String,
    pub ref_calculation: String,
    #[serde(default)]
    pub additional_info: bool,
    #[serde(default)]
    pub inspection_types: Vec<String>,
    #[serde(default)]
    pub prs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDefect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    pub defect_name: String,
    #[serde(default)]
    pub defect_notes: String,
}

/// Position of a test unit among its siblings, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateOrder {
    pub current: usize,
    pub total: usize,
}

/// A single test type lifted out of its parent record.
#[derive(Debug, Clone, PartialEq)]
pub struct TestUnit {
    pub record: Arc<TestRecordHeader>,
    pub test_type: TestType,
    pub order: CertificateOrder,
}

impl TestUnit {
    pub fn result(&self) -> TestOutcome {
        self.test_type.test_result
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.record.vehicle_type
    }

    pub fn is_trailer(&self) -> bool {
        self.record.vehicle_type == VehicleType::Trl
    }

    pub fn test_type_id(&self) -> &str {
        &self.test_type.test_type_id
    }

    /// Trailer id for trailers, VRM otherwise.
    pub fn vehicle_number(&self) -> Option<&str> {
        if self.is_trailer() {
            self.record.trailer_id.as_deref()
        } else {
            self.record.vrm.as_deref()
        }
    }

    /// Tester name as printed on certificates; `Last, First` becomes `First Last`.
    pub fn issuer_name(&self) -> String {
        super::formatting::display_name(&self.record.tester_name)
    }
}
