//! Certificate payload sections and the assembler that fills them.

pub mod generators;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

pub use self::generators::{odometer_entries, AssemblyContext, GenerationError, Generator};
use super::defects::CategorizedDefectSet;
use super::domain::{CustomDefect, RequiredStandard, TestOutcome};
use super::reference::{AdrDetails, MakeAndModel, TrailerRegistration};

/// Which annual certificate page a PASS/FAIL generator writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadSection {
    Data,
    FailData,
}

impl PayloadSection {
    /// `DATA` unless the test failed, `FAIL_DATA` unless it passed.
    pub fn for_result(result: TestOutcome) -> Vec<PayloadSection> {
        let mut sections = Vec::with_capacity(2);
        if result != TestOutcome::Fail {
            sections.push(PayloadSection::Data);
        }
        if result != TestOutcome::Pass {
            sections.push(PayloadSection::FailData);
        }
        sections
    }
}

/// Document body handed to the renderer; absent sections are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CertificatePayload {
    #[serde(rename = "DATA", skip_serializing_if = "Option::is_none")]
    pub data: Option<CertificateData>,
    #[serde(rename = "FAIL_DATA", skip_serializing_if = "Option::is_none")]
    pub fail_data: Option<CertificateData>,
    #[serde(rename = "RWT_DATA", skip_serializing_if = "Option::is_none")]
    pub rwt_data: Option<RwtData>,
    #[serde(rename = "ADR_DATA", skip_serializing_if = "Option::is_none")]
    pub adr_data: Option<AdrData>,
    #[serde(rename = "IVA_DATA", skip_serializing_if = "Option::is_none")]
    pub iva_data: Option<IvaData>,
    #[serde(rename = "MSVA_DATA", skip_serializing_if = "Option::is_none")]
    pub msva_data: Option<MsvaData>,
    #[serde(rename = "ABANDONED_DATA", skip_serializing_if = "Option::is_none")]
    pub abandoned_data: Option<AbandonedData>,
}

impl CertificatePayload {
    /// Payload carrying only the given annual section.
    pub fn with_section(section: PayloadSection, data: CertificateData) -> Self {
        let mut payload = Self::default();
        *payload.section_mut(section) = Some(data);
        payload
    }

    pub fn section(&self, section: PayloadSection) -> Option<&CertificateData> {
        match section {
            PayloadSection::Data => self.data.as_ref(),
            PayloadSection::FailData => self.fail_data.as_ref(),
        }
    }

    fn section_mut(&mut self, section: PayloadSection) -> &mut Option<CertificateData> {
        match section {
            PayloadSection::Data => &mut self.data,
            PayloadSection::FailData => &mut self.fail_data,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combines two partial payloads. Generators write disjoint keys, so for any key at
    /// most one side is populated.
    pub fn merge(self, other: Self) -> Self {
        Self {
            data: merge_data(self.data, other.data),
            fail_data: merge_data(self.fail_data, other.fail_data),
            rwt_data: self.rwt_data.or(other.rwt_data),
            adr_data: self.adr_data.or(other.adr_data),
            iva_data: self.iva_data.or(other.iva_data),
            msva_data: self.msva_data.or(other.msva_data),
            abandoned_data: self.abandoned_data.or(other.abandoned_data),
        }
    }
}

fn merge_data(
    left: Option<CertificateData>,
    right: Option<CertificateData>,
) -> Option<CertificateData> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left.merge(right)),
        (left, right) => left.or(right),
    }
}

/// Contents of an annual certificate page (`DATA` or `FAIL_DATA`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CertificateData {
    #[serde(flatten)]
    pub test_details: Option<TestDetails>,
    #[serde(flatten)]
    pub defects: Option<CategorizedDefectSet>,
    #[serde(flatten)]
    pub make_and_model: Option<MakeAndModel>,
    #[serde(flatten)]
    pub trailer_registration: Option<TrailerRegistration>,
    #[serde(rename = "OdometerHistoryList", skip_serializing_if = "Option::is_none")]
    pub odometer_history: Option<Vec<OdometerHistoryEntry>>,
}

impl CertificateData {
    pub fn merge(self, other: Self) -> Self {
        Self {
            test_details: self.test_details.or(other.test_details),
            defects: self.defects.or(other.defects),
            make_and_model: self.make_and_model.or(other.make_and_model),
            trailer_registration: self.trailer_registration.or(other.trailer_registration),
            odometer_history: self.odometer_history.or(other.odometer_history),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OdometerReading {
    pub value: Option<u32>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OdometerHistoryEntry {
    pub value: Option<u32>,
    pub unit: Option<String>,
    pub date: String,
}

/// Core fields printed on every annual certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestDetails {
    pub test_number: String,
    pub test_station_p_number: String,
    pub test_station_name: String,
    pub current_odometer: OdometerReading,
    pub issuers_name: String,
    pub date_of_the_test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_registration_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_eu_classification: Option<String>,
    #[serde(rename = "RawVIN")]
    pub raw_vin: String,
    #[serde(rename = "RawVRM", skip_serializing_if = "Option::is_none")]
    pub raw_vrm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_date_of_the_next_test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_belt_tested: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_belt_previous_check_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_belt_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RwtData {
    pub dgvw: u32,
    pub weight2: u32,
    pub vehicle_number: String,
    pub vin: String,
    pub issuers_name: String,
    pub date_of_inspection: String,
    pub test_station_p_number: String,
    pub document_number: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defects: Option<Vec<String>>,
    pub is_trailer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdrData {
    pub chasis_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(flatten)]
    pub make_and_model: MakeAndModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adr_details: Option<AdrDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    pub atf_name_atf_p_number: String,
    pub test_type_date: String,
}

/// Free-text defect raised during a vehicle approval inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDefect {
    pub defect_name: String,
    pub defect_notes: String,
}

impl ApprovalDefect {
    /// Placeholder printed when the inspection recorded no custom defects.
    pub fn placeholder() -> Self {
        Self {
            defect_name: "N/A".to_string(),
            defect_notes: String::new(),
        }
    }

    pub fn list(custom_defects: Option<&[CustomDefect]>) -> Vec<ApprovalDefect> {
        match custom_defects {
            Some(defects) if !defects.is_empty() => defects
                .iter()
                .map(|defect| ApprovalDefect {
                    defect_name: defect.defect_name.clone(),
                    defect_notes: defect.defect_notes.clone(),
                })
                .collect(),
            _ => vec![Self::placeholder()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IvaData {
    pub vin: String,
    pub serial_number: Option<String>,
    pub vehicle_trailer_nr_no: Option<String>,
    pub test_category_class: Option<String>,
    pub test_category_basic_normal: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub body_type: Option<String>,
    pub date: String,
    pub tester_name: String,
    pub reapplication_date: String,
    pub station: String,
    pub additional_defects: Vec<ApprovalDefect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_standards: Option<Vec<RequiredStandard>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsvaData {
    pub vin: String,
    pub serial_number: Option<String>,
    pub vehicle_z_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub tester_name: String,
    pub date: String,
    pub reapplication_date: String,
    pub station: String,
    pub additional_defects: Vec<ApprovalDefect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_standards: Option<Vec<RequiredStandard>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AbandonedData {
    pub registration_number: String,
    pub reasons_for_refusal: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,
    pub issuers_name: String,
    pub test_station_name: String,
    pub test_station_p_number: String,
    pub date_of_the_test: String,
}

/// Runs the registered generators for a unit and merges their partial payloads.
#[derive(Debug, Clone)]
pub struct PayloadAssembler {
    generators: Vec<Generator>,
}

impl PayloadAssembler {
    pub fn standard() -> Self {
        Self {
            generators: Generator::ALL.to_vec(),
        }
    }

    /// Generators run concurrently; the first failure fails the whole assembly.
    pub async fn assemble(
        &self,
        context: &AssemblyContext<'_>,
    ) -> Result<CertificatePayload, GenerationError> {
        let applicable: Vec<Generator> = self
            .generators
            .iter()
            .copied()
            .filter(|generator| generator.applies(context.category, context.unit))
            .collect();

        debug!(
            category = context.category.label(),
            generators = ?applicable,
            "assembling certificate payload"
        );

        let parts = try_join_all(
            applicable
                .iter()
                .map(|generator| generator.generate(context)),
        )
        .await?;

        Ok(parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .fold(CertificatePayload::default(), CertificatePayload::merge))
    }
}

impl Default for PayloadAssembler {
    fn default() -> Self {
        Self::standard()
    }
}
