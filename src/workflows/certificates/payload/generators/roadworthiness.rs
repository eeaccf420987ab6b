use super::{AssemblyContext, GenerationError, Generator};
use crate::workflows::certificates::defects::translation::format_defect;
use crate::workflows::certificates::domain::TestOutcome;
use crate::workflows::certificates::formatting::dotted_date;
use crate::workflows::certificates::payload::{CertificatePayload, RwtData};

pub(super) async fn generate(
    context: &AssemblyContext<'_>,
) -> Result<CertificatePayload, GenerationError> {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;

    let weights = context
        .reference
        .tech_records
        .weight_details(unit)
        .await
        .map_err(GenerationError::lookup(Generator::Roadworthiness))?;

    let defects: Option<Vec<String>> = (unit.result() == TestOutcome::Fail)
        .then(|| test_type.defects.iter().map(format_defect).collect());
    let inspected = dotted_date(&test_type.test_type_start_timestamp);

    Ok(CertificatePayload {
        rwt_data: Some(RwtData {
            dgvw: weights.dgvw,
            weight2: weights.weight2,
            vehicle_number: unit.vehicle_number().unwrap_or_default().to_string(),
            vin: record.vin.clone(),
            issuers_name: unit.issuer_name(),
            date_of_inspection: inspected.clone(),
            test_station_p_number: record.test_station_p_number.clone(),
            document_number: test_type.certificate_number.clone().unwrap_or_default(),
            date: inspected,
            defects,
            is_trailer: unit.is_trailer(),
        }),
        ..CertificatePayload::default()
    })
}
