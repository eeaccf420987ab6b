use super::{AssemblyContext, GenerationError, Generator};
use crate::workflows::certificates::formatting::dotted_date;
use crate::workflows::certificates::payload::{AdrData, CertificatePayload};

pub(super) async fn generate(
    context: &AssemblyContext<'_>,
) -> Result<CertificatePayload, GenerationError> {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;
    let tech_records = &context.reference.tech_records;

    let (make_and_model, adr_details) =
        futures::try_join!(tech_records.make_and_model(unit), tech_records.adr_details(unit))
            .map_err(GenerationError::lookup(Generator::Adr))?;

    Ok(CertificatePayload {
        adr_data: Some(AdrData {
            chasis_number: record.vin.clone(),
            registration_number: unit.vehicle_number().map(str::to_string),
            make_and_model,
            adr_details,
            expiry_date: test_type.test_expiry_date.as_ref().map(dotted_date),
            certificate_number: test_type.certificate_number.clone(),
            atf_name_atf_p_number: format!(
                "{} {}",
                record.test_station_name, record.test_station_p_number
            ),
            test_type_date: dotted_date(&test_type.test_type_start_timestamp),
        }),
        ..CertificatePayload::default()
    })
}
