use super::AssemblyContext;
use crate::workflows::certificates::formatting::{dotted_date, split_sentences};
use crate::workflows::certificates::payload::{AbandonedData, CertificatePayload};

pub(super) fn generate(context: &AssemblyContext<'_>) -> CertificatePayload {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;

    // Trailer id or VRM, falling back to the VIN when the identifier was not captured.
    let registration_number = unit
        .vehicle_number()
        .filter(|number| !number.trim().is_empty())
        .unwrap_or(&record.vin)
        .to_string();

    let reasons_for_refusal = test_type
        .reason_for_abandoning
        .as_deref()
        .map(split_sentences)
        .unwrap_or_default();

    CertificatePayload {
        abandoned_data: Some(AbandonedData {
            registration_number,
            reasons_for_refusal,
            additional_comments: test_type.additional_comments_for_abandon.clone(),
            issuers_name: unit.issuer_name(),
            test_station_name: record.test_station_name.clone(),
            test_station_p_number: record.test_station_p_number.clone(),
            date_of_the_test: dotted_date(&record.test_end_timestamp),
        }),
        ..CertificatePayload::default()
    }
}
