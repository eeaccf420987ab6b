use chrono::{DateTime, Datelike, Months, Utc};
use tracing::{debug, warn};

use super::{per_section, AssemblyContext, GenerationError, Generator};
use crate::workflows::certificates::defects::translation::TranslationIndex;
use crate::workflows::certificates::defects::{categorize, CategorizedDefectSet, DefectContext};
use crate::workflows::certificates::domain::{
    TestOutcome, TestStatus, TestUnit, ANNUAL_WITH_CERTIFICATE,
};
use crate::workflows::certificates::formatting::dotted_date;
use crate::workflows::certificates::payload::{
    CertificateData, CertificatePayload, OdometerHistoryEntry, OdometerReading, TestDetails,
};
use crate::workflows::certificates::reference::{HistoricTestResult, LookupError};

const HISTORY_LIMIT: usize = 3;

pub(super) fn test_details(context: &AssemblyContext<'_>) -> CertificatePayload {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;

    let details = TestDetails {
        test_number: test_type.test_number.clone(),
        test_station_p_number: record.test_station_p_number.clone(),
        test_station_name: record.test_station_name.clone(),
        current_odometer: OdometerReading {
            value: record.odometer_reading,
            unit: record.odometer_reading_units.clone(),
        },
        issuers_name: unit.issuer_name(),
        date_of_the_test: dotted_date(&record.test_end_timestamp),
        country_of_registration_code: record.country_of_registration.clone(),
        vehicle_eu_classification: record
            .eu_vehicle_category
            .as_ref()
            .map(|category| category.to_uppercase()),
        raw_vin: record.vin.clone(),
        raw_vrm: unit.vehicle_number().map(str::to_string),
        expiry_date: test_type.test_expiry_date.as_ref().map(dotted_date),
        earliest_date_of_the_next_test: earliest_next_test(unit),
        seat_belt_tested: test_type
            .seatbelt_installation_check_date
            .map(|tested| (if tested { "Yes" } else { "No" }).to_string()),
        seat_belt_previous_check_date: test_type
            .last_seatbelt_installation_check_date
            .as_ref()
            .map(dotted_date),
        seat_belt_number: test_type.number_of_seatbelts_fitted,
    };

    per_section(unit.result(), |_| CertificateData {
        test_details: Some(details.clone()),
        ..CertificateData::default()
    })
}

/// Goods vehicles that passed may be presented from the first day of the month before
/// their anniversary; everything else prints the anniversary itself.
fn earliest_next_test(unit: &TestUnit) -> Option<String> {
    let anniversary = unit.test_type.test_anniversary_date?;
    let passed = matches!(unit.result(), TestOutcome::Pass | TestOutcome::Prs);

    if unit.vehicle_type().is_heavy_goods() && passed {
        let earliest = anniversary
            .checked_sub_months(Months::new(1))
            .and_then(|date| date.with_day(1))?;
        return Some(dotted_date(&earliest));
    }

    Some(dotted_date(&anniversary))
}

pub(super) async fn defects(context: &AssemblyContext<'_>) -> CertificatePayload {
    let unit = context.unit;
    let translations = if context.welsh {
        load_translations(context).await
    } else {
        TranslationIndex::default()
    };

    per_section(unit.result(), |section| {
        let defect_context = DefectContext {
            section,
            result: unit.result(),
            vehicle_type: unit.vehicle_type(),
            welsh: context.welsh,
            translations: &translations,
            policy: context.prs_policy,
        };
        let set = CategorizedDefectSet::fold(
            unit.test_type
                .defects
                .iter()
                .map(|defect| categorize(defect, &defect_context)),
        );

        CertificateData {
            defects: (!set.is_empty()).then_some(set),
            ..CertificateData::default()
        }
    })
}

async fn load_translations(context: &AssemblyContext<'_>) -> TranslationIndex {
    match context.reference.defects.defects().await {
        Ok(catalogue) => {
            let index = TranslationIndex::from_catalogue(&catalogue);
            debug!(entries = index.len(), "loaded defect translations");
            index
        }
        Err(err) => {
            warn!(error = %err, "defect translations unavailable, welsh defects omitted");
            TranslationIndex::default()
        }
    }
}

pub(super) async fn make_and_model(
    context: &AssemblyContext<'_>,
) -> Result<CertificatePayload, GenerationError> {
    let unit = context.unit;
    let make_and_model = context
        .reference
        .tech_records
        .make_and_model(unit)
        .await
        .map_err(GenerationError::lookup(Generator::MakeAndModel))?;

    let trailer_registration = if unit.is_trailer() && !make_and_model.make.trim().is_empty() {
        match context
            .reference
            .trailers
            .registration(&unit.record.vin, &make_and_model.make)
            .await
        {
            Ok(registration) => registration,
            Err(err) => {
                warn!(
                    vin = %unit.record.vin,
                    error = %err,
                    "trailer registration lookup failed, continuing without it"
                );
                None
            }
        }
    } else {
        None
    };

    Ok(per_section(unit.result(), |_| CertificateData {
        make_and_model: Some(make_and_model.clone()),
        trailer_registration: trailer_registration.clone(),
        ..CertificateData::default()
    }))
}

pub(super) async fn odometer_history(
    context: &AssemblyContext<'_>,
) -> Result<CertificatePayload, GenerationError> {
    let unit = context.unit;
    let system_number = &unit.record.system_number;

    let results = context
        .reference
        .history
        .test_results(system_number)
        .await
        .map_err(GenerationError::lookup(Generator::OdometerHistory))?;

    if results.is_empty() {
        return Err(GenerationError::lookup(Generator::OdometerHistory)(
            LookupError::BadData {
                service: "test results",
                reason: format!("no test results returned for system number {system_number}"),
            },
        ));
    }

    let entries = odometer_entries(results, unit.record.test_end_timestamp);

    Ok(per_section(unit.result(), |_| CertificateData {
        odometer_history: Some(entries.clone()),
        ..CertificateData::default()
    }))
}

/// Latest readings from submitted tests that ended before `before` and carried an annual
/// certificate with a pass or PRS result, newest first.
pub fn odometer_entries(
    mut results: Vec<HistoricTestResult>,
    before: DateTime<Utc>,
) -> Vec<OdometerHistoryEntry> {
    results.retain(|result| {
        result.test_end_timestamp < before
            && result.test_status == TestStatus::Submitted
            && result.test_types.iter().any(|test_type| {
                test_type.test_type_classification == ANNUAL_WITH_CERTIFICATE
                    && matches!(test_type.test_result, TestOutcome::Pass | TestOutcome::Prs)
            })
    });
    results.sort_by(|left, right| right.test_end_timestamp.cmp(&left.test_end_timestamp));

    results
        .into_iter()
        .take(HISTORY_LIMIT)
        .map(|result| OdometerHistoryEntry {
            value: result.odometer_reading,
            unit: result.odometer_reading_units,
            date: dotted_date(&result.test_end_timestamp),
        })
        .collect()
}
