//! IVA and MSVA failure notices.

use super::AssemblyContext;
use crate::workflows::certificates::domain::{RequiredStandard, TestType};
use crate::workflows::certificates::formatting::{natural_cmp, slashed_date};
use crate::workflows::certificates::payload::{
    ApprovalDefect, CertificatePayload, IvaData, MsvaData,
};

const BASIC: &str = "Basic";
const NORMAL: &str = "Normal";

pub(super) fn iva(context: &AssemblyContext<'_>) -> CertificatePayload {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;
    let vehicle_number = unit.vehicle_number().map(str::to_string);

    let basic_normal = if context.catalog.is_basic_iva(unit.test_type_id()) {
        BASIC
    } else {
        NORMAL
    };

    CertificatePayload {
        iva_data: Some(IvaData {
            vin: record.vin.clone(),
            serial_number: vehicle_number.clone(),
            vehicle_trailer_nr_no: vehicle_number,
            test_category_class: record.eu_vehicle_category.clone(),
            test_category_basic_normal: basic_normal.to_string(),
            make: record.make.clone(),
            model: record.model.clone(),
            body_type: record
                .body_type
                .as_ref()
                .and_then(|body_type| body_type.description.clone()),
            date: slashed_date(&test_type.test_type_start_timestamp),
            tester_name: unit.issuer_name(),
            reapplication_date: reapplication_date(test_type),
            station: record.test_station_name.clone(),
            additional_defects: ApprovalDefect::list(test_type.custom_defects.as_deref()),
            required_standards: sorted_standards(test_type.required_standards.as_deref()),
        }),
        ..CertificatePayload::default()
    }
}

pub(super) fn msva(context: &AssemblyContext<'_>) -> CertificatePayload {
    let unit = context.unit;
    let record = &unit.record;
    let test_type = &unit.test_type;

    CertificatePayload {
        msva_data: Some(MsvaData {
            vin: record.vin.clone(),
            serial_number: record.vrm.clone(),
            vehicle_z_number: record.vrm.clone(),
            make: record.make.clone(),
            model: record.model.clone(),
            vehicle_type: unit.vehicle_type().label().to_string(),
            tester_name: unit.issuer_name(),
            date: slashed_date(&test_type.test_type_start_timestamp),
            reapplication_date: reapplication_date(test_type),
            station: record.test_station_name.clone(),
            additional_defects: ApprovalDefect::list(test_type.custom_defects.as_deref()),
            required_standards: sorted_standards(test_type.required_standards.as_deref()),
        }),
        ..CertificatePayload::default()
    }
}

fn reapplication_date(test_type: &TestType) -> String {
    test_type
        .reapplication_date
        .as_ref()
        .map(slashed_date)
        .unwrap_or_default()
}

/// Stable sort by `refCalculation`, numeric-aware and case-insensitive.
pub(crate) fn sorted_standards(
    standards: Option<&[RequiredStandard]>,
) -> Option<Vec<RequiredStandard>> {
    let mut standards = standards?.to_vec();
    standards.sort_by(|left, right| natural_cmp(&left.ref_calculation, &right.ref_calculation));
    Some(standards)
}
