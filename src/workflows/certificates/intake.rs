use std::sync::Arc;

use super::catalog::TestTypeCatalog;
use super::domain::{
    CertificateOrder, CompositeTestRecord, TestOutcome, TestStatus, TestUnit,
    ANNUAL_WITH_CERTIFICATE, IVA_WITH_CERTIFICATE, MSVA_WITH_CERTIFICATE,
};
use super::flags::FeatureFlagSnapshot;

/// Splits a composite record into one unit per test type, preserving input order.
///
/// A record whose `testTypes` was not a sequence yields no units.
pub fn expand_record(record: &CompositeTestRecord) -> Vec<TestUnit> {
    let Some(test_types) = record.test_types.as_ref() else {
        return Vec::new();
    };

    let header = Arc::new(record.header.clone());
    let total = test_types.len();

    test_types
        .iter()
        .enumerate()
        .map(|(index, test_type)| TestUnit {
            record: Arc::clone(&header),
            test_type: test_type.clone(),
            order: CertificateOrder {
                current: index + 1,
                total,
            },
        })
        .collect()
}

/// Whether a certificate has to be produced for the unit.
pub fn is_eligible(
    unit: &TestUnit,
    flags: &FeatureFlagSnapshot,
    catalog: &TestTypeCatalog,
) -> bool {
    if unit.record.test_status != TestStatus::Submitted {
        return false;
    }

    let test_type = &unit.test_type;
    let result = test_type.test_result;

    if result == TestOutcome::Abandoned {
        return flags.abandoned_certificates_enabled()
            && catalog.is_abandoned_eligible(&test_type.test_type_id);
    }

    if !result.is_certifiable() {
        return false;
    }

    match test_type.test_type_classification.as_str() {
        ANNUAL_WITH_CERTIFICATE => true,
        IVA_WITH_CERTIFICATE | MSVA_WITH_CERTIFICATE => {
            result == TestOutcome::Fail
                && test_type
                    .required_standards
                    .as_ref()
                    .is_some_and(|standards| !standards.is_empty())
        }
        _ => false,
    }
}

pub fn eligible_units(
    units: Vec<TestUnit>,
    flags: &FeatureFlagSnapshot,
    catalog: &TestTypeCatalog,
) -> Vec<TestUnit> {
    units
        .into_iter()
        .filter(|unit| is_eligible(unit, flags, catalog))
        .collect()
}
