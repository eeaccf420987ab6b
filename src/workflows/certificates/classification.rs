use serde::{Deserialize, Serialize};

use super::catalog::TestTypeCatalog;
use super::domain::{TestOutcome, TestUnit};

/// Certificate family a unit is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateCategory {
    Pass,
    Fail,
    Rwt,
    Adr,
    Iva,
    Msva,
    Abandoned,
}

impl CertificateCategory {
    pub const fn label(self) -> &'static str {
        match self {
            CertificateCategory::Pass => "PASS",
            CertificateCategory::Fail => "FAIL",
            CertificateCategory::Rwt => "RWT",
            CertificateCategory::Adr => "ADR",
            CertificateCategory::Iva => "IVA",
            CertificateCategory::Msva => "MSVA",
            CertificateCategory::Abandoned => "ABANDONED",
        }
    }

    pub const fn is_annual(self) -> bool {
        matches!(self, CertificateCategory::Pass | CertificateCategory::Fail)
    }
}

/// First matching rule wins; the order below is significant.
pub fn classify(unit: &TestUnit, catalog: &TestTypeCatalog) -> CertificateCategory {
    let result = unit.result();
    let test_type_id = unit.test_type_id();

    if result == TestOutcome::Abandoned && catalog.is_abandoned_eligible(test_type_id) {
        return CertificateCategory::Abandoned;
    }

    if unit.vehicle_type().is_heavy_goods() && catalog.is_roadworthiness(test_type_id) {
        return CertificateCategory::Rwt;
    }

    if result == TestOutcome::Pass && catalog.is_adr(test_type_id) {
        return CertificateCategory::Adr;
    }

    if result == TestOutcome::Fail && catalog.is_iva(test_type_id) {
        return CertificateCategory::Iva;
    }

    if result == TestOutcome::Fail && catalog.is_msva(test_type_id) {
        return CertificateCategory::Msva;
    }

    if result != TestOutcome::Pass {
        return CertificateCategory::Fail;
    }

    CertificateCategory::Pass
}
