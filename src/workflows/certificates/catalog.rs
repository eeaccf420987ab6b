use std::collections::BTreeSet;

use super::domain::{TestOutcome, VehicleType};

/// Test-type id lists that drive eligibility, classification and template choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTypeCatalog {
    abandoned_eligible: BTreeSet<String>,
    roadworthiness: BTreeSet<String>,
    adr: BTreeSet<String>,
    iva: BTreeSet<String>,
    basic_iva: BTreeSet<String>,
    msva: BTreeSet<String>,
    welsh_certificates: BTreeSet<String>,
}

fn id_set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

impl TestTypeCatalog {
    /// Catalogue matching the test types issued by DVSA test stations.
    pub fn standard() -> Self {
        Self {
            abandoned_eligible: id_set(&[
                "1", "3", "4", "7", "8", "10", "14", "18", "21", "27", "28", "93", "94", "95",
                "40", "53", "54", "65", "66", "70", "76", "79", "82", "83",
            ]),
            roadworthiness: id_set(&["62", "63", "91", "101", "122"]),
            adr: id_set(&["50", "59", "60"]),
            iva: id_set(&[
                "125", "126", "128", "129", "130", "154", "158", "159", "185", "186", "187",
                "188", "189", "190", "191", "192", "193", "194", "195", "196", "197",
            ]),
            basic_iva: id_set(&["125", "129", "154", "158", "159", "185"]),
            msva: id_set(&[
                "133", "134", "135", "136", "138", "139", "140", "166", "167", "169", "170",
                "172", "173",
            ]),
            welsh_certificates: id_set(&[
                "hgv_pass", "trl_pass", "psv_pass", "hgv_fail", "trl_fail", "psv_fail",
                "hgv_prs", "trl_prs", "psv_prs",
            ]),
        }
    }

    pub fn is_abandoned_eligible(&self, test_type_id: &str) -> bool {
        self.abandoned_eligible.contains(test_type_id)
    }

    pub fn is_roadworthiness(&self, test_type_id: &str) -> bool {
        self.roadworthiness.contains(test_type_id)
    }

    pub fn is_adr(&self, test_type_id: &str) -> bool {
        self.adr.contains(test_type_id)
    }

    pub fn is_iva(&self, test_type_id: &str) -> bool {
        self.iva.contains(test_type_id)
    }

    pub fn is_basic_iva(&self, test_type_id: &str) -> bool {
        self.basic_iva.contains(test_type_id)
    }

    pub fn is_msva(&self, test_type_id: &str) -> bool {
        self.msva.contains(test_type_id)
    }

    /// Whether a bilingual document exists for the vehicle type and result pair.
    pub fn has_welsh_certificate(&self, vehicle_type: VehicleType, result: TestOutcome) -> bool {
        let key = format!("{}_{}", vehicle_type.label(), result.label());
        self.welsh_certificates.contains(&key)
    }
}

impl Default for TestTypeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
