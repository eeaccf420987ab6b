//! Template names, the documents they map to, and certificate file names.

use super::catalog::TestTypeCatalog;
use super::domain::{TestOutcome, TestUnit};

/// Renderer template for a unit, e.g. `psv_pass`, `rwt` or `hgv_prs_bilingual`.
pub fn template_name(
    unit: &TestUnit,
    catalog: &TestTypeCatalog,
    welsh: bool,
    abandoned_enabled: bool,
) -> String {
    let vehicle_type = unit.vehicle_type();
    let result = unit.result();
    let test_type_id = unit.test_type_id();

    if result == TestOutcome::Abandoned
        && abandoned_enabled
        && catalog.is_abandoned_eligible(test_type_id)
    {
        return format!("{}_abandoned", vehicle_type.label());
    }
    if catalog.is_roadworthiness(test_type_id) {
        return "rwt".to_string();
    }
    if catalog.is_adr(test_type_id) {
        return "adr_pass".to_string();
    }
    if result == TestOutcome::Fail && catalog.is_iva(test_type_id) {
        return "iva_fail".to_string();
    }
    if result == TestOutcome::Fail && catalog.is_msva(test_type_id) {
        return "msva_fail".to_string();
    }
    if welsh && catalog.has_welsh_certificate(vehicle_type, result) {
        return format!("{}_{}_bilingual", vehicle_type.label(), result.label());
    }

    format!("{}_{}", vehicle_type.label(), result.label())
}

/// Document the renderer fills for a template; `None` for templates without one.
pub fn document_name(template: &str) -> Option<&'static str> {
    let document = match template {
        "psv_pass" => "VTP20.pdf",
        "psv_pass_bilingual" => "VTP20_BILINGUAL.pdf",
        "psv_fail" => "VTP30.pdf",
        "psv_fail_bilingual" => "VTP30_BILINGUAL.pdf",
        "psv_prs" => "PSV_PRS.pdf",
        "psv_prs_bilingual" => "PSV_PRS_BILINGUAL.pdf",
        "hgv_pass" => "VTG5.pdf",
        "hgv_pass_bilingual" => "VTG5_BILINGUAL.pdf",
        "hgv_fail" | "trl_fail" => "VTG30.pdf",
        "hgv_fail_bilingual" | "trl_fail_bilingual" => "VTG30_BILINGUAL.pdf",
        "hgv_prs" => "HGV_PRS.pdf",
        "hgv_prs_bilingual" => "HGV_PRS_BILINGUAL.pdf",
        "trl_pass" => "VTG5A.pdf",
        "trl_pass_bilingual" => "VTG5A_BILINGUAL.pdf",
        "trl_prs" => "TRL_PRS.pdf",
        "trl_prs_bilingual" => "TRL_PRS_BILINGUAL.pdf",
        "rwt" => "RWT.pdf",
        "adr_pass" => "ADR_PASS.pdf",
        "iva_fail" => "IVA30.pdf",
        "msva_fail" => "MSVA30.pdf",
        "psv_abandoned" => "VTP12.pdf",
        "hgv_abandoned" | "trl_abandoned" => "VTG12.pdf",
        _ => return None,
    };
    Some(document)
}

pub fn file_name(unit: &TestUnit) -> String {
    let test_number = &unit.test_type.test_number;

    if unit.result() == TestOutcome::Abandoned {
        let prefix = if unit.vehicle_type().is_heavy_goods() {
            "VTG12"
        } else {
            "VTP12"
        };
        return format!("{prefix}_{test_number}.pdf");
    }

    format!("{test_number}_{}.pdf", unit.record.vin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_welsh_certificate_has_a_bilingual_document() {
        for vehicle_type in ["psv", "hgv", "trl"] {
            for result in ["pass", "fail", "prs"] {
                let template = format!("{vehicle_type}_{result}_bilingual");
                assert!(
                    document_name(&template).is_some(),
                    "{template} has no document"
                );
            }
        }
    }

    #[test]
    fn unknown_templates_have_no_document() {
        assert_eq!(document_name("car_pass"), None);
        assert_eq!(document_name("rwt"), Some("RWT.pdf"));
    }
}
