use super::common::*;
use serde_json::json;

use crate::workflows::certificates::domain::IVA_WITH_CERTIFICATE;
use crate::workflows::certificates::templates::{document_name, file_name, template_name};
use crate::workflows::certificates::{classify, CertificateCategory, TestTypeCatalog};

fn category(vehicle_type: &str, id: &str, result: &str) -> CertificateCategory {
    let unit = first_unit(record_value(vehicle_type, vec![test_type_value(id, result)]));
    classify(&unit, &TestTypeCatalog::standard())
}

#[test]
fn annual_results_split_into_pass_and_fail() {
    assert_eq!(category("psv", "1", "pass"), CertificateCategory::Pass);
    assert_eq!(category("psv", "1", "fail"), CertificateCategory::Fail);
    assert_eq!(category("hgv", "1", "prs"), CertificateCategory::Fail);
}

#[test]
fn earlier_rules_win() {
    assert_eq!(category("psv", "1", "abandoned"), CertificateCategory::Abandoned);
    assert_eq!(category("trl", "62", "pass"), CertificateCategory::Rwt);
    assert_eq!(category("psv", "62", "pass"), CertificateCategory::Pass);
    assert_eq!(category("hgv", "50", "pass"), CertificateCategory::Adr);
    assert_eq!(category("hgv", "50", "fail"), CertificateCategory::Fail);
    assert_eq!(category("car", "125", "fail"), CertificateCategory::Iva);
    assert_eq!(category("car", "133", "fail"), CertificateCategory::Msva);
}

#[test]
fn templates_follow_category_and_language() {
    let catalog = TestTypeCatalog::standard();

    let pass = first_unit(annual_record("psv", "pass"));
    assert_eq!(template_name(&pass, &catalog, false, false), "psv_pass");
    assert_eq!(template_name(&pass, &catalog, true, false), "psv_pass_bilingual");

    let prs = first_unit(annual_record("hgv", "prs"));
    let template = template_name(&prs, &catalog, true, false);
    assert_eq!(template, "hgv_prs_bilingual");
    assert_eq!(document_name(&template), Some("HGV_PRS_BILINGUAL.pdf"));

    let trailer = first_unit(annual_record("trl", "pass"));
    assert_eq!(
        document_name(&template_name(&trailer, &catalog, false, false)),
        Some("VTG5A.pdf")
    );

    let car = first_unit(annual_record("car", "pass"));
    let template = template_name(&car, &catalog, true, false);
    assert_eq!(template, "car_pass");
    assert_eq!(document_name(&template), None);
}

#[test]
fn special_templates_ignore_language() {
    let catalog = TestTypeCatalog::standard();

    let rwt = first_unit(record_value("hgv", vec![test_type_value("63", "fail")]));
    assert_eq!(template_name(&rwt, &catalog, true, false), "rwt");

    let adr = first_unit(record_value("hgv", vec![test_type_value("59", "pass")]));
    assert_eq!(template_name(&adr, &catalog, true, false), "adr_pass");

    let mut iva = test_type_value("125", "fail");
    iva["testTypeClassification"] = json!(IVA_WITH_CERTIFICATE);
    let iva = first_unit(record_value("car", vec![iva]));
    assert_eq!(template_name(&iva, &catalog, true, false), "iva_fail");
}

#[test]
fn abandoned_trailers_use_the_goods_document() {
    let catalog = TestTypeCatalog::standard();
    let unit = first_unit(annual_record("trl", "abandoned"));

    let template = template_name(&unit, &catalog, false, true);
    assert_eq!(template, "trl_abandoned");
    assert_eq!(document_name(&template), Some("VTG12.pdf"));
    assert_eq!(file_name(&unit), "VTG12_W01A00310.pdf");
}

#[test]
fn annual_file_names_combine_test_number_and_vin() {
    let unit = first_unit(annual_record("psv", "pass"));
    assert_eq!(file_name(&unit), format!("W01A00310_{VIN}.pdf"));
}
