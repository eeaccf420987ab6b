use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::catalog::TestTypeCatalog;
use super::classification::classify;
use super::defects::policy::{PrsPolicy, StandardPrsPolicy};
use super::delivery::{DocumentRenderer, GeneratedCertificate, RenderRequest};
use super::domain::TestUnit;
use super::flags::{FeatureFlagCache, FeatureFlagSnapshot};
use super::formatting::long_date;
use super::payload::{AssemblyContext, PayloadAssembler};
use super::processor::ProcessingError;
use super::reference::ReferenceData;
use super::templates::{document_name, file_name, template_name};

/// Test-station lookups are retried this many times before falling back to English.
pub const STATION_LOOKUP_ATTEMPTS: usize = 3;

/// Turns an eligible test unit into a rendered certificate.
pub struct CertificateGenerationService<D> {
    renderer: Arc<D>,
    reference: ReferenceData,
    flags: Arc<FeatureFlagCache>,
    catalog: Arc<TestTypeCatalog>,
    assembler: PayloadAssembler,
    prs_policy: Arc<dyn PrsPolicy>,
    document_directory: String,
}

impl<D> CertificateGenerationService<D>
where
    D: DocumentRenderer + 'static,
{
    pub fn new(
        renderer: Arc<D>,
        reference: ReferenceData,
        flags: Arc<FeatureFlagCache>,
        catalog: Arc<TestTypeCatalog>,
        document_directory: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            reference,
            flags,
            catalog,
            assembler: PayloadAssembler::standard(),
            prs_policy: Arc::new(StandardPrsPolicy),
            document_directory: document_directory.into(),
        }
    }

    pub fn with_prs_policy(mut self, policy: Arc<dyn PrsPolicy>) -> Self {
        self.prs_policy = policy;
        self
    }

    pub(crate) fn flags(&self) -> &FeatureFlagCache {
        &self.flags
    }

    pub(crate) fn catalog(&self) -> &TestTypeCatalog {
        &self.catalog
    }

    pub async fn generate(&self, unit: &TestUnit) -> Result<GeneratedCertificate, ProcessingError> {
        let flags = self.flags.effective().await;
        let welsh = self.should_translate(unit, &flags).await;
        let abandoned_enabled = flags.abandoned_certificates_enabled();

        let category = classify(unit, &self.catalog);
        let template = template_name(unit, &self.catalog, welsh, abandoned_enabled);
        let document = document_name(&template)
            .ok_or_else(|| ProcessingError::UnknownTemplate(template.clone()))?;

        debug!(
            test_number = %unit.test_type.test_number,
            category = category.label(),
            template = %template,
            welsh,
            "resolved certificate template"
        );

        let context = AssemblyContext {
            unit,
            category,
            welsh,
            catalog: &self.catalog,
            reference: &self.reference,
            prs_policy: self.prs_policy.as_ref(),
        };
        let payload = self.assembler.assemble(&context).await?;

        let request = RenderRequest {
            document_name: document.to_string(),
            document_directory: self.document_directory.clone(),
            payload,
        };
        let certificate = self.renderer.render(&request).await?;

        info!(
            test_number = %unit.test_type.test_number,
            document,
            order = unit.order.current,
            of = unit.order.total,
            "certificate rendered"
        );

        let record = &unit.record;
        Ok(GeneratedCertificate {
            test_result_id: record.test_result_id.clone(),
            file_name: file_name(unit),
            vrm: unit.vehicle_number().map(str::to_string),
            test_type_name: unit.test_type.test_type_name.clone(),
            test_type_result: unit.result(),
            date_of_issue: long_date(&unit.test_type.test_type_start_timestamp),
            certificate_type: document
                .split('.')
                .next()
                .unwrap_or(document)
                .to_string(),
            file_format: "pdf".to_string(),
            file_size: certificate.len().to_string(),
            certificate_order: unit.order,
            email: record
                .created_by_email_address
                .clone()
                .or_else(|| record.tester_email_address.clone()),
            should_email_certificate: record
                .should_email_certificate
                .clone()
                .unwrap_or_else(|| "true".to_string()),
            certificate,
        })
    }

    /// Welsh output needs the master switch, the result switch and a station in Wales.
    pub async fn should_translate(&self, unit: &TestUnit, flags: &FeatureFlagSnapshot) -> bool {
        if !flags.welsh_enabled_for(unit.result()) {
            return false;
        }
        self.is_station_welsh(&unit.record.test_station_p_number)
            .await
    }

    async fn is_station_welsh(&self, p_number: &str) -> bool {
        for attempt in 1..=STATION_LOOKUP_ATTEMPTS {
            match self.reference.stations.station(p_number).await {
                Ok(station) => {
                    debug!(
                        p_number,
                        country = station.test_station_country.as_deref().unwrap_or("unknown"),
                        "resolved test station country"
                    );
                    return station.is_welsh();
                }
                Err(err) => warn!(
                    p_number,
                    attempt,
                    error = %err,
                    "failed to retrieve test station"
                ),
            }
        }

        error!(p_number, "test station details unavailable, issuing english certificate");
        false
    }
}
