use crate::config::ProcessingConfig;
use crate::error::AppError;
use crate::workflows::certificates::defects::translation::DefectParent;
use crate::workflows::certificates::reference::{
    AdrDetails, DefectCatalogue, HistoricTestResult, MakeAndModel, TechRecordService,
    TestResultHistory, TestStation, TestStationDirectory, TrailerRegistration, TrailerRegistry,
    WeightDetails,
};
use crate::workflows::certificates::{
    CertificateGenerationService, CertificateRequestProcessor, CertificateStore,
    DocumentRenderer, FeatureFlagCache, FeatureFlagSnapshot, GeneratedCertificate,
    LookupError, ProcessorSettings, ReferenceData, RemovalRequest, RenderError, RenderRequest,
    StaticFlagSource, StoreError, TestTypeCatalog, TestUnit,
};
use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type LocalProcessor =
    CertificateRequestProcessor<JsonDocumentRenderer, FilesystemCertificateStore>;

/// Reference data for local runs, read from a single JSON document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReferenceFixture {
    #[serde(default)]
    pub(crate) flags: FeatureFlagSnapshot,
    /// Keyed by VIN.
    #[serde(default)]
    pub(crate) vehicles: HashMap<String, VehicleFixture>,
    /// Trailer registration numbers keyed by VIN.
    #[serde(default)]
    pub(crate) trailers: HashMap<String, String>,
    #[serde(default)]
    pub(crate) stations: Vec<TestStation>,
    /// Keyed by system number.
    #[serde(default)]
    pub(crate) history: HashMap<String, Vec<HistoricTestResult>>,
    #[serde(default)]
    pub(crate) defects: Vec<DefectParent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VehicleFixture {
    #[serde(default)]
    pub(crate) make: Option<String>,
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) weights: Option<WeightDetails>,
    #[serde(default)]
    pub(crate) adr: Option<AdrDetails>,
}

pub(crate) async fn load_fixture(path: Option<&Path>) -> Result<ReferenceFixture, AppError> {
    let Some(path) = path else {
        debug!("no reference fixture configured, lookups will report missing records");
        return Ok(ReferenceFixture::default());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let fixture = serde_json::from_str(&raw).map_err(|err| LookupError::BadData {
        service: "reference fixture",
        reason: format!("{}: {err}", path.display()),
    })?;
    Ok(fixture)
}

#[derive(Debug, Clone)]
pub(crate) struct FixtureReferenceData {
    fixture: Arc<ReferenceFixture>,
}

impl FixtureReferenceData {
    pub(crate) fn new(fixture: Arc<ReferenceFixture>) -> Self {
        Self { fixture }
    }

    pub(crate) fn into_reference_data(self) -> ReferenceData {
        let shared = Arc::new(self);
        ReferenceData {
            tech_records: shared.clone(),
            trailers: shared.clone(),
            stations: shared.clone(),
            history: shared.clone(),
            defects: shared,
        }
    }

    fn vehicle(&self, unit: &TestUnit) -> Option<&VehicleFixture> {
        self.fixture.vehicles.get(&unit.record.vin)
    }
}

fn tech_record_missing(unit: &TestUnit) -> LookupError {
    LookupError::NotFound {
        service: "tech records",
        key: unit.record.vin.clone(),
    }
}

#[async_trait]
impl TechRecordService for FixtureReferenceData {
    /// Falls back to the make and model carried on the test record itself.
    async fn make_and_model(&self, unit: &TestUnit) -> Result<MakeAndModel, LookupError> {
        let vehicle = self.vehicle(unit);
        let make = vehicle
            .and_then(|vehicle| vehicle.make.clone())
            .or_else(|| unit.record.make.clone());
        let model = vehicle
            .and_then(|vehicle| vehicle.model.clone())
            .or_else(|| unit.record.model.clone());

        match (make, model) {
            (Some(make), Some(model)) => Ok(MakeAndModel { make, model }),
            _ => Err(tech_record_missing(unit)),
        }
    }

    async fn weight_details(&self, unit: &TestUnit) -> Result<WeightDetails, LookupError> {
        self.vehicle(unit)
            .and_then(|vehicle| vehicle.weights)
            .ok_or_else(|| tech_record_missing(unit))
    }

    async fn adr_details(&self, unit: &TestUnit) -> Result<Option<AdrDetails>, LookupError> {
        Ok(self.vehicle(unit).and_then(|vehicle| vehicle.adr.clone()))
    }
}

#[async_trait]
impl TrailerRegistry for FixtureReferenceData {
    async fn registration(
        &self,
        vin: &str,
        _make: &str,
    ) -> Result<Option<TrailerRegistration>, LookupError> {
        Ok(self
            .fixture
            .trailers
            .get(vin)
            .map(|trn| TrailerRegistration { trn: trn.clone() }))
    }
}

#[async_trait]
impl TestStationDirectory for FixtureReferenceData {
    async fn station(&self, p_number: &str) -> Result<TestStation, LookupError> {
        self.fixture
            .stations
            .iter()
            .find(|station| station.test_station_p_number == p_number)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                service: "test stations",
                key: p_number.to_string(),
            })
    }
}

#[async_trait]
impl TestResultHistory for FixtureReferenceData {
    async fn test_results(
        &self,
        system_number: &str,
    ) -> Result<Vec<HistoricTestResult>, LookupError> {
        self.fixture
            .history
            .get(system_number)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                service: "test results",
                key: system_number.to_string(),
            })
    }
}

#[async_trait]
impl DefectCatalogue for FixtureReferenceData {
    async fn defects(&self) -> Result<Vec<DefectParent>, LookupError> {
        Ok(self.fixture.defects.clone())
    }
}

/// Emits the render request itself as the document body.
#[derive(Debug, Default, Clone)]
pub(crate) struct JsonDocumentRenderer;

#[async_trait]
impl DocumentRenderer for JsonDocumentRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        serde_json::to_vec_pretty(request).map_err(|err| RenderError::Rejected {
            document: request.document_name.clone(),
            reason: err.to_string(),
        })
    }
}

/// Stores certificates as `<root>/<testResultId>/<fileName>` with a JSON metadata sidecar.
#[derive(Debug, Clone)]
pub(crate) struct FilesystemCertificateStore {
    root: PathBuf,
}

impl FilesystemCertificateStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_dir(&self, test_result_id: &str) -> Result<PathBuf, StoreError> {
        let unsafe_key = test_result_id.is_empty()
            || test_result_id.contains(['/', '\\'])
            || test_result_id.contains("..");
        if unsafe_key {
            return Err(StoreError::Unavailable(format!(
                "refusing to use '{test_result_id}' as a storage key"
            )));
        }
        Ok(self.root.join(test_result_id))
    }
}

fn io_error(key: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.display().to_string(),
        source,
    }
}

#[async_trait]
impl CertificateStore for FilesystemCertificateStore {
    async fn upload(&self, certificate: &GeneratedCertificate) -> Result<(), StoreError> {
        let dir = self.record_dir(&certificate.test_result_id)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(io_error(&dir))?;

        let document = dir.join(&certificate.file_name);
        tokio::fs::write(&document, &certificate.certificate)
            .await
            .map_err(io_error(&document))?;

        let metadata_path = dir.join(format!("{}.json", certificate.file_name));
        let metadata = serde_json::to_vec_pretty(certificate)
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))
            .map_err(io_error(&metadata_path))?;
        tokio::fs::write(&metadata_path, metadata)
            .await
            .map_err(io_error(&metadata_path))?;

        info!(path = %document.display(), "stored certificate");
        Ok(())
    }

    async fn remove(&self, request: &RemovalRequest) -> Result<(), StoreError> {
        let dir = self.record_dir(&request.test_result_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(path = %dir.display(), "removed certificates");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %dir.display(), "no stored certificates to remove");
                Ok(())
            }
            Err(err) => Err(io_error(&dir)(err)),
        }
    }
}

/// Wires the bundled adapters into a processor.
pub(crate) async fn build_processor(config: &ProcessingConfig) -> Result<LocalProcessor, AppError> {
    let fixture = Arc::new(load_fixture(config.reference_data.as_deref()).await?);
    let flags = Arc::new(FeatureFlagCache::new(Arc::new(StaticFlagSource(
        fixture.flags.clone(),
    ))));
    let reference = FixtureReferenceData::new(fixture).into_reference_data();

    let generator = CertificateGenerationService::new(
        Arc::new(JsonDocumentRenderer),
        reference,
        flags,
        Arc::new(TestTypeCatalog::standard()),
        config.document_directory.clone(),
    );
    let store = Arc::new(FilesystemCertificateStore::new(&config.output_directory));

    Ok(CertificateRequestProcessor::new(
        generator,
        store,
        ProcessorSettings {
            process_modify_events: config.process_modify_events,
        },
    ))
}
