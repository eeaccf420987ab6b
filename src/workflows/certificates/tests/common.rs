use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::workflows::certificates::defects::policy::PrsPolicy;
use crate::workflows::certificates::defects::translation::{
    DefectChild, DefectItem, DefectParent,
};
use crate::workflows::certificates::delivery::{
    CertificateStore, DocumentRenderer, GeneratedCertificate, RemovalRequest, RenderError,
    RenderRequest, StoreError,
};
use crate::workflows::certificates::domain::{
    CompositeTestRecord, TestOutcome, TestStatus, TestUnit, VehicleType, ANNUAL_WITH_CERTIFICATE,
};
use crate::workflows::certificates::flags::{
    FeatureFlagCache, FeatureFlagSnapshot, StaticFlagSource,
};
use crate::workflows::certificates::intake::expand_record;
use crate::workflows::certificates::payload::{
    AssemblyContext, CertificatePayload, GenerationError, PayloadAssembler,
};
use crate::workflows::certificates::processor::{
    CertificateRequestProcessor, ProcessorSettings, QueueMessage,
};
use crate::workflows::certificates::reference::{
    AdrDetails, DefectCatalogue, HistoricTestResult, HistoricTestType, LookupError,
    MakeAndModel, ReferenceData, TechRecordService, TestResultHistory, TestStation,
    TestStationDirectory, TrailerRegistration, TrailerRegistry, WeightDetails,
};
use crate::workflows::certificates::service::CertificateGenerationService;
use crate::workflows::certificates::{classify, StandardPrsPolicy, TestTypeCatalog};

pub(super) const TEST_RESULT_ID: &str = "1f0b9a4c-8ad9-4f43-9a3e-0c7d2f5c6b11";
pub(super) const VIN: &str = "XMGDE02FS0H012345";
pub(super) const VRM: &str = "BQ91YHQ";
pub(super) const TRAILER_ID: &str = "C000123";
pub(super) const STATION: &str = "87-1369569";

pub(super) fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(super) fn test_type_value(id: &str, result: &str) -> Value {
    json!({
        "testTypeId": id,
        "testTypeName": "Annual test",
        "testTypeClassification": ANNUAL_WITH_CERTIFICATE,
        "testNumber": "W01A00310",
        "certificateNumber": "W01A00310",
        "testResult": result,
        "testTypeStartTimestamp": "2024-03-01T10:00:00Z",
        "testTypeEndTimestamp": "2024-03-01T11:30:00Z",
        "testExpiryDate": "2025-02-28",
        "testAnniversaryDate": "2025-02-28",
        "defects": []
    })
}

pub(super) fn record_value(vehicle_type: &str, test_types: Vec<Value>) -> Value {
    json!({
        "testResultId": TEST_RESULT_ID,
        "systemNumber": "10000001",
        "vin": VIN,
        "vrm": VRM,
        "trailerId": TRAILER_ID,
        "vehicleType": vehicle_type,
        "testStatus": "submitted",
        "testStationName": "Abshire-Kub",
        "testStationPNumber": STATION,
        "testerName": "Smith, Jane",
        "testerEmailAddress": "jane.smith@example.com",
        "testEndTimestamp": "2024-03-01T12:00:00Z",
        "odometerReading": 350000,
        "odometerReadingUnits": "kilometres",
        "euVehicleCategory": "m1",
        "countryOfRegistration": "gb",
        "make": "Plaxton",
        "model": "Panther",
        "testTypes": test_types
    })
}

pub(super) fn annual_record(vehicle_type: &str, result: &str) -> Value {
    record_value(vehicle_type, vec![test_type_value("1", result)])
}

pub(super) fn parse_record(value: Value) -> CompositeTestRecord {
    serde_json::from_value(value).expect("record parses")
}

pub(super) fn first_unit(value: Value) -> TestUnit {
    expand_record(&parse_record(value))
        .into_iter()
        .next()
        .expect("record has a test type")
}

pub(super) fn major_defect() -> Value {
    json!({
        "imNumber": 1,
        "imDescription": "Registration Plate",
        "itemNumber": 1,
        "itemDescription": "A registration plate:",
        "deficiencyRef": "1.1.a",
        "deficiencyCategory": "major",
        "deficiencyText": "missing.",
        "prs": false,
        "additionalInformation": {
            "location": { "longitudinal": "front", "axleNumber": 2 },
            "notes": "None"
        }
    })
}

pub(super) fn defect_with(reference: &str, category: &str) -> Value {
    let mut defect = major_defect();
    defect["deficiencyRef"] = json!(reference);
    defect["deficiencyCategory"] = json!(category);
    defect
}

pub(super) fn with_defects(mut record: Value, defects: Vec<Value>) -> Value {
    record["testTypes"][0]["defects"] = Value::Array(defects);
    record
}

pub(super) fn defect_catalogue() -> Vec<DefectParent> {
    vec![DefectParent {
        im_number: 1,
        im_description: "Registration Plate".to_string(),
        im_description_welsh: Some("Plât cofrestru".to_string()),
        items: vec![DefectItem {
            item_number: 1,
            item_description: "A registration plate:".to_string(),
            item_description_welsh: Some("Plât cofrestru:".to_string()),
            deficiencies: vec![DefectChild {
                reference: "1.1.a".to_string(),
                deficiency_text: "missing.".to_string(),
                deficiency_text_welsh: Some("ar goll.".to_string()),
                for_vehicle_type: vec![VehicleType::Psv, VehicleType::Hgv, VehicleType::Trl],
            }],
        }],
    }]
}

pub(super) fn historic(
    end: &str,
    status: TestStatus,
    result: TestOutcome,
    reading: u32,
) -> HistoricTestResult {
    HistoricTestResult {
        test_status: status,
        test_end_timestamp: timestamp(end),
        odometer_reading: Some(reading),
        odometer_reading_units: Some("kilometres".to_string()),
        test_types: vec![HistoricTestType {
            test_type_classification: ANNUAL_WITH_CERTIFICATE.to_string(),
            test_result: result,
        }],
    }
}

pub(super) fn welsh_flags() -> FeatureFlagSnapshot {
    let mut flags = FeatureFlagSnapshot::default();
    flags.welsh_translation.enabled = true;
    flags.welsh_translation.translate_pass_test_result = true;
    flags.welsh_translation.translate_fail_test_result = true;
    flags.welsh_translation.translate_prs_test_result = true;
    flags
}

pub(super) fn abandoned_flags() -> FeatureFlagSnapshot {
    let mut flags = FeatureFlagSnapshot::default();
    flags.abandoned_certs.enabled = true;
    flags
}

pub(super) fn message(id: &str, event_name: &str, record: Value) -> QueueMessage {
    QueueMessage {
        message_id: id.to_string(),
        body: json!({
            "eventName": event_name,
            "dynamodb": { "NewImage": record }
        })
        .to_string(),
    }
}

/// Reference data held in memory; a `None` answer is reported as a failed lookup.
pub(super) struct MemoryReference {
    pub(super) make_and_model: Option<MakeAndModel>,
    pub(super) weights: Option<WeightDetails>,
    pub(super) adr: Option<AdrDetails>,
    pub(super) trailer: Option<TrailerRegistration>,
    pub(super) trailer_unavailable: bool,
    pub(super) station_country: Option<String>,
    pub(super) history: Option<Vec<HistoricTestResult>>,
    pub(super) defects: Option<Vec<DefectParent>>,
    pub(super) station_calls: AtomicUsize,
}

impl Default for MemoryReference {
    fn default() -> Self {
        Self {
            make_and_model: Some(MakeAndModel {
                make: "Plaxton".to_string(),
                model: "Panther".to_string(),
            }),
            weights: Some(WeightDetails {
                dgvw: 18000,
                weight2: 26000,
            }),
            adr: None,
            trailer: Some(TrailerRegistration {
                trn: "ABC1234".to_string(),
            }),
            trailer_unavailable: false,
            station_country: Some("England".to_string()),
            history: Some(vec![
                historic("2023-02-20T10:00:00Z", TestStatus::Submitted, TestOutcome::Pass, 300000),
                historic("2022-02-20T10:00:00Z", TestStatus::Submitted, TestOutcome::Prs, 250000),
            ]),
            defects: Some(defect_catalogue()),
            station_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryReference {
    pub(super) fn welsh() -> Self {
        Self {
            station_country: Some("Wales".to_string()),
            ..Self::default()
        }
    }

    pub(super) fn station_calls(&self) -> usize {
        self.station_calls.load(Ordering::SeqCst)
    }

    pub(super) fn into_reference_data(self: Arc<Self>) -> ReferenceData {
        ReferenceData {
            tech_records: self.clone(),
            trailers: self.clone(),
            stations: self.clone(),
            history: self.clone(),
            defects: self,
        }
    }
}

fn unavailable(service: &'static str) -> LookupError {
    LookupError::Unavailable {
        service,
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl TechRecordService for MemoryReference {
    async fn make_and_model(&self, _unit: &TestUnit) -> Result<MakeAndModel, LookupError> {
        self.make_and_model
            .clone()
            .ok_or_else(|| unavailable("tech records"))
    }

    async fn weight_details(&self, _unit: &TestUnit) -> Result<WeightDetails, LookupError> {
        self.weights.ok_or_else(|| unavailable("tech records"))
    }

    async fn adr_details(&self, _unit: &TestUnit) -> Result<Option<AdrDetails>, LookupError> {
        Ok(self.adr.clone())
    }
}

#[async_trait]
impl TrailerRegistry for MemoryReference {
    async fn registration(
        &self,
        _vin: &str,
        _make: &str,
    ) -> Result<Option<TrailerRegistration>, LookupError> {
        if self.trailer_unavailable {
            return Err(unavailable("trailer registry"));
        }
        Ok(self.trailer.clone())
    }
}

#[async_trait]
impl TestStationDirectory for MemoryReference {
    async fn station(&self, p_number: &str) -> Result<TestStation, LookupError> {
        self.station_calls.fetch_add(1, Ordering::SeqCst);
        let country = self
            .station_country
            .clone()
            .ok_or_else(|| unavailable("test stations"))?;
        Ok(TestStation {
            test_station_p_number: p_number.to_string(),
            test_station_country: Some(country),
        })
    }
}

#[async_trait]
impl TestResultHistory for MemoryReference {
    async fn test_results(
        &self,
        _system_number: &str,
    ) -> Result<Vec<HistoricTestResult>, LookupError> {
        self.history.clone().ok_or_else(|| unavailable("test results"))
    }
}

#[async_trait]
impl DefectCatalogue for MemoryReference {
    async fn defects(&self) -> Result<Vec<DefectParent>, LookupError> {
        self.defects.clone().ok_or_else(|| unavailable("defects"))
    }
}

#[derive(Default)]
pub(super) struct RecordingRenderer {
    requests: Mutex<Vec<RenderRequest>>,
    pub(super) reject: bool,
}

impl RecordingRenderer {
    pub(super) fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub(super) fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().expect("renderer mutex poisoned").clone()
    }
}

#[async_trait]
impl DocumentRenderer for RecordingRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        self.requests
            .lock()
            .expect("renderer mutex poisoned")
            .push(request.clone());
        if self.reject {
            return Err(RenderError::Rejected {
                document: request.document_name.clone(),
                reason: "template missing".to_string(),
            });
        }
        Ok(b"%PDF-1.4".to_vec())
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    uploads: Mutex<Vec<GeneratedCertificate>>,
    removals: Mutex<Vec<RemovalRequest>>,
}

impl MemoryStore {
    pub(super) fn uploads(&self) -> Vec<GeneratedCertificate> {
        self.uploads.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn removals(&self) -> Vec<RemovalRequest> {
        self.removals.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn upload(&self, certificate: &GeneratedCertificate) -> Result<(), StoreError> {
        self.uploads
            .lock()
            .expect("store mutex poisoned")
            .push(certificate.clone());
        Ok(())
    }

    async fn remove(&self, request: &RemovalRequest) -> Result<(), StoreError> {
        self.removals
            .lock()
            .expect("store mutex poisoned")
            .push(request.clone());
        Ok(())
    }
}

pub(super) struct Harness {
    pub(super) processor: CertificateRequestProcessor<RecordingRenderer, MemoryStore>,
    pub(super) renderer: Arc<RecordingRenderer>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) reference: Arc<MemoryReference>,
}

pub(super) fn harness_with(
    reference: MemoryReference,
    renderer: RecordingRenderer,
    flags: FeatureFlagSnapshot,
    settings: ProcessorSettings,
) -> Harness {
    build_harness(reference, renderer, flags, settings, Arc::new(StandardPrsPolicy))
}

pub(super) fn harness_with_policy(
    reference: MemoryReference,
    flags: FeatureFlagSnapshot,
    policy: Arc<dyn PrsPolicy>,
) -> Harness {
    build_harness(
        reference,
        RecordingRenderer::default(),
        flags,
        ProcessorSettings::default(),
        policy,
    )
}

fn build_harness(
    reference: MemoryReference,
    renderer: RecordingRenderer,
    flags: FeatureFlagSnapshot,
    settings: ProcessorSettings,
    policy: Arc<dyn PrsPolicy>,
) -> Harness {
    let reference = Arc::new(reference);
    let renderer = Arc::new(renderer);
    let store = Arc::new(MemoryStore::default());
    let flags = Arc::new(FeatureFlagCache::new(Arc::new(StaticFlagSource(flags))));

    let generator = CertificateGenerationService::new(
        renderer.clone(),
        reference.clone().into_reference_data(),
        flags,
        Arc::new(TestTypeCatalog::standard()),
        "CVS",
    )
    .with_prs_policy(policy);

    Harness {
        processor: CertificateRequestProcessor::new(generator, store.clone(), settings),
        renderer,
        store,
        reference,
    }
}

pub(super) fn harness(reference: MemoryReference, flags: FeatureFlagSnapshot) -> Harness {
    harness_with(
        reference,
        RecordingRenderer::default(),
        flags,
        ProcessorSettings::default(),
    )
}

/// Runs the standard assembler for a unit the way the generation service does.
pub(super) async fn assemble(
    unit: &TestUnit,
    reference: Arc<MemoryReference>,
    welsh: bool,
) -> Result<CertificatePayload, GenerationError> {
    let catalog = TestTypeCatalog::standard();
    let reference = reference.into_reference_data();
    let context = AssemblyContext {
        unit,
        category: classify(unit, &catalog),
        welsh,
        catalog: &catalog,
        reference: &reference,
        prs_policy: &StandardPrsPolicy,
    };
    PayloadAssembler::standard().assemble(&context).await
}
