use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::domain::TestOutcome;

/// Feature switches read while deciding eligibility and translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagSnapshot {
    #[serde(default)]
    pub welsh_translation: WelshTranslationFlags,
    #[serde(default)]
    pub abandoned_certs: AbandonedCertificateFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelshTranslationFlags {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub translate_pass_test_result: bool,
    #[serde(default)]
    pub translate_fail_test_result: bool,
    #[serde(default)]
    pub translate_prs_test_result: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedCertificateFlags {
    #[serde(default)]
    pub enabled: bool,
}

impl FeatureFlagSnapshot {
    pub fn abandoned_certificates_enabled(&self) -> bool {
        self.abandoned_certs.enabled
    }

    /// Master switch and result-specific switch; station locality is checked elsewhere.
    pub fn welsh_enabled_for(&self, result: TestOutcome) -> bool {
        if !self.welsh_translation.enabled {
            debug!("welsh translation disabled globally");
            return false;
        }

        let enabled = match result {
            TestOutcome::Pass => self.welsh_translation.translate_pass_test_result,
            TestOutcome::Fail => self.welsh_translation.translate_fail_test_result,
            TestOutcome::Prs => self.welsh_translation.translate_prs_test_result,
            TestOutcome::Abandoned | TestOutcome::Other => false,
        };
        if !enabled {
            debug!(result = result.label(), "welsh translation disabled for result");
        }
        enabled
    }
}

#[derive(Debug, thiserror::Error)]
#[error("feature flag source unavailable: {0}")]
pub struct FlagFetchError(pub String);

/// Remote profile holding the feature switches.
#[async_trait]
pub trait FeatureFlagSource: Send + Sync {
    async fn fetch(&self) -> Result<FeatureFlagSnapshot, FlagFetchError>;
}

/// Memoized accessor: the first successful fetch is kept for the life of the value.
pub struct FeatureFlagCache {
    source: Arc<dyn FeatureFlagSource>,
    snapshot: OnceCell<FeatureFlagSnapshot>,
}

impl FeatureFlagCache {
    pub fn new(source: Arc<dyn FeatureFlagSource>) -> Self {
        Self {
            source,
            snapshot: OnceCell::new(),
        }
    }

    /// Returns the cached snapshot, fetching it on first use.
    ///
    /// Concurrent callers wait on a single fetch. A failed fetch is logged and leaves the
    /// cache empty so the next call tries again.
    pub async fn snapshot(&self) -> Option<&FeatureFlagSnapshot> {
        let result = self
            .snapshot
            .get_or_try_init(|| async {
                debug!("feature flag cache not set, retrieving feature flags");
                self.source.fetch().await
            })
            .await;

        match result {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(error = %err, "failed to retrieve feature flags");
                None
            }
        }
    }

    /// Snapshot to evaluate against; an unavailable profile disables every switch.
    pub async fn effective(&self) -> FeatureFlagSnapshot {
        self.snapshot().await.cloned().unwrap_or_default()
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot.initialized()
    }
}

impl fmt::Debug for FeatureFlagCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFlagCache")
            .field("snapshot", &self.snapshot.get())
            .finish_non_exhaustive()
    }
}

/// Fixed snapshot, for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagSource(pub FeatureFlagSnapshot);

#[async_trait]
impl FeatureFlagSource for StaticFlagSource {
    async fn fetch(&self) -> Result<FeatureFlagSnapshot, FlagFetchError> {
        Ok(self.0.clone())
    }
}
