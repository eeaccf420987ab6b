//! Severity and language bucketing for the defects recorded against a test type.

pub mod policy;
pub mod translation;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use self::policy::{PromotionInput, PrsPolicy};
use self::translation::{format_defect, format_defect_welsh, TranslationIndex};
use super::domain::{DefectRecord, DefectSeverity, TestOutcome, VehicleType};
use super::payload::PayloadSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    Dangerous,
    Major,
    Prs,
    Minor,
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefectBucket {
    pub kind: BucketKind,
    pub welsh: bool,
}

impl DefectBucket {
    pub const fn english(kind: BucketKind) -> Self {
        Self { kind, welsh: false }
    }

    pub const fn welsh(kind: BucketKind) -> Self {
        Self { kind, welsh: true }
    }
}

/// Bucketed defect texts produced by a single defect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefectContribution {
    entries: Vec<(DefectBucket, String)>,
}

impl DefectContribution {
    pub fn entries(&self) -> &[(DefectBucket, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, bucket: DefectBucket, text: impl Into<String>) {
        self.entries.push((bucket, text.into()));
    }
}

/// Everything besides the defect itself that bucketing depends on.
pub struct DefectContext<'a> {
    pub section: PayloadSection,
    pub result: TestOutcome,
    pub vehicle_type: VehicleType,
    pub welsh: bool,
    pub translations: &'a TranslationIndex,
    pub policy: &'a dyn PrsPolicy,
}

pub fn categorize(defect: &DefectRecord, context: &DefectContext<'_>) -> DefectContribution {
    let mut contribution = DefectContribution::default();

    let Some(severity) = defect.severity() else {
        debug!(
            deficiency_ref = %defect.deficiency_ref,
            category = %defect.deficiency_category,
            "ignoring defect with unrecognised severity"
        );
        return contribution;
    };

    let english = format_defect(defect);

    let kinds = match severity {
        DefectSeverity::Dangerous | DefectSeverity::Major => {
            context.policy.buckets(PromotionInput {
                severity,
                result: context.result,
                section: context.section,
            })
        }
        DefectSeverity::Minor => vec![BucketKind::Minor],
        DefectSeverity::Advisory => {
            contribution.push(DefectBucket::english(BucketKind::Advisory), english.clone());
            if context.welsh {
                contribution.push(DefectBucket::welsh(BucketKind::Advisory), english);
            }
            return contribution;
        }
    };

    for kind in &kinds {
        contribution.push(DefectBucket::english(*kind), english.clone());
    }

    if context.welsh {
        match welsh_text(defect, context) {
            Some(welsh) => {
                for kind in &kinds {
                    contribution.push(DefectBucket::welsh(*kind), welsh.clone());
                }
            }
            None => warn!(
                deficiency_ref = %defect.deficiency_ref,
                vehicle_type = context.vehicle_type.label(),
                "no welsh translation found for defect"
            ),
        }
    }

    contribution
}

fn welsh_text(defect: &DefectRecord, context: &DefectContext<'_>) -> Option<String> {
    let entry = context
        .translations
        .find(&defect.deficiency_ref, context.vehicle_type)?;
    format_defect_welsh(defect, entry)
}

/// The ten defect lists of a certificate section; empty lists are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategorizedDefectSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangerous_defects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_defects: Option<Vec<String>>,
    #[serde(rename = "PRSDefects", default, skip_serializing_if = "Option::is_none")]
    pub prs_defects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_defects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory_defects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangerous_defects_welsh: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_defects_welsh: Option<Vec<String>>,
    #[serde(
        rename = "PRSDefectsWelsh",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub prs_defects_welsh: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_defects_welsh: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory_defects_welsh: Option<Vec<String>>,
}

impl CategorizedDefectSet {
    /// Folds contributions in order; a bucket nobody contributed to stays absent.
    pub fn fold<I>(contributions: I) -> Self
    where
        I: IntoIterator<Item = DefectContribution>,
    {
        let mut set = Self::default();
        for contribution in contributions {
            for (bucket, text) in contribution.entries {
                set.slot(bucket).get_or_insert_with(Vec::new).push(text);
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn bucket(&self, bucket: DefectBucket) -> Option<&[String]> {
        let slot = match (bucket.kind, bucket.welsh) {
            (BucketKind::Dangerous, false) => &self.dangerous_defects,
            (BucketKind::Major, false) => &self.major_defects,
            (BucketKind::Prs, false) => &self.prs_defects,
            (BucketKind::Minor, false) => &self.minor_defects,
            (BucketKind::Advisory, false) => &self.advisory_defects,
            (BucketKind::Dangerous, true) => &self.dangerous_defects_welsh,
            (BucketKind::Major, true) => &self.major_defects_welsh,
            (BucketKind::Prs, true) => &self.prs_defects_welsh,
            (BucketKind::Minor, true) => &self.minor_defects_welsh,
            (BucketKind::Advisory, true) => &self.advisory_defects_welsh,
        };
        slot.as_deref()
    }

    fn slot(&mut self, bucket: DefectBucket) -> &mut Option<Vec<String>> {
        match (bucket.kind, bucket.welsh) {
            (BucketKind::Dangerous, false) => &mut self.dangerous_defects,
            (BucketKind::Major, false) => &mut self.major_defects,
            (BucketKind::Prs, false) => &mut self.prs_defects,
            (BucketKind::Minor, false) => &mut self.minor_defects,
            (BucketKind::Advisory, false) => &mut self.advisory_defects,
            (BucketKind::Dangerous, true) => &mut self.dangerous_defects_welsh,
            (BucketKind::Major, true) => &mut self.major_defects_welsh,
            (BucketKind::Prs, true) => &mut self.prs_defects_welsh,
            (BucketKind::Minor, true) => &mut self.minor_defects_welsh,
            (BucketKind::Advisory, true) => &mut self.advisory_defects_welsh,
        }
    }
}
