use super::BucketKind;
use crate::workflows::certificates::domain::{DefectSeverity, TestOutcome};
use crate::workflows::certificates::payload::PayloadSection;

/// What a promotion rule sees when placing a dangerous or major defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionInput {
    pub severity: DefectSeverity,
    pub result: TestOutcome,
    pub section: PayloadSection,
}

/// Decides which English buckets a dangerous or major defect lands in.
pub trait PrsPolicy: Send + Sync {
    fn buckets(&self, input: PromotionInput) -> Vec<BucketKind>;
}

/// Base severity bucket, plus the PRS bucket when the test was passed after rectification.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPrsPolicy;

impl PrsPolicy for StandardPrsPolicy {
    fn buckets(&self, input: PromotionInput) -> Vec<BucketKind> {
        let base = match input.severity {
            DefectSeverity::Dangerous => BucketKind::Dangerous,
            DefectSeverity::Major => BucketKind::Major,
            DefectSeverity::Minor => BucketKind::Minor,
            DefectSeverity::Advisory => BucketKind::Advisory,
        };

        if input.result == TestOutcome::Prs {
            vec![base, BucketKind::Prs]
        } else {
            vec![base]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(severity: DefectSeverity, result: TestOutcome) -> PromotionInput {
        PromotionInput {
            severity,
            result,
            section: PayloadSection::Data,
        }
    }

    #[test]
    fn prs_result_adds_prs_bucket() {
        let policy = StandardPrsPolicy;
        assert_eq!(
            policy.buckets(input(DefectSeverity::Major, TestOutcome::Prs)),
            vec![BucketKind::Major, BucketKind::Prs]
        );
        assert_eq!(
            policy.buckets(input(DefectSeverity::Dangerous, TestOutcome::Fail)),
            vec![BucketKind::Dangerous]
        );
    }
}
