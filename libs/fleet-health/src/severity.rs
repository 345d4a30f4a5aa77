//! SeverityClassifier - root cause to operator priority

use crate::types::{IssueCategory, SeverityTier};

/// Map a root cause to its severity tier
///
/// Connectivity and storage faults mean footage is not being recorded or
/// cannot be reached, so they are critical. Video and login faults degrade
/// the unit without losing recordings.
pub fn classify(category: IssueCategory) -> SeverityTier {
    match category {
        IssueCategory::Gateway | IssueCategory::Host | IssueCategory::Storage => {
            SeverityTier::Critical
        },
        IssueCategory::Video | IssueCategory::Login => SeverityTier::Attention,
        IssueCategory::Healthy => SeverityTier::Healthy,
    }
}

/// Stateless classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityClassifier;

impl SeverityClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, category: IssueCategory) -> SeverityTier {
        classify(category)
    }
}

impl IssueCategory {
    pub fn severity(&self) -> SeverityTier {
        classify(*self)
    }
}
