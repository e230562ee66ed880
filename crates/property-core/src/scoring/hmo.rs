use serde::{Deserialize, Serialize};

use crate::resolution::{CanonicalProperty, LicenceStatus, LicensingScheme};

use super::config::HmoPolicy;
use super::DealScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HmoClassification {
    ReadyToGo,
    ValueAdd,
    NotSuitable,
}

impl HmoClassification {
    pub const fn label(self) -> &'static str {
        match self {
            HmoClassification::ReadyToGo => "ready_to_go",
            HmoClassification::ValueAdd => "value_add",
            HmoClassification::NotSuitable => "not_suitable",
        }
    }
}

/// Decision table over facts already on the property and its deal score.
#[derive(Debug, Clone, Default)]
pub struct HmoClassifier {
    policy: HmoPolicy,
}

impl HmoClassifier {
    pub fn new(policy: HmoPolicy) -> Self {
        Self { policy }
    }

    pub fn classify(&self, property: &CanonicalProperty, score: &DealScoreResult) -> HmoClassification {
        if property.bedrooms < self.policy.min_lettable_rooms {
            return HmoClassification::NotSuitable;
        }

        let licensing_ready = property.licence.status == Some(LicenceStatus::Active)
            || property.licensing_scheme == Some(LicensingScheme::NotRequired);
        let space_shortfall = score.space_standard_met == Some(false);
        let article_4_risk = property.article_4 == Some(true);
        let needs_work = !licensing_ready || space_shortfall || article_4_risk;

        if !needs_work && score.score >= self.policy.ready_threshold {
            return HmoClassification::ReadyToGo;
        }
        if needs_work && score.score >= self.policy.value_add_threshold {
            return HmoClassification::ValueAdd;
        }
        HmoClassification::NotSuitable
    }
}

/// Classification under the default thresholds.
pub fn classify_hmo(property: &CanonicalProperty, score: &DealScoreResult) -> HmoClassification {
    HmoClassifier::default().classify(property, score)
}
