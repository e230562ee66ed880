//! Investment and compliance scoring over reconciled canonical properties.
//!
//! All scorers are pure: they read a [`CanonicalProperty`] and return a fresh result,
//! so they can run concurrently across properties and re-run whenever the record changes.

mod config;
mod hmo;
pub mod lha;
mod rules;
mod ta;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolution::CanonicalProperty;

pub use config::{
    DealScoreConfig, EpcBandScores, FinancialAssumptions, HmoPolicy, ScoreWeights, SpaceStandard,
    TaPolicy, UnknownDefaults,
};
pub use hmo::{classify_hmo, HmoClassification, HmoClassifier};
pub use lha::{LhaLookup, LhaRate, LhaRateTable, LhaTableError};
pub use ta::{assess_ta_suitability, TaAssessor, TaChecklist, TaCriterion, TaSuitabilityResult, TaVerdict};

/// Named inputs to the deal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealFactor {
    Yield,
    Epc,
    Compliance,
    Location,
}

impl DealFactor {
    pub const fn label(self) -> &'static str {
        match self {
            DealFactor::Yield => "yield",
            DealFactor::Epc => "epc",
            DealFactor::Compliance => "compliance",
            DealFactor::Location => "location",
        }
    }
}

impl fmt::Display for DealFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One factor's sub-score and its weighted share of the total, for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: DealFactor,
    /// Clamped to [0, 100].
    pub sub_score: f64,
    pub weight: u8,
    pub contribution: f64,
    /// The configured "unknown" default was used because inputs were missing.
    pub defaulted: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealScoreResult {
    pub score: u8,
    pub breakdown: BTreeMap<DealFactor, f64>,
    pub components: Vec<FactorScore>,
    pub gross_yield_pct: Option<f64>,
    pub estimated_monthly_cashflow: Option<f64>,
    /// `None` when floor area is unknown.
    pub space_standard_met: Option<bool>,
    pub classification: Option<HmoClassification>,
}

impl DealScoreResult {
    pub fn contribution(&self, factor: DealFactor) -> Option<f64> {
        self.breakdown.get(&factor).copied()
    }
}

/// Stateless engine applying a [`DealScoreConfig`] to canonical properties.
#[derive(Debug, Clone, Default)]
pub struct DealScoringEngine {
    config: DealScoreConfig,
}

impl DealScoringEngine {
    pub fn new(config: DealScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DealScoreConfig {
        &self.config
    }

    /// Always produces a score; missing inputs fall back to configured defaults.
    pub fn score(&self, property: &CanonicalProperty) -> DealScoreResult {
        let (components, signals) = rules::score_property(property, &self.config);

        let total: f64 = components.iter().map(|c| c.contribution).sum();
        let breakdown = components
            .iter()
            .map(|c| (c.factor, (c.contribution * 100.0).round() / 100.0))
            .collect();

        DealScoreResult {
            score: total.round().clamp(0.0, 100.0) as u8,
            breakdown,
            components,
            gross_yield_pct: signals.gross_yield_pct.map(|y| (y * 100.0).round() / 100.0),
            estimated_monthly_cashflow: signals.estimated_monthly_cashflow,
            space_standard_met: signals.space_standard_met,
            classification: None,
        }
    }

    /// Score and attach the HMO classification in one pass.
    pub fn score_and_classify(
        &self,
        property: &CanonicalProperty,
        policy: &HmoPolicy,
    ) -> DealScoreResult {
        let mut result = self.score(property);
        result.classification = Some(HmoClassifier::new(policy.clone()).classify(property, &result));
        result
    }
}

/// Deal score under the default configuration.
pub fn compute_deal_score(property: &CanonicalProperty) -> DealScoreResult {
    DealScoringEngine::default().score(property)
}
