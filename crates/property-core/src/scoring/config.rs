use serde::{Deserialize, Serialize};

use crate::resolution::EpcRating;

/// Share of the total each factor contributes, in percent. Must sum to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub yield_pct: u8,
    pub epc_pct: u8,
    pub compliance_pct: u8,
    pub location_pct: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            yield_pct: 40,
            epc_pct: 20,
            compliance_pct: 20,
            location_pct: 20,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> u16 {
        self.yield_pct as u16
            + self.epc_pct as u16
            + self.compliance_pct as u16
            + self.location_pct as u16
    }
}

/// Sub-score per EPC band, reflecting retrofit cost risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpcBandScores {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub g: f64,
}

impl Default for EpcBandScores {
    fn default() -> Self {
        Self {
            a: 100.0,
            b: 95.0,
            c: 85.0,
            d: 60.0,
            e: 45.0,
            f: 10.0,
            g: 0.0,
        }
    }
}

impl EpcBandScores {
    pub fn for_rating(&self, rating: EpcRating) -> f64 {
        match rating {
            EpcRating::A => self.a,
            EpcRating::B => self.b,
            EpcRating::C => self.c,
            EpcRating::D => self.d,
            EpcRating::E => self.e,
            EpcRating::F => self.f,
            EpcRating::G => self.g,
        }
    }
}

/// Minimum floor area for the implied occupancy: `base_sqm + per_occupant_sqm * occupants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceStandard {
    pub base_sqm: f64,
    pub per_occupant_sqm: f64,
    /// At or below this fraction of the requirement the location term scores zero.
    pub zero_score_ratio: f64,
}

impl Default for SpaceStandard {
    fn default() -> Self {
        Self {
            base_sqm: 20.0,
            per_occupant_sqm: 13.0,
            zero_score_ratio: 0.6,
        }
    }
}

impl SpaceStandard {
    pub fn required_sqm(&self, occupants: u8) -> f64 {
        self.base_sqm + self.per_occupant_sqm * occupants as f64
    }
}

/// Contribution used when a factor's inputs are missing ("unknown, assume average").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnknownDefaults {
    pub yield_score: f64,
    pub epc_score: f64,
    pub compliance_score: f64,
    pub location_score: f64,
}

impl Default for UnknownDefaults {
    fn default() -> Self {
        Self {
            yield_score: 50.0,
            epc_score: 50.0,
            compliance_score: 50.0,
            location_score: 50.0,
        }
    }
}

/// Simplified financing heuristics behind the cashflow estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialAssumptions {
    pub operating_cost_ratio: f64,
    pub mortgage_rate_pct: f64,
    pub loan_to_value: f64,
}

impl Default for FinancialAssumptions {
    fn default() -> Self {
        Self {
            operating_cost_ratio: 0.30,
            mortgage_rate_pct: 5.5,
            loan_to_value: 0.75,
        }
    }
}

/// Tunable policy for the deal score. The scoring shape is fixed; these numbers are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealScoreConfig {
    pub weights: ScoreWeights,
    /// Gross yield (percent) that earns 85 points.
    pub yield_target_pct: f64,
    /// Gross yield (percent) beyond which no further credit is given.
    pub yield_ceiling_pct: f64,
    pub epc_scores: EpcBandScores,
    pub article_4_penalty: f64,
    pub discretionary_licensing_penalty: f64,
    pub lapsed_licence_penalty: f64,
    pub space_standard: SpaceStandard,
    pub slow_broadband_mbps: u32,
    pub slow_broadband_penalty: f64,
    pub unknown: UnknownDefaults,
    pub financials: FinancialAssumptions,
}

impl Default for DealScoreConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            yield_target_pct: 8.0,
            yield_ceiling_pct: 14.0,
            epc_scores: EpcBandScores::default(),
            article_4_penalty: 40.0,
            discretionary_licensing_penalty: 20.0,
            lapsed_licence_penalty: 25.0,
            space_standard: SpaceStandard::default(),
            slow_broadband_mbps: 10,
            slow_broadband_penalty: 15.0,
            unknown: UnknownDefaults::default(),
            financials: FinancialAssumptions::default(),
        }
    }
}

/// Thresholds for the HMO decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmoPolicy {
    /// Fewer lettable rooms than this cannot carry shared-housing economics.
    pub min_lettable_rooms: u8,
    pub ready_threshold: u8,
    pub value_add_threshold: u8,
}

impl Default for HmoPolicy {
    fn default() -> Self {
        Self {
            min_lettable_rooms: 3,
            ready_threshold: 70,
            value_add_threshold: 50,
        }
    }
}

/// Temporary-accommodation sourcing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaPolicy {
    pub min_bedrooms: u8,
    /// Rent may reach this multiple of the LHA monthly rate.
    pub lha_tolerance: f64,
}

impl Default for TaPolicy {
    fn default() -> Self {
        Self {
            min_bedrooms: 3,
            lha_tolerance: 1.10,
        }
    }
}
