use serde::{Deserialize, Serialize};

use crate::resolution::{CanonicalProperty, EpcRating, LicenceStatus, ListingType};

use super::config::TaPolicy;
use super::lha::LhaLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaCriterion {
    IsRental,
    HasActiveLicence,
    HasAdequateEpc,
    HasMinBedrooms,
    WithinLhaBudget,
}

impl TaCriterion {
    pub const ALL: [TaCriterion; 5] = [
        TaCriterion::IsRental,
        TaCriterion::HasActiveLicence,
        TaCriterion::HasAdequateEpc,
        TaCriterion::HasMinBedrooms,
        TaCriterion::WithinLhaBudget,
    ];
}

/// The five temporary-accommodation criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaChecklist {
    pub is_rental: bool,
    pub has_active_licence: bool,
    pub has_adequate_epc: bool,
    pub has_min_bedrooms: bool,
    pub within_lha_budget: bool,
}

impl TaChecklist {
    pub fn passed(&self, criterion: TaCriterion) -> bool {
        match criterion {
            TaCriterion::IsRental => self.is_rental,
            TaCriterion::HasActiveLicence => self.has_active_licence,
            TaCriterion::HasAdequateEpc => self.has_adequate_epc,
            TaCriterion::HasMinBedrooms => self.has_min_bedrooms,
            TaCriterion::WithinLhaBudget => self.within_lha_budget,
        }
    }

    pub fn score(&self) -> u8 {
        TaCriterion::ALL
            .iter()
            .filter(|criterion| self.passed(**criterion))
            .count() as u8
    }

    pub fn failed(&self) -> Vec<TaCriterion> {
        TaCriterion::ALL
            .into_iter()
            .filter(|criterion| !self.passed(*criterion))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaVerdict {
    Suitable,
    Partial,
    NotSuitable,
}

impl TaVerdict {
    pub fn from_score(score: u8) -> Self {
        match score {
            5.. => TaVerdict::Suitable,
            3 | 4 => TaVerdict::Partial,
            _ => TaVerdict::NotSuitable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaSuitabilityResult {
    pub checklist: TaChecklist,
    pub score: u8,
    pub verdict: TaVerdict,
    pub lha_monthly_rate: Option<f64>,
    /// User-facing justification naming every failed criterion.
    pub reason: String,
}

/// Rule-based sourcing check against LHA caps.
#[derive(Debug, Clone, Default)]
pub struct TaAssessor {
    policy: TaPolicy,
}

impl TaAssessor {
    pub fn new(policy: TaPolicy) -> Self {
        Self { policy }
    }

    pub fn assess<L: LhaLookup + ?Sized>(
        &self,
        property: &CanonicalProperty,
        lha: &L,
    ) -> TaSuitabilityResult {
        let lha_monthly_rate = lha.monthly_rate(
            property.city.as_deref().unwrap_or(""),
            property.bedrooms,
            property.postcode.as_deref(),
        );

        let within_lha_budget = match (property.monthly_rent, lha_monthly_rate) {
            (Some(rent), Some(rate)) if rate > 0.0 => {
                rent as f64 <= rate * self.policy.lha_tolerance
            }
            // no reference rate (or no rent): affordability cannot be confirmed
            _ => false,
        };

        let checklist = TaChecklist {
            is_rental: property.listing_type == Some(ListingType::Rent),
            has_active_licence: property.licence.status == Some(LicenceStatus::Active),
            has_adequate_epc: property
                .epc_rating
                .map(|rating| rating <= EpcRating::D)
                .unwrap_or(false),
            has_min_bedrooms: property.bedrooms >= self.policy.min_bedrooms,
            within_lha_budget,
        };

        let score = checklist.score();
        let reason = self.reason(property, &checklist, lha_monthly_rate);

        TaSuitabilityResult {
            checklist,
            score,
            verdict: TaVerdict::from_score(score),
            lha_monthly_rate,
            reason,
        }
    }

    fn reason(
        &self,
        property: &CanonicalProperty,
        checklist: &TaChecklist,
        lha_monthly_rate: Option<f64>,
    ) -> String {
        let failed = checklist.failed();
        if failed.is_empty() {
            return "meets all 5 temporary accommodation criteria".to_string();
        }

        let explanations: Vec<String> = failed
            .iter()
            .map(|criterion| match criterion {
                TaCriterion::IsRental => "not listed as a rental".to_string(),
                TaCriterion::HasActiveLicence => match property.licence.status {
                    Some(status) => format!("licence is {}", status.label()),
                    None => "no licence on record".to_string(),
                },
                TaCriterion::HasAdequateEpc => match property.epc_rating {
                    Some(rating) => format!("EPC {} is below D", rating.letter()),
                    None => "EPC rating unknown".to_string(),
                },
                TaCriterion::HasMinBedrooms => format!(
                    "{} bedroom(s), minimum is {}",
                    property.bedrooms, self.policy.min_bedrooms
                ),
                TaCriterion::WithinLhaBudget => match (property.monthly_rent, lha_monthly_rate) {
                    (_, None) => "no LHA rate for this location".to_string(),
                    (None, Some(_)) => "monthly rent unknown".to_string(),
                    (Some(rent), Some(rate)) => format!(
                        "rent £{rent} exceeds {:.0}% of LHA £{rate:.2}",
                        self.policy.lha_tolerance * 100.0
                    ),
                },
            })
            .collect();

        format!(
            "fails {} of 5 criteria: {}",
            failed.len(),
            explanations.join("; ")
        )
    }
}

/// Assessment under the default policy.
pub fn assess_ta_suitability<L: LhaLookup + ?Sized>(
    property: &CanonicalProperty,
    lha: &L,
) -> TaSuitabilityResult {
    TaAssessor::default().assess(property, lha)
}
