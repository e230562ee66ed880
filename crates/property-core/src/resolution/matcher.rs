use std::fmt;

use serde::{Deserialize, Serialize};

use super::address::{normalize_address, NormalizedAddress};

/// Discrete match tiers. Declaration order is the ranking order (`Exact` highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    None,
    Nearby,
    Low,
    Medium,
    High,
    Exact,
}

impl MatchConfidence {
    pub const fn label(self) -> &'static str {
        match self {
            MatchConfidence::None => "none",
            MatchConfidence::Nearby => "nearby",
            MatchConfidence::Low => "low",
            MatchConfidence::Medium => "medium",
            MatchConfidence::High => "high",
            MatchConfidence::Exact => "exact",
        }
    }

    pub const fn is_usable(self) -> bool {
        !matches!(self, MatchConfidence::None)
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tunable knobs for the confidence lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Maximum bedroom difference still considered `nearby`.
    pub nearby_bedroom_tolerance: u8,
    /// Radius used when pulling candidate properties around a record.
    pub candidate_radius_km: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            nearby_bedroom_tolerance: 2,
            candidate_radius_km: 1.5,
        }
    }
}

/// The matching inputs for one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFields {
    pub normalized: NormalizedAddress,
    pub bedrooms: Option<u8>,
}

impl MatchFields {
    pub fn new(address: &str, postcode: Option<&str>, bedrooms: Option<u8>) -> Self {
        Self {
            normalized: normalize_address(address, postcode),
            bedrooms,
        }
    }
}

/// Confidence with the default policy.
pub fn match_confidence(target: &MatchFields, candidate: &MatchFields) -> MatchConfidence {
    match_confidence_with(&MatchPolicy::default(), target, candidate)
}

/// First matching rule wins, top to bottom.
pub fn match_confidence_with(
    policy: &MatchPolicy,
    target: &MatchFields,
    candidate: &MatchFields,
) -> MatchConfidence {
    let t = &target.normalized;
    let c = &candidate.normalized;

    let same_outcode = !t.outcode.is_empty() && t.outcode == c.outcode;
    let same_district = !t.district.is_empty() && t.district == c.district;

    if !same_outcode && !same_district {
        return MatchConfidence::None;
    }

    if same_outcode {
        let number = street_numbers_match(t, c);
        let name = street_names_match(t, c);
        let bedrooms = target.bedrooms.is_some() && target.bedrooms == candidate.bedrooms;

        if number && name {
            return MatchConfidence::Exact;
        }
        if number && bedrooms {
            return MatchConfidence::High;
        }
        if name && bedrooms {
            return MatchConfidence::Medium;
        }
        if name {
            return MatchConfidence::Low;
        }
    }

    match (target.bedrooms, candidate.bedrooms) {
        (Some(a), Some(b)) if a.abs_diff(b) <= policy.nearby_bedroom_tolerance => {
            MatchConfidence::Nearby
        }
        _ => MatchConfidence::None,
    }
}

fn street_numbers_match(a: &NormalizedAddress, b: &NormalizedAddress) -> bool {
    !a.street_number.is_empty() && a.street_number.eq_ignore_ascii_case(&b.street_number)
}

fn street_names_match(a: &NormalizedAddress, b: &NormalizedAddress) -> bool {
    if a.street_name.is_empty() || b.street_name.is_empty() {
        return false;
    }
    let left = a.street_name.to_lowercase();
    let right = b.street_name.to_lowercase();
    left.contains(&right) || right.contains(&left)
}
