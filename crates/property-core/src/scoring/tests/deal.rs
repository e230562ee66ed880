use super::common::*;
use crate::resolution::{EpcRating, LicenceStatus, LicensingScheme};
use crate::scoring::{
    compute_deal_score, DealFactor, DealScoreConfig, DealScoringEngine, HmoClassification,
    HmoPolicy, ScoreWeights,
};

#[test]
fn complete_property_scores_every_factor_from_its_inputs() {
    let result = compute_deal_score(&hmo_property());

    assert_eq!(result.score, 92);
    assert_close(result.contribution(DealFactor::Yield).expect("yield"), 35.0);
    assert_close(result.contribution(DealFactor::Epc).expect("epc"), 17.0);
    assert_close(result.contribution(DealFactor::Compliance).expect("compliance"), 20.0);
    assert_close(result.contribution(DealFactor::Location).expect("location"), 20.0);
    assert!(result.components.iter().all(|c| !c.defaulted));
    assert_eq!(result.gross_yield_pct, Some(9.0));
    assert_eq!(result.estimated_monthly_cashflow, Some(435.0));
    assert_eq!(result.space_standard_met, Some(true));
    assert_eq!(result.classification, None);
}

#[test]
fn missing_inputs_fall_back_to_average_instead_of_failing() {
    let result = compute_deal_score(&bare_property());

    assert_eq!(result.score, 50);
    assert_eq!(result.components.len(), 4);
    assert!(result.components.iter().all(|c| c.defaulted));
    assert_eq!(result.gross_yield_pct, None);
    assert_eq!(result.estimated_monthly_cashflow, None);
    assert_eq!(result.space_standard_met, None);
}

#[test]
fn weights_bound_each_contribution_and_total_stays_in_range() {
    let result = compute_deal_score(&hmo_property());
    let weights = ScoreWeights::default();

    for component in &result.components {
        assert!(component.sub_score >= 0.0 && component.sub_score <= 100.0);
        assert!(component.contribution <= component.weight as f64 + 1e-9);
    }
    assert_eq!(weights.total(), 100);
    assert!(result.score <= 100);
}

#[test]
fn compliance_burdens_stack_as_penalties() {
    let mut property = hmo_property();
    property.article_4 = Some(true);
    property.licensing_scheme = Some(LicensingScheme::Additional);
    property.licence.status = Some(LicenceStatus::Expired);

    let result = compute_deal_score(&property);

    assert_close(result.contribution(DealFactor::Compliance).expect("compliance"), 3.0);
    assert_eq!(result.score, 75);
    let compliance = result
        .components
        .iter()
        .find(|c| c.factor == DealFactor::Compliance)
        .expect("compliance component");
    assert!(compliance.notes.contains("article 4"));
    assert!(compliance.notes.contains("licence not active"));
}

#[test]
fn higher_yield_never_lowers_the_score() {
    let mut previous = 0;
    for rent in [600, 1_000, 1_600, 2_000, 2_800, 3_600] {
        let mut property = hmo_property();
        property.monthly_rent = Some(rent);
        let score = compute_deal_score(&property).score;
        assert!(score >= previous, "rent {rent} scored {score} after {previous}");
        previous = score;
    }

    let mut at_ceiling = hmo_property();
    at_ceiling.monthly_rent = Some(2_800);
    let result = compute_deal_score(&at_ceiling);
    assert_close(result.contribution(DealFactor::Yield).expect("yield"), 40.0);
}

#[test]
fn better_epc_band_never_lowers_the_score() {
    let bands = [
        EpcRating::G,
        EpcRating::F,
        EpcRating::E,
        EpcRating::D,
        EpcRating::C,
        EpcRating::B,
        EpcRating::A,
    ];
    let mut previous = 0;
    for band in bands {
        let mut property = hmo_property();
        property.epc_rating = Some(band);
        let score = compute_deal_score(&property).score;
        assert!(score >= previous);
        previous = score;
    }
}

#[test]
fn undersized_floor_area_misses_space_standard() {
    let mut property = hmo_property();
    property.floor_area_sqm = Some(78.4);

    let result = compute_deal_score(&property);

    assert_eq!(result.space_standard_met, Some(false));
    assert_close(result.contribution(DealFactor::Location).expect("location"), 10.0);
}

#[test]
fn occupancy_falls_back_to_bedrooms_without_a_licence_cap() {
    let mut property = hmo_property();
    property.licence.max_occupants = None;
    // 20 + 13 * 5 bedrooms
    property.floor_area_sqm = Some(85.0);

    let result = compute_deal_score(&property);

    assert_eq!(result.space_standard_met, Some(true));
}

#[test]
fn slow_broadband_reduces_location() {
    let mut property = hmo_property();
    property.broadband_max_mbps = Some(5);

    let result = compute_deal_score(&property);

    assert_close(result.contribution(DealFactor::Location).expect("location"), 17.0);
    assert_eq!(result.score, 89);
}

#[test]
fn engine_applies_configured_weights() {
    let engine = DealScoringEngine::new(DealScoreConfig {
        weights: ScoreWeights {
            yield_pct: 100,
            epc_pct: 0,
            compliance_pct: 0,
            location_pct: 0,
        },
        ..DealScoreConfig::default()
    });

    let result = engine.score(&hmo_property());

    assert_eq!(result.score, 88);
    assert_close(result.contribution(DealFactor::Epc).expect("epc"), 0.0);
}

#[test]
fn score_and_classify_attaches_hmo_classification() {
    let engine = DealScoringEngine::default();
    let result = engine.score_and_classify(&hmo_property(), &HmoPolicy::default());

    assert_eq!(result.score, 92);
    assert_eq!(result.classification, Some(HmoClassification::ReadyToGo));
}
