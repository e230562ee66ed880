use crate::resolution::{CanonicalProperty, LicenceStatus, LicensingScheme};

use super::config::DealScoreConfig;
use super::{DealFactor, FactorScore};

/// Facts surfaced alongside the sub-scores for the classifiers.
pub(crate) struct ScoreSignals {
    pub gross_yield_pct: Option<f64>,
    pub estimated_monthly_cashflow: Option<f64>,
    pub space_standard_met: Option<bool>,
}

pub(crate) fn score_property(
    property: &CanonicalProperty,
    config: &DealScoreConfig,
) -> (Vec<FactorScore>, ScoreSignals) {
    let gross_yield_pct = gross_yield(property);
    let (location, space_standard_met) = location_score(property, config);

    let components = vec![
        yield_score(gross_yield_pct, config),
        epc_score(property, config),
        compliance_score(property, config),
        location,
    ];

    let signals = ScoreSignals {
        gross_yield_pct,
        estimated_monthly_cashflow: monthly_cashflow(property, config),
        space_standard_met,
    };

    (components, signals)
}

fn component(
    factor: DealFactor,
    config: &DealScoreConfig,
    sub_score: f64,
    defaulted: bool,
    notes: String,
) -> FactorScore {
    let weight = match factor {
        DealFactor::Yield => config.weights.yield_pct,
        DealFactor::Epc => config.weights.epc_pct,
        DealFactor::Compliance => config.weights.compliance_pct,
        DealFactor::Location => config.weights.location_pct,
    };
    let sub_score = clamp_score(sub_score);
    FactorScore {
        factor,
        sub_score,
        weight,
        contribution: sub_score * weight as f64 / 100.0,
        defaulted,
        notes,
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn gross_yield(property: &CanonicalProperty) -> Option<f64> {
    match (property.monthly_rent, property.purchase_price) {
        (Some(rent), Some(price)) if rent > 0 && price > 0 => {
            Some(rent as f64 * 12.0 / price as f64 * 100.0)
        }
        _ => None,
    }
}

fn yield_score(gross_yield_pct: Option<f64>, config: &DealScoreConfig) -> FactorScore {
    let Some(yield_pct) = gross_yield_pct else {
        return component(
            DealFactor::Yield,
            config,
            config.unknown.yield_score,
            true,
            "rent or purchase price unknown; assuming average yield".to_string(),
        );
    };

    let target = config.yield_target_pct.max(f64::EPSILON);
    let ceiling = config.yield_ceiling_pct.max(target);
    let score = if yield_pct <= target {
        85.0 * yield_pct / target
    } else if yield_pct < ceiling {
        // shallower slope above target, flat once the ceiling is reached
        85.0 + 15.0 * (yield_pct - target) / (ceiling - target)
    } else {
        100.0
    };

    component(
        DealFactor::Yield,
        config,
        score,
        false,
        format!("gross yield {yield_pct:.2}% (target {target:.1}%, ceiling {ceiling:.1}%)"),
    )
}

fn epc_score(property: &CanonicalProperty, config: &DealScoreConfig) -> FactorScore {
    match property.epc_rating {
        Some(rating) => component(
            DealFactor::Epc,
            config,
            config.epc_scores.for_rating(rating),
            false,
            format!("EPC band {}", rating.letter()),
        ),
        None => component(
            DealFactor::Epc,
            config,
            config.unknown.epc_score,
            true,
            "EPC rating unknown".to_string(),
        ),
    }
}

fn compliance_score(property: &CanonicalProperty, config: &DealScoreConfig) -> FactorScore {
    let status = property.licence.status;
    if property.article_4.is_none() && property.licensing_scheme.is_none() && status.is_none() {
        return component(
            DealFactor::Compliance,
            config,
            config.unknown.compliance_score,
            true,
            "planning and licensing position unknown".to_string(),
        );
    }

    let mut score = 100.0;
    let mut burdens = Vec::new();

    if property.article_4 == Some(true) {
        score -= config.article_4_penalty;
        burdens.push("article 4 direction");
    }
    if matches!(
        property.licensing_scheme,
        Some(LicensingScheme::Additional | LicensingScheme::Selective)
    ) {
        score -= config.discretionary_licensing_penalty;
        burdens.push("discretionary licensing scheme");
    }
    if matches!(
        status,
        Some(LicenceStatus::Pending | LicenceStatus::Expired | LicenceStatus::Revoked)
    ) {
        score -= config.lapsed_licence_penalty;
        burdens.push("licence not active");
    }

    let notes = if burdens.is_empty() {
        "no compliance burden recorded".to_string()
    } else {
        burdens.join(", ")
    };
    component(DealFactor::Compliance, config, score, false, notes)
}

fn location_score(
    property: &CanonicalProperty,
    config: &DealScoreConfig,
) -> (FactorScore, Option<bool>) {
    let occupants = property
        .licence
        .max_occupants
        .unwrap_or(property.bedrooms)
        .max(1);
    let required = config.space_standard.required_sqm(occupants);

    let (mut score, defaulted, met, mut notes) = match property.floor_area_sqm {
        Some(area) => {
            let ratio = area / required;
            let floor = config.space_standard.zero_score_ratio.clamp(0.0, 0.99);
            let score = if ratio >= 1.0 {
                100.0
            } else if ratio <= floor {
                0.0
            } else {
                100.0 * (ratio - floor) / (1.0 - floor)
            };
            (
                score,
                false,
                Some(ratio >= 1.0),
                format!("{area:.0} sqm against {required:.0} sqm for {occupants} occupant(s)"),
            )
        }
        None => (
            config.unknown.location_score,
            true,
            None,
            "floor area unknown".to_string(),
        ),
    };

    if let Some(mbps) = property.broadband_max_mbps {
        if mbps < config.slow_broadband_mbps {
            score -= config.slow_broadband_penalty;
            notes.push_str(&format!("; broadband limited to {mbps} Mbps"));
        }
    }

    (
        component(DealFactor::Location, config, score, defaulted, notes),
        met,
    )
}

fn monthly_cashflow(property: &CanonicalProperty, config: &DealScoreConfig) -> Option<f64> {
    let rent = property.monthly_rent? as f64;
    let price = property.purchase_price? as f64;
    let financials = &config.financials;
    let costs = rent * financials.operating_cost_ratio;
    let interest = price * financials.loan_to_value * financials.mortgage_rate_pct / 100.0 / 12.0;
    Some(((rent - costs - interest) * 100.0).round() / 100.0)
}
