use super::common::*;
use crate::resolution::domain::Tenure;
use crate::resolution::matcher::{
    match_confidence, match_confidence_with, MatchConfidence, MatchFields, MatchPolicy,
};
use crate::resolution::selector::{rank_candidates, select_best_candidate, Candidate};

#[test]
fn identical_address_postcode_and_bedrooms_is_exact() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidate = fields("21 Elm Road", "E8 1EJ", 5);

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::Exact);
}

#[test]
fn same_district_different_outcode_is_only_ever_nearby() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidate = fields("21 Elm Road", "E11 2AB", 4);

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::Nearby);
}

#[test]
fn tiers_follow_which_identifiers_agree() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);

    let high = fields("21 Oak Road", "E8 3PQ", 5);
    let medium = fields("23 Elm Road", "E8 1EJ", 5);
    let low = fields("23 Elm Road", "E8 1EJ", 2);
    let nearby = fields("40 Oak Road", "E8 1EJ", 4);

    assert_eq!(match_confidence(&target, &high), MatchConfidence::High);
    assert_eq!(match_confidence(&target, &medium), MatchConfidence::Medium);
    assert_eq!(match_confidence(&target, &low), MatchConfidence::Low);
    assert_eq!(match_confidence(&target, &nearby), MatchConfidence::Nearby);
}

#[test]
fn different_district_never_matches_even_with_identical_street() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidate = fields("21 Elm Road", "M1 1AA", 5);

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::None);
}

#[test]
fn missing_postcode_never_matches() {
    let target = MatchFields::new("21 Elm Road", None, Some(5));
    let candidate = MatchFields::new("21 Elm Road", None, Some(5));

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::None);
}

#[test]
fn bedroom_gap_beyond_tolerance_is_none() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidate = fields("40 Oak Road", "E11 2AB", 2);

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::None);

    let wider = MatchPolicy {
        nearby_bedroom_tolerance: 3,
        ..MatchPolicy::default()
    };
    assert_eq!(
        match_confidence_with(&wider, &target, &candidate),
        MatchConfidence::Nearby
    );
}

#[test]
fn unknown_bedrooms_cannot_support_nearby() {
    let target = MatchFields::new("21 Elm Road", Some("E8 1EJ"), None);
    let candidate = fields("40 Oak Road", "E11 2AB", 4);

    assert_eq!(match_confidence(&target, &candidate), MatchConfidence::None);
}

#[test]
fn agreeing_on_more_identifiers_never_lowers_confidence() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let steps = [
        fields("40 Oak Road", "E11 2AB", 4),
        fields("23 Elm Road", "E8 1EJ", 2),
        fields("23 Elm Road", "E8 1EJ", 5),
        fields("21 Elm Road", "E8 1EJ", 5),
    ];

    let confidences: Vec<_> = steps
        .iter()
        .map(|candidate| match_confidence(&target, candidate))
        .collect();
    assert!(confidences.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(confidences.last(), Some(&MatchConfidence::Exact));
}

#[test]
fn confidence_ordering_is_total_from_none_to_exact() {
    let ordered = [
        MatchConfidence::None,
        MatchConfidence::Nearby,
        MatchConfidence::Low,
        MatchConfidence::Medium,
        MatchConfidence::High,
        MatchConfidence::Exact,
    ];
    assert!(ordered.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!MatchConfidence::None.is_usable());
    assert!(MatchConfidence::Nearby.is_usable());
}

#[test]
fn best_candidate_prefers_highest_confidence() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidates = vec![
        Candidate::new(fields("40 Oak Road", "E11 2AB", 4), "nearby"),
        Candidate::new(fields("21 Elm Road", "E8 1EJ", 5), "exact"),
        Candidate::new(fields("23 Elm Road", "E8 1EJ", 5), "medium"),
    ];

    let best = select_best_candidate(&MatchPolicy::default(), &target, &candidates)
        .expect("a usable candidate");

    assert_eq!(best.candidate.item, "exact");
    assert_eq!(best.index, 1);
    assert_eq!(best.confidence, MatchConfidence::Exact);
}

#[test]
fn freehold_title_wins_a_confidence_tie() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidates = vec![
        Candidate::new(fields("21 Elm Road", "E8 1EJ", 5), "leasehold")
            .with_tenure(Some(Tenure::Leasehold)),
        Candidate::new(fields("21 Elm Road", "E8 1EJ", 5), "unknown"),
        Candidate::new(fields("21 Elm Road", "E8 1EJ", 5), "freehold")
            .with_tenure(Some(Tenure::Freehold)),
    ];

    let best = select_best_candidate(&MatchPolicy::default(), &target, &candidates)
        .expect("a usable candidate");

    assert_eq!(best.candidate.item, "freehold");
}

#[test]
fn ties_without_tenure_keep_first_seen_order() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidates = vec![
        Candidate::new(fields("23 Elm Road", "E8 1EJ", 5), "first"),
        Candidate::new(fields("25 Elm Road", "E8 1EJ", 5), "second"),
    ];

    let ranked = rank_candidates(&MatchPolicy::default(), &target, &candidates);

    let order: Vec<_> = ranked.iter().map(|r| r.candidate.item).collect();
    assert_eq!(order, vec!["first", "second"]);
}

#[test]
fn no_usable_candidate_selects_nothing() {
    let target = fields("21 Elm Road", "E8 1EJ", 5);
    let candidates = vec![
        Candidate::new(fields("21 Elm Road", "M1 1AA", 5), ()),
        Candidate::new(fields("21 Elm Road", "LS1 4DY", 5), ()),
    ];

    assert!(select_best_candidate(&MatchPolicy::default(), &target, &candidates).is_none());
    assert!(select_best_candidate::<()>(&MatchPolicy::default(), &target, &[]).is_none());
}
