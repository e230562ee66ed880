use std::cmp::Ordering;

use super::domain::Tenure;
use super::matcher::{match_confidence_with, MatchConfidence, MatchFields, MatchPolicy};

/// A record competing to be identified with a target property.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub fields: MatchFields,
    /// Only ownership records carry tenure; listings leave it unset.
    pub tenure: Option<Tenure>,
    pub item: T,
}

impl<T> Candidate<T> {
    pub fn new(fields: MatchFields, item: T) -> Self {
        Self {
            fields,
            tenure: None,
            item,
        }
    }

    pub fn with_tenure(mut self, tenure: Option<Tenure>) -> Self {
        self.tenure = tenure;
        self
    }
}

/// A candidate together with its position in the input and its confidence tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate<'a, T> {
    pub index: usize,
    pub confidence: MatchConfidence,
    pub candidate: &'a Candidate<T>,
}

/// Score and order every candidate: tier first, freehold before leasehold, then input order.
pub fn rank_candidates<'a, T>(
    policy: &MatchPolicy,
    target: &MatchFields,
    candidates: &'a [Candidate<T>],
) -> Vec<RankedCandidate<'a, T>> {
    let mut ranked: Vec<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| RankedCandidate {
            index,
            confidence: match_confidence_with(policy, target, &candidate.fields),
            candidate,
        })
        .collect();

    // sort_by is stable, so equal keys keep first-seen order
    ranked.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| tenure_preference(a.candidate.tenure, b.candidate.tenure))
    });
    ranked
}

/// The winning candidate, or `None` when nothing reaches above `MatchConfidence::None`.
pub fn select_best_candidate<'a, T>(
    policy: &MatchPolicy,
    target: &MatchFields,
    candidates: &'a [Candidate<T>],
) -> Option<RankedCandidate<'a, T>> {
    rank_candidates(policy, target, candidates)
        .into_iter()
        .next()
        .filter(|ranked| ranked.confidence.is_usable())
}

fn tenure_preference(a: Option<Tenure>, b: Option<Tenure>) -> Ordering {
    let rank = |tenure: Option<Tenure>| match tenure {
        Some(Tenure::Freehold) => 0,
        Some(Tenure::Leasehold) | None => 1,
    };
    rank(a).cmp(&rank(b))
}
