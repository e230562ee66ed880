//! Property identity resolution: decide which canonical property an external record
//! describes, then fold its values in without losing what is already known.

pub mod address;
pub mod cache;
pub mod domain;
pub mod extractors;
pub mod geocode;
pub mod matcher;
pub mod merge;
pub mod repository;
pub mod selector;
pub mod service;

#[cfg(test)]
mod tests;

pub use address::{normalize_address, NormalizedAddress};
pub use cache::{CachePolicy, Clock, SystemClock, TtlCache};
pub use domain::{
    CanonicalProperty, Coordinates, EpcRating, FieldSet, LicenceDetails, LicenceStatus,
    LicensingScheme, ListingType, OwnerFields, OwnerType, Ownership, PropertyField, PropertyId,
    RawExternalRecord, SourceName, Tenure,
};
pub use extractors::{
    BroadbandExtractor, ExtractorRegistry, LicenceRegisterExtractor, ListingExtractor,
    SourceExtractor, TitleExtractor,
};
pub use geocode::{CachedGeocoder, GeocodeError, GeocodeKey, Geocoder, NoGeocoder};
pub use matcher::{match_confidence, match_confidence_with, MatchConfidence, MatchFields, MatchPolicy};
pub use merge::{reconcile, reconcile_at, CreationRejection, MergeOutcome, ReconcileError};
pub use repository::{InMemoryPropertyRepository, NearbyQuery, PropertyRepository, RepositoryError};
pub use selector::{rank_candidates, select_best_candidate, Candidate, RankedCandidate};
pub use service::{EnrichOutcome, IngestOutcome, ResolutionError, ResolutionService};
