//! Geocoding contract used when a record arrives without coordinates.
//!
//! The engine never geocodes on its own; a collaborator does. Lookups are memoized:
//! found coordinates for the positive TTL, a confirmed "no result" for the shorter
//! negative TTL, and transient failures not at all.

use tracing::debug;

use super::address::normalize_address;
use super::cache::{CachePolicy, Clock, SystemClock, TtlCache};
use super::domain::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
    #[error("geocoder returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// `Ok(None)` means the provider confirmed it has no location for the address.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        address: &str,
        postcode: Option<&str>,
    ) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Geocoder for pipelines that only accept records with supplied coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn geocode(
        &self,
        _address: &str,
        _postcode: Option<&str>,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(None)
    }
}

/// Cache fingerprint: normalized address text plus outcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeocodeKey {
    pub normalized_address: String,
    pub outcode: String,
}

impl GeocodeKey {
    pub fn new(address: &str, postcode: Option<&str>) -> Self {
        let normalized = normalize_address(address, postcode);
        Self {
            normalized_address: normalized.normalized_full,
            outcode: normalized.outcode,
        }
    }
}

pub struct CachedGeocoder<G, C = SystemClock> {
    inner: G,
    cache: TtlCache<GeocodeKey, Option<Coordinates>>,
    policy: CachePolicy,
    clock: C,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, policy: CachePolicy) -> Self {
        Self::with_clock(inner, policy, SystemClock)
    }
}

impl<G: Geocoder, C: Clock> CachedGeocoder<G, C> {
    pub fn with_clock(inner: G, policy: CachePolicy, clock: C) -> Self {
        Self {
            inner,
            cache: TtlCache::new(),
            policy,
            clock,
        }
    }

    /// Drop a memoized answer, e.g. after an address correction.
    pub fn invalidate(&self, address: &str, postcode: Option<&str>) -> bool {
        self.cache.invalidate(&GeocodeKey::new(address, postcode))
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

impl<G: Geocoder, C: Clock> Geocoder for CachedGeocoder<G, C> {
    fn geocode(
        &self,
        address: &str,
        postcode: Option<&str>,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        let key = GeocodeKey::new(address, postcode);
        let now = self.clock.now();

        if let Some(hit) = self.cache.get(&key, now) {
            debug!(address = %key.normalized_address, found = hit.is_some(), "geocode cache hit");
            return Ok(hit);
        }

        let result = self.inner.geocode(address, postcode)?;
        let ttl = match result {
            Some(_) => self.policy.positive_ttl(),
            None => self.policy.negative_ttl(),
        };
        debug!(address = %key.normalized_address, found = result.is_some(), "geocode cache miss");
        self.cache.insert(key, result, ttl, now);
        Ok(result)
    }
}
