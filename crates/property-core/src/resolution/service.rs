use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::{Clock, SystemClock};
use super::domain::{
    Coordinates, FieldSet, PropertyField, PropertyId, RawExternalRecord, SourceName,
};
use super::extractors::ExtractorRegistry;
use super::geocode::Geocoder;
use super::extractors::SourceExtractor;
use super::matcher::{MatchConfidence, MatchFields, MatchPolicy};
use super::merge::{reconcile_at, ReconcileError};
use super::repository::{NearbyQuery, PropertyRepository, RepositoryError};
use super::selector::{select_best_candidate, Candidate};

/// What happened to one incoming record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Matched {
        property_id: PropertyId,
        confidence: MatchConfidence,
        changed: Vec<PropertyField>,
    },
    Created {
        property_id: PropertyId,
    },
}

impl IngestOutcome {
    pub fn property_id(&self) -> PropertyId {
        match self {
            IngestOutcome::Matched { property_id, .. } | IngestOutcome::Created { property_id } => {
                *property_id
            }
        }
    }
}

/// Result of checking one source for an existing property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichOutcome {
    pub property_id: PropertyId,
    pub source: SourceName,
    /// `None` when no candidate was usable; the enrichment timestamp is still stamped.
    pub matched: Option<MatchConfidence>,
    pub changed: Vec<PropertyField>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Rejected(#[from] ReconcileError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Mutexes created on demand per key and dropped once no caller holds or awaits them.
struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn with_lock<T>(&self, key: &K, work: impl FnOnce() -> T) -> T {
        let lock = self.table().entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            work()
        };

        let mut table = self.table();
        // one reference in the table and ours: nobody else is waiting on this key
        if Arc::strong_count(&lock) == 2 {
            table.remove(key);
        }
        result
    }

    fn len(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<K, Arc<Mutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Service composing extraction, matching, selection and reconciliation over a store.
///
/// Merges into one property id are serialized through a per-id lock; different ids
/// proceed in parallel. Ingestion holds a lock on the record's postcode district from
/// candidate lookup until the property is merged or created, so concurrent records
/// for the same new address cannot both create it. Locks are dropped once released.
pub struct ResolutionService<R, G> {
    repository: Arc<R>,
    geocoder: Arc<G>,
    extractors: ExtractorRegistry,
    policy: MatchPolicy,
    clock: Arc<dyn Clock>,
    property_locks: KeyedLocks<PropertyId>,
    district_locks: KeyedLocks<String>,
}

impl<R, G> ResolutionService<R, G>
where
    R: PropertyRepository + 'static,
    G: Geocoder + 'static,
{
    pub fn new(repository: Arc<R>, geocoder: Arc<G>, policy: MatchPolicy) -> Self {
        Self {
            repository,
            geocoder,
            extractors: ExtractorRegistry::standard(),
            policy,
            clock: Arc::new(SystemClock),
            property_locks: KeyedLocks::new(),
            district_locks: KeyedLocks::new(),
        }
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Identify the property a record describes and fold it in, creating one when nothing matches.
    pub fn ingest(&self, record: &RawExternalRecord) -> Result<IngestOutcome, ResolutionError> {
        let extractor = self.extractors.for_source(&record.source);
        let target = extractor.match_fields(record);
        let district = target.normalized.district.clone();

        self.district_locks
            .with_lock(&district, || self.resolve_or_create(record, extractor, &target))
    }

    fn resolve_or_create(
        &self,
        record: &RawExternalRecord,
        extractor: &dyn SourceExtractor,
        target: &MatchFields,
    ) -> Result<IngestOutcome, ResolutionError> {
        let mut fields = extractor.field_set(record);

        let query = NearbyQuery {
            district: target.normalized.district.clone(),
            coordinates: record.coordinates,
            radius_km: self.policy.candidate_radius_km,
        };
        let candidates: Vec<Candidate<PropertyId>> = self
            .repository
            .nearby(&query)?
            .into_iter()
            .map(|property| {
                Candidate::new(
                    MatchFields::new(
                        &property.address,
                        property.postcode.as_deref(),
                        Some(property.bedrooms),
                    ),
                    property.id,
                )
                .with_tenure(property.ownership.tenure)
            })
            .collect();

        debug!(
            source = %record.source,
            address = %target.normalized.normalized_full,
            candidates = candidates.len(),
            "resolving incoming record"
        );

        if let Some(best) = select_best_candidate(&self.policy, target, &candidates) {
            let property_id = best.candidate.item;
            let confidence = best.confidence;
            let changed = self.merge_into(&property_id, &fields, &record.source)?;
            info!(
                source = %record.source,
                property_id = %property_id,
                confidence = %confidence,
                changed = changed.len(),
                "record matched existing property"
            );
            return Ok(IngestOutcome::Matched {
                property_id,
                confidence,
                changed,
            });
        }

        if fields.coordinates.is_none() {
            fields.coordinates = self.lookup_coordinates(record);
        }

        let outcome = match reconcile_at(None, &fields, &record.source, self.clock.now()) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(source = %record.source, address = %record.address, "enrichment skipped: {err}");
                return Err(err.into());
            }
        };

        let stored = self.repository.insert(outcome.property)?;
        info!(
            source = %record.source,
            property_id = %stored.id,
            "created canonical property"
        );
        Ok(IngestOutcome::Created {
            property_id: stored.id,
        })
    }

    /// Ingest many records in order, keeping each record's result.
    pub fn ingest_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a RawExternalRecord>,
    ) -> Vec<Result<IngestOutcome, ResolutionError>> {
        records.into_iter().map(|record| self.ingest(record)).collect()
    }

    /// Pick the best of `candidates` from `source` for an existing property and merge it.
    pub fn enrich(
        &self,
        property_id: &PropertyId,
        source: &SourceName,
        candidates: &[RawExternalRecord],
    ) -> Result<EnrichOutcome, ResolutionError> {
        self.property_locks.with_lock(property_id, || {
            self.enrich_locked(property_id, source, candidates)
        })
    }

    fn enrich_locked(
        &self,
        property_id: &PropertyId,
        source: &SourceName,
        candidates: &[RawExternalRecord],
    ) -> Result<EnrichOutcome, ResolutionError> {
        let property = self
            .repository
            .fetch(property_id)?
            .ok_or(RepositoryError::NotFound)?;
        let target = MatchFields::new(
            &property.address,
            property.postcode.as_deref(),
            Some(property.bedrooms),
        );

        let extractor = self.extractors.for_source(source);
        let scored: Vec<Candidate<usize>> = candidates
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Candidate::new(extractor.match_fields(record), index)
                    .with_tenure(extractor.tenure(record))
            })
            .collect();

        let (matched, fields) = match select_best_candidate(&self.policy, &target, &scored) {
            Some(best) => (
                Some(best.confidence),
                extractor.field_set(&candidates[best.candidate.item]),
            ),
            None => (None, FieldSet::default()),
        };

        let outcome = reconcile_at(Some(property), &fields, source, self.clock.now())?;
        self.repository.update(outcome.property)?;

        match matched {
            Some(confidence) => info!(
                source = %source,
                property_id = %property_id,
                confidence = %confidence,
                changed = outcome.changed.len(),
                "property enriched"
            ),
            None => debug!(
                source = %source,
                property_id = %property_id,
                candidates = candidates.len(),
                "no usable candidate; enrichment timestamp stamped"
            ),
        }

        Ok(EnrichOutcome {
            property_id: *property_id,
            source: source.clone(),
            matched,
            changed: outcome.changed,
        })
    }

    fn merge_into(
        &self,
        property_id: &PropertyId,
        fields: &FieldSet,
        source: &SourceName,
    ) -> Result<Vec<PropertyField>, ResolutionError> {
        self.property_locks.with_lock(property_id, || {
            // re-read under the lock; the nearby snapshot may be stale
            let property = self
                .repository
                .fetch(property_id)?
                .ok_or(RepositoryError::NotFound)?;
            let outcome = reconcile_at(Some(property), fields, source, self.clock.now())?;
            self.repository.update(outcome.property)?;
            Ok(outcome.changed)
        })
    }

    fn lookup_coordinates(&self, record: &RawExternalRecord) -> Option<Coordinates> {
        match self
            .geocoder
            .geocode(&record.address, record.postcode.as_deref())
        {
            Ok(found) => found,
            Err(err) => {
                warn!(source = %record.source, address = %record.address, "geocoding failed: {err}");
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn held_locks(&self) -> usize {
        self.property_locks.len() + self.district_locks.len()
    }
}
