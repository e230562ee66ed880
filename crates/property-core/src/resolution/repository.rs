use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::address::{district_of, outcode_of};
use super::domain::{CanonicalProperty, Coordinates, PropertyId};

/// Area filter used to pull candidate properties around an incoming record.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    /// Postcode district ("E" for "E8 1EJ"); empty when unknown.
    pub district: String,
    pub coordinates: Option<Coordinates>,
    pub radius_km: f64,
}

/// Storage abstraction for canonical properties; persistence lives outside the engine.
pub trait PropertyRepository: Send + Sync {
    fn insert(&self, property: CanonicalProperty) -> Result<CanonicalProperty, RepositoryError>;
    fn update(&self, property: CanonicalProperty) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<CanonicalProperty>, RepositoryError>;
    fn nearby(&self, query: &NearbyQuery) -> Result<Vec<CanonicalProperty>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("property already exists")]
    Conflict,
    #[error("property not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store, ordered by insertion so candidate order is deterministic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPropertyRepository {
    records: Arc<Mutex<BTreeMap<u64, CanonicalProperty>>>,
}

impl InMemoryPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: impl IntoIterator<Item = CanonicalProperty>) -> Self {
        let repository = Self::new();
        {
            let mut guard = repository.lock();
            for (sequence, property) in properties.into_iter().enumerate() {
                guard.insert(sequence as u64, property);
            }
        }
        repository
    }

    pub fn all(&self) -> Vec<CanonicalProperty> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, CanonicalProperty>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn within(query: &NearbyQuery, property: &CanonicalProperty) -> bool {
    if let Some(origin) = &query.coordinates {
        if origin.distance_km(&property.coordinates) <= query.radius_km {
            return true;
        }
    }
    if query.district.is_empty() {
        return false;
    }
    property
        .postcode
        .as_deref()
        .map(|postcode| district_of(&outcode_of(postcode)) == query.district)
        .unwrap_or(false)
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn insert(&self, property: CanonicalProperty) -> Result<CanonicalProperty, RepositoryError> {
        let mut guard = self.lock();
        if guard.values().any(|existing| existing.id == property.id) {
            return Err(RepositoryError::Conflict);
        }
        let sequence = guard.keys().next_back().map(|last| last + 1).unwrap_or(0);
        guard.insert(sequence, property.clone());
        Ok(property)
    }

    fn update(&self, property: CanonicalProperty) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let slot = guard
            .values_mut()
            .find(|existing| existing.id == property.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = property;
        Ok(())
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<CanonicalProperty>, RepositoryError> {
        Ok(self.lock().values().find(|p| &p.id == id).cloned())
    }

    fn nearby(&self, query: &NearbyQuery) -> Result<Vec<CanonicalProperty>, RepositoryError> {
        Ok(self
            .lock()
            .values()
            .filter(|property| within(query, property))
            .cloned()
            .collect())
    }
}
