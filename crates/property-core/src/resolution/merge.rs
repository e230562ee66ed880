//! Field-level reconciliation of one source's values into a canonical property.
//!
//! Absence never destroys presence: a `None` (or blank string) in the incoming
//! [`FieldSet`] leaves the canonical value untouched. Every value that is written is
//! tagged with the writing source, and the source's enrichment timestamp is stamped on
//! every pass whether or not anything changed.
//!
//! The merge is a read-modify-write over one record; callers must not run two merges
//! for the same property id concurrently.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{
    CanonicalProperty, Coordinates, FieldSet, LicenceDetails, Ownership, PropertyField,
    PropertyId, SourceName,
};

/// Why a brand-new property could not be created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreationRejection {
    #[error("address is missing or blank")]
    MissingAddress,
    #[error("coordinates are missing")]
    MissingCoordinates,
    #[error("coordinates ({latitude}, {longitude}) are not usable")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("bedroom count is missing")]
    MissingBedrooms,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    #[error("creation rejected for record from {source_name}: {}", join_rejections(.problems))]
    CreationRejected {
        source_name: SourceName,
        problems: Vec<CreationRejection>,
    },
}

fn join_rejections(problems: &[CreationRejection]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a reconciliation pass, including which fields actually changed value.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub property: CanonicalProperty,
    pub created: bool,
    pub changed: Vec<PropertyField>,
}

/// Merge `incoming` from `source` into `existing`, or create a new property when `existing` is `None`.
pub fn reconcile(
    existing: Option<CanonicalProperty>,
    incoming: &FieldSet,
    source: &SourceName,
) -> Result<CanonicalProperty, ReconcileError> {
    reconcile_at(existing, incoming, source, Utc::now()).map(|outcome| outcome.property)
}

/// Same as [`reconcile`] with an explicit clock.
pub fn reconcile_at(
    existing: Option<CanonicalProperty>,
    incoming: &FieldSet,
    source: &SourceName,
    now: DateTime<Utc>,
) -> Result<MergeOutcome, ReconcileError> {
    let (mut property, created) = match existing {
        Some(property) => (property, false),
        None => (create(incoming, source, now)?, true),
    };

    let changed = apply(&mut property, incoming, source);
    if !changed.is_empty() || created {
        property.updated_at = now;
    }
    property.enriched_at.insert(source.clone(), now);

    Ok(MergeOutcome {
        property,
        created,
        changed,
    })
}

fn create(
    incoming: &FieldSet,
    source: &SourceName,
    now: DateTime<Utc>,
) -> Result<CanonicalProperty, ReconcileError> {
    let mut problems = Vec::new();

    let address = present(&incoming.address);
    if address.is_none() {
        problems.push(CreationRejection::MissingAddress);
    }

    match incoming.coordinates {
        None => problems.push(CreationRejection::MissingCoordinates),
        Some(coordinates) if !coordinates.is_valid() => {
            problems.push(CreationRejection::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            })
        }
        Some(_) => {}
    }

    if incoming.bedrooms.is_none() {
        problems.push(CreationRejection::MissingBedrooms);
    }

    match (address, incoming.coordinates, incoming.bedrooms) {
        (Some(address), Some(coordinates), Some(bedrooms)) if problems.is_empty() => {
            Ok(CanonicalProperty {
                id: PropertyId::generate(),
                address,
                postcode: None,
                city: None,
                coordinates,
                bedrooms,
                floor_area_sqm: None,
                listing_type: None,
                purchase_price: None,
                monthly_rent: None,
                epc_rating: None,
                article_4: None,
                licensing_scheme: None,
                licence: LicenceDetails::default(),
                ownership: Ownership::default(),
                owner_is_licence_holder: false,
                broadband_max_mbps: None,
                provenance: BTreeMap::new(),
                enriched_at: BTreeMap::new(),
                created_at: now,
                updated_at: now,
            })
        }
        _ => Err(ReconcileError::CreationRejected {
            source_name: source.clone(),
            problems,
        }),
    }
}

/// Tracks provenance stamping and changed fields for one pass.
struct FieldWriter<'a> {
    provenance: &'a mut BTreeMap<PropertyField, SourceName>,
    source: &'a SourceName,
    changed: Vec<PropertyField>,
}

impl FieldWriter<'_> {
    fn write<T: Clone + PartialEq>(
        &mut self,
        field: PropertyField,
        slot: &mut Option<T>,
        incoming: Option<T>,
    ) {
        if let Some(value) = incoming {
            if slot.as_ref() != Some(&value) {
                self.changed.push(field);
            }
            *slot = Some(value);
            self.provenance.insert(field, self.source.clone());
        }
    }

    fn write_required<T: Clone + PartialEq>(
        &mut self,
        field: PropertyField,
        slot: &mut T,
        incoming: Option<T>,
    ) {
        if let Some(value) = incoming {
            if *slot != value {
                self.changed.push(field);
            }
            *slot = value;
            self.provenance.insert(field, self.source.clone());
        }
    }
}

fn apply(
    property: &mut CanonicalProperty,
    incoming: &FieldSet,
    source: &SourceName,
) -> Vec<PropertyField> {
    let previous_owner = property.ownership.owner_name.clone();
    let previous_holder = property.licence.holder_name.clone();

    let mut writer = FieldWriter {
        provenance: &mut property.provenance,
        source,
        changed: Vec::new(),
    };

    writer.write_required(
        PropertyField::Address,
        &mut property.address,
        present(&incoming.address),
    );
    writer.write_required(
        PropertyField::Coordinates,
        &mut property.coordinates,
        incoming.coordinates.filter(Coordinates::is_valid),
    );
    writer.write_required(PropertyField::Bedrooms, &mut property.bedrooms, incoming.bedrooms);

    writer.write(
        PropertyField::Postcode,
        &mut property.postcode,
        present(&incoming.postcode),
    );
    writer.write(PropertyField::City, &mut property.city, present(&incoming.city));
    writer.write(
        PropertyField::FloorArea,
        &mut property.floor_area_sqm,
        incoming
            .floor_area_sqm
            .filter(|area| area.is_finite() && *area > 0.0),
    );
    writer.write(
        PropertyField::ListingType,
        &mut property.listing_type,
        incoming.listing_type,
    );
    writer.write(
        PropertyField::PurchasePrice,
        &mut property.purchase_price,
        incoming.purchase_price,
    );
    writer.write(
        PropertyField::MonthlyRent,
        &mut property.monthly_rent,
        incoming.monthly_rent,
    );
    writer.write(
        PropertyField::EpcRating,
        &mut property.epc_rating,
        incoming.epc_rating,
    );
    writer.write(PropertyField::Article4, &mut property.article_4, incoming.article_4);
    writer.write(
        PropertyField::LicensingScheme,
        &mut property.licensing_scheme,
        incoming.licensing_scheme,
    );

    let licence = &mut property.licence;
    writer.write(
        PropertyField::LicenceNumber,
        &mut licence.licence_number,
        present(&incoming.licence_number),
    );
    writer.write(
        PropertyField::LicenceStatus,
        &mut licence.status,
        incoming.licence_status,
    );
    writer.write(
        PropertyField::LicenceExpiry,
        &mut licence.expiry,
        incoming.licence_expiry,
    );
    writer.write(
        PropertyField::MaxOccupants,
        &mut licence.max_occupants,
        incoming.max_occupants,
    );
    writer.write(
        PropertyField::LicenceHolder,
        &mut licence.holder_name,
        present(&incoming.licence_holder),
    );

    let ownership = &mut property.ownership;
    writer.write(
        PropertyField::OwnerName,
        &mut ownership.owner_name,
        present(&incoming.owner.owner_name),
    );
    writer.write(
        PropertyField::OwnerType,
        &mut ownership.owner_type,
        incoming.owner.owner_type,
    );
    writer.write(
        PropertyField::CompanyNumber,
        &mut ownership.company_number,
        present(&incoming.owner.company_number),
    );
    writer.write(PropertyField::Tenure, &mut ownership.tenure, incoming.tenure);

    writer.write(
        PropertyField::BroadbandMaxMbps,
        &mut property.broadband_max_mbps,
        incoming.broadband_max_mbps,
    );

    let changed = writer.changed;

    let asserts_both =
        present(&incoming.owner.owner_name).is_some() && present(&incoming.licence_holder).is_some();
    match incoming.owner_is_licence_holder {
        Some(linked) if asserts_both => property.owner_is_licence_holder = linked,
        _ => {
            let owner_moved = property.ownership.owner_name != previous_owner;
            let holder_moved = property.licence.holder_name != previous_holder;
            if owner_moved || holder_moved {
                property.owner_is_licence_holder = false;
            }
        }
    }

    changed
}

/// Trimmed, non-empty copy of an optional string.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
