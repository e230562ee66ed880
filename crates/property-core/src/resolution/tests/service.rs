use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveDate};
use serde_json::json;

use super::common::*;
use crate::resolution::domain::{
    Coordinates, LicenceStatus, PropertyField, PropertyId, SourceName, Tenure,
};
use crate::resolution::geocode::{GeocodeError, Geocoder, NoGeocoder};
use crate::resolution::matcher::{MatchConfidence, MatchPolicy};
use crate::resolution::merge::{CreationRejection, ReconcileError};
use crate::resolution::repository::{
    InMemoryPropertyRepository, PropertyRepository, RepositoryError,
};
use crate::resolution::service::{IngestOutcome, ResolutionError, ResolutionService};

struct FixedGeocoder(Coordinates);

impl Geocoder for FixedGeocoder {
    fn geocode(
        &self,
        _address: &str,
        _postcode: Option<&str>,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(Some(self.0))
    }
}

fn service_with<G: Geocoder + 'static>(
    geocoder: G,
    clock: Arc<StepClock>,
) -> ResolutionService<InMemoryPropertyRepository, G> {
    ResolutionService::new(
        Arc::new(InMemoryPropertyRepository::new()),
        Arc::new(geocoder),
        MatchPolicy::default(),
    )
    .with_clock(clock)
}

fn service(clock: Arc<StepClock>) -> ResolutionService<InMemoryPropertyRepository, NoGeocoder> {
    service_with(NoGeocoder, clock)
}

fn seeded(
    service: &ResolutionService<InMemoryPropertyRepository, NoGeocoder>,
) -> PropertyId {
    match service.ingest(&zoopla_sale_listing()) {
        Ok(IngestOutcome::Created { property_id }) => property_id,
        other => panic!("expected listing to create a property, got {other:?}"),
    }
}

#[test]
fn first_record_creates_and_second_source_enriches_same_property() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock.clone());
    let property_id = seeded(&service);

    clock.advance(Duration::hours(1));
    let outcome = service.ingest(&hmo_register_entry()).expect("register entry ingests");

    match &outcome {
        IngestOutcome::Matched {
            confidence,
            changed,
            ..
        } => {
            assert_eq!(*confidence, MatchConfidence::Exact);
            assert!(changed.contains(&PropertyField::LicenceStatus));
        }
        other => panic!("expected a match, got {other:?}"),
    }
    assert_eq!(outcome.property_id(), property_id);

    let stored = service.repository().all();
    assert_eq!(stored.len(), 1);
    let property = &stored[0];
    assert_eq!(property.purchase_price, Some(240_000));
    assert_eq!(property.monthly_rent, Some(1_800));
    assert_eq!(property.licence.status, Some(LicenceStatus::Active));
    assert_eq!(
        property.licence.expiry,
        NaiveDate::from_ymd_opt(2029, 3, 31)
    );
    assert_eq!(property.licence.max_occupants, Some(6));
    assert_eq!(
        property.source_of(PropertyField::LicenceStatus),
        Some(&SourceName::new(SourceName::HMO_REGISTER))
    );
    assert_eq!(
        property.source_of(PropertyField::PurchasePrice),
        Some(&SourceName::new(SourceName::ZOOPLA))
    );
    assert_eq!(
        property.enriched_at(&SourceName::new(SourceName::ZOOPLA)),
        Some(t0())
    );
    assert_eq!(
        property.enriched_at(&SourceName::new(SourceName::HMO_REGISTER)),
        Some(t0() + Duration::hours(1))
    );
}

#[test]
fn record_in_another_district_creates_a_second_property() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    seeded(&service);

    let manchester = record(
        SourceName::ZOOPLA,
        "3 Canal Street",
        "M1 3HB",
        Some(5),
        Some(Coordinates::new(53.4794, -2.2453)),
        json!({"listing_status": "rent", "price": 1500}),
    );
    let outcome = service.ingest(&manchester).expect("ingests");

    assert!(matches!(outcome, IngestOutcome::Created { .. }));
    assert_eq!(service.repository().all().len(), 2);
}

#[test]
fn record_without_coordinates_is_rejected_when_geocoding_finds_nothing() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let leeds = record(
        SourceName::ZOOPLA,
        "8 Park Row",
        "LS1 4DY",
        Some(3),
        None,
        json!({}),
    );

    match service.ingest(&leeds) {
        Err(ResolutionError::Rejected(ReconcileError::CreationRejected { problems, .. })) => {
            assert_eq!(problems, vec![CreationRejection::MissingCoordinates]);
        }
        other => panic!("expected creation rejection, got {other:?}"),
    }
    assert!(service.repository().all().is_empty());
}

#[test]
fn geocoder_fills_missing_coordinates_before_creation() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let leeds_centre = Coordinates::new(53.7997, -1.5492);
    let service = service_with(FixedGeocoder(leeds_centre), clock);
    let leeds = record(
        SourceName::ZOOPLA,
        "8 Park Row",
        "LS1 4DY",
        Some(3),
        None,
        json!({}),
    );

    let outcome = service.ingest(&leeds).expect("created with geocoded coordinates");
    let property = service
        .repository()
        .fetch(&outcome.property_id())
        .expect("fetch")
        .expect("stored");

    assert_eq!(property.coordinates, leeds_centre);
}

#[test]
fn ingest_all_keeps_each_record_result_in_order() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let no_location = record(SourceName::ZOOPLA, "8 Park Row", "LS1 4DY", Some(3), None, json!({}));
    let records = vec![zoopla_sale_listing(), no_location, hmo_register_entry()];

    let results = service.ingest_all(&records);

    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], Ok(IngestOutcome::Created { .. })));
    assert!(results[1].is_err());
    assert!(matches!(results[2], Ok(IngestOutcome::Matched { .. })));
}

#[test]
fn enrichment_prefers_freehold_title_among_equal_candidates() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let property_id = seeded(&service);
    let searchland = SourceName::new(SourceName::SEARCHLAND);

    let leasehold = record(
        SourceName::SEARCHLAND,
        "21 Elm Road",
        "E8 1EJ",
        None,
        None,
        json!({"tenure": "Leasehold", "owner_name": "Flat Owner"}),
    );
    let freehold = record(
        SourceName::SEARCHLAND,
        "21 Elm Road",
        "E8 1EJ",
        None,
        None,
        json!({"tenure": "Freehold", "owner_name": "Elm Holdings Ltd", "company_number": "09876543"}),
    );

    let outcome = service
        .enrich(&property_id, &searchland, &[leasehold, freehold])
        .expect("enriched");

    assert_eq!(outcome.matched, Some(MatchConfidence::Exact));
    let property = service
        .repository()
        .fetch(&property_id)
        .expect("fetch")
        .expect("stored");
    assert_eq!(property.ownership.tenure, Some(Tenure::Freehold));
    assert_eq!(
        property.ownership.owner_name.as_deref(),
        Some("Elm Holdings Ltd")
    );
    assert_eq!(
        property.source_of(PropertyField::OwnerName).map(|s| s.as_str()),
        Some("searchland")
    );
}

#[test]
fn enrichment_without_a_usable_candidate_still_stamps_the_source() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock.clone());
    let property_id = seeded(&service);
    let ofcom = SourceName::new(SourceName::OFCOM);

    clock.advance(Duration::days(1));
    let elsewhere = record(
        SourceName::OFCOM,
        "21 Elm Road",
        "M1 3HB",
        None,
        None,
        json!({"max_download_mbps": 900}),
    );
    let outcome = service
        .enrich(&property_id, &ofcom, &[elsewhere])
        .expect("enrichment pass");

    assert_eq!(outcome.matched, None);
    assert!(outcome.changed.is_empty());
    let property = service
        .repository()
        .fetch(&property_id)
        .expect("fetch")
        .expect("stored");
    assert_eq!(property.broadband_max_mbps, None);
    assert_eq!(property.enriched_at(&ofcom), Some(t0() + Duration::days(1)));
}

#[test]
fn enriching_an_unknown_property_is_not_found() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);

    let result = service.enrich(
        &PropertyId::generate(),
        &SourceName::new(SourceName::OFCOM),
        &[],
    );

    assert!(matches!(
        result,
        Err(ResolutionError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn concurrent_enrichment_of_one_property_loses_no_source() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let property_id = seeded(&service);
    let sources = [
        SourceName::OFCOM,
        SourceName::SEARCHLAND,
        SourceName::LAND_REGISTRY,
        SourceName::COMPANIES_HOUSE,
        SourceName::PROPERTY_DATA,
    ];

    thread::scope(|scope| {
        for source in sources {
            let service = &service;
            scope.spawn(move || {
                let source = SourceName::new(source);
                for _ in 0..20 {
                    service
                        .enrich(&property_id, &source, &[])
                        .expect("enrichment pass");
                }
            });
        }
    });

    let property = service
        .repository()
        .fetch(&property_id)
        .expect("fetch")
        .expect("stored");
    for source in sources {
        assert!(
            property.enriched_at(&SourceName::new(source)).is_some(),
            "{source} was lost"
        );
    }
}

#[test]
fn concurrent_records_for_one_new_address_create_it_once() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let listing = zoopla_sale_listing();

    let outcomes: Vec<IngestOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = &service;
                let listing = &listing;
                scope.spawn(move || service.ingest(listing).expect("listing ingests"))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("ingest thread"))
            .collect()
    });

    let created = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, IngestOutcome::Created { .. }))
        .count();
    assert_eq!(created, 1);
    assert_eq!(service.repository().all().len(), 1);
}

#[test]
fn locks_are_released_once_work_completes() {
    let clock = Arc::new(StepClock::starting_at(t0()));
    let service = service(clock);
    let property_id = seeded(&service);

    service
        .ingest(&hmo_register_entry())
        .expect("register entry ingests");
    service
        .enrich(&property_id, &SourceName::new(SourceName::OFCOM), &[])
        .expect("enrichment pass");

    assert_eq!(service.held_locks(), 0);
}
