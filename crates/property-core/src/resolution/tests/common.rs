use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::resolution::cache::Clock;
use crate::resolution::domain::{Coordinates, FieldSet, RawExternalRecord, SourceName};
use crate::resolution::matcher::MatchFields;

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock that only moves when a test advances it.
pub(super) struct StepClock {
    now: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn fields(address: &str, postcode: &str, bedrooms: u8) -> MatchFields {
    MatchFields::new(address, Some(postcode), Some(bedrooms))
}

pub(super) fn hackney() -> Coordinates {
    Coordinates::new(51.5465, -0.0553)
}

/// Minimal field set that is enough to create a canonical property.
pub(super) fn creatable(address: &str, bedrooms: u8) -> FieldSet {
    FieldSet {
        address: Some(address.to_string()),
        postcode: Some("E8 1EJ".to_string()),
        coordinates: Some(hackney()),
        bedrooms: Some(bedrooms),
        ..FieldSet::default()
    }
}

pub(super) fn record(
    source: &str,
    address: &str,
    postcode: &str,
    bedrooms: Option<u8>,
    coordinates: Option<Coordinates>,
    fields: Value,
) -> RawExternalRecord {
    let fields: Map<String, Value> = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    RawExternalRecord {
        source: SourceName::new(source),
        address: address.to_string(),
        postcode: Some(postcode.to_string()),
        coordinates,
        bedrooms,
        identifiers: Default::default(),
        fields,
    }
}

pub(super) fn zoopla_sale_listing() -> RawExternalRecord {
    record(
        SourceName::ZOOPLA,
        "21 Elm Road, Hackney",
        "E8 1EJ",
        Some(5),
        Some(hackney()),
        json!({
            "listing_status": "sale",
            "price": 240000,
            "estimated_rent_pcm": "£1,800",
            "epc_rating": "c",
            "floor_area_sqm": 120.0,
            "city": "London",
        }),
    )
}

pub(super) fn hmo_register_entry() -> RawExternalRecord {
    record(
        SourceName::HMO_REGISTER,
        "21 Elm Rd",
        "E8 1EJ",
        None,
        None,
        json!({
            "lettable_rooms": 5,
            "licence_number": "HMO/2024/0113",
            "licence_status": "Granted",
            "licence_expiry": "31/03/2029",
            "max_occupants": 6,
            "licence_holder": "Elm Lettings Ltd",
            "licensing_scheme": "mandatory",
        }),
    )
}
