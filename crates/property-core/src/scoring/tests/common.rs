use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use crate::resolution::{
    CanonicalProperty, Coordinates, EpcRating, LicenceDetails, LicenceStatus, LicensingScheme,
    ListingType, Ownership, PropertyId, Tenure,
};
use crate::scoring::{LhaRate, LhaRateTable};

/// Five-bed licensed HMO bought at 240k and let at 1800/month (9% gross).
pub(super) fn hmo_property() -> CanonicalProperty {
    let timestamp = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");

    CanonicalProperty {
        id: PropertyId::generate(),
        address: "21 Elm Road".to_string(),
        postcode: Some("E8 1EJ".to_string()),
        city: Some("London".to_string()),
        coordinates: Coordinates::new(51.5465, -0.0553),
        bedrooms: 5,
        floor_area_sqm: Some(120.0),
        listing_type: Some(ListingType::Sale),
        purchase_price: Some(240_000),
        monthly_rent: Some(1_800),
        epc_rating: Some(EpcRating::C),
        article_4: Some(false),
        licensing_scheme: Some(LicensingScheme::Mandatory),
        licence: LicenceDetails {
            licence_number: Some("HMO/2024/0113".to_string()),
            status: Some(LicenceStatus::Active),
            expiry: None,
            max_occupants: Some(6),
            holder_name: Some("Elm Lettings Ltd".to_string()),
        },
        ownership: Ownership {
            owner_name: None,
            owner_type: None,
            company_number: None,
            tenure: Some(Tenure::Freehold),
        },
        owner_is_licence_holder: false,
        broadband_max_mbps: Some(80),
        provenance: BTreeMap::new(),
        enriched_at: BTreeMap::new(),
        created_at: timestamp,
        updated_at: timestamp,
    }
}

/// Property with nothing beyond the mandatory creation fields.
pub(super) fn bare_property() -> CanonicalProperty {
    CanonicalProperty {
        floor_area_sqm: None,
        listing_type: None,
        purchase_price: None,
        monthly_rent: None,
        epc_rating: None,
        article_4: None,
        licensing_scheme: None,
        licence: LicenceDetails::default(),
        ownership: Ownership::default(),
        broadband_max_mbps: None,
        ..hmo_property()
    }
}

/// Three-bed rental in E8 let at exactly the London three-bed LHA rate.
pub(super) fn ta_property() -> CanonicalProperty {
    CanonicalProperty {
        bedrooms: 3,
        listing_type: Some(ListingType::Rent),
        purchase_price: None,
        monthly_rent: Some(2_100),
        ..hmo_property()
    }
}

pub(super) fn lha_table() -> LhaRateTable {
    LhaRateTable::new(vec![
        LhaRate {
            city: "London".to_string(),
            bedrooms: 3,
            monthly_rate: 2_100.0,
            outcode: None,
        },
        LhaRate {
            city: "London".to_string(),
            bedrooms: 3,
            monthly_rate: 2_400.0,
            outcode: Some("N16".to_string()),
        },
    ])
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
