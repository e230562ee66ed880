//! Per-source field extraction so matching and merging stay uniform across providers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::domain::{
    EpcRating, FieldSet, LicenceStatus, LicensingScheme, ListingType, OwnerFields, OwnerType,
    RawExternalRecord, SourceName, Tenure,
};
use super::matcher::MatchFields;

/// Pulls matching inputs and merge values out of one provider's record shape.
pub trait SourceExtractor: Send + Sync {
    fn bedrooms(&self, record: &RawExternalRecord) -> Option<u8> {
        record
            .bedrooms
            .or_else(|| int_field(&record.fields, &["bedrooms", "beds", "num_bedrooms"]))
    }

    fn tenure(&self, _record: &RawExternalRecord) -> Option<Tenure> {
        None
    }

    fn match_fields(&self, record: &RawExternalRecord) -> MatchFields {
        MatchFields::new(
            &record.address,
            record.postcode.as_deref(),
            self.bedrooms(record),
        )
    }

    fn field_set(&self, record: &RawExternalRecord) -> FieldSet;
}

fn base_field_set(record: &RawExternalRecord, bedrooms: Option<u8>) -> FieldSet {
    FieldSet {
        address: Some(record.address.clone()),
        postcode: record.postcode.clone(),
        city: text_field(&record.fields, &["city", "post_town", "town", "local_authority"]),
        coordinates: record.coordinates,
        bedrooms,
        ..FieldSet::default()
    }
}

/// Rental/sale listings and price-comparison feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingExtractor;

impl SourceExtractor for ListingExtractor {
    fn field_set(&self, record: &RawExternalRecord) -> FieldSet {
        let fields = &record.fields;
        let mut set = base_field_set(record, self.bedrooms(record));

        let listing_type = text_field(fields, &["listing_type", "listing_status", "channel"])
            .and_then(|value| ListingType::parse(&value));
        set.listing_type = listing_type;

        let price = money_field(fields, &["price", "asking_price"]);
        let weekly = text_field(fields, &["price_frequency", "rent_frequency"])
            .map(|freq| freq.to_ascii_lowercase().contains("week"))
            .unwrap_or(false);
        let explicit_rent = money_field(fields, &["rent_pcm", "monthly_rent"]);

        match listing_type {
            Some(ListingType::Rent) => {
                set.monthly_rent = explicit_rent.or_else(|| {
                    price.map(|amount| if weekly { weekly_to_monthly(amount) } else { amount })
                });
            }
            Some(ListingType::Sale) => {
                set.purchase_price = price;
                set.monthly_rent = explicit_rent
                    .or_else(|| money_field(fields, &["estimated_rent_pcm", "rent_estimate"]));
            }
            None => {
                set.monthly_rent = explicit_rent;
            }
        }

        set.epc_rating = text_field(fields, &["epc_rating", "epc", "current_energy_rating"])
            .and_then(|value| EpcRating::parse(&value));
        set.floor_area_sqm = float_field(fields, &["floor_area_sqm", "floor_area", "total_floor_area"]);
        set.article_4 = bool_field(fields, &["article_4", "article4"]);
        set
    }
}

/// HMO licence registers. Occupancy data is approximate; bedrooms fall back to room counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LicenceRegisterExtractor;

impl SourceExtractor for LicenceRegisterExtractor {
    fn bedrooms(&self, record: &RawExternalRecord) -> Option<u8> {
        record.bedrooms.or_else(|| {
            int_field(
                &record.fields,
                &["bedrooms", "sleeping_rooms", "lettable_rooms", "households"],
            )
        })
    }

    fn field_set(&self, record: &RawExternalRecord) -> FieldSet {
        let fields = &record.fields;
        let mut set = base_field_set(record, self.bedrooms(record));

        set.licence_number = text_field(fields, &["licence_number", "license_number", "reference"])
            .or_else(|| record.identifiers.get("licence_number").cloned());
        set.licence_status = text_field(fields, &["licence_status", "status"])
            .and_then(|value| LicenceStatus::parse(&value));
        set.licence_expiry = text_field(fields, &["licence_expiry", "expiry_date", "expires_on"])
            .and_then(|value| parse_date(&value));
        set.max_occupants = int_field(fields, &["max_occupants", "permitted_occupants"]);
        set.licence_holder = text_field(fields, &["licence_holder", "holder_name"]);
        set.licensing_scheme = text_field(fields, &["licensing_scheme", "scheme", "licence_type"])
            .and_then(|value| LicensingScheme::parse(&value));

        let owner_name = text_field(fields, &["owner_name"]);
        if owner_name.is_some() {
            set.owner = OwnerFields {
                owner_name,
                ..OwnerFields::default()
            };
            set.owner_is_licence_holder = bool_field(fields, &["holder_is_owner"]);
        }
        set
    }
}

/// Land-registry titles, ownership lookups and company registers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleExtractor;

impl SourceExtractor for TitleExtractor {
    fn tenure(&self, record: &RawExternalRecord) -> Option<Tenure> {
        text_field(&record.fields, &["tenure", "estate_interest"]).and_then(|value| Tenure::parse(&value))
    }

    fn field_set(&self, record: &RawExternalRecord) -> FieldSet {
        let fields = &record.fields;
        let mut set = base_field_set(record, self.bedrooms(record));

        let company_number = text_field(fields, &["company_number", "company_registration_no"])
            .or_else(|| record.identifiers.get("company_number").cloned());
        let owner_type = text_field(fields, &["owner_type", "proprietor_category"])
            .and_then(|value| OwnerType::parse(&value))
            .or_else(|| company_number.as_ref().map(|_| OwnerType::Company));

        set.owner = OwnerFields {
            owner_name: text_field(fields, &["owner_name", "proprietor_name", "company_name"]),
            owner_type,
            company_number,
        };
        set.tenure = self.tenure(record);
        set.purchase_price = money_field(fields, &["last_price_paid", "price_paid"]);
        set.article_4 = bool_field(fields, &["article_4", "article4", "article_4_direction"]);
        set.floor_area_sqm = float_field(fields, &["floor_area_sqm", "floor_area"]);
        set
    }
}

/// Broadband coverage lookups.
#[derive(Debug, Default, Clone, Copy)]
pub struct BroadbandExtractor;

impl SourceExtractor for BroadbandExtractor {
    fn field_set(&self, record: &RawExternalRecord) -> FieldSet {
        let mut set = base_field_set(record, self.bedrooms(record));
        set.broadband_max_mbps = int_field(
            &record.fields,
            &["max_download_mbps", "max_bb_predicted_down", "max_speed"],
        );
        set
    }
}

/// Resolves the extractor for a source name, defaulting to the listing shape.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<SourceName, Arc<dyn SourceExtractor>>,
    fallback: Arc<dyn SourceExtractor>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
            fallback: Arc::new(ListingExtractor),
        }
    }

    pub fn standard() -> Self {
        let listing: Arc<dyn SourceExtractor> = Arc::new(ListingExtractor);
        let title: Arc<dyn SourceExtractor> = Arc::new(TitleExtractor);

        Self::empty()
            .register(SourceName::ZOOPLA, listing.clone())
            .register(SourceName::PROPERTY_DATA, listing)
            .register(SourceName::HMO_REGISTER, Arc::new(LicenceRegisterExtractor))
            .register(SourceName::SEARCHLAND, title.clone())
            .register(SourceName::LAND_REGISTRY, title.clone())
            .register(SourceName::COMPANIES_HOUSE, title)
            .register(SourceName::OFCOM, Arc::new(BroadbandExtractor))
    }

    pub fn register(mut self, source: &str, extractor: Arc<dyn SourceExtractor>) -> Self {
        self.extractors.insert(SourceName::new(source), extractor);
        self
    }

    pub fn for_source(&self, source: &SourceName) -> &dyn SourceExtractor {
        self.extractors
            .get(source)
            .map(Arc::as_ref)
            .unwrap_or(self.fallback.as_ref())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn first<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let value = first(fields, keys)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn float_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let value = match first(fields, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    };
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn int_field<T: TryFrom<u64>>(fields: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    let value = float_field(fields, keys)?;
    T::try_from(value.round() as u64).ok()
}

fn money_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    int_field::<u32>(fields, keys).filter(|amount| *amount > 0)
}

fn bool_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match first(fields, keys)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// "£1,250.00" style amounts.
fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .ok()
}

fn weekly_to_monthly(weekly: u32) -> u32 {
    ((weekly as f64) * 52.0 / 12.0).round() as u32
}
