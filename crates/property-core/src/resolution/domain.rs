use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable internal identifier; never derived from any source identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub Uuid);

impl PropertyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the external data provider that produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceName(pub String);

impl SourceName {
    pub const SEARCHLAND: &'static str = "searchland";
    pub const ZOOPLA: &'static str = "zoopla";
    pub const PROPERTY_DATA: &'static str = "propertydata";
    pub const LAND_REGISTRY: &'static str = "land_registry";
    pub const COMPANIES_HOUSE: &'static str = "companies_house";
    pub const OFCOM: &'static str = "ofcom";
    pub const HMO_REGISTER: &'static str = "hmo_register";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite, within WGS84 range, and neither axis a zero placeholder.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.latitude != 0.0
            && self.longitude != 0.0
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// One listing/licence/title/price record exactly as a source adapter returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExternalRecord {
    pub source: SourceName,
    pub address: String,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rent" | "rental" | "to_rent" | "let" | "lettings" => Some(Self::Rent),
            "sale" | "for_sale" | "buy" | "purchase" => Some(Self::Sale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenceStatus {
    Active,
    Pending,
    Expired,
    Revoked,
}

impl LicenceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "granted" | "licensed" | "current" => Some(Self::Active),
            "pending" | "applied" | "application_received" | "under_review" => Some(Self::Pending),
            "expired" | "lapsed" => Some(Self::Expired),
            "revoked" | "refused" | "cancelled" => Some(Self::Revoked),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LicenceStatus::Active => "active",
            LicenceStatus::Pending => "pending",
            LicenceStatus::Expired => "expired",
            LicenceStatus::Revoked => "revoked",
        }
    }
}

/// Scheme under which a property is (or would be) licensed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicensingScheme {
    Mandatory,
    Additional,
    Selective,
    NotRequired,
}

impl LicensingScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mandatory" => Some(Self::Mandatory),
            "additional" => Some(Self::Additional),
            "selective" => Some(Self::Selective),
            "none" | "not_required" => Some(Self::NotRequired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpcRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl EpcRating {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "E" => Some(Self::E),
            "F" => Some(Self::F),
            "G" => Some(Self::G),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            EpcRating::A => 'A',
            EpcRating::B => 'B',
            EpcRating::C => 'C',
            EpcRating::D => 'D',
            EpcRating::E => 'E',
            EpcRating::F => 'F',
            EpcRating::G => 'G',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    Freehold,
    Leasehold,
}

impl Tenure {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "freehold" | "f" => Some(Self::Freehold),
            "leasehold" | "l" => Some(Self::Leasehold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Individual,
    Company,
    Council,
    HousingAssociation,
}

impl OwnerType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" | "private" | "person" => Some(Self::Individual),
            "company" | "corporate" | "limited company" | "ltd" => Some(Self::Company),
            "council" | "local authority" => Some(Self::Council),
            "housing association" | "housing_association" | "rsl" => {
                Some(Self::HousingAssociation)
            }
            _ => None,
        }
    }
}

/// Every canonical attribute that more than one source may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyField {
    Address,
    Postcode,
    City,
    Coordinates,
    Bedrooms,
    FloorArea,
    ListingType,
    PurchasePrice,
    MonthlyRent,
    EpcRating,
    Article4,
    LicensingScheme,
    LicenceNumber,
    LicenceStatus,
    LicenceExpiry,
    MaxOccupants,
    LicenceHolder,
    OwnerName,
    OwnerType,
    CompanyNumber,
    Tenure,
    BroadbandMaxMbps,
}

/// Responsible-party group for the licence. Tracked separately from ownership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenceDetails {
    pub licence_number: Option<String>,
    pub status: Option<LicenceStatus>,
    pub expiry: Option<NaiveDate>,
    pub max_occupants: Option<u8>,
    pub holder_name: Option<String>,
}

/// Legal-owner group. Never inferred from the licence holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    pub owner_name: Option<String>,
    pub owner_type: Option<OwnerType>,
    pub company_number: Option<String>,
    pub tenure: Option<Tenure>,
}

/// The durable, reconciled view of one real-world property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProperty {
    pub id: PropertyId,
    pub address: String,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub coordinates: Coordinates,
    pub bedrooms: u8,
    pub floor_area_sqm: Option<f64>,
    pub listing_type: Option<ListingType>,
    pub purchase_price: Option<u32>,
    pub monthly_rent: Option<u32>,
    pub epc_rating: Option<EpcRating>,
    pub article_4: Option<bool>,
    pub licensing_scheme: Option<LicensingScheme>,
    pub licence: LicenceDetails,
    pub ownership: Ownership,
    /// Set only when a single source asserted owner and licence holder are the same party.
    pub owner_is_licence_holder: bool,
    pub broadband_max_mbps: Option<u32>,
    pub provenance: BTreeMap<PropertyField, SourceName>,
    pub enriched_at: BTreeMap<SourceName, DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CanonicalProperty {
    pub fn source_of(&self, field: PropertyField) -> Option<&SourceName> {
        self.provenance.get(&field)
    }

    pub fn enriched_at(&self, source: &SourceName) -> Option<DateTime<Utc>> {
        self.enriched_at.get(source).copied()
    }
}

/// Owner identity as asserted by one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerFields {
    pub owner_name: Option<String>,
    pub owner_type: Option<OwnerType>,
    pub company_number: Option<String>,
}

/// Incoming attribute values from one named source. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub bedrooms: Option<u8>,
    pub floor_area_sqm: Option<f64>,
    pub listing_type: Option<ListingType>,
    pub purchase_price: Option<u32>,
    pub monthly_rent: Option<u32>,
    pub epc_rating: Option<EpcRating>,
    pub article_4: Option<bool>,
    pub licensing_scheme: Option<LicensingScheme>,
    pub licence_number: Option<String>,
    pub licence_status: Option<LicenceStatus>,
    pub licence_expiry: Option<NaiveDate>,
    pub max_occupants: Option<u8>,
    pub licence_holder: Option<String>,
    pub owner: OwnerFields,
    pub tenure: Option<Tenure>,
    /// Explicit assertion that `owner` and `licence_holder` are the same party.
    pub owner_is_licence_holder: Option<bool>,
    pub broadband_max_mbps: Option<u32>,
}

impl FieldSet {
    pub fn is_empty(&self) -> bool {
        self == &FieldSet::default()
    }
}
