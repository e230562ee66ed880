//! Local Housing Allowance reference rates.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::resolution::address::outcode_of;

/// Largest LHA bedroom category; bigger homes are capped at this rate.
const MAX_LHA_BEDROOMS: u8 = 4;

/// Pure lookup of the monthly LHA cap for a location and bedroom count.
pub trait LhaLookup {
    fn monthly_rate(&self, city: &str, bedrooms: u8, postcode: Option<&str>) -> Option<f64>;
}

impl<F> LhaLookup for F
where
    F: Fn(&str, u8, Option<&str>) -> Option<f64>,
{
    fn monthly_rate(&self, city: &str, bedrooms: u8, postcode: Option<&str>) -> Option<f64> {
        self(city, bedrooms, postcode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LhaRate {
    pub city: String,
    pub bedrooms: u8,
    pub monthly_rate: f64,
    /// Restricts the row to one outcode; `None` applies city-wide.
    pub outcode: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LhaTableError {
    #[error("failed to read LHA table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid LHA CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("LHA row {row} for {city} has neither a monthly nor a weekly rate")]
    MissingRate { row: usize, city: String },
}

#[derive(Debug, Deserialize)]
struct LhaRow {
    city: String,
    bedrooms: u8,
    #[serde(default)]
    monthly_rate: Option<f64>,
    #[serde(default)]
    weekly_rate: Option<f64>,
    #[serde(default)]
    outcode: Option<String>,
}

/// In-memory LHA table; outcode-specific rows take precedence over city-wide rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LhaRateTable {
    rates: Vec<LhaRate>,
}

impl LhaRateTable {
    pub fn new(rates: Vec<LhaRate>) -> Self {
        Self { rates }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LhaTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Columns: `city,bedrooms,monthly_rate,weekly_rate,outcode`; weekly rates convert at 52/12.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LhaTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rates = Vec::new();

        for (index, row) in csv_reader.deserialize::<LhaRow>().enumerate() {
            let row = row?;
            let monthly_rate = match (row.monthly_rate, row.weekly_rate) {
                (Some(monthly), _) => monthly,
                (None, Some(weekly)) => weekly * 52.0 / 12.0,
                (None, None) => {
                    return Err(LhaTableError::MissingRate {
                        row: index + 1,
                        city: row.city,
                    })
                }
            };
            let outcode = row
                .outcode
                .map(|value| outcode_of(&value))
                .filter(|value| !value.is_empty());

            rates.push(LhaRate {
                city: row.city,
                bedrooms: row.bedrooms,
                monthly_rate,
                outcode,
            });
        }

        Ok(Self { rates })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl LhaLookup for LhaRateTable {
    fn monthly_rate(&self, city: &str, bedrooms: u8, postcode: Option<&str>) -> Option<f64> {
        let category = bedrooms.clamp(1, MAX_LHA_BEDROOMS);
        let outcode = postcode.map(outcode_of).filter(|o| !o.is_empty());

        if let Some(outcode) = &outcode {
            let by_outcode = self
                .rates
                .iter()
                .find(|rate| rate.bedrooms == category && rate.outcode.as_ref() == Some(outcode));
            if let Some(rate) = by_outcode {
                return Some(rate.monthly_rate);
            }
        }

        let city = city.trim();
        if city.is_empty() {
            return None;
        }
        self.rates
            .iter()
            .find(|rate| {
                rate.bedrooms == category
                    && rate.outcode.is_none()
                    && rate.city.eq_ignore_ascii_case(city)
            })
            .map(|rate| rate.monthly_rate)
    }
}
