//! Canonicalization of free-text UK addresses and postcodes into comparable tokens.
//!
//! Everything here degrades to empty fields on malformed input; nothing fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Road-type words stripped from the end of a street name.
const ROAD_SUFFIXES: &[&str] = &[
    "road", "street", "avenue", "lane", "drive", "close", "way", "place", "court", "gardens",
    "terrace", "crescent", "grove", "square", "mews", "hill", "rise", "row", "walk", "park",
];

/// Sub-unit prefixes whose following number is a flat, not a street number.
const UNIT_PREFIXES: &[&str] = &["flat", "apartment", "apt", "unit"];

/// Street names without a road-type word keep at most this many tokens.
const MAX_STREET_NAME_TOKENS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub street_number: String,
    pub street_name: String,
    pub normalized_full: String,
    pub outcode: String,
    pub district: String,
}

impl NormalizedAddress {
    pub fn has_outcode(&self) -> bool {
        !self.outcode.is_empty()
    }
}

fn street_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+[a-z]?$").expect("street number pattern compiles"))
}

fn incode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d[A-Z]{2}$").expect("incode pattern compiles"))
}

fn outcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z]{1,2}\d[A-Z\d]?$").expect("outcode pattern compiles")
    })
}

/// Normalize an address and optional postcode.
pub fn normalize_address(address: &str, postcode: Option<&str>) -> NormalizedAddress {
    let normalized_full = normalize_text(address);
    let tokens: Vec<&str> = normalized_full.split(' ').filter(|t| !t.is_empty()).collect();

    let (street_number, street_name) = match street_number_position(&tokens) {
        Some(index) => (
            tokens[index].to_string(),
            street_name_after(&tokens[index + 1..]),
        ),
        None => (String::new(), String::new()),
    };

    let outcode = postcode.map(outcode_of).unwrap_or_default();
    let district = district_of(&outcode);

    NormalizedAddress {
        street_number,
        street_name,
        normalized_full,
        outcode,
        district,
    }
}

/// Lowercase, drop commas/periods/apostrophes, collapse whitespace.
pub(crate) fn normalize_text(value: &str) -> String {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ',' => Some(' '),
            '.' | '\'' | '\u{2019}' => None,
            c if c.is_whitespace() => Some(' '),
            c => Some(c),
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn street_number_position(tokens: &[&str]) -> Option<usize> {
    let pattern = street_number_pattern();
    let mut index = 0;
    while index < tokens.len() {
        let token = tokens[index];
        if UNIT_PREFIXES.contains(&token) {
            // the flat number is only skipped when a street number follows it
            let flat_number_follows = tokens
                .get(index + 2..)
                .is_some_and(|rest| rest.iter().any(|t| pattern.is_match(t)));
            index += if flat_number_follows { 2 } else { 1 };
            continue;
        }
        if pattern.is_match(token) {
            return Some(index);
        }
        index += 1;
    }
    None
}

fn street_name_after(rest: &[&str]) -> String {
    let mut name = Vec::new();
    for token in rest {
        if ROAD_SUFFIXES.contains(token) {
            if name.is_empty() {
                // "4 park" style addresses where the suffix is the whole name
                name.push(*token);
            }
            return name.join(" ");
        }
        if name.len() == MAX_STREET_NAME_TOKENS {
            break;
        }
        name.push(*token);
    }
    name.join(" ")
}

/// Outcode of a UK postcode: whitespace stripped, uppercased, incode removed.
pub fn outcode_of(postcode: &str) -> String {
    let compact: String = postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if compact.is_empty() {
        return String::new();
    }

    let candidate = if compact.len() > 3 && incode_pattern().is_match(&compact) {
        &compact[..compact.len() - 3]
    } else {
        compact.as_str()
    };

    if outcode_pattern().is_match(candidate) {
        candidate.to_string()
    } else {
        String::new()
    }
}

/// Leading letter run of an outcode ("E" for "E8", "SW" for "SW1A").
pub fn district_of(outcode: &str) -> String {
    outcode
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect()
}
