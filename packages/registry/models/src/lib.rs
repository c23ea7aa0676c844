#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the Icelandic address registry (Staðfangaskrá).
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It has no heavyweight dependencies (no regex, no I/O).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Converts to a [`geo::Point`] (x = longitude, y = latitude).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

impl From<geo::Point<f64>> for Coordinates {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// One of the four fields making up an [`AddressKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyField {
    Municipality,
    Postcode,
    Street,
    HouseNr,
}

impl KeyField {
    pub const ALL: [Self; 4] = [
        Self::Municipality,
        Self::Postcode,
        Self::Street,
        Self::HouseNr,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Municipality => "municipality",
            Self::Postcode => "postcode",
            Self::Street => "street_nominative",
            Self::HouseNr => "house_nr",
        }
    }
}

/// The `(municipality, postcode, street_nominative, house_nr)` key.
///
/// Used both as the unique key of the canonical table and as the
/// candidate key produced by the parsers. In a candidate key an empty
/// field means "unknown" and matches anything during fallback resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressKey {
    pub municipality: String,
    pub postcode: String,
    pub street: String,
    pub house_nr: String,
}

/// A parsed, not yet resolved address key.
pub type CandidateKey = AddressKey;

impl AddressKey {
    #[must_use]
    pub fn new(
        municipality: impl Into<String>,
        postcode: impl Into<String>,
        street: impl Into<String>,
        house_nr: impl Into<String>,
    ) -> Self {
        Self {
            municipality: municipality.into(),
            postcode: postcode.into(),
            street: street.into(),
            house_nr: house_nr.into(),
        }
    }

    #[must_use]
    pub fn get(&self, field: KeyField) -> &str {
        match field {
            KeyField::Municipality => &self.municipality,
            KeyField::Postcode => &self.postcode,
            KeyField::Street => &self.street,
            KeyField::HouseNr => &self.house_nr,
        }
    }

    /// Returns `true` if the field was not parsed (empty).
    #[must_use]
    pub fn is_unknown(&self, field: KeyField) -> bool {
        self.get(field).is_empty()
    }

    /// A key with no municipality, postcode and street can never be
    /// resolved; a house number alone is not enough.
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        !(self.municipality.is_empty() && self.postcode.is_empty() && self.street.is_empty())
    }

    /// Joins the known fields with `/`, used to group identical queries.
    #[must_use]
    pub fn identity_string(&self) -> String {
        KeyField::ALL
            .iter()
            .map(|f| self.get(*f))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// One row of the canonical address table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Municipality name (e.g. `"Reykjavík"`).
    pub municipality: String,
    /// Three digit postcode.
    pub postcode: String,
    /// Street name in the nominative case (e.g. `"Laugavegur"`).
    pub street_nominative: String,
    /// Street name in the dative case (e.g. `"Laugavegi"`).
    pub street_dative: String,
    /// House number including any letter suffix, uppercased.
    pub house_nr: String,
    /// Named place, if the registry has one for this address.
    #[serde(default)]
    pub special_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl AddressRecord {
    #[must_use]
    pub fn key(&self) -> AddressKey {
        AddressKey::new(
            self.municipality.clone(),
            self.postcode.clone(),
            self.street_nominative.clone(),
            self.house_nr.clone(),
        )
    }

    #[must_use]
    pub fn get(&self, field: KeyField) -> &str {
        match field {
            KeyField::Municipality => &self.municipality,
            KeyField::Postcode => &self.postcode,
            KeyField::Street => &self.street_nominative,
            KeyField::HouseNr => &self.house_nr,
        }
    }

    /// Returns the coordinates if both latitude and longitude are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(Coordinates::new(lat, lon))
            }
            _ => None,
        }
    }
}

/// A free-text scan match. `None` means the fragment was not seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub postcode: Option<String>,
    pub street: Option<String>,
    pub house_nr: Option<String>,
}

/// A [`Match`] enriched with coordinates and the postcode's municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullMatch {
    pub postcode: Option<String>,
    pub street: Option<String>,
    pub house_nr: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub municipality: Option<String>,
}

/// A candidate key plus the bookkeeping needed to resolve it in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    pub key: CandidateKey,
    /// Position of the row in the caller's input.
    pub order: usize,
    /// Rows built from identical input share the same identity and must
    /// carry the same key. The engine searches once per identity and
    /// gives the result to every row that shares it.
    pub identity: usize,
    /// Original input text, if the row came from a text query.
    pub query: Option<String>,
}

/// A batch query row after resolution against the canonical table.
///
/// Every textual field is an empty string when the row could not be
/// resolved, and `coordinates` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub municipality: String,
    pub postcode: String,
    pub street_nominative: String,
    pub street_dative: String,
    pub house_nr: String,
    pub special_name: String,
    pub coordinates: Option<Coordinates>,
}

impl ResolvedAddress {
    /// Returns `true` if the row was matched to a canonical record.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.postcode.is_empty() || !self.street_nominative.is_empty()
    }

    /// The resolved location as a point geometry.
    #[must_use]
    pub fn geometry(&self) -> Option<geo::Point<f64>> {
        self.coordinates.map(Coordinates::to_point)
    }
}

/// Configuration for loading the canonical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to a prepared canonical table CSV.
    #[serde(default)]
    pub table_path: String,

    /// Path to the raw registry export (`.dsv`, `.csv` or `.zip`).
    /// Used when `table_path` is empty.
    #[serde(default)]
    pub registry_path: String,

    /// Field delimiter of the canonical table CSV.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Extra administrative aliases, merged over the built-in ones.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

const fn default_delimiter() -> char {
    ','
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            table_path: String::new(),
            registry_path: String::new(),
            delimiter: default_delimiter(),
            aliases: BTreeMap::new(),
        }
    }
}
