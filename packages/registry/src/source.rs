//! Canonical table and registry export readers.
//!
//! Two input formats are supported:
//!
//! - **Canonical table**: a prepared CSV with the columns of
//!   [`AddressRecord`] (`municipality, postcode, street_nominative,
//!   street_dative, house_nr, special_name, lat, lon`). [`write_table`]
//!   produces this format.
//! - **Registry export**: the raw Staðfangaskrá export published by
//!   Þjóðskrá, either `|`-delimited (`.dsv`) or comma-delimited (`.csv`),
//!   optionally inside a `.zip` archive. House numbers and letters are
//!   merged, comma decimals are parsed and the municipality is derived from
//!   the postcode.

use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;
use stadfang_registry_models::AddressRecord;

use crate::{RegistryError, postcodes, table::CanonicalTable};

/// Columns every canonical table must have.
const TABLE_COLUMNS: &[&str] = &[
    "municipality",
    "postcode",
    "street_nominative",
    "street_dative",
    "house_nr",
];

/// A raw row of the registry export.
#[derive(Debug, Deserialize)]
pub struct RegistryRow {
    /// Street name, nominative case.
    #[serde(rename = "HEITI_NF", default)]
    pub street_nominative: String,
    /// Street name, dative case.
    #[serde(rename = "HEITI_TGF", default)]
    pub street_dative: String,
    /// House number (may be written as a decimal, e.g. `"12.0"`).
    #[serde(rename = "HUSNR", default)]
    pub house_nr: String,
    /// House letter (`"a"`, `"b"`, ...).
    #[serde(rename = "BOKST", default)]
    pub house_char: String,
    #[serde(rename = "POSTNR", default)]
    pub postcode: String,
    /// Named place, e.g. a farm name.
    #[serde(rename = "SERHEITI", default)]
    pub special_name: String,
    /// Latitude with a decimal comma.
    #[serde(rename = "LAT_WGS84", alias = "N_HNIT_WGS84", default)]
    pub lat: String,
    /// Longitude with a decimal comma.
    #[serde(rename = "LONG_WGS84", alias = "E_HNIT_WGS84", default)]
    pub lon: String,
}

impl RegistryRow {
    /// Converts the raw row into an address record.
    ///
    /// Returns `None` for rows without a street name.
    #[must_use]
    pub fn to_record(&self) -> Option<AddressRecord> {
        let street_nominative = self.street_nominative.trim();
        if street_nominative.is_empty() {
            return None;
        }

        let street_dative = match self.street_dative.trim() {
            "" => street_nominative,
            dative => dative,
        };

        let postcode = normalize_integer(&self.postcode)
            .filter(|pc| pc != "0" && !pc.starts_with('-'))
            .unwrap_or_default();
        let municipality = postcodes::municipality(&postcode).unwrap_or_default();

        let special_name = Some(self.special_name.trim())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Some(AddressRecord {
            municipality: municipality.to_string(),
            postcode,
            street_nominative: street_nominative.to_string(),
            street_dative: street_dative.to_string(),
            house_nr: merge_house_nr(&self.house_nr, &self.house_char),
            special_name,
            lat: parse_decimal(&self.lat),
            lon: parse_decimal(&self.lon),
        })
    }
}

/// Merges the house number and house letter columns into a single
/// uppercase house number (`"12"` + `"a"` → `"12A"`).
#[must_use]
pub fn merge_house_nr(number: &str, letter: &str) -> String {
    let number = normalize_integer(number).unwrap_or_default();
    let letter = normalize_integer(letter).unwrap_or_else(|| letter.trim().to_string());
    format!("{number}{letter}").to_uppercase()
}

/// Parses a decimal number written with either a comma or a period.
#[must_use]
pub fn parse_decimal(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Renders integral values as integers (`"12.0"` → `"12"`). Returns the
/// trimmed input for non-numeric values and `None` for empty ones.
#[allow(clippy::cast_possible_truncation)]
fn normalize_integer(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match parse_decimal(value) {
        Some(n) if n.fract() == 0.0 => Some(format!("{}", n as i64)),
        _ => Some(value.to_string()),
    }
}

/// Reads a canonical table CSV.
///
/// # Errors
///
/// Returns [`RegistryError::MissingColumn`] if a required column is
/// absent, or a CSV error if the header cannot be read.
pub fn read_table(reader: impl Read, delimiter: u8) -> Result<CanonicalTable, RegistryError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in TABLE_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(RegistryError::MissingColumn((*column).to_string()));
        }
    }

    let mut records = Vec::new();
    let mut skipped = 0u64;
    for result in csv_reader.deserialize::<AddressRecord>() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed canonical table rows");
    }

    Ok(CanonicalTable::from_records(records))
}

/// Reads a canonical table CSV from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn load_table(path: &Path, delimiter: u8) -> Result<CanonicalTable, RegistryError> {
    log::info!("Loading canonical table from {}", path.display());

    let file = std::fs::File::open(path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    read_table(std::io::BufReader::new(file), delimiter)
}

/// Writes a canonical table as CSV.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized or written.
pub fn write_table(table: &CanonicalTable, writer: impl Write) -> Result<(), RegistryError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in table {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(|e| RegistryError::Io {
        path: "<output>".to_string(),
        source: e,
    })?;
    Ok(())
}

/// Reads raw registry rows, returning address records in source order.
/// Rows without a street name or coordinates are skipped.
///
/// # Errors
///
/// Returns [`RegistryError::MissingColumn`] if the street, house number,
/// postcode or coordinate columns are absent.
pub fn read_registry(reader: impl Read, delimiter: u8) -> Result<Vec<AddressRecord>, RegistryError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let has = |names: &[&str]| names.iter().any(|n| headers.iter().any(|h| h == *n));
    let required_columns: [&[&str]; 5] = [
        &["HEITI_NF"],
        &["HUSNR"],
        &["POSTNR"],
        &["LAT_WGS84", "N_HNIT_WGS84"],
        &["LONG_WGS84", "E_HNIT_WGS84"],
    ];
    for required in required_columns {
        if !has(required) {
            return Err(RegistryError::MissingColumn(required.join(" or ")));
        }
    }

    let mut records = Vec::new();
    let mut skipped = 0u64;
    for result in csv_reader.deserialize::<RegistryRow>() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
                continue;
            }
        };

        match row.to_record() {
            Some(record) if record.coordinates().is_some() => records.push(record),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} registry rows without a usable address");
    }
    log::info!("Read {} registry rows", records.len());

    Ok(records)
}

/// Parses a registry export from disk into a canonical table.
///
/// `.zip` archives are read in memory; the first `.dsv` or `.csv` entry is
/// used. `.dsv` files are `|`-delimited, everything else comma-delimited.
///
/// # Errors
///
/// Returns an error if the file or archive cannot be read or is missing
/// required columns.
pub fn parse_registry(path: &Path) -> Result<CanonicalTable, RegistryError> {
    let io_err = |e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    };

    log::info!("Parsing registry export {}", path.display());

    let file = std::fs::File::open(path).map_err(io_err)?;

    if has_extension(path.to_str().unwrap_or_default(), "zip") {
        let mut archive = zip::ZipArchive::new(file)?;
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            let delimiter = if has_extension(&name, "dsv") {
                b'|'
            } else if has_extension(&name, "csv") {
                b','
            } else {
                continue;
            };
            log::debug!("  reading {name} from archive");
            let records = read_registry(entry, delimiter)?;
            return Ok(CanonicalTable::from_records(records));
        }
        return Err(RegistryError::EmptyArchive(path.display().to_string()));
    }

    let delimiter = if has_extension(path.to_str().unwrap_or_default(), "dsv") {
        b'|'
    } else {
        b','
    };
    let records = read_registry(std::io::BufReader::new(file), delimiter)?;
    Ok(CanonicalTable::from_records(records))
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stadfang_registry_models::AddressKey;

    const REGISTRY_DSV: &str = "\
HNITNUM|HEITI_NF|HEITI_TGF|HUSNR|BOKST|POSTNR|SVFNR|SERHEITI|LAT_WGS84|LONG_WGS84
1|Laugavegur|Laugavegi|22||101|0|Kaffihús|64,145|-21,93
2|Þórsgata|Þórsgötu|5|a|101|0||64,144|-21,930
3|Þórsgata|Þórsgötu|3||101|0|||
4||||||||64,1|-21,9
5|Laugavegur|Laugavegi|22||101|0||0|0
";

    #[test]
    fn merges_house_number_and_letter() {
        assert_eq!(merge_house_nr("12", "a"), "12A");
        assert_eq!(merge_house_nr("12.0", ""), "12");
        assert_eq!(merge_house_nr("", ""), "");
        assert_eq!(merge_house_nr("3", "1.0"), "31");
    }

    #[test]
    fn parses_comma_decimals() {
        assert_eq!(parse_decimal("64,145"), Some(64.145));
        assert_eq!(parse_decimal("-21.93"), Some(-21.93));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn reads_registry_rows() {
        let records = read_registry(REGISTRY_DSV.as_bytes(), b'|').unwrap();
        // Rows without a street or without coordinates are dropped.
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.municipality, "Reykjavík");
        assert_eq!(first.postcode, "101");
        assert_eq!(first.house_nr, "22");
        assert_eq!(first.special_name.as_deref(), Some("Kaffihús"));
        assert_eq!(first.lat, Some(64.145));

        assert_eq!(records[1].house_nr, "5A");
        assert_eq!(records[2].lat, Some(0.0));
    }

    #[test]
    fn registry_duplicates_keep_first_row() {
        let records = read_registry(REGISTRY_DSV.as_bytes(), b'|').unwrap();
        let table = CanonicalTable::from_records(records);
        let key = AddressKey::new("Reykjavík", "101", "Laugavegur", "22");
        assert_eq!(table.get(&key).unwrap().lat, Some(64.145));
    }

    #[test]
    fn registry_requires_coordinate_columns() {
        let err = read_registry("HEITI_NF|HUSNR|POSTNR\nLaugavegur|1|101\n".as_bytes(), b'|')
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingColumn(c) if c.contains("LAT_WGS84")));
    }

    #[test]
    fn canonical_table_requires_key_columns() {
        let err = read_table("municipality,postcode\nReykjavík,101\n".as_bytes(), b',')
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingColumn(c) if c == "street_nominative"));
    }

    #[test]
    fn writes_and_reads_back_the_table() {
        let table = crate::fixtures::sample_table();
        let mut out = Vec::new();
        write_table(&table, &mut out).unwrap();

        let reread = read_table(out.as_slice(), b',').unwrap();
        assert_eq!(reread.len(), table.len());
        assert_eq!(reread.records(), table.records());
    }

    #[test]
    fn parses_zipped_registry() {
        let tmp = std::env::temp_dir().join("stadfang_registry_zip_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("STADFANG.dsv.zip");
        let file = std::fs::File::create(&zip_path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip_writer.start_file("STADFANG.dsv", options).unwrap();
        zip_writer.write_all(REGISTRY_DSV.as_bytes()).unwrap();
        zip_writer.finish().unwrap();

        let table = parse_registry(&zip_path).unwrap();
        assert_eq!(table.len(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
