#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical Icelandic address table (Staðfangaskrá).
//!
//! Loads the address registry into an immutable [`CanonicalTable`] and
//! provides the static lookups the geocoder builds on: the postcode to
//! municipality map, the administrative alias map, the street name
//! patterns and the `(municipality, street) -> postcode` lookup.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use stadfang_registry::RegistryConfig;
//!
//! let config = RegistryConfig {
//!     table_path: "data/stadfang.csv".to_string(),
//!     ..RegistryConfig::default()
//! };
//! let table = stadfang_registry::load(&config)?;
//! println!("{} addresses", table.len());
//! # Ok(())
//! # }
//! ```

pub mod aliases;
pub mod patterns;
pub mod postcodes;
pub mod source;
pub mod street_postcode;
pub mod table;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

use std::path::Path;

pub use aliases::AdministrativeAliasMap;
pub use stadfang_registry_models::{
    AddressKey, AddressRecord, CandidateKey, Coordinates, FullMatch, KeyField, Match, QueryRow,
    RegistryConfig, ResolvedAddress,
};
pub use street_postcode::MunicipalityStreetToPostcode;
pub use table::CanonicalTable;

/// Errors from loading the registry or its configuration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// I/O error on a specific file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive error.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required column is absent from the input header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The archive holds no `.dsv` or `.csv` entry.
    #[error("No registry file found in archive {0}")]
    EmptyArchive(String),

    /// The configured delimiter is not an ASCII character.
    #[error("Invalid delimiter {0:?}: must be an ASCII character")]
    InvalidDelimiter(char),

    /// Neither a table path nor a registry path is configured.
    #[error("No address source configured: set a table path or a registry path")]
    NoSource,
}

/// Reads a [`RegistryConfig`] from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid config.
pub fn load_config(path: &Path) -> Result<RegistryConfig, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(toml::from_str(&contents)?)
}

/// Loads the canonical table named by `config`.
///
/// A prepared table (`table_path`) takes precedence over a raw registry
/// export (`registry_path`).
///
/// # Errors
///
/// Returns [`RegistryError::NoSource`] if neither path is set, or any
/// error from reading the source.
pub fn load(config: &RegistryConfig) -> Result<CanonicalTable, RegistryError> {
    if !config.table_path.is_empty() {
        let delimiter = delimiter_byte(config.delimiter)?;
        return source::load_table(Path::new(&config.table_path), delimiter);
    }

    if !config.registry_path.is_empty() {
        return source::parse_registry(Path::new(&config.registry_path));
    }

    Err(RegistryError::NoSource)
}

/// Converts a CSV delimiter to the single byte the `csv` crate expects.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidDelimiter`] unless `delimiter` is ASCII.
/// Latin-1 characters such as `'þ'` fit in a byte but are two bytes in
/// UTF-8 text, so they are rejected too.
pub fn delimiter_byte(delimiter: char) -> Result<u8, RegistryError> {
    if !delimiter.is_ascii() {
        return Err(RegistryError::InvalidDelimiter(delimiter));
    }
    u8::try_from(delimiter).map_err(|_| RegistryError::InvalidDelimiter(delimiter))
}

/// Returns the built-in alias map with the configured extra aliases
/// merged on top.
#[must_use]
pub fn aliases(config: &RegistryConfig) -> AdministrativeAliasMap {
    let mut aliases = AdministrativeAliasMap::builtin();
    aliases.extend(config.aliases.clone());
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_source_fails() {
        let err = load(&RegistryConfig::default()).unwrap_err();
        assert!(matches!(err, RegistryError::NoSource));
    }

    #[test]
    fn load_rejects_multibyte_delimiter() {
        let config = RegistryConfig {
            table_path: "unused.csv".to_string(),
            delimiter: 'þ',
            ..RegistryConfig::default()
        };
        assert!(matches!(
            load(&config),
            Err(RegistryError::InvalidDelimiter('þ'))
        ));
    }

    #[test]
    fn delimiter_must_be_ascii() {
        assert_eq!(delimiter_byte('|').unwrap(), b'|');
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert!(matches!(
            delimiter_byte('é'),
            Err(RegistryError::InvalidDelimiter('é'))
        ));
        assert!(matches!(
            delimiter_byte('€'),
            Err(RegistryError::InvalidDelimiter('€'))
        ));
    }

    #[test]
    fn config_file_merges_extra_aliases() {
        let tmp = std::env::temp_dir().join("stadfang_registry_config_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let config_path = tmp.join("stadfang.toml");
        std::fs::write(
            &config_path,
            r#"
table_path = "data/stadfang.csv"
delimiter = ";"

[aliases]
"Höfuðborgin" = ["Reykjavík"]
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.table_path, "data/stadfang.csv");
        assert_eq!(config.delimiter, ';');
        assert!(config.registry_path.is_empty());

        let aliases = aliases(&config);
        assert_eq!(
            aliases.get("Höfuðborgin"),
            Some(&["Reykjavík".to_string()][..])
        );
        assert!(aliases.contains("Fjarðabyggð"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn loads_table_from_config() {
        let tmp = std::env::temp_dir().join("stadfang_registry_load_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let table_path = tmp.join("stadfang.csv");
        std::fs::write(&table_path, fixtures::SAMPLE_TABLE_CSV).unwrap();

        let config = RegistryConfig {
            table_path: table_path.display().to_string(),
            ..RegistryConfig::default()
        };
        let table = load(&config).unwrap();
        assert_eq!(table.len(), fixtures::sample_table().len());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
