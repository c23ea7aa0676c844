#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Icelandic address geocoder.
//!
//! Resolves free-form and structured Icelandic addresses against the
//! canonical address table:
//!
//! 1. **Scanning** ([`tokenize`]): finds `"Street number, postcode"`
//!    fragments in running text by word shape alone.
//! 2. **Parsing** ([`vocabulary`]): turns one address string into a
//!    candidate key using the table's vocabulary and the administrative
//!    alias map.
//! 3. **Point lookups** ([`coordinates`]): exact, street mean or postcode
//!    mean coordinates.
//! 4. **Batch resolution** ([`engine`]): exact key matches, then a
//!    narrowed partial-key search for the rest.
//!
//! Everything is built once in [`Geocoder::new`] and is read-only
//! afterwards, so a `Geocoder` can be shared between threads.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use stadfang_geocoder::Geocoder;
//! use stadfang_registry::RegistryConfig;
//!
//! let config = RegistryConfig {
//!     table_path: "data/stadfang.csv".to_string(),
//!     ..RegistryConfig::default()
//! };
//! let geocoder = Geocoder::from_config(&config)?;
//! for address in geocoder.resolve_text(&["Laugavegur 22, 101 Reykjavík"]) {
//!     println!("{} {:?}", address.postcode, address.coordinates);
//! }
//! # Ok(())
//! # }
//! ```

pub mod coordinates;
pub mod engine;
pub mod hydrate;
pub mod structured;
pub mod tokenize;
pub mod vocabulary;

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use stadfang_registry::{
    AdministrativeAliasMap, CanonicalTable, Coordinates, FullMatch, QueryRow, RegistryConfig,
    RegistryError, ResolvedAddress, postcodes,
};
use thiserror::Error;

use coordinates::CoordinateIndex;
use engine::QueryEngine;
use hydrate::{HydrateOptions, HydrateSummary};
use structured::{StreetForms, StructuredQuery};
use vocabulary::VocabularyParser;

pub use tokenize::parse_text;

/// Errors from malformed queries or loading the table.
///
/// Addresses that cannot be resolved are not errors; they produce empty
/// output rows.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required input column is absent.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },

    /// Parallel input columns differ in length.
    #[error("Column {column} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A CSV row has more fields than its header.
    #[error("Line {line} has {actual} fields, header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        actual: usize,
    },

    /// Loading the canonical table failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// All lookup structures built over one canonical table.
#[derive(Debug, Clone)]
pub struct Geocoder {
    table: Arc<CanonicalTable>,
    index: CoordinateIndex,
    parser: VocabularyParser,
    engine: QueryEngine,
    streets: StreetForms,
}

impl Geocoder {
    /// Builds the coordinate index, parser vocabulary and query engine.
    #[must_use]
    pub fn new(table: CanonicalTable, aliases: AdministrativeAliasMap) -> Self {
        let table = Arc::new(table);

        let index = CoordinateIndex::build(&table);
        let parser = VocabularyParser::from_table(&table, aliases);
        let streets = StreetForms::build(&table);
        let engine = QueryEngine::new(Arc::clone(&table));

        log::info!("Geocoder ready: {} addresses", table.len());

        Self {
            table,
            index,
            parser,
            engine,
            streets,
        }
    }

    /// Loads the table and aliases named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, QueryError> {
        let table = stadfang_registry::load(config)?;
        Ok(Self::new(table, stadfang_registry::aliases(config)))
    }

    #[must_use]
    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    /// Coordinates for a postcode, optionally narrowed by street and house
    /// number, falling back to the street and postcode means.
    #[must_use]
    pub fn single_lookup(
        &self,
        postcode: &str,
        street: Option<&str>,
        house_nr: Option<&str>,
    ) -> Option<Coordinates> {
        self.index.single(postcode, street, house_nr)
    }

    /// Element-wise [`Self::single_lookup`] over parallel columns.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::LengthMismatch`] if the columns differ in
    /// length.
    pub fn coordinates_from_array<P, S, H>(
        &self,
        postcodes: &[P],
        streets: &[S],
        house_nrs: &[H],
    ) -> Result<Vec<Option<Coordinates>>, QueryError>
    where
        P: AsRef<str>,
        S: AsRef<str>,
        H: AsRef<str>,
    {
        self.index
            .coordinates_from_array(postcodes, streets, house_nrs)
    }

    /// Scans `text` and attaches coordinates and the postcode's
    /// municipality to every match.
    pub fn scan_text<'a>(&'a self, text: &'a str) -> impl Iterator<Item = FullMatch> + 'a {
        tokenize::parse_text(text).map(move |m| {
            let postcode = m.postcode.as_deref().unwrap_or_default();
            FullMatch {
                coordinates: self.index.single(
                    postcode,
                    m.street.as_deref(),
                    m.house_nr.as_deref(),
                ),
                municipality: postcodes::municipality(postcode).map(ToString::to_string),
                postcode: m.postcode,
                street: m.street,
                house_nr: m.house_nr,
            }
        })
    }

    /// The first [`Self::scan_text`] match of each text, or `None`.
    #[must_use]
    pub fn hydrate_text_array<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Option<FullMatch>> {
        texts
            .iter()
            .map(|text| self.scan_text(text.as_ref()).next())
            .collect()
    }

    /// Resolves prepared query rows.
    #[must_use]
    pub fn resolve_batch(&self, rows: &[QueryRow]) -> Vec<ResolvedAddress> {
        self.engine.resolve(rows)
    }

    /// Parses and resolves address strings, one output row per input.
    #[must_use]
    pub fn resolve_text<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ResolvedAddress> {
        let mut identities: HashMap<&str, usize> = HashMap::new();

        let rows: Vec<QueryRow> = texts
            .iter()
            .enumerate()
            .map(|(order, text)| {
                let text = text.as_ref().trim();
                let next = identities.len();
                let identity = *identities.entry(text).or_insert(next);
                QueryRow {
                    key: self.parser.parse(text),
                    order,
                    identity,
                    query: Some(text.to_string()),
                }
            })
            .collect();

        self.engine.resolve(&rows)
    }

    /// Resolves structured queries. Dative street names are accepted and
    /// a missing municipality is derived from the postcode.
    #[must_use]
    pub fn resolve_structured(&self, queries: &[StructuredQuery]) -> Vec<ResolvedAddress> {
        self.engine.resolve(&self.streets.to_rows(queries))
    }

    /// Resolves every address fragment found in a block of text.
    #[must_use]
    pub fn query_text_body(&self, text: &str) -> Vec<ResolvedAddress> {
        let queries: Vec<StructuredQuery> = tokenize::parse_text(text)
            .map(|m| StructuredQuery {
                postcode: m.postcode.unwrap_or_default(),
                street: m.street.unwrap_or_default(),
                house_nr: m.house_nr.unwrap_or_default(),
                municipality: None,
            })
            .collect();
        self.resolve_structured(&queries)
    }

    /// Hydrates a CSV table. See [`hydrate::hydrate_csv`].
    ///
    /// # Errors
    ///
    /// Returns an error if the table lacks the address columns or cannot
    /// be read or written.
    pub fn hydrate_csv(
        &self,
        reader: impl Read,
        writer: impl Write,
        options: &HydrateOptions,
    ) -> Result<HydrateSummary, QueryError> {
        hydrate::hydrate_csv(self, reader, writer, options)
    }
}
