//! `(municipality, street) -> postcode` lookup.
//!
//! Used to recover a postcode for addresses written as
//! `"Suðurtún 5, Garðabær"`. Streets that span more than one postcode
//! within a municipality are left out entirely.

use std::collections::{BTreeSet, HashMap};

use crate::table::CanonicalTable;

/// Maps a municipality and a street name, in either grammatical case, to
/// the single postcode the street belongs to.
#[derive(Debug, Clone, Default)]
pub struct MunicipalityStreetToPostcode {
    map: HashMap<String, HashMap<String, String>>,
}

impl MunicipalityStreetToPostcode {
    /// Builds the lookup from the canonical table.
    #[must_use]
    pub fn build(table: &CanonicalTable) -> Self {
        struct StreetPostcodes<'a> {
            dative: BTreeSet<&'a str>,
            postcodes: BTreeSet<&'a str>,
        }

        let mut streets: HashMap<(&str, &str), StreetPostcodes<'_>> = HashMap::new();

        for record in table {
            let entry = streets
                .entry((
                    record.municipality.as_str(),
                    record.street_nominative.as_str(),
                ))
                .or_insert_with(|| StreetPostcodes {
                    dative: BTreeSet::new(),
                    postcodes: BTreeSet::new(),
                });
            entry.dative.insert(record.street_dative.as_str());
            entry.postcodes.insert(record.postcode.as_str());
        }

        let mut map: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut ambiguous = 0usize;

        // Dative forms first so that a nominative name always wins a
        // collision with another street's dative form.
        for ((municipality, _), entry) in &streets {
            let Some(postcode) = single(&entry.postcodes) else {
                continue;
            };
            let by_street = map.entry((*municipality).to_string()).or_default();
            for dative in &entry.dative {
                by_street.insert((*dative).to_string(), postcode.to_string());
            }
        }

        for ((municipality, nominative), entry) in &streets {
            let Some(postcode) = single(&entry.postcodes) else {
                ambiguous += 1;
                continue;
            };
            map.entry((*municipality).to_string())
                .or_default()
                .insert((*nominative).to_string(), postcode.to_string());
        }

        let lookup = Self { map };
        log::debug!(
            "Street to postcode lookup: {} entries, {ambiguous} streets spanning several postcodes",
            lookup.len()
        );

        lookup
    }

    /// Returns the postcode of `street` in `municipality`.
    #[must_use]
    pub fn get(&self, municipality: &str, street: &str) -> Option<&str> {
        self.map
            .get(municipality)
            .and_then(|streets| streets.get(street))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn single<'a>(postcodes: &BTreeSet<&'a str>) -> Option<&'a str> {
    if postcodes.len() == 1 {
        postcodes.first().copied()
    } else {
        None
    }
}
