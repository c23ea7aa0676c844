//! Multi-granularity coordinate index.
//!
//! Built once from the canonical table with three tiers of keys:
//!
//! | Tier   | Key                                   | Value                     |
//! |--------|---------------------------------------|---------------------------|
//! | exact  | `(postcode, street, house_nr)`        | the address's coordinates |
//! | street | `(postcode, street, -)`               | mean over the street      |
//! | area   | `(postcode, -, -)`                    | mean over the postcode    |
//!
//! Street keys are lowercased and indexed in both grammatical cases, so
//! `"Laugavegi"` and `"laugavegur"` find the same street. Records without
//! coordinates are left out of every tier.

use std::collections::{BTreeMap, HashMap};

use geo::{Centroid, MultiPoint, Point};
use stadfang_registry::{AddressRecord, CanonicalTable, Coordinates};

use crate::QueryError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    postcode: String,
    street: Option<String>,
    house_nr: Option<String>,
}

impl IndexKey {
    fn new(postcode: &str, street: Option<&str>, house_nr: Option<&str>) -> Self {
        Self {
            postcode: postcode.trim().to_string(),
            street: street.map(str::to_lowercase),
            house_nr: house_nr.map(str::to_uppercase),
        }
    }
}

/// Point lookups with fallback from exact address to street to postcode.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    data: HashMap<IndexKey, Coordinates>,
}

impl CoordinateIndex {
    /// Builds the three tiers from `table`.
    #[must_use]
    pub fn build(table: &CanonicalTable) -> Self {
        let mut data = HashMap::new();

        // Nominative first; a dative key equal to another street's
        // nominative key overwrites it.
        let cases: [fn(&AddressRecord) -> &str; 2] = [
            |r| r.street_nominative.as_str(),
            |r| r.street_dative.as_str(),
        ];

        for street_of in cases {
            let mut streets: BTreeMap<(&str, String), Vec<Point<f64>>> = BTreeMap::new();

            for record in table {
                let Some(coordinates) = record.coordinates() else {
                    continue;
                };
                let street = street_of(record);
                data.insert(
                    IndexKey::new(&record.postcode, Some(street), Some(&record.house_nr)),
                    coordinates,
                );
                streets
                    .entry((record.postcode.as_str(), street.to_lowercase()))
                    .or_default()
                    .push(coordinates.to_point());
            }

            for ((postcode, street), points) in streets {
                if let Some(mean) = mean(points) {
                    data.insert(IndexKey::new(postcode, Some(&street), None), mean);
                }
            }
        }

        let mut areas: BTreeMap<&str, Vec<Point<f64>>> = BTreeMap::new();
        for record in table {
            if let Some(coordinates) = record.coordinates() {
                areas
                    .entry(record.postcode.as_str())
                    .or_default()
                    .push(coordinates.to_point());
            }
        }
        for (postcode, points) in areas {
            if let Some(mean) = mean(points) {
                data.insert(IndexKey::new(postcode, None, None), mean);
            }
        }

        log::info!("Coordinate index built: {} keys", data.len());

        Self { data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Looks up coordinates for a postcode, optionally narrowed by street
    /// and house number.
    ///
    /// Tries the exact address, then the street mean, then the postcode
    /// mean. Empty strings count as absent.
    #[must_use]
    pub fn single(
        &self,
        postcode: &str,
        street: Option<&str>,
        house_nr: Option<&str>,
    ) -> Option<Coordinates> {
        let street = street.map(str::trim).filter(|s| !s.is_empty());
        let house_nr = house_nr.map(str::trim).filter(|s| !s.is_empty());

        if let (Some(street), Some(house_nr)) = (street, house_nr) {
            if let Some(c) = self.data.get(&IndexKey::new(postcode, Some(street), Some(house_nr))) {
                return Some(*c);
            }
        }

        if let Some(street) = street {
            if let Some(c) = self.data.get(&IndexKey::new(postcode, Some(street), None)) {
                return Some(*c);
            }
        }

        self.data.get(&IndexKey::new(postcode, None, None)).copied()
    }

    /// Element-wise [`Self::single`] over parallel columns.
    ///
    /// Misses are `None`, never `(0.0, 0.0)`.
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
        for (column, len) in [("street", streets.len()), ("house_nr", house_nrs.len())] {
            if len != postcodes.len() {
                return Err(QueryError::LengthMismatch {
                    column: column.to_string(),
                    expected: postcodes.len(),
                    actual: len,
                });
            }
        }

        Ok(postcodes
            .iter()
            .zip(streets)
            .zip(house_nrs)
            .map(|((postcode, street), house_nr)| {
                self.single(
                    postcode.as_ref(),
                    Some(street.as_ref()),
                    Some(house_nr.as_ref()),
                )
            })
            .collect())
    }
}

fn mean(points: Vec<Point<f64>>) -> Option<Coordinates> {
    MultiPoint::new(points).centroid().map(Coordinates::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stadfang_registry::fixtures::sample_table;

    const EPSILON: f64 = 1e-9;

    fn assert_close(actual: Option<Coordinates>, lat: f64, lon: f64) {
        let actual = actual.expect("coordinates");
        assert!(
            (actual.lat - lat).abs() < EPSILON && (actual.lon - lon).abs() < EPSILON,
            "expected ({lat}, {lon}), got ({}, {})",
            actual.lat,
            actual.lon
        );
    }

    #[test]
    fn exact_address() {
        let index = CoordinateIndex::build(&sample_table());
        assert_close(
            index.single("101", Some("Laugavegur"), Some("22")),
            64.1450,
            -21.9300,
        );
    }

    #[test]
    fn dative_and_case_insensitive_street() {
        let index = CoordinateIndex::build(&sample_table());
        assert_close(
            index.single("101", Some("Laugavegi"), Some("22")),
            64.1450,
            -21.9300,
        );
        assert_close(
            index.single("101", Some("LAUGAVEGUR"), Some("22")),
            64.1450,
            -21.9300,
        );
    }

    #[test]
    fn house_letter_matches_either_case() {
        let index = CoordinateIndex::build(&sample_table());
        assert_close(
            index.single("101", Some("Þórsgata"), Some("5a")),
            64.1440,
            -21.9300,
        );
    }

    #[test]
    fn unknown_house_number_falls_back_to_street_mean() {
        let index = CoordinateIndex::build(&sample_table());
        // Laugavegur 3, 11 and 22 in 101.
        assert_close(
            index.single("101", Some("Laugavegur"), Some("999")),
            64.1460,
            -21.9320,
        );
        assert_close(index.single("101", Some("Laugavegur"), None), 64.1460, -21.9320);
    }

    #[test]
    fn postcode_only_is_postcode_mean() {
        let index = CoordinateIndex::build(&sample_table());
        // Five addresses with coordinates in 101; Þórsgata 3 has none.
        assert_close(index.single("101", None, None), 64.1448, -21.9308);
    }

    #[test]
    fn unknown_street_falls_back_to_postcode_mean() {
        let index = CoordinateIndex::build(&sample_table());
        assert_eq!(
            index.single("101", Some("Engingata"), Some("1")),
            index.single("101", None, None)
        );
    }

    #[test]
    fn unknown_postcode_is_not_found() {
        let index = CoordinateIndex::build(&sample_table());
        assert_eq!(index.single("999", Some("Laugavegur"), Some("22")), None);
    }

    #[test]
    fn record_without_coordinates_is_not_indexed() {
        let index = CoordinateIndex::build(&sample_table());
        // Þórsgata 3 falls back to the mean of Þórsgata 1 and 5A.
        assert_close(
            index.single("101", Some("Þórsgata"), Some("3")),
            64.1430,
            -21.9290,
        );
    }

    #[test]
    fn coordinates_from_array_marks_misses() {
        let index = CoordinateIndex::build(&sample_table());
        let result = index
            .coordinates_from_array(
                &["101", "999"],
                &["Laugavegur", "Laugavegur"],
                &["22", "22"],
            )
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_close(result[0], 64.1450, -21.9300);
        assert!(result[1].is_none());
    }

    #[test]
    fn coordinates_from_array_rejects_ragged_columns() {
        let index = CoordinateIndex::build(&sample_table());
        let err = index
            .coordinates_from_array(&["101", "112"], &["Laugavegur"], &["22", "95"])
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::LengthMismatch { expected: 2, actual: 1, .. }
        ));
    }
}
