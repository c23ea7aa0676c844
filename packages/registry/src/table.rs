//! The canonical address table.
//!
//! Records are sorted by their `(municipality, postcode,
//! street_nominative, house_nr)` key and deduplicated on it, keeping the
//! first occurrence in source order. A hash index over the key gives
//! constant time exact lookups.

use std::collections::{BTreeSet, HashMap};

use stadfang_registry_models::{AddressKey, AddressRecord};

/// Immutable, sorted and deduplicated collection of address records.
#[derive(Debug, Clone, Default)]
pub struct CanonicalTable {
    records: Vec<AddressRecord>,
    index: HashMap<AddressKey, usize>,
}

impl CanonicalTable {
    /// Builds the table from records in source order.
    ///
    /// House numbers are uppercased. Records sharing a key are collapsed
    /// to the first one seen.
    #[must_use]
    pub fn from_records(records: Vec<AddressRecord>) -> Self {
        let total = records.len();

        let mut records: Vec<AddressRecord> = records
            .into_iter()
            .map(|mut r| {
                r.house_nr = r.house_nr.trim().to_uppercase();
                r
            })
            .collect();

        // Stable sort keeps source order among equal keys, so `dedup_by`
        // retains the first occurrence.
        records.sort_by(|a, b| key_cmp(a, b));
        records.dedup_by(|later, earlier| key_cmp(later, earlier).is_eq());

        let dropped = total - records.len();
        if dropped > 0 {
            log::debug!("Dropped {dropped} duplicate address records");
        }

        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();

        log::info!("Canonical table built: {} records", records.len());

        Self { records, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, sorted by key.
    #[must_use]
    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AddressRecord> {
        self.records.iter()
    }

    /// Returns the record at `position` (as returned by [`Self::position`]).
    #[must_use]
    pub fn record(&self, position: usize) -> Option<&AddressRecord> {
        self.records.get(position)
    }

    /// Returns the position of the record with exactly this key.
    #[must_use]
    pub fn position(&self, key: &AddressKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Returns the record with exactly this key.
    #[must_use]
    pub fn get(&self, key: &AddressKey) -> Option<&AddressRecord> {
        self.position(key).map(|i| &self.records[i])
    }

    #[must_use]
    pub fn contains(&self, key: &AddressKey) -> bool {
        self.index.contains_key(key)
    }

    /// Distinct municipality names.
    #[must_use]
    pub fn municipalities(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.municipality.as_str()).collect()
    }

    /// Distinct postcodes.
    #[must_use]
    pub fn postcodes(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.postcode.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a CanonicalTable {
    type Item = &'a AddressRecord;
    type IntoIter = std::slice::Iter<'a, AddressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn key_cmp(a: &AddressRecord, b: &AddressRecord) -> std::cmp::Ordering {
    a.municipality
        .cmp(&b.municipality)
        .then_with(|| a.postcode.cmp(&b.postcode))
        .then_with(|| a.street_nominative.cmp(&b.street_nominative))
        .then_with(|| a.house_nr.cmp(&b.house_nr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(street: &str, house_nr: &str, lat: f64) -> AddressRecord {
        AddressRecord {
            municipality: "Reykjavík".to_string(),
            postcode: "101".to_string(),
            street_nominative: street.to_string(),
            street_dative: street.to_string(),
            house_nr: house_nr.to_string(),
            special_name: None,
            lat: Some(lat),
            lon: Some(-21.93),
        }
    }

    #[test]
    fn sorts_records_by_key() {
        let table = CanonicalTable::from_records(vec![
            record("Þórsgata", "1", 64.0),
            record("Laugavegur", "3", 64.1),
            record("Laugavegur", "11", 64.2),
        ]);
        let streets: Vec<(&str, &str)> = table
            .iter()
            .map(|r| (r.street_nominative.as_str(), r.house_nr.as_str()))
            .collect();
        assert_eq!(
            streets,
            [("Laugavegur", "11"), ("Laugavegur", "3"), ("Þórsgata", "1")]
        );
    }

    #[test]
    fn keeps_first_duplicate_in_source_order() {
        let table = CanonicalTable::from_records(vec![
            record("Laugavegur", "22", 64.1),
            record("Laugavegur", "22", 0.0),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].lat, Some(64.1));
    }

    #[test]
    fn uppercases_house_numbers() {
        let table = CanonicalTable::from_records(vec![record("Þórsgata", "5a", 64.0)]);
        let key = AddressKey::new("Reykjavík", "101", "Þórsgata", "5A");
        assert!(table.contains(&key));
        assert_eq!(table.get(&key).map(|r| r.house_nr.as_str()), Some("5A"));
    }

    #[test]
    fn case_variants_collapse_after_uppercasing() {
        let table = CanonicalTable::from_records(vec![
            record("Þórsgata", "5a", 64.0),
            record("Þórsgata", "5A", 65.0),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].lat, Some(64.0));
    }

    #[test]
    fn position_points_at_the_indexed_record() {
        let table = CanonicalTable::from_records(vec![
            record("Laugavegur", "3", 64.1),
            record("Laugavegur", "11", 64.2),
        ]);
        let key = AddressKey::new("Reykjavík", "101", "Laugavegur", "3");
        let position = table.position(&key).unwrap();
        assert_eq!(table.record(position).unwrap().house_nr, "3");
        assert!(table.position(&AddressKey::default()).is_none());
    }
}
