//! Hierarchical batch query engine.
//!
//! A batch is resolved in two passes:
//!
//! 1. **Exact**: rows whose full `(municipality, postcode, street,
//!    house_nr)` key is in the table resolve through the hash index.
//! 2. **Fallback**: the remaining rows have one or more unknown fields.
//!    The table is narrowed once for the whole batch to the records that
//!    could match any of them, then the key of every distinct query
//!    identity is matched against that slice with unknown fields acting
//!    as wildcards. A key matching exactly one record resolves to it;
//!    zero or several matches leave the row unresolved.
//!
//! Every input row produces exactly one output row, sorted by the row's
//! `order`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use stadfang_registry::{
    AddressKey, AddressRecord, CanonicalTable, KeyField, QueryRow, ResolvedAddress,
};

/// Result of matching a partial key against the search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackOutcome {
    NotFound,
    /// Position of the single matching record in the table.
    Resolved(usize),
    /// More than one record matches.
    Ambiguous,
}

/// The part of the table a fallback batch can match.
///
/// For each key field, if every key in the batch knows the field the
/// slice is restricted to records whose value is among the known values.
/// A field that some key leaves unknown is not restricted.
///
/// The same pass indexes the slice by each field's value, so a key is
/// only compared against the records sharing its most selective known
/// field.
#[derive(Debug)]
pub struct SearchSpace<'a> {
    table: &'a CanonicalTable,
    positions: Vec<usize>,
    postings: [HashMap<&'a str, Vec<usize>>; 4],
}

impl<'a> SearchSpace<'a> {
    /// Narrows `table` to the records that may match one of `keys`.
    #[must_use]
    pub fn narrow<'k>(
        table: &'a CanonicalTable,
        keys: impl IntoIterator<Item = &'k AddressKey>,
    ) -> Self {
        let mut filters: [Option<HashSet<&str>>; 4] = [
            Some(HashSet::new()),
            Some(HashSet::new()),
            Some(HashSet::new()),
            Some(HashSet::new()),
        ];

        for key in keys {
            for (filter, field) in filters.iter_mut().zip(KeyField::ALL) {
                let value = key.get(field);
                if value.is_empty() {
                    *filter = None;
                } else if let Some(values) = filter {
                    values.insert(value);
                }
            }
        }

        let mut positions = Vec::new();
        let mut postings: [HashMap<&'a str, Vec<usize>>; 4] = Default::default();

        for (i, record) in table.iter().enumerate() {
            let keep = filters.iter().zip(KeyField::ALL).all(|(filter, field)| {
                filter
                    .as_ref()
                    .is_none_or(|values| values.contains(record.get(field)))
            });
            if !keep {
                continue;
            }
            positions.push(i);
            for (posting, field) in postings.iter_mut().zip(KeyField::ALL) {
                posting.entry(record.get(field)).or_default().push(i);
            }
        }

        Self {
            table,
            positions,
            postings,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The records sharing `key`'s most selective known field. A key with
    /// no known field gets the whole slice.
    fn candidates(&self, key: &AddressKey) -> &[usize] {
        let mut best: Option<&[usize]> = None;

        for (posting, field) in self.postings.iter().zip(KeyField::ALL) {
            let value = key.get(field);
            if value.is_empty() {
                continue;
            }
            let list = posting.get(value).map_or(&[][..], Vec::as_slice);
            if best.is_none_or(|b| list.len() < b.len()) {
                best = Some(list);
            }
        }

        best.unwrap_or(&self.positions)
    }

    /// Number of records [`Self::find`] compares `key` against.
    #[must_use]
    pub fn candidate_count(&self, key: &AddressKey) -> usize {
        self.candidates(key).len()
    }

    /// Matches `key` against the slice; unknown fields match anything.
    #[must_use]
    pub fn find(&self, key: &AddressKey) -> FallbackOutcome {
        let mut found = None;

        for &position in self.candidates(key) {
            if !matches_known_fields(&self.table.records()[position], key) {
                continue;
            }
            if found.is_some() {
                return FallbackOutcome::Ambiguous;
            }
            found = Some(position);
        }

        found.map_or(FallbackOutcome::NotFound, FallbackOutcome::Resolved)
    }
}

fn matches_known_fields(record: &AddressRecord, key: &AddressKey) -> bool {
    KeyField::ALL.into_iter().all(|field| {
        let value = key.get(field);
        value.is_empty() || record.get(field) == value
    })
}

/// Resolves batches of [`QueryRow`]s against a shared canonical table.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    table: Arc<CanonicalTable>,
}

impl QueryEngine {
    #[must_use]
    pub const fn new(table: Arc<CanonicalTable>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    /// Resolves every row, returning one output row per input row in
    /// `order`.
    #[must_use]
    pub fn resolve(&self, rows: &[QueryRow]) -> Vec<ResolvedAddress> {
        let mut positions: Vec<Option<usize>> = rows
            .iter()
            .map(|row| self.table.position(&row.key))
            .collect();

        let exact = positions.iter().filter(|p| p.is_some()).count();

        let (mut fallback, invalid) = fallback_groups(rows, &positions);

        if !fallback.is_empty() {
            let space = SearchSpace::narrow(&self.table, fallback.values().map(|(key, _)| *key));
            log::debug!(
                "Fallback: {} distinct queries against {} of {} records",
                fallback.len(),
                space.len(),
                self.table.len()
            );

            for (key, outcome) in fallback.values_mut() {
                *outcome = space.find(key);
                log::trace!(
                    "  {} -> {outcome:?} ({} candidates)",
                    key.identity_string(),
                    space.candidate_count(key)
                );
            }

            for (row, position) in rows.iter().zip(positions.iter_mut()) {
                if position.is_none()
                    && let Some((_, FallbackOutcome::Resolved(p))) = fallback.get(&row.identity)
                {
                    *position = Some(*p);
                }
            }
        }

        let resolved = positions.iter().filter(|p| p.is_some()).count();
        log::debug!(
            "Resolved {resolved} of {} rows ({exact} exact, {} by fallback, {invalid} without key)",
            rows.len(),
            resolved - exact,
        );

        let mut out: Vec<ResolvedAddress> = rows
            .iter()
            .zip(positions)
            .map(|(row, position)| {
                let record = position.and_then(|p| self.table.record(p));
                to_resolved(row, record)
            })
            .collect();
        out.sort_by_key(|r| r.order);
        out
    }
}

/// Groups the rows without an exact hit by identity, keeping the key of
/// the first row of each group. Also returns the number of rows whose key
/// has no municipality, postcode or street.
fn fallback_groups<'r>(
    rows: &'r [QueryRow],
    positions: &[Option<usize>],
) -> (HashMap<usize, (&'r AddressKey, FallbackOutcome)>, usize) {
    let mut groups = HashMap::new();
    let mut invalid = 0usize;

    for (row, position) in rows.iter().zip(positions) {
        if position.is_some() {
            continue;
        }
        if row.key.is_resolvable() {
            groups
                .entry(row.identity)
                .or_insert((&row.key, FallbackOutcome::NotFound));
        } else {
            invalid += 1;
        }
    }

    (groups, invalid)
}

fn to_resolved(row: &QueryRow, record: Option<&AddressRecord>) -> ResolvedAddress {
    let Some(record) = record else {
        return ResolvedAddress {
            order: row.order,
            query: row.query.clone(),
            ..ResolvedAddress::default()
        };
    };

    ResolvedAddress {
        order: row.order,
        query: row.query.clone(),
        municipality: record.municipality.clone(),
        postcode: record.postcode.clone(),
        street_nominative: record.street_nominative.clone(),
        street_dative: record.street_dative.clone(),
        house_nr: record.house_nr.clone(),
        special_name: record.special_name.clone().unwrap_or_default(),
        coordinates: record.coordinates(),
    }
}
