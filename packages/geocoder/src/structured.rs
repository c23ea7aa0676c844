//! Structured (already split) address queries.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Deserializer, de};
use stadfang_registry::{AddressKey, CanonicalTable, QueryRow, postcodes};

/// An address given as separate fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StructuredQuery {
    /// Postcode; numbers are accepted and converted to text.
    #[serde(deserialize_with = "string_or_number")]
    pub postcode: String,
    /// Street name in either grammatical case.
    #[serde(alias = "street_nominative")]
    pub street: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub house_nr: String,
    /// Derived from the postcode when absent.
    #[serde(default)]
    pub municipality: Option<String>,
}

impl StructuredQuery {
    #[must_use]
    pub fn new(
        postcode: impl Into<String>,
        street: impl Into<String>,
        house_nr: impl Into<String>,
    ) -> Self {
        Self {
            postcode: postcode.into(),
            street: street.into(),
            house_nr: house_nr.into(),
            municipality: None,
        }
    }

    #[must_use]
    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }
}

/// Maps dative street names to their nominative form.
#[derive(Debug, Clone, Default)]
pub struct StreetForms {
    dative_to_nominative: HashMap<String, String>,
    nominative: HashSet<String>,
}

impl StreetForms {
    #[must_use]
    pub fn build(table: &CanonicalTable) -> Self {
        let mut forms = Self::default();
        for record in table {
            forms
                .dative_to_nominative
                .insert(record.street_dative.clone(), record.street_nominative.clone());
            forms.nominative.insert(record.street_nominative.clone());
        }
        forms
    }

    /// Returns the nominative form of `street`. Known nominative names and
    /// unknown names are returned as given.
    #[must_use]
    pub fn nominative<'a>(&'a self, street: &'a str) -> &'a str {
        if self.nominative.contains(street) {
            return street;
        }
        self.dative_to_nominative
            .get(street)
            .map_or(street, String::as_str)
    }

    /// Normalizes `query` into a candidate key.
    #[must_use]
    pub fn to_key(&self, query: &StructuredQuery) -> AddressKey {
        let postcode = query.postcode.trim();
        let municipality = match query.municipality.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => postcodes::municipality(postcode).unwrap_or_default(),
        };

        AddressKey::new(
            municipality,
            postcode,
            self.nominative(query.street.trim()),
            query.house_nr.trim().to_uppercase(),
        )
    }

    /// Builds query rows in input order. Rows with the same key share an
    /// identity.
    #[must_use]
    pub fn to_rows(&self, queries: &[StructuredQuery]) -> Vec<QueryRow> {
        let mut identities: HashMap<AddressKey, usize> = HashMap::new();

        queries
            .iter()
            .enumerate()
            .map(|(order, query)| {
                let key = self.to_key(query);
                let next = identities.len();
                let identity = *identities.entry(key.clone()).or_insert(next);
                QueryRow {
                    key,
                    order,
                    identity,
                    query: None,
                }
            })
            .collect()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl de::Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stadfang_registry::fixtures::sample_table;

    #[test]
    fn dative_street_becomes_nominative() {
        let forms = StreetForms::build(&sample_table());
        assert_eq!(forms.nominative("Laugavegi"), "Laugavegur");
        assert_eq!(forms.nominative("Laugavegur"), "Laugavegur");
        assert_eq!(forms.nominative("Engingata"), "Engingata");
    }

    #[test]
    fn municipality_is_derived_from_postcode() {
        let forms = StreetForms::build(&sample_table());
        let key = forms.to_key(&StructuredQuery::new("101", "Þórsgötu", "5a"));
        assert_eq!(key, AddressKey::new("Reykjavík", "101", "Þórsgata", "5A"));
    }

    #[test]
    fn explicit_municipality_is_kept() {
        let forms = StreetForms::build(&sample_table());
        let query = StructuredQuery::new("225", "Suðurtún", "5").with_municipality("Garðabær");
        assert_eq!(forms.to_key(&query).municipality, "Garðabær");
    }

    #[test]
    fn identical_keys_share_identity() {
        let forms = StreetForms::build(&sample_table());
        let rows = forms.to_rows(&[
            StructuredQuery::new("101", "Laugavegur", "22"),
            StructuredQuery::new("112", "Funafold", "95"),
            StructuredQuery::new("101", "Laugavegi", "22"),
        ]);
        let identities: Vec<usize> = rows.iter().map(|r| r.identity).collect();
        assert_eq!(identities, [0, 1, 0]);
        let orders: Vec<usize> = rows.iter().map(|r| r.order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn deserializes_numeric_postcode_and_street_alias() {
        let query: StructuredQuery = serde_json::from_str(
            r#"{"postcode": 101, "street_nominative": "Laugavegur", "house_nr": 22}"#,
        )
        .unwrap();
        assert_eq!(query, StructuredQuery::new("101", "Laugavegur", "22"));
    }
}
