//! Table-aware address parser.
//!
//! Unlike the [`tokenize`](crate::tokenize) scanner this parser knows the
//! vocabulary of the canonical table: every street name, house number,
//! postcode and municipality. Each word is checked against those sets and
//! the first match of each kind wins. Once all words are seen the parser
//! tries to fill in a missing postcode from the municipality and street.

use std::collections::HashSet;

use stadfang_registry::{
    AdministrativeAliasMap, CandidateKey, CanonicalTable, MunicipalityStreetToPostcode, postcodes,
};

use crate::tokenize::strip_punctuation;

/// Municipality that the registry splits in two; its Álftanes part is
/// tried when a street is not found in the main one.
const GARDABAER: &str = "Garðabær";
const GARDABAER_ALFTANES: &str = "Garðabær (Álftanes)";

/// Parses one address string into a [`CandidateKey`].
#[derive(Debug, Clone)]
pub struct VocabularyParser {
    streets: HashSet<String>,
    house_nrs: HashSet<String>,
    postcodes: HashSet<String>,
    municipalities: HashSet<String>,
    aliases: AdministrativeAliasMap,
    street_postcode: MunicipalityStreetToPostcode,
}

impl VocabularyParser {
    /// Collects the vocabulary of `table`.
    #[must_use]
    pub fn from_table(table: &CanonicalTable, aliases: AdministrativeAliasMap) -> Self {
        let mut streets = HashSet::new();
        let mut house_nrs = HashSet::new();
        let mut postcodes = HashSet::new();
        let mut municipalities = HashSet::new();

        for record in table {
            streets.insert(record.street_nominative.clone());
            house_nrs.insert(record.house_nr.clone());
            postcodes.insert(record.postcode.clone());
            municipalities.insert(record.municipality.clone());
        }

        log::debug!(
            "Vocabulary: {} streets, {} house numbers, {} postcodes, {} municipalities, {} aliases",
            streets.len(),
            house_nrs.len(),
            postcodes.len(),
            municipalities.len(),
            aliases.len(),
        );

        Self {
            streets,
            house_nrs,
            postcodes,
            municipalities,
            aliases,
            street_postcode: MunicipalityStreetToPostcode::build(table),
        }
    }

    /// Parses `text`. Fields that could not be recognized are left empty.
    #[must_use]
    pub fn parse(&self, text: &str) -> CandidateKey {
        let mut municipality = String::new();
        let mut postcode = String::new();
        let mut street = String::new();
        let mut house_nr = String::new();
        let mut admin_unit = "";

        for word in text.split_whitespace() {
            let token = strip_punctuation(word);

            if street.is_empty() && self.streets.contains(token) {
                street = token.to_string();
            }

            if house_nr.is_empty()
                && (self.house_nrs.contains(&token.to_uppercase()) || token.contains('-'))
            {
                house_nr = token.to_string();
            }

            if postcode.is_empty() && self.postcodes.contains(token) && token != house_nr {
                postcode = token.to_string();
                municipality = postcodes::municipality(token)
                    .unwrap_or_default()
                    .to_string();
            }

            if postcode.is_empty() && municipality.is_empty() && self.municipalities.contains(token)
            {
                municipality = token.to_string();
            }

            if municipality.is_empty() && self.aliases.contains(token) {
                admin_unit = token;
            }
        }

        if !admin_unit.is_empty()
            && !street.is_empty()
            && let Some((target, pc)) = self.resolve_alias(admin_unit, &street)
        {
            municipality = target.to_string();
            postcode = pc.to_string();
        }

        if !municipality.is_empty() && !street.is_empty() && postcode.is_empty() {
            if let Some(pc) = self.street_postcode.get(&municipality, &street) {
                postcode = pc.to_string();
            } else if municipality == GARDABAER {
                if let Some(pc) = self.street_postcode.get(GARDABAER_ALFTANES, &street) {
                    postcode = pc.to_string();
                    municipality = GARDABAER_ALFTANES.to_string();
                }
            }
        }

        // "1-3" is a range; the first number stands for it.
        if let Some((first, _)) = house_nr.split_once('-') {
            house_nr = first.to_string();
        }

        let key = CandidateKey {
            municipality,
            postcode,
            street,
            house_nr: house_nr.to_uppercase(),
        };
        log::trace!("Parsed {text:?} as {key:?}");
        key
    }

    /// Returns the first municipality covered by `admin_unit` that has
    /// `street`, together with the street's postcode.
    fn resolve_alias<'a>(&'a self, admin_unit: &str, street: &str) -> Option<(&'a str, &'a str)> {
        self.aliases.get(admin_unit)?.iter().find_map(|target| {
            self.street_postcode
                .get(target, street)
                .map(|pc| (target.as_str(), pc))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stadfang_registry::fixtures::sample_table;

    fn parser() -> VocabularyParser {
        VocabularyParser::from_table(&sample_table(), AdministrativeAliasMap::builtin())
    }

    fn key(municipality: &str, postcode: &str, street: &str, house_nr: &str) -> CandidateKey {
        CandidateKey::new(municipality, postcode, street, house_nr)
    }

    #[test]
    fn full_address() {
        assert_eq!(
            parser().parse("Laugavegur 22, 101 Reykjavík"),
            key("Reykjavík", "101", "Laugavegur", "22")
        );
    }

    #[test]
    fn street_and_number_only() {
        assert_eq!(
            parser().parse("Funafold 95"),
            key("", "", "Funafold", "95")
        );
    }

    #[test]
    fn postcode_sets_municipality() {
        assert_eq!(
            parser().parse("Funafold 95, 112"),
            key("Reykjavík", "112", "Funafold", "95")
        );
    }

    #[test]
    fn municipality_and_street_give_postcode() {
        assert_eq!(
            parser().parse("Bjarmastígur 13, Akureyri"),
            key("Akureyri", "600", "Bjarmastígur", "13")
        );
    }

    #[test]
    fn alias_resolves_to_covered_municipality() {
        assert_eq!(
            parser().parse("Lindarbraut 25, Seltjarnarnesbær"),
            key("Seltjarnarnes", "170", "Lindarbraut", "25")
        );
        assert_eq!(
            parser().parse("Gilsbakki 4, Fjarðabyggð"),
            key("Neskaupstaður", "740", "Gilsbakki", "4")
        );
    }

    #[test]
    fn alias_skips_municipalities_without_the_street() {
        // Neskaupstaður is listed first for Fjarðabyggð but has no Strandgata.
        assert_eq!(
            parser().parse("Strandgata 12, Fjarðabyggð"),
            key("Eskifjörður", "735", "Strandgata", "12")
        );
    }

    #[test]
    fn gardabaer_falls_back_to_alftanes() {
        assert_eq!(
            parser().parse("Suðurtún 5, Garðabær"),
            key("Garðabær (Álftanes)", "225", "Suðurtún", "5")
        );
    }

    #[test]
    fn range_keeps_first_number() {
        assert_eq!(
            parser().parse("Tjarnarflöt 1-2, Garðabær"),
            key("Garðabær", "210", "Tjarnarflöt", "1")
        );
    }

    #[test]
    fn house_letter_is_uppercased() {
        assert_eq!(
            parser().parse("Þórsgata 5a, 101 Reykjavík"),
            key("Reykjavík", "101", "Þórsgata", "5A")
        );
    }

    #[test]
    fn unknown_text_is_all_unknown() {
        assert_eq!(parser().parse("Heimilisfang vantar"), CandidateKey::default());
        assert_eq!(parser().parse(""), CandidateKey::default());
    }

    #[test]
    fn house_number_is_not_reused_as_postcode() {
        let parser = VocabularyParser::from_table(
            &stadfang_registry::CanonicalTable::from_records(vec![
                stadfang_registry::AddressRecord {
                    municipality: "Reykjavík".to_string(),
                    postcode: "101".to_string(),
                    street_nominative: "Laugavegur".to_string(),
                    street_dative: "Laugavegi".to_string(),
                    house_nr: "101".to_string(),
                    special_name: None,
                    lat: Some(64.14),
                    lon: Some(-21.92),
                },
            ]),
            AdministrativeAliasMap::default(),
        );
        assert_eq!(
            parser.parse("Laugavegur 101"),
            key("", "", "Laugavegur", "101")
        );
    }
}
