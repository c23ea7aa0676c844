//! Free-text address scanner.
//!
//! Addresses are assumed to be written in the usual `"Street number,
//! postcode town"` order. Words are classified one at a time by shape
//! alone (no table lookups):
//!
//! 1. a word ending like a street name sets the street,
//! 2. a valid postcode sets the postcode,
//! 3. anything else sets the house number.
//!
//! As soon as a postcode has been seen, the collected fragments are
//! emitted as a [`Match`] and the state is cleared.

use std::str::SplitWhitespace;

use stadfang_registry::{Match, patterns};

/// Fragments collected since the last emitted match.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanState {
    postcode: Option<String>,
    street: Option<String>,
    house_nr: Option<String>,
}

impl ScanState {
    /// Classifies one word and returns a match if a postcode has been
    /// collected.
    pub fn push(&mut self, word: &str) -> Option<Match> {
        let token = strip_punctuation(word);

        if patterns::is_street(token) {
            self.street = Some(token.to_string());
        } else if patterns::is_postcode(token) {
            self.postcode = Some(token.to_string());
        } else if patterns::is_house_nr(token) {
            self.house_nr = Some(token.to_string());
        }

        if self.postcode.is_some() {
            let state = std::mem::take(self);
            return Some(Match {
                postcode: state.postcode,
                street: state.street,
                house_nr: state.house_nr,
            });
        }

        None
    }
}

/// Lazy iterator over the address matches in a text.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    words: SplitWhitespace<'a>,
    state: ScanState,
}

impl Iterator for Matches<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Self::Item> {
        for word in self.words.by_ref() {
            if let Some(m) = self.state.push(word) {
                return Some(m);
            }
        }
        None
    }
}

/// Scans `text` for address-shaped fragments, left to right.
#[must_use]
pub fn parse_text(text: &str) -> Matches<'_> {
    Matches {
        words: text.split_whitespace(),
        state: ScanState::default(),
    }
}

/// Strips surrounding commas and periods (`"22,"` → `"22"`).
pub(crate) fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c| c == ',' || c == '.')
}
