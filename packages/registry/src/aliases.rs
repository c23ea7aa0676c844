//! Administrative alias map.
//!
//! Several municipalities have merged over the years, and people still
//! write the name of the merged unit (e.g. `"Fjarðabyggð"`) instead of the
//! town the address belongs to. The built-in aliases are embedded from
//! `aliases.toml` at compile time; callers may add their own on top via
//! [`AdministrativeAliasMap::extend`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::RegistryError;

const ALIASES_TOML: &str = include_str!("../aliases.toml");

#[derive(Debug, Deserialize)]
struct AliasFile {
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
}

/// Maps an administrative unit name to the canonical municipality names
/// it may refer to, in the order they should be tried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdministrativeAliasMap {
    aliases: BTreeMap<String, Vec<String>>,
}

impl AdministrativeAliasMap {
    /// Returns the aliases embedded in the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `aliases.toml` is malformed (this is a
    /// compile-time guarantee since the file is embedded).
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_toml(ALIASES_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded aliases.toml: {e}"))
    }

    /// Parses an alias map from a TOML document with an `[aliases]` table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Toml`] if the document is not valid TOML
    /// or has the wrong shape.
    pub fn from_toml(toml_str: &str) -> Result<Self, RegistryError> {
        let file: AliasFile = toml::from_str(toml_str)?;
        Ok(Self {
            aliases: file.aliases,
        })
    }

    /// Adds or replaces aliases.
    pub fn extend(&mut self, aliases: impl IntoIterator<Item = (String, Vec<String>)>) {
        self.aliases.extend(aliases);
    }

    /// Returns the canonical municipalities for an alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.aliases.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.aliases
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for AdministrativeAliasMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            aliases: iter.into_iter().collect(),
        }
    }
}
