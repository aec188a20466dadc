//! Abbreviation store consulted by the citation processor.
//!
//! Abbreviations are kept per jurisdiction and, inside a jurisdiction, per
//! category. Every jurisdiction record carries every category of
//! [`AbbreviationCategory::ALL`], so lookups never have to distinguish "no such
//! category" from "no such key".
//!
//! The store is reset before every render call. Instead of handing the
//! processor a shared object that has to be cleared in place, the store keeps a
//! generation counter that moves on each reset; the processor reads through
//! the store on every lookup and may use the generation to drop anything it
//! cached from an earlier call.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Jurisdiction used when an abbreviation set names none.
pub const DEFAULT_JURISDICTION: &str = "default";

/// The fixed universe of abbreviation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbbreviationCategory {
    ContainerTitle,
    CollectionTitle,
    InstitutionEntire,
    InstitutionPart,
    Nickname,
    Number,
    Title,
    Place,
    Hereinafter,
    Classic,
    ContainerPhrase,
    TitlePhrase,
}

impl AbbreviationCategory {
    pub const ALL: [AbbreviationCategory; 12] = [
        AbbreviationCategory::ContainerTitle,
        AbbreviationCategory::CollectionTitle,
        AbbreviationCategory::InstitutionEntire,
        AbbreviationCategory::InstitutionPart,
        AbbreviationCategory::Nickname,
        AbbreviationCategory::Number,
        AbbreviationCategory::Title,
        AbbreviationCategory::Place,
        AbbreviationCategory::Hereinafter,
        AbbreviationCategory::Classic,
        AbbreviationCategory::ContainerPhrase,
        AbbreviationCategory::TitlePhrase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbbreviationCategory::ContainerTitle => "container-title",
            AbbreviationCategory::CollectionTitle => "collection-title",
            AbbreviationCategory::InstitutionEntire => "institution-entire",
            AbbreviationCategory::InstitutionPart => "institution-part",
            AbbreviationCategory::Nickname => "nickname",
            AbbreviationCategory::Number => "number",
            AbbreviationCategory::Title => "title",
            AbbreviationCategory::Place => "place",
            AbbreviationCategory::Hereinafter => "hereinafter",
            AbbreviationCategory::Classic => "classic",
            AbbreviationCategory::ContainerPhrase => "container-phrase",
            AbbreviationCategory::TitlePhrase => "title-phrase",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AbbreviationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One abbreviation configuration entry of a test case.
///
/// ```yaml
/// abbreviations:
///   - jurisdiction: us
///     container-title:
///       "Federal Reporter": "F."
/// ```
///
/// Keys and values are taken as raw text, so `number: {1: "No. 1"}` is read
/// as the string key `"1"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, serde_yaml::Value>")]
pub struct AbbreviationSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(flatten)]
    pub categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl AbbreviationSet {
    pub fn jurisdiction(&self) -> &str {
        self.jurisdiction.as_deref().unwrap_or(DEFAULT_JURISDICTION)
    }
}

impl TryFrom<BTreeMap<String, serde_yaml::Value>> for AbbreviationSet {
    type Error = String;

    fn try_from(mut raw: BTreeMap<String, serde_yaml::Value>) -> Result<Self, Self::Error> {
        let jurisdiction = match raw.remove("jurisdiction") {
            None | Some(serde_yaml::Value::Null) => None,
            Some(value) => Some(
                scalar_text(&value).ok_or_else(|| "jurisdiction must be a scalar".to_string())?,
            ),
        };
        let mut categories = BTreeMap::new();
        for (name, value) in raw {
            let serde_yaml::Value::Mapping(mapping) = value else {
                return Err(format!("abbreviation category '{}' must be a mapping", name));
            };
            let mut entries = BTreeMap::new();
            for (key, value) in &mapping {
                match (scalar_text(key), scalar_text(value)) {
                    (Some(key), Some(value)) => {
                        entries.insert(key, value);
                    }
                    _ => {
                        return Err(format!(
                            "abbreviation entries in '{}' must be scalar pairs",
                            name
                        ))
                    }
                }
            }
            categories.insert(name, entries);
        }
        Ok(Self {
            jurisdiction,
            categories,
        })
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalizes an abbreviation key before storage and lookup.
pub type KeyNormalizer = fn(&str) -> String;

/// Default key normalization: periods dropped, whitespace collapsed, lowercased.
///
/// `"U.S."`, `"US"` and `" u.s. "` all normalize to `"us"`.
pub fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(|word| word.replace('.', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

type CategoryMap = HashMap<String, String>;

/// Fixed-shape record: one map per category.
#[derive(Debug, Clone, Default)]
struct JurisdictionRecord {
    categories: [CategoryMap; 12],
}

impl JurisdictionRecord {
    fn category(&self, category: AbbreviationCategory) -> &CategoryMap {
        &self.categories[category.slot()]
    }

    fn category_mut(&mut self, category: AbbreviationCategory) -> &mut CategoryMap {
        &mut self.categories[category.slot()]
    }
}

#[derive(Debug, Clone)]
pub struct AbbreviationStore {
    jurisdictions: BTreeMap<String, JurisdictionRecord>,
    generation: u64,
    normalizer: KeyNormalizer,
}

impl Default for AbbreviationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AbbreviationStore {
    pub fn new() -> Self {
        Self::with_normalizer(normalize_key)
    }

    pub fn with_normalizer(normalizer: KeyNormalizer) -> Self {
        let mut store = Self {
            jurisdictions: BTreeMap::new(),
            generation: 0,
            normalizer,
        };
        store.reset();
        store
    }

    /// Drops every jurisdiction and seeds `default` with empty categories.
    pub fn reset(&mut self) {
        self.jurisdictions.clear();
        self.jurisdictions
            .insert(DEFAULT_JURISDICTION.to_string(), JurisdictionRecord::default());
        self.generation += 1;
    }

    /// Resets the store, then applies the given sets in order.
    ///
    /// Called once per render call; `None` still resets.
    pub fn configure(&mut self, sets: Option<&[AbbreviationSet]>) {
        self.reset();
        if let Some(sets) = sets {
            self.apply(sets);
        }
    }

    /// Adds the entries of each set. Later sets win on key collisions.
    pub fn apply(&mut self, sets: &[AbbreviationSet]) {
        for set in sets {
            let jurisdiction = set.jurisdiction();
            self.record_mut(jurisdiction);
            for category in AbbreviationCategory::ALL {
                let Some(entries) = set.categories.get(category.as_str()) else {
                    continue;
                };
                for (key, value) in entries {
                    self.add(jurisdiction, category, key, value);
                }
            }
            for name in set.categories.keys() {
                if AbbreviationCategory::from_name(name).is_none() {
                    warn!(jurisdiction, category = %name, "ignoring unknown abbreviation category");
                }
            }
        }
    }

    pub fn add(
        &mut self,
        jurisdiction: &str,
        category: AbbreviationCategory,
        key: &str,
        value: &str,
    ) {
        let key = (self.normalizer)(key);
        self.record_mut(jurisdiction)
            .category_mut(category)
            .insert(key, value.to_string());
    }

    pub fn get(
        &self,
        jurisdiction: &str,
        category: AbbreviationCategory,
        key: &str,
    ) -> Option<&str> {
        let key = (self.normalizer)(key);
        self.jurisdictions
            .get(jurisdiction)?
            .category(category)
            .get(&key)
            .map(String::as_str)
    }

    /// Changes on every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn jurisdictions(&self) -> impl Iterator<Item = &str> {
        self.jurisdictions.keys().map(String::as_str)
    }

    /// Entries of one category; `None` only when the jurisdiction is unknown.
    pub fn entries(
        &self,
        jurisdiction: &str,
        category: AbbreviationCategory,
    ) -> Option<&HashMap<String, String>> {
        self.jurisdictions
            .get(jurisdiction)
            .map(|record| record.category(category))
    }

    fn record_mut(&mut self, jurisdiction: &str) -> &mut JurisdictionRecord {
        self.jurisdictions
            .entry(jurisdiction.to_string())
            .or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(jurisdiction: Option<&str>, category: &str, key: &str, value: &str) -> AbbreviationSet {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value.to_string());
        let mut categories = BTreeMap::new();
        categories.insert(category.to_string(), entries);
        AbbreviationSet {
            jurisdiction: jurisdiction.map(str::to_string),
            categories,
        }
    }

    #[test]
    fn test_new_store_has_only_default() {
        let store = AbbreviationStore::new();
        assert_eq!(store.jurisdictions().collect::<Vec<_>>(), vec!["default"]);
        for category in AbbreviationCategory::ALL {
            assert!(store.entries("default", category).unwrap().is_empty());
        }
    }

    #[test]
    fn test_reset_clears_prior_jurisdictions() {
        let mut store = AbbreviationStore::new();
        store.add("us", AbbreviationCategory::Place, "New York", "N.Y.");
        store.add("default", AbbreviationCategory::Title, "Journal", "J.");
        let before = store.generation();

        store.reset();

        assert_eq!(store.jurisdictions().collect::<Vec<_>>(), vec!["default"]);
        assert_eq!(store.get("us", AbbreviationCategory::Place, "New York"), None);
        assert_eq!(store.get("default", AbbreviationCategory::Title, "Journal"), None);
        assert!(store.generation() > before);
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let store = AbbreviationStore::new();
        assert_eq!(store.get("jp", AbbreviationCategory::Nickname, "x"), None);
        assert_eq!(store.get("default", AbbreviationCategory::Nickname, "x"), None);
    }

    #[test]
    fn test_keys_are_normalized() {
        let mut store = AbbreviationStore::new();
        store.add("us", AbbreviationCategory::Place, "U.S.", "United States");
        assert_eq!(
            store.get("us", AbbreviationCategory::Place, "US"),
            Some("United States")
        );
        assert_eq!(
            store.get("us", AbbreviationCategory::Place, "  u.s. "),
            Some("United States")
        );
    }

    #[test]
    fn test_injected_normalizer() {
        fn exact(key: &str) -> String {
            key.to_string()
        }
        let mut store = AbbreviationStore::with_normalizer(exact);
        store.add("default", AbbreviationCategory::Title, "U.S.", "x");
        assert_eq!(store.get("default", AbbreviationCategory::Title, "US"), None);
        assert_eq!(store.get("default", AbbreviationCategory::Title, "U.S."), Some("x"));
    }

    #[test]
    fn test_apply_fills_every_category() {
        let mut store = AbbreviationStore::new();
        store.configure(Some(&[set(
            Some("us:ca"),
            "container-title",
            "California Reporter",
            "Cal. Rptr.",
        )]));

        assert_eq!(
            store.get("us:ca", AbbreviationCategory::ContainerTitle, "California Reporter"),
            Some("Cal. Rptr.")
        );
        for category in AbbreviationCategory::ALL {
            assert!(store.entries("us:ca", category).is_some());
        }
    }

    #[test]
    fn test_unknown_category_is_ignored() {
        let mut store = AbbreviationStore::new();
        store.configure(Some(&[set(None, "bogus", "a", "b")]));
        assert_eq!(store.jurisdictions().collect::<Vec<_>>(), vec!["default"]);
        for category in AbbreviationCategory::ALL {
            assert!(store.entries("default", category).unwrap().is_empty());
        }
    }

    #[test]
    fn test_configure_without_sets_still_resets() {
        let mut store = AbbreviationStore::new();
        store.configure(Some(&[set(None, "title", "Journal", "J.")]));
        assert_eq!(store.get("default", AbbreviationCategory::Title, "journal"), Some("J."));

        store.configure(None);
        assert_eq!(store.get("default", AbbreviationCategory::Title, "journal"), None);
    }

    #[test]
    fn test_set_deserializes_from_yaml() {
        let yaml = "jurisdiction: us\ncontainer-title:\n  Federal Reporter: F.\n";
        let parsed: AbbreviationSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.jurisdiction(), "us");
        assert_eq!(parsed.categories["container-title"]["Federal Reporter"], "F.");

        let bare: AbbreviationSet = serde_yaml::from_str("title:\n  A: B\n").unwrap();
        assert_eq!(bare.jurisdiction(), DEFAULT_JURISDICTION);
    }

    #[test]
    fn test_numeric_keys_and_values_are_text() {
        let yaml = "number:\n  1: \"No. 1\"\n  2: 20\n";
        let parsed: AbbreviationSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.categories["number"]["1"], "No. 1");
        assert_eq!(parsed.categories["number"]["2"], "20");

        let mut store = AbbreviationStore::new();
        store.configure(Some(&[parsed.clone()]));
        assert_eq!(store.get("default", AbbreviationCategory::Number, "1"), Some("No. 1"));

        let text = serde_yaml::to_string(&parsed).unwrap();
        let again: AbbreviationSet = serde_yaml::from_str(&text).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_non_mapping_category_is_rejected() {
        let err = serde_yaml::from_str::<AbbreviationSet>("title: [a, b]\n").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }
}
