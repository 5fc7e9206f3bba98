//! Translation-table specialization
//!
//! The mapping export treats every worksheet as a three-column table: the
//! language code, the key phrase and the translated phrase. Keys compare
//! case-insensitively on both fields while the originally extracted casing
//! stays available for display.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::error::Result;
use crate::walker::RecordSink;

/// Mapping from [`LngKey`] to translated phrase.
///
/// Backed by an ordered map so iteration follows document order; inserting a
/// duplicate key overwrites the value in place (last write wins).
pub type TranslationMap = IndexMap<LngKey, String>;

/// Composite (language, phrase) key with case-insensitive identity.
///
/// Equality and hashing normalize both fields to uppercase, so lookups do
/// not depend on how the workbook cased its entries. The normalization is
/// Unicode uppercasing, independent of any ambient locale.
///
/// # Example
///
/// ```
/// use sheetsource::LngKey;
///
/// assert_eq!(LngKey::new("EN", "Greeting"), LngKey::new("en", "GREETING"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LngKey {
    language: String,
    phrase: String,
}

impl LngKey {
    /// Create a key; original casing is preserved in the stored fields.
    pub fn new(language: impl Into<String>, phrase: impl Into<String>) -> Self {
        LngKey {
            language: language.into(),
            phrase: phrase.into(),
        }
    }

    /// The language code, as extracted.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The key phrase, as extracted.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_uppercase)
        .eq(b.chars().flat_map(char::to_uppercase))
}

impl PartialEq for LngKey {
    fn eq(&self, other: &Self) -> bool {
        eq_fold(&self.language, &other.language) && eq_fold(&self.phrase, &other.phrase)
    }
}

impl Eq for LngKey {}

impl Hash for LngKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.language.chars().flat_map(char::to_uppercase) {
            state.write_u32(c as u32);
        }
        // Field separator so ("ab", "c") and ("a", "bc") hash apart.
        state.write_u32(0);
        for c in self.phrase.chars().flat_map(char::to_uppercase) {
            state.write_u32(c as u32);
        }
    }
}

/// Accumulator for translation rows: the first three cells, positionally.
///
/// Column labels are ignored on purpose; sparse rows still map their first,
/// second and third delivered cells to language, phrase and translation.
#[derive(Debug, Default)]
pub(crate) struct TranslationRow {
    fields: [Option<String>; 3],
    seen: usize,
}

impl TranslationRow {
    /// The (language, phrase, translation) triple, when all three arrived.
    pub(crate) fn into_triple(self) -> Option<(String, String, String)> {
        let [language, phrase, translation] = self.fields;
        Some((language?, phrase?, translation?))
    }
}

impl RecordSink for TranslationRow {
    fn set(&mut self, _column: &str, value: String) -> Result<()> {
        if self.seen < 3 {
            self.fields[self.seen] = Some(value);
        }
        self.seen += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &LngKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_keys_compare_case_insensitively() {
        let a = LngKey::new("en", "greeting");
        let b = LngKey::new("EN", "Greeting");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_different_keys_differ() {
        assert_ne!(LngKey::new("en", "greeting"), LngKey::new("de", "greeting"));
        assert_ne!(LngKey::new("en", "greeting"), LngKey::new("en", "farewell"));
        // Field boundaries matter.
        assert_ne!(LngKey::new("ab", "c"), LngKey::new("a", "bc"));
    }

    #[test]
    fn test_original_casing_is_preserved() {
        let key = LngKey::new("En", "GrEeting");
        assert_eq!(key.language(), "En");
        assert_eq!(key.phrase(), "GrEeting");
    }

    #[test]
    fn test_map_lookup_ignores_case() {
        let mut map = TranslationMap::new();
        map.insert(LngKey::new("en", "greeting"), "Hello".to_string());
        assert_eq!(
            map.get(&LngKey::new("EN", "GREETING")).map(String::as_str),
            Some("Hello")
        );
    }

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let mut map = TranslationMap::new();
        map.insert(LngKey::new("en", "greeting"), "Hi".to_string());
        map.insert(LngKey::new("EN", "Greeting"), "Hello".to_string());
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(&LngKey::new("en", "greeting")).map(String::as_str),
            Some("Hello")
        );
    }

    #[test]
    fn test_translation_row_is_positional() {
        let mut row = TranslationRow::default();
        row.set("B", "en".to_string()).unwrap();
        row.set("C", "greeting".to_string()).unwrap();
        row.set("D", "Hello".to_string()).unwrap();
        assert_eq!(
            row.into_triple(),
            Some(("en".to_string(), "greeting".to_string(), "Hello".to_string()))
        );
    }

    #[test]
    fn test_short_row_yields_no_triple() {
        let mut row = TranslationRow::default();
        row.set("A", "en".to_string()).unwrap();
        row.set("B", "greeting".to_string()).unwrap();
        assert_eq!(row.into_triple(), None);
    }
}
