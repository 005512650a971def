/*!
 * Locale-aware transliteration table.
 *
 * The table maps single source characters (Cyrillic family and Georgian)
 * to ASCII replacement strings. A base table is built once per locale and
 * adjusted with locale overrides; callers can further modify the table
 * through the engine's filter hook before it is applied.
 */

use isolang::Language;
use std::collections::HashMap;

/// ISO-9-like Cyrillic table, covering Russian, Ukrainian, Belarusian,
/// Serbian and Macedonian letters. Soft and hard signs map to nothing.
const ISO9_TABLE: &[(char, &str)] = &[
    ('А', "A"),
    ('Б', "B"),
    ('В', "V"),
    ('Г', "G"),
    ('Ѓ', "G"),
    ('Ґ', "G"),
    ('Д', "D"),
    ('Е', "E"),
    ('Ё', "YO"),
    ('Є', "YE"),
    ('Ж', "ZH"),
    ('З', "Z"),
    ('Ѕ', "Z"),
    ('И', "I"),
    ('Й', "J"),
    ('Ј', "J"),
    ('І', "I"),
    ('Ї', "YI"),
    ('К', "K"),
    ('Ќ', "K"),
    ('Л', "L"),
    ('Љ', "L"),
    ('М', "M"),
    ('Н', "N"),
    ('Њ', "N"),
    ('О', "O"),
    ('П', "P"),
    ('Р', "R"),
    ('С', "S"),
    ('Т', "T"),
    ('У', "U"),
    ('Ў', "U"),
    ('Ф', "F"),
    ('Х', "H"),
    ('Ц', "TS"),
    ('Ч', "CH"),
    ('Џ', "DH"),
    ('Ш', "SH"),
    ('Щ', "SHH"),
    ('Ъ', ""),
    ('Ы', "Y"),
    ('Ь', ""),
    ('Э', "E"),
    ('Ю', "YU"),
    ('Я', "YA"),
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('ѓ', "g"),
    ('ґ', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('є', "ye"),
    ('ж', "zh"),
    ('з', "z"),
    ('ѕ', "z"),
    ('и', "i"),
    ('й', "j"),
    ('ј', "j"),
    ('і', "i"),
    ('ї', "yi"),
    ('к', "k"),
    ('ќ', "k"),
    ('л', "l"),
    ('љ', "l"),
    ('м', "m"),
    ('н', "n"),
    ('њ', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ў', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('џ', "dh"),
    ('ш', "sh"),
    ('щ', "shh"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
];

/// Georgian alphabet (mkhedruli) to Latin digraphs
const GEO2LAT_TABLE: &[(char, &str)] = &[
    ('ა', "a"),
    ('ბ', "b"),
    ('გ', "g"),
    ('დ', "d"),
    ('ე', "e"),
    ('ვ', "v"),
    ('ზ', "z"),
    ('თ', "th"),
    ('ი', "i"),
    ('კ', "k"),
    ('ლ', "l"),
    ('მ', "m"),
    ('ნ', "n"),
    ('ო', "o"),
    ('პ', "p"),
    ('ჟ', "zh"),
    ('რ', "r"),
    ('ს', "s"),
    ('ტ', "t"),
    ('უ', "u"),
    ('ფ', "ph"),
    ('ქ', "q"),
    ('ღ', "gh"),
    ('ყ', "qh"),
    ('შ', "sh"),
    ('ჩ', "ch"),
    ('ც', "ts"),
    ('ძ', "dz"),
    ('წ', "ts"),
    ('ჭ', "tch"),
    ('ხ', "kh"),
    ('ჯ', "j"),
    ('ჰ', "h"),
];

/// Character-to-replacement mapping for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransliterationTable {
    /// Mapping entries; keys are single characters so multi-byte input
    /// is always matched atomically
    entries: HashMap<char, String>,
}

impl TransliterationTable {
    /// Build the table for a locale.
    ///
    /// Deterministic and side-effect free: two calls with the same locale
    /// yield identical tables. Unrecognized locales receive the unmodified
    /// base table.
    pub fn build(locale: &str) -> Self {
        let mut entries: HashMap<char, String> =
            HashMap::with_capacity(ISO9_TABLE.len() + GEO2LAT_TABLE.len());

        for (key, value) in ISO9_TABLE.iter().chain(GEO2LAT_TABLE.iter()) {
            entries.insert(*key, (*value).to_string());
        }

        let mut table = Self { entries };
        table.apply_locale_overrides(locale);
        table
    }

    /// Locale adjustments. Overrides replace base entries but never remove
    /// them.
    fn apply_locale_overrides(&mut self, locale: &str) {
        match primary_language(locale) {
            Some(Language::Bul) => {
                self.set('Щ', "SHT");
                self.set('щ', "sht");
                self.set('Ъ', "A");
                self.set('ъ', "a");
            }
            Some(Language::Ukr) => {
                self.set('И', "Y");
                self.set('и', "y");
            }
            _ => {}
        }
    }

    /// Look up the replacement for a character
    pub fn get(&self, key: char) -> Option<&str> {
        self.entries.get(&key).map(|s| s.as_str())
    }

    /// Insert or replace a mapping entry
    pub fn set(&mut self, key: char, replacement: &str) {
        self.entries.insert(key, replacement.to_string());
    }

    /// Remove a mapping entry, returning the previous replacement if any
    pub fn unset(&mut self, key: char) -> Option<String> {
        self.entries.remove(&key)
    }

    /// Number of mapping entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitute every mapped character in `input` with its replacement.
    ///
    /// Unmapped characters pass through unchanged.
    pub fn apply(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());

        for ch in input.chars() {
            match self.entries.get(&ch) {
                Some(replacement) => output.push_str(replacement),
                None => output.push(ch),
            }
        }

        output
    }
}

/// Resolve the primary language subtag of a locale identifier
/// (e.g. "bg_BG" -> Bulgarian, "uk" -> Ukrainian).
fn primary_language(locale: &str) -> Option<Language> {
    let subtag = locale
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if subtag.len() != 2 {
        return None;
    }

    Language::from_639_1(&subtag)
}
