/*!
 * Transliteration engine.
 *
 * The engine owns a per-locale table cache and two ordered filter chains:
 * table filters run after the cached table is fetched (and may rewrite the
 * mapping wholesale), string filters run after substitution and
 * normalization, tagged with the call-site context.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::normalize::{normalize_filename, normalize_slug};
use super::table::TransliterationTable;

/// Call-site context passed to string filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeContext {
    /// Post or term title being turned into a slug
    Title,
    /// Media file name
    FileName,
}

impl std::fmt::Display for SanitizeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::FileName => write!(f, "file_name"),
        }
    }
}

/// Filter applied to the table before substitution
pub type TableFilter = Box<dyn Fn(&mut TransliterationTable) + Send + Sync>;

/// Filter applied to the final sanitized string
pub type StringFilter = Box<dyn Fn(String, SanitizeContext) -> String + Send + Sync>;

/// Locale-aware transliteration engine with a process-lifetime table cache
pub struct TransliterationEngine {
    /// Built tables, keyed by locale string
    cache: Arc<RwLock<HashMap<String, Arc<TransliterationTable>>>>,

    /// Ordered filters run on a copy of the table before each substitution
    table_filters: Vec<TableFilter>,

    /// Ordered filters run on the sanitized output of each call
    string_filters: Vec<StringFilter>,
}

impl TransliterationEngine {
    /// Create a new engine with no filters registered
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            table_filters: Vec::new(),
            string_filters: Vec::new(),
        }
    }

    /// Register a table filter, appended to the chain
    pub fn with_table_filter(mut self, filter: TableFilter) -> Self {
        self.table_filters.push(filter);
        self
    }

    /// Register a string filter, appended to the chain
    pub fn with_string_filter(mut self, filter: StringFilter) -> Self {
        self.string_filters.push(filter);
        self
    }

    /// Transliterate `input` using the table for `locale`.
    ///
    /// Unmapped characters are handed to a best-effort Unicode folding
    /// pass; anything folding cannot resolve passes through unchanged.
    /// Referentially transparent for a fixed locale and filter chain.
    pub fn transliterate(&self, locale: &str, input: &str) -> String {
        if input.is_empty() {
            return String::new();
        }

        let table = self.table_for(locale);

        let substituted = if self.table_filters.is_empty() {
            table.apply(input)
        } else {
            // Filters see a fresh copy per call; the cached table stays pristine.
            let mut call_table = (*table).clone();
            for filter in &self.table_filters {
                filter(&mut call_table);
            }
            call_table.apply(input)
        };

        fold_to_ascii(&substituted)
    }

    /// Sanitize a title into a slug: transliterate, normalize, then run
    /// the string filter chain with the title context.
    pub fn sanitize_title(&self, locale: &str, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let slug = normalize_slug(&self.transliterate(locale, raw));
        self.run_string_filters(slug, SanitizeContext::Title)
    }

    /// Sanitize a file name: transliterate, normalize keeping extension
    /// dots, then run the string filter chain with the file name context.
    pub fn sanitize_file_name(&self, locale: &str, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let name = normalize_filename(&self.transliterate(locale, raw));
        self.run_string_filters(name, SanitizeContext::FileName)
    }

    /// Fetch the cached table for a locale, building it on first use
    fn table_for(&self, locale: &str) -> Arc<TransliterationTable> {
        if let Some(table) = self.cache.read().get(locale) {
            return table.clone();
        }

        let mut cache = self.cache.write();

        // Another caller may have built it between the read and write lock.
        if let Some(table) = cache.get(locale) {
            return table.clone();
        }

        debug!("Building transliteration table for locale '{}'", locale);
        let table = Arc::new(TransliterationTable::build(locale));
        cache.insert(locale.to_string(), table.clone());
        table
    }

    fn run_string_filters(&self, mut value: String, context: SanitizeContext) -> String {
        for filter in &self.string_filters {
            value = filter(value, context);
        }
        value
    }

    /// Number of locales with a built table
    pub fn cached_locales(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for TransliterationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort fold of remaining non-ASCII characters: NFD decomposition
/// with combining marks dropped. Characters that do not decompose to ASCII
/// pass through; an empty fold result retains the pre-fold value.
fn fold_to_ascii(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let folded: String = value.nfd().filter(|ch| !is_combining_mark(*ch)).collect();

    if folded.is_empty() && !value.is_empty() {
        return value.to_string();
    }

    folded
}
