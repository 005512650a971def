/*!
 * Transliteration of Cyrillic and Georgian text into ASCII-safe Latin.
 *
 * This module contains the deterministic text-transform pipeline. It is
 * split into several submodules:
 *
 * - `table`: Base character table and locale overrides
 * - `engine`: Table cache, filter hooks and the substitution/folding pass
 * - `normalize`: Slug and file-name output policies
 */

// Re-export main types for easier usage
pub use self::engine::{SanitizeContext, StringFilter, TableFilter, TransliterationEngine};
pub use self::normalize::{normalize_filename, normalize_slug};
pub use self::table::TransliterationTable;

// Submodules
pub mod engine;
pub mod normalize;
pub mod table;
