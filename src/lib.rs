/*!
 * # cyrlatin
 *
 * A Rust library that converts Cyrillic, European and Georgian characters
 * in slugs and file names to Latin, and runs a resumable background
 * migration that rewrites previously stored identifiers with the same
 * rule set.
 *
 * ## Features
 *
 * - Locale-aware transliteration table (ISO-9-like Cyrillic, Georgian
 *   mkhedruli) with Bulgarian and Ukrainian overrides
 * - Best-effort Unicode folding for characters outside the table
 * - Slug-safe and filename-safe normalization policies
 * - Filter hooks for the table and for sanitized output
 * - Cron-driven, idempotent, crash-safe batch conversion of existing
 *   post and term slugs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `transliteration`: The deterministic text-transform pipeline:
 *   - `transliteration::table`: Base table and locale overrides
 *   - `transliteration::engine`: Table cache, filters, substitution
 *   - `transliteration::normalize`: Slug and filename output policies
 * - `conversion`: The background migration:
 *   - `conversion::progress`: Durable cursor/counter record
 *   - `conversion::batch`: Per-tick orchestration
 * - `store`: Host seams (content store, option store, scheduler) with
 *   in-memory and SQLite implementations
 * - `errors`: Custom error types for the crate
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod conversion;
pub mod errors;
pub mod store;
pub mod transliteration;

// Re-export main types for easier usage
pub use app_config::{BatchContext, Config};
pub use conversion::{BatchConverter, ConversionProgress, ConversionState, TickOutcome};
pub use errors::{AppError, ConversionError, StoreError};
pub use transliteration::{
    normalize_filename, normalize_slug, SanitizeContext, TransliterationEngine,
    TransliterationTable,
};
