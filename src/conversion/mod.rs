/*!
 * Resumable background conversion of existing slugs.
 *
 * This module provides:
 * - Durable progress tracking with crash-safe cursors
 * - Bounded, cron-driven batch conversion of posts and terms
 * - Self-rearming scheduling until the sources are exhausted
 */

pub mod batch;
pub mod progress;

// Re-export main types
pub use batch::{BatchConverter, TickOutcome, CONVERSION_HOOK};
pub use progress::{ConversionProgress, ConversionState, PROGRESS_OPTION_KEY};
