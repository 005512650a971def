/*!
 * Durable progress record for the background slug conversion.
 *
 * The record is the only shared mutable state of the migration: read once
 * at tick start, written once at tick end, persisted as JSON at a
 * well-known option key. Offsets are monotonically non-decreasing; once
 * `finished` is set the record is never mutated again.
 */

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::ConversionError;
use crate::store::OptionStore;

/// Well-known option key the progress record is stored under
pub const PROGRESS_OPTION_KEY: &str = "cyrlatin_conversion_progress";

/// Lifecycle state of the conversion job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    /// No progress record has been persisted yet
    NotStarted,
    /// A record exists and the terms source has not been exhausted
    InProgress,
    /// The terms source returned an empty page; no further work happens
    Finished,
}

/// Durable cursor and counters for the migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Pagination cursor into the primary (posts) source
    pub posts_offset: u64,

    /// Pagination cursor into the secondary (terms) source
    pub terms_offset: u64,

    /// Posts actually rewritten (counter, not a cursor)
    pub done_posts: u64,

    /// Terms actually rewritten
    pub done_terms: u64,

    /// Records whose update was attempted but left unchanged (failed
    /// writes); lets operators detect stragglers, since offsets never
    /// revisit them
    #[serde(default)]
    pub attempted_unchanged: u64,

    /// Whether the migration has run to completion
    pub finished: bool,

    /// Unix timestamp of first activation
    pub started_at: i64,
}

impl ConversionProgress {
    /// Fresh record with all offsets and counters at zero
    pub fn new() -> Self {
        Self {
            posts_offset: 0,
            terms_offset: 0,
            done_posts: 0,
            done_terms: 0,
            attempted_unchanged: 0,
            finished: false,
            started_at: Utc::now().timestamp(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConversionState {
        if self.finished {
            ConversionState::Finished
        } else {
            ConversionState::InProgress
        }
    }

    /// Advance the posts cursor by one processed page
    pub fn advance_posts(&mut self, page_size: usize) {
        self.posts_offset += page_size as u64;
    }

    /// Advance the terms cursor by one processed page
    pub fn advance_terms(&mut self, page_size: usize) {
        self.terms_offset += page_size as u64;
    }

    /// Mark the migration complete
    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// Load the persisted record, if any.
    ///
    /// A record that fails to decode is treated as absent and logged; the
    /// migration restarts from scratch rather than wedging.
    pub async fn load(store: &dyn OptionStore) -> Result<Option<Self>, ConversionError> {
        let value = store.get_option(PROGRESS_OPTION_KEY).await?;

        match value {
            None => Ok(None),
            Some(value) => match serde_json::from_value::<Self>(value) {
                Ok(progress) => Ok(Some(progress)),
                Err(e) => {
                    warn!("Discarding undecodable conversion progress record: {}", e);
                    Ok(None)
                }
            },
        }
    }

    /// Persist the record at the well-known key
    pub async fn save(&self, store: &dyn OptionStore) -> Result<(), ConversionError> {
        let value = serde_json::to_value(self)
            .map_err(|e| ConversionError::CorruptProgress(e.to_string()))?;

        store.set_option(PROGRESS_OPTION_KEY, value).await?;
        Ok(())
    }

    /// Remove the persisted record (explicit reset only)
    pub async fn reset(store: &dyn OptionStore) -> Result<(), ConversionError> {
        store.delete_option(PROGRESS_OPTION_KEY).await?;
        Ok(())
    }
}

impl Default for ConversionProgress {
    fn default() -> Self {
        Self::new()
    }
}
