/*!
 * Interfaces to the host environment.
 *
 * The background conversion only touches the host through three seams:
 * the content/metadata store (posts and terms with their slugs), the
 * key-value option store (conversion progress), and the scheduled-task
 * runner. Each seam is a trait so hosts can plug in their own backends:
 *
 * - `memory`: In-memory implementations with failure injection, for tests
 * - `sqlite`: SQLite-backed reference implementation
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::StoreError;

/// Handle to a primary-kind (post) record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Stable record id; pagination orders by this ascending
    pub id: i64,
    /// Current slug
    pub slug: String,
}

/// Handle to a secondary-kind (taxonomy term) record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    /// Stable record id; pagination orders by this ascending
    pub id: i64,
    /// Taxonomy the term belongs to
    pub taxonomy: String,
    /// Current slug
    pub slug: String,
}

/// Host content/metadata store.
///
/// Page fetches must be ordered by id ascending so no record is skipped or
/// revisited across ticks while the underlying data is edited, as long as
/// records are not deleted from before the cursor.
#[async_trait]
pub trait ContentStore: Send + Sync + Debug {
    /// Fetch a bounded page of published posts starting at `offset`
    async fn fetch_posts(&self, limit: usize, offset: u64) -> Result<Vec<PostRecord>, StoreError>;

    /// Write a new slug for a post, running the host's own cache and hook
    /// invalidation
    async fn update_post_slug(&self, id: i64, new_slug: &str) -> Result<(), StoreError>;

    /// Persist the previous slug of a post so the host can serve redirects
    async fn record_old_post_slug(&self, id: i64, old_slug: &str) -> Result<(), StoreError>;

    /// Fetch a bounded page of terms starting at `offset`.
    ///
    /// A `StoreError::Recoverable` means the fetch should be retried on a
    /// later tick; an empty page means there are no terms at or past
    /// `offset`.
    async fn fetch_terms(&self, limit: usize, offset: u64) -> Result<Vec<TermRecord>, StoreError>;

    /// Write a new slug for a term
    async fn update_term_slug(
        &self,
        id: i64,
        taxonomy: &str,
        new_slug: &str,
    ) -> Result<(), StoreError>;
}

/// Host key-value persistence for durable crate state
#[async_trait]
pub trait OptionStore: Send + Sync + Debug {
    /// Read the value stored under `key`, if any
    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Remove the value stored under `key`
    async fn delete_option(&self, key: &str) -> Result<(), StoreError>;
}

/// Host scheduled-task runner
#[async_trait]
pub trait Scheduler: Send + Sync + Debug {
    /// Arm a one-shot invocation of `hook` after `delay`
    async fn schedule_once(&self, hook: &str, delay: Duration) -> Result<(), StoreError>;

    /// Whether an invocation of `hook` is currently armed
    async fn is_scheduled(&self, hook: &str) -> bool;

    /// Disarm any pending invocation of `hook`
    async fn unschedule(&self, hook: &str);
}

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryScheduler, MemoryStore};
pub use sqlite::SqliteStore;
