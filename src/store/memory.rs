/*!
 * In-memory store implementations for testing.
 *
 * These mirror the trait surface of a real host without any I/O, and
 * expose failure-injection knobs so behavior under store errors can be
 * exercised deterministically:
 *
 * - `MemoryStore::fail_next_term_fetches(n)` - next n term fetches return
 *   a recoverable error
 * - `MemoryStore::fail_post_update(id)` / `fail_term_update(id)` - updates
 *   for those ids fail with a backend error
 * - `MemoryStore::fail_next_option_gets(n)` / `fail_next_option_sets(n)` -
 *   next n option reads/writes return a recoverable error
 */

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::StoreError;

use super::{ContentStore, OptionStore, PostRecord, Scheduler, TermRecord};

/// In-memory content and option store
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Posts ordered by insertion; fetches sort by id
    posts: RwLock<Vec<PostRecord>>,

    /// Terms ordered by insertion; fetches sort by id
    terms: RwLock<Vec<TermRecord>>,

    /// Old slugs recorded for redirects, keyed by post id
    old_slugs: RwLock<HashMap<i64, Vec<String>>>,

    /// Key-value options
    options: RwLock<HashMap<String, serde_json::Value>>,

    /// Remaining term fetches that should fail recoverably
    term_fetch_failures: AtomicUsize,

    /// Remaining option reads that should fail recoverably
    option_get_failures: AtomicUsize,

    /// Remaining option writes that should fail recoverably
    option_set_failures: AtomicUsize,

    /// Post ids whose slug updates fail
    failing_post_updates: RwLock<HashSet<i64>>,

    /// Term ids whose slug updates fail
    failing_term_updates: RwLock<HashSet<i64>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with posts and terms
    pub fn with_records(posts: Vec<PostRecord>, terms: Vec<TermRecord>) -> Self {
        let store = Self::new();
        *store.posts.write() = posts;
        *store.terms.write() = terms;
        store
    }

    /// Add a post record
    pub fn insert_post(&self, id: i64, slug: &str) {
        self.posts.write().push(PostRecord {
            id,
            slug: slug.to_string(),
        });
    }

    /// Add a term record
    pub fn insert_term(&self, id: i64, taxonomy: &str, slug: &str) {
        self.terms.write().push(TermRecord {
            id,
            taxonomy: taxonomy.to_string(),
            slug: slug.to_string(),
        });
    }

    /// Make the next `count` term fetches fail with a recoverable error
    pub fn fail_next_term_fetches(&self, count: usize) {
        self.term_fetch_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` option reads fail with a recoverable error
    pub fn fail_next_option_gets(&self, count: usize) {
        self.option_get_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` option writes fail with a recoverable error
    pub fn fail_next_option_sets(&self, count: usize) {
        self.option_set_failures.store(count, Ordering::SeqCst);
    }

    /// Make slug updates for this post id fail
    pub fn fail_post_update(&self, id: i64) {
        self.failing_post_updates.write().insert(id);
    }

    /// Make slug updates for this term id fail
    pub fn fail_term_update(&self, id: i64) {
        self.failing_term_updates.write().insert(id);
    }

    /// Current slug of a post, if it exists
    pub fn post_slug(&self, id: i64) -> Option<String> {
        self.posts
            .read()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.slug.clone())
    }

    /// Current slug of a term, if it exists
    pub fn term_slug(&self, id: i64) -> Option<String> {
        self.terms
            .read()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.slug.clone())
    }

    /// Old slugs recorded for a post
    pub fn old_slugs_for(&self, id: i64) -> Vec<String> {
        self.old_slugs.read().get(&id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_posts(&self, limit: usize, offset: u64) -> Result<Vec<PostRecord>, StoreError> {
        let mut posts = self.posts.read().clone();
        posts.sort_by_key(|p| p.id);

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }

    async fn update_post_slug(&self, id: i64, new_slug: &str) -> Result<(), StoreError> {
        if self.failing_post_updates.read().contains(&id) {
            return Err(StoreError::Backend(format!(
                "injected update failure for post {}",
                id
            )));
        }

        let mut posts = self.posts.write();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", id)))?;

        post.slug = new_slug.to_string();
        Ok(())
    }

    async fn record_old_post_slug(&self, id: i64, old_slug: &str) -> Result<(), StoreError> {
        self.old_slugs
            .write()
            .entry(id)
            .or_default()
            .push(old_slug.to_string());
        Ok(())
    }

    async fn fetch_terms(&self, limit: usize, offset: u64) -> Result<Vec<TermRecord>, StoreError> {
        let remaining = self.term_fetch_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.term_fetch_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Recoverable(
                "injected term fetch failure".to_string(),
            ));
        }

        let mut terms = self.terms.read().clone();
        terms.sort_by_key(|t| t.id);

        Ok(terms
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }

    async fn update_term_slug(
        &self,
        id: i64,
        taxonomy: &str,
        new_slug: &str,
    ) -> Result<(), StoreError> {
        if self.failing_term_updates.read().contains(&id) {
            return Err(StoreError::Backend(format!(
                "injected update failure for term {}",
                id
            )));
        }

        let mut terms = self.terms.write();
        let term = terms
            .iter_mut()
            .find(|t| t.id == id && t.taxonomy == taxonomy)
            .ok_or_else(|| StoreError::NotFound(format!("term {} ({})", id, taxonomy)))?;

        term.slug = new_slug.to_string();
        Ok(())
    }
}

#[async_trait]
impl OptionStore for MemoryStore {
    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let remaining = self.option_get_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.option_get_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Recoverable(
                "injected option read failure".to_string(),
            ));
        }

        Ok(self.options.read().get(key).cloned())
    }

    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let remaining = self.option_set_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.option_set_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Recoverable(
                "injected option write failure".to_string(),
            ));
        }

        self.options.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> Result<(), StoreError> {
        self.options.write().remove(key);
        Ok(())
    }
}

/// In-memory scheduler that records armed hooks without firing them
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    /// Currently armed hooks with their requested delays
    armed: RwLock<HashMap<String, Duration>>,

    /// Total number of successful schedule_once calls
    schedule_calls: AtomicUsize,
}

impl MemoryScheduler {
    /// Create a scheduler with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the hook is armed with, if armed
    pub fn armed_delay(&self, hook: &str) -> Option<Duration> {
        self.armed.read().get(hook).copied()
    }

    /// Disarm a hook as if the host had fired it, returning whether it
    /// was armed
    pub fn consume(&self, hook: &str) -> bool {
        self.armed.write().remove(hook).is_some()
    }

    /// Number of schedule_once calls made so far
    pub fn schedule_count(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scheduler for MemoryScheduler {
    async fn schedule_once(&self, hook: &str, delay: Duration) -> Result<(), StoreError> {
        self.armed.write().insert(hook.to_string(), delay);
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_scheduled(&self, hook: &str) -> bool {
        self.armed.read().contains_key(hook)
    }

    async fn unschedule(&self, hook: &str) {
        self.armed.write().remove(hook);
    }
}
