/*!
 * Batch slug conversion.
 *
 * One tick converts a bounded page of posts, then a bounded page of terms,
 * through the transliteration pipeline, advancing the durable progress
 * cursors. Ticks are fired by the host scheduler and re-arm themselves
 * until the terms source is exhausted.
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_config::{BatchContext, Config};
use crate::store::{ContentStore, OptionStore, Scheduler};
use crate::transliteration::{normalize_slug, TransliterationEngine};

use super::progress::{ConversionProgress, ConversionState};

/// Hook name the converter schedules itself under
pub const CONVERSION_HOOK: &str = "cyrlatin_convert_existing_slugs";

/// Result of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick holds the guard; nothing was read or written
    Skipped,
    /// Progress could not be read this tick; a retry was armed and no
    /// cursor was touched
    Deferred,
    /// The migration had already finished before this tick
    AlreadyFinished,
    /// The tick ran; `finished` reports whether it was the final one
    Ran {
        /// Posts rewritten this tick
        converted_posts: u64,
        /// Terms rewritten this tick
        converted_terms: u64,
        /// Whether the terms source was exhausted this tick
        finished: bool,
    },
}

/// Orchestrates the resumable background conversion of existing slugs
pub struct BatchConverter {
    /// Host content store
    content: Arc<dyn ContentStore>,

    /// Host key-value persistence
    options: Arc<dyn OptionStore>,

    /// Host scheduled-task runner
    scheduler: Arc<dyn Scheduler>,

    /// Shared transliteration pipeline
    engine: Arc<TransliterationEngine>,

    /// Crate configuration (locale, batch sizes, delays)
    config: Config,

    /// Acquire-or-skip guard; a concurrent tick returns immediately
    running: AtomicBool,
}

impl BatchConverter {
    /// Create a converter over the given host seams
    pub fn new(
        content: Arc<dyn ContentStore>,
        options: Arc<dyn OptionStore>,
        scheduler: Arc<dyn Scheduler>,
        engine: Arc<TransliterationEngine>,
        config: Config,
    ) -> Self {
        Self {
            content,
            options,
            scheduler,
            engine,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Activation: create the progress record if absent and arm the first
    /// tick. Idempotent: an existing record is left untouched and an
    /// already-armed schedule is not duplicated.
    pub async fn activate(&self) -> Result<()> {
        if ConversionProgress::load(self.options.as_ref()).await?.is_none() {
            info!("Starting background slug conversion");
            ConversionProgress::new().save(self.options.as_ref()).await?;
        }

        if !self.scheduler.is_scheduled(CONVERSION_HOOK).await {
            self.scheduler
                .schedule_once(CONVERSION_HOOK, self.config.activation_delay())
                .await?;
        }

        Ok(())
    }

    /// Deactivation: disarm any pending tick. Progress is kept so a later
    /// activation resumes where it left off.
    pub async fn deactivate(&self) {
        self.scheduler.unschedule(CONVERSION_HOOK).await;
    }

    /// Current lifecycle state of the migration
    pub async fn state(&self) -> Result<ConversionState> {
        Ok(match ConversionProgress::load(self.options.as_ref()).await? {
            None => ConversionState::NotStarted,
            Some(progress) => progress.state(),
        })
    }

    /// Run one scheduler tick.
    ///
    /// Every tick completes and returns control; store failures degrade to
    /// "no progress this tick" with a re-armed retry rather than propagating
    /// to the scheduler.
    pub async fn run_tick(&self) -> TickOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Conversion tick already in flight, skipping");
            return TickOutcome::Skipped;
        }

        let outcome = self.tick_inner().await;
        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    async fn tick_inner(&self) -> TickOutcome {
        let mut progress = match ConversionProgress::load(self.options.as_ref()).await {
            Ok(Some(progress)) => progress,
            Ok(None) => ConversionProgress::new(),
            Err(e) => {
                // Starting from a fresh record here could overwrite real
                // cursors on the next save, so do nothing and retry later.
                warn!("Could not read conversion progress, deferring tick: {e}");
                self.rearm().await;
                return TickOutcome::Deferred;
            }
        };

        if progress.finished {
            return TickOutcome::AlreadyFinished;
        }

        let posts_before = progress.done_posts;
        let terms_before = progress.done_terms;

        // 1) Convert posts first.
        self.convert_posts_batch(&mut progress).await;

        // 2) Then convert terms; an empty terms page is the completion signal.
        self.convert_terms_batch(&mut progress).await;

        let converted_posts = progress.done_posts - posts_before;
        let converted_terms = progress.done_terms - terms_before;
        let finished = progress.finished;

        // Persist unconditionally so cursors survive a crash between ticks,
        // and only stop re-arming once the finished flag is durable.
        let persisted = match progress.save(self.options.as_ref()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not persist conversion progress, cursors retry next tick: {e}");
                false
            }
        };

        if finished && persisted {
            info!(
                "Slug conversion finished: {} posts, {} terms converted ({} left unchanged after failed updates)",
                progress.done_posts, progress.done_terms, progress.attempted_unchanged
            );
        } else {
            self.rearm().await;
        }

        TickOutcome::Ran {
            converted_posts,
            converted_terms,
            finished,
        }
    }

    /// Arm the next tick unless one is already pending. A scheduler failure
    /// is logged and left to the still-armed or next host-driven tick.
    async fn rearm(&self) {
        if self.scheduler.is_scheduled(CONVERSION_HOOK).await {
            return;
        }
        if let Err(e) = self
            .scheduler
            .schedule_once(CONVERSION_HOOK, self.config.reschedule_delay())
            .await
        {
            warn!("Could not re-arm conversion tick: {e}");
        }
    }

    /// Convert one page of posts.
    ///
    /// The cursor advances by the page size requested whenever a non-empty
    /// page was processed, regardless of how many records were skipped. An
    /// empty or failed fetch advances nothing.
    async fn convert_posts_batch(&self, progress: &mut ConversionProgress) {
        let batch_size = self.config.batch.size_for(BatchContext::Posts);

        let posts = match self.content.fetch_posts(batch_size, progress.posts_offset).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Posts fetch failed at offset {}: {}", progress.posts_offset, e);
                return;
            }
        };

        if posts.is_empty() {
            return;
        }

        for post in &posts {
            let old_slug = post.slug.as_str();
            let new_slug = match self.converted_slug(old_slug) {
                Some(slug) => slug,
                None => continue,
            };

            // Keep the old slug around for redirects before rewriting.
            if let Err(e) = self.content.record_old_post_slug(post.id, old_slug).await {
                warn!("Failed to record old slug for post {}: {}", post.id, e);
            }

            match self.content.update_post_slug(post.id, &new_slug).await {
                Ok(()) => {
                    debug!("Post {}: '{}' -> '{}'", post.id, old_slug, new_slug);
                    progress.done_posts += 1;
                }
                Err(e) => {
                    warn!("Failed to update slug for post {}: {}", post.id, e);
                    progress.attempted_unchanged += 1;
                }
            }
        }

        progress.advance_posts(batch_size);
    }

    /// Convert one page of terms.
    ///
    /// A recoverable fetch failure leaves the cursor alone so the next
    /// tick retries; an empty page marks the migration finished.
    async fn convert_terms_batch(&self, progress: &mut ConversionProgress) {
        let batch_size = self.config.batch.size_for(BatchContext::Terms);

        let terms = match self.content.fetch_terms(batch_size, progress.terms_offset).await {
            Ok(terms) => terms,
            Err(e) => {
                // Temporary failure: do not mark as finished. The next tick
                // will retry from the same offset.
                warn!("Terms fetch failed at offset {}: {}", progress.terms_offset, e);
                return;
            }
        };

        if terms.is_empty() {
            progress.mark_finished();
            return;
        }

        for term in &terms {
            let old_slug = term.slug.as_str();
            let new_slug = match self.converted_slug(old_slug) {
                Some(slug) => slug,
                None => continue,
            };

            match self
                .content
                .update_term_slug(term.id, &term.taxonomy, &new_slug)
                .await
            {
                Ok(()) => {
                    debug!(
                        "Term {} ({}): '{}' -> '{}'",
                        term.id, term.taxonomy, old_slug, new_slug
                    );
                    progress.done_terms += 1;
                }
                Err(e) => {
                    warn!("Failed to update slug for term {}: {}", term.id, e);
                    progress.attempted_unchanged += 1;
                }
            }
        }

        progress.advance_terms(batch_size);
    }

    /// Run one stored slug through the pipeline.
    ///
    /// Returns `None` when the result is empty or identical to the current
    /// slug, in which case nothing should be written.
    fn converted_slug(&self, old_slug: &str) -> Option<String> {
        let decoded = urlencoding::decode(old_slug)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| old_slug.to_string());

        let new_slug = normalize_slug(&self.engine.transliterate(&self.config.locale, &decoded));

        if new_slug.is_empty() || new_slug == old_slug {
            None
        } else {
            Some(new_slug)
        }
    }
}
