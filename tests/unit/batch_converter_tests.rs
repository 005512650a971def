/*!
 * Tests for single ticks of the batch converter
 */

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use cyrlatin::app_config::{BatchConfig, Config};
use cyrlatin::conversion::{BatchConverter, ConversionProgress, TickOutcome, CONVERSION_HOOK};
use cyrlatin::errors::StoreError;
use cyrlatin::store::memory::{MemoryScheduler, MemoryStore};
use cyrlatin::store::{ContentStore, PostRecord, Scheduler, TermRecord};
use cyrlatin::transliteration::TransliterationEngine;

use crate::common::{harness, harness_with_config};

async fn load_progress(store: &cyrlatin::store::memory::MemoryStore) -> ConversionProgress {
    ConversionProgress::load(store)
        .await
        .expect("progress load failed")
        .expect("progress record missing")
}

#[tokio::test]
async fn test_runTick_withEmptyStore_shouldFinishImmediately() {
    let h = harness();

    let outcome = h.converter.run_tick().await;
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 0,
            converted_terms: 0,
            finished: true,
        }
    );

    let progress = load_progress(&h.store).await;
    assert!(progress.finished);
    assert_eq!(progress.done_posts, 0);
    assert_eq!(progress.done_terms, 0);
    assert_eq!(progress.posts_offset, 0);
    assert_eq!(progress.terms_offset, 0);

    // The final tick does not re-arm.
    assert!(!h.scheduler.is_scheduled(CONVERSION_HOOK).await);
}

#[tokio::test]
async fn test_runTick_withCyrillicSlugs_shouldConvertAndRecordOldSlugs() {
    let h = harness();
    h.store.insert_post(1, "привет-мир");
    h.store.insert_post(2, "уже-готово");
    h.store.insert_term(10, "category", "новости");

    let outcome = h.converter.run_tick().await;
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 2,
            converted_terms: 1,
            finished: false,
        }
    );

    assert_eq!(h.store.post_slug(1).unwrap(), "privet-mir");
    assert_eq!(h.store.post_slug(2).unwrap(), "uzhe-gotovo");
    assert_eq!(h.store.term_slug(10).unwrap(), "novosti");

    // Old slugs are kept for redirects, for posts only.
    assert_eq!(h.store.old_slugs_for(1), vec!["привет-мир".to_string()]);
    assert_eq!(h.store.old_slugs_for(2), vec!["уже-готово".to_string()]);

    // Offsets advance by the page size requested, not the count converted.
    let progress = load_progress(&h.store).await;
    assert_eq!(progress.posts_offset, 200);
    assert_eq!(progress.terms_offset, 200);
    assert!(!progress.finished);
    assert!(h.scheduler.is_scheduled(CONVERSION_HOOK).await);
}

#[tokio::test]
async fn test_runTick_withPercentEncodedSlug_shouldDecodeBeforeConverting() {
    let h = harness();
    h.store
        .insert_post(1, "%D0%BF%D1%80%D0%B8%D0%B2%D0%B5%D1%82");

    h.converter.run_tick().await;

    assert_eq!(h.store.post_slug(1).unwrap(), "privet");
}

#[tokio::test]
async fn test_runTick_withUnchangedSlug_shouldSkipWrite() {
    let h = harness();
    h.store.insert_post(1, "already-latin");

    h.converter.run_tick().await;

    assert_eq!(h.store.post_slug(1).unwrap(), "already-latin");
    assert!(h.store.old_slugs_for(1).is_empty());

    let progress = load_progress(&h.store).await;
    assert_eq!(progress.done_posts, 0);
    // The page still advances so a stuck record cannot wedge the cursor.
    assert_eq!(progress.posts_offset, 200);
}

#[tokio::test]
async fn test_runTick_withRecoverableTermFetchFailure_shouldRetryNextTick() {
    let h = harness();
    h.store.insert_term(1, "category", "метки");
    h.store.fail_next_term_fetches(1);

    let outcome = h.converter.run_tick().await;
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 0,
            converted_terms: 0,
            finished: false,
        }
    );

    // No progress on the terms cursor and not finished; the tick re-arms.
    let progress = load_progress(&h.store).await;
    assert_eq!(progress.terms_offset, 0);
    assert!(!progress.finished);
    assert!(h.scheduler.is_scheduled(CONVERSION_HOOK).await);

    // The next tick succeeds.
    h.converter.run_tick().await;
    assert_eq!(h.store.term_slug(1).unwrap(), "metki");
    assert_eq!(load_progress(&h.store).await.terms_offset, 200);
}

#[tokio::test]
async fn test_runTick_withFailingUpdate_shouldCountStraggler() {
    let h = harness();
    h.store.insert_post(1, "первый");
    h.store.insert_post(2, "второй");
    h.store.fail_post_update(2);

    h.converter.run_tick().await;

    assert_eq!(h.store.post_slug(1).unwrap(), "pervyj");
    // The failed record keeps its old slug and is not retried in-tick.
    assert_eq!(h.store.post_slug(2).unwrap(), "второй");

    let progress = load_progress(&h.store).await;
    assert_eq!(progress.done_posts, 1);
    assert_eq!(progress.attempted_unchanged, 1);
    assert_eq!(progress.posts_offset, 200);
}

#[tokio::test]
async fn test_runTick_afterFinished_shouldBeNoOp() {
    let h = harness();

    // Empty store: first tick finishes the migration.
    h.converter.run_tick().await;
    let before = load_progress(&h.store).await;
    assert!(before.finished);

    let outcome = h.converter.run_tick().await;
    assert_eq!(outcome, TickOutcome::AlreadyFinished);

    let after = load_progress(&h.store).await;
    assert_eq!(after, before);
    assert!(!h.scheduler.is_scheduled(CONVERSION_HOOK).await);
}

#[tokio::test]
async fn test_runTick_withSmallBatches_shouldAdvanceOffsetsMonotonically() {
    let config = Config {
        locale: "ru_RU".to_string(),
        batch: BatchConfig { posts: 2, terms: 2 },
        ..Config::default()
    };
    let h = harness_with_config(config);

    for id in 1..=5 {
        h.store.insert_post(id, &format!("пост-{}", id));
    }
    for id in 1..=3 {
        h.store.insert_term(id, "category", &format!("метка-{}", id));
    }

    let mut last_posts_offset = 0;
    let mut last_terms_offset = 0;

    for _ in 0..10 {
        let outcome = h.converter.run_tick().await;
        let progress = load_progress(&h.store).await;

        // Offsets never decrease and grow by at most the batch size.
        assert!(progress.posts_offset >= last_posts_offset);
        assert!(progress.posts_offset - last_posts_offset <= 2);
        assert!(progress.terms_offset >= last_terms_offset);
        assert!(progress.terms_offset - last_terms_offset <= 2);
        last_posts_offset = progress.posts_offset;
        last_terms_offset = progress.terms_offset;

        if outcome == TickOutcome::AlreadyFinished || progress.finished {
            break;
        }
    }

    let progress = load_progress(&h.store).await;
    assert!(progress.finished);
    assert_eq!(progress.done_posts, 5);
    assert_eq!(progress.done_terms, 3);

    for id in 1..=5 {
        assert_eq!(h.store.post_slug(id).unwrap(), format!("post-{}", id));
    }
    for id in 1..=3 {
        assert_eq!(h.store.term_slug(id).unwrap(), format!("metka-{}", id));
    }
}

#[tokio::test]
async fn test_runTick_withFailedProgressRead_shouldDeferAndRearm() {
    let h = harness();
    h.store.insert_post(1, "привет");
    h.converter.activate().await.unwrap();
    assert!(h.scheduler.consume(CONVERSION_HOOK));

    h.store.fail_next_option_gets(1);
    let outcome = h.converter.run_tick().await;
    assert_eq!(outcome, TickOutcome::Deferred);

    // Nothing converted and the cursors from activation are untouched.
    assert_eq!(h.store.post_slug(1).unwrap(), "привет");
    let progress = load_progress(&h.store).await;
    assert_eq!(progress.posts_offset, 0);
    assert!(!progress.finished);

    // A retry is armed with the reschedule delay.
    let delay = h.scheduler.armed_delay(CONVERSION_HOOK).unwrap();
    assert_eq!(delay.as_secs(), 30);
}

#[tokio::test]
async fn test_runTick_withFailedProgressWrite_shouldKeepHookArmed() {
    let h = harness();
    h.store.insert_post(1, "привет");
    h.store.fail_next_option_sets(1);

    let outcome = h.converter.run_tick().await;
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 1,
            converted_terms: 0,
            finished: true,
        }
    );

    // The slug changed but the finished flag never became durable, so the
    // tick re-arms instead of stopping.
    assert_eq!(h.store.post_slug(1).unwrap(), "privet");
    assert!(ConversionProgress::load(h.store.as_ref())
        .await
        .unwrap()
        .is_none());
    assert!(h.scheduler.consume(CONVERSION_HOOK));

    // The retry persists the finished state and stops re-arming.
    let outcome = h.converter.run_tick().await;
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 0,
            converted_terms: 0,
            finished: true,
        }
    );
    assert!(load_progress(&h.store).await.finished);
    assert!(!h.scheduler.is_scheduled(CONVERSION_HOOK).await);
}

/// Content store that parks inside the posts fetch until released, so a
/// tick can be held mid-flight from the test body.
#[derive(Debug)]
struct GatedStore {
    inner: Arc<MemoryStore>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl ContentStore for GatedStore {
    async fn fetch_posts(&self, limit: usize, offset: u64) -> Result<Vec<PostRecord>, StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.fetch_posts(limit, offset).await
    }

    async fn update_post_slug(&self, id: i64, new_slug: &str) -> Result<(), StoreError> {
        self.inner.update_post_slug(id, new_slug).await
    }

    async fn record_old_post_slug(&self, id: i64, old_slug: &str) -> Result<(), StoreError> {
        self.inner.record_old_post_slug(id, old_slug).await
    }

    async fn fetch_terms(&self, limit: usize, offset: u64) -> Result<Vec<TermRecord>, StoreError> {
        self.inner.fetch_terms(limit, offset).await
    }

    async fn update_term_slug(
        &self,
        id: i64,
        taxonomy: &str,
        new_slug: &str,
    ) -> Result<(), StoreError> {
        self.inner.update_term_slug(id, taxonomy, new_slug).await
    }
}

#[tokio::test]
async fn test_runTick_whileTickInFlight_shouldSkipWithoutTouchingProgress() {
    let inner = Arc::new(MemoryStore::new());
    inner.insert_post(1, "привет");

    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gated = Arc::new(GatedStore {
        inner: inner.clone(),
        entered: entered.clone(),
        release: release.clone(),
    });

    let scheduler = Arc::new(MemoryScheduler::new());
    let config = Config {
        locale: "ru_RU".to_string(),
        ..Config::default()
    };
    let converter = Arc::new(BatchConverter::new(
        gated,
        inner.clone(),
        scheduler,
        Arc::new(TransliterationEngine::new()),
        config,
    ));

    let held = {
        let converter = converter.clone();
        tokio::spawn(async move { converter.run_tick().await })
    };
    entered.notified().await;

    // The first tick is parked inside its posts fetch; a concurrent tick
    // backs off without reading or writing anything.
    assert_eq!(converter.run_tick().await, TickOutcome::Skipped);
    assert!(ConversionProgress::load(inner.as_ref())
        .await
        .unwrap()
        .is_none());
    assert_eq!(inner.post_slug(1).unwrap(), "привет");

    release.notify_one();
    let outcome = held.await.unwrap();
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            converted_posts: 1,
            converted_terms: 0,
            finished: true,
        }
    );
    assert_eq!(inner.post_slug(1).unwrap(), "privet");
}
