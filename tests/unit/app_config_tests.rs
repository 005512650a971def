/*!
 * Tests for configuration defaults, clamping and serialization
 */

use cyrlatin::app_config::{BatchConfig, BatchContext, Config, MAX_BATCH_SIZE};

#[test]
fn test_default_shouldUseDocumentedValues() {
    let config = Config::default();

    assert_eq!(config.locale, "en_US");
    assert_eq!(config.batch.posts, 200);
    assert_eq!(config.batch.terms, 200);
    assert_eq!(config.activation_delay_secs, 15);
    assert_eq!(config.reschedule_delay_secs, 30);
    assert!(config.validate().is_ok());
}

#[test]
fn test_sizeFor_withinRange_shouldReturnConfiguredValue() {
    let batch = BatchConfig { posts: 7, terms: 500 };

    assert_eq!(batch.size_for(BatchContext::Posts), 7);
    assert_eq!(batch.size_for(BatchContext::Terms), 500);
}

#[test]
fn test_sizeFor_belowOne_shouldFallBackToDefault() {
    let batch = BatchConfig { posts: 0, terms: 0 };

    assert_eq!(batch.size_for(BatchContext::Posts), 200);
    assert_eq!(batch.size_for(BatchContext::Terms), 200);
}

#[test]
fn test_sizeFor_aboveMax_shouldClamp() {
    let batch = BatchConfig {
        posts: 5000,
        terms: MAX_BATCH_SIZE + 1,
    };

    assert_eq!(batch.size_for(BatchContext::Posts), MAX_BATCH_SIZE);
    assert_eq!(batch.size_for(BatchContext::Terms), MAX_BATCH_SIZE);
}

#[test]
fn test_deserialize_withMissingFields_shouldApplyDefaults() {
    let config: Config = serde_json::from_str(r#"{ "locale": "bg_BG" }"#).unwrap();

    assert_eq!(config.locale, "bg_BG");
    assert_eq!(config.batch.posts, 200);
    assert_eq!(config.reschedule_delay_secs, 30);
}

#[test]
fn test_deserialize_withPartialBatch_shouldFillRemainder() {
    let config: Config =
        serde_json::from_str(r#"{ "locale": "uk_UA", "batch": { "posts": 50 } }"#).unwrap();

    assert_eq!(config.batch.posts, 50);
    assert_eq!(config.batch.terms, 200);
}

#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.locale = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.reschedule_delay_secs = 0;
    assert!(config.validate().is_err());
}
