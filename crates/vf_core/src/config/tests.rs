use std::collections::HashMap;
use std::time::Duration;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_are_valid() {
    let config = AppConfig::default();
    config.validate().expect("defaults validate");
    assert_eq!(config.top_k, 3);
    assert_eq!(config.collection_name, "verified_facts");
    assert_eq!(config.llm_timeout, Duration::from_secs(300));
}

#[test]
fn env_overrides_apply_on_top_of_defaults() {
    let config = AppConfig::from_vars(lookup(&[
        ("FACTCHECK_TOP_K", "5"),
        ("FACTCHECK_COLLECTION", "pib_facts"),
        ("FACTCHECK_LLM_TIMEOUT_SECS", "60"),
        ("FACTCHECK_WARMUP", "off"),
        ("FACTCHECK_STORE_PATH", "/tmp/facts.sqlite"),
    ]))
    .expect("from_vars");

    assert_eq!(config.top_k, 5);
    assert_eq!(config.collection_name, "pib_facts");
    assert_eq!(config.llm_timeout, Duration::from_secs(60));
    assert!(!config.warmup_on_start);
    assert_eq!(config.store_path, PathBuf::from("/tmp/facts.sqlite"));
    assert_eq!(config.extraction_model, "gemma:7b");
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let config = AppConfig::from_vars(lookup(&[("FACTCHECK_TOP_K", "   ")])).expect("from_vars");
    assert_eq!(config.top_k, 3);
}

#[test]
fn malformed_numbers_are_rejected() {
    let err = AppConfig::from_vars(lookup(&[("FACTCHECK_TOP_K", "three")])).unwrap_err();
    assert_eq!(err.code, "CONFIG_INVALID");

    let err = AppConfig::from_vars(lookup(&[("FACTCHECK_WARMUP", "maybe")])).unwrap_err();
    assert_eq!(err.code, "CONFIG_INVALID");
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut config = AppConfig::default();
    config.top_k = 0;
    assert_eq!(config.validate().unwrap_err().code, "CONFIG_INVALID");

    let mut config = AppConfig::default();
    config.top_k = 51;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.collection_name = "bad name".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.llm_timeout = Duration::ZERO;
    assert!(config.validate().is_err());
}
