// Tests for configuration loading

use shopcrawl_core::config::{ConfigError, DEFAULT_CONFIG, ShopcrawlConfig, write_default_config};
use shopcrawl_core::crawl::CrawlOptions;
use shopcrawl_core::merge::MergeLayout;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_bundled_config_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/config.json");
    write_default_config(&path, false).unwrap();

    let loaded = ShopcrawlConfig::load(&path).unwrap();
    assert_eq!(loaded, ShopcrawlConfig::bundled().unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{}").unwrap();

    assert!(matches!(write_default_config(&path, false), Err(ConfigError::Invalid(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

    write_default_config(&path, true).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
}

#[test]
fn test_bundled_name_map_covers_reference_shop() {
    let config = ShopcrawlConfig::bundled().unwrap();
    assert_eq!(config.merge.name_map.get("فیوز"), Some("fuse"));
    assert_eq!(config.merge.layout, MergeLayout::Nested);
    assert_eq!(config.merge.min_chars, 20);
}

#[test]
fn test_inverted_delays_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"crawl":{"min_delay_secs":9.0,"max_delay_secs":2.0}}"#).unwrap();
    assert!(matches!(ShopcrawlConfig::load(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_bad_selector_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"selectors":{"title":"h1["}}"#).unwrap();
    assert!(matches!(ShopcrawlConfig::load(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_empty_fallback_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"categories":{"rules":[],"fallback":""}}"#).unwrap();
    assert!(matches!(ShopcrawlConfig::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ShopcrawlConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_crawl_options_follow_config() {
    let config = ShopcrawlConfig::bundled().unwrap();
    let options = CrawlOptions::from_config(&config).unwrap();
    assert_eq!(options.seeds, vec![config.crawl.base_url.clone()]);
    assert_eq!(options.pacing.min(), Duration::from_secs(3));
    assert_eq!(options.pacing.max(), Duration::from_secs(8));
    assert_eq!(options.max_retries, 2);
    assert!(options.state_dir.is_some());
}
