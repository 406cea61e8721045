// Tests for title classification

use shopcrawl_core::ShopcrawlConfig;
use shopcrawl_core::classify::{CategoryRule, CategoryTable, TableError};

fn table() -> CategoryTable {
    CategoryTable::new(
        vec![
            CategoryRule::new("resistor", &["resistor"]),
            CategoryRule::new("led", &["led"]),
        ],
        "miscellaneous",
    )
    .unwrap()
}

#[test]
fn test_first_declared_category_wins() {
    assert_eq!(table().classify("LED resistor module"), "resistor");
}

#[test]
fn test_unknown_title_falls_back() {
    assert_eq!(table().classify("xyz unknown part"), "miscellaneous");
}

#[test]
fn test_empty_title_falls_back() {
    assert_eq!(table().classify(""), "miscellaneous");
}

#[test]
fn test_matching_is_case_insensitive() {
    assert_eq!(table().classify("Super Bright led 3MM"), "led");
    assert_eq!(table().classify("RESISTOR 10K"), "resistor");
}

#[test]
fn test_classification_is_deterministic() {
    let table = table();
    let first = table.classify("led strip with resistor");
    for _ in 0..10 {
        assert_eq!(table.classify("led strip with resistor"), first);
    }
}

#[test]
fn test_keywords_are_lowercased_too() {
    let table = CategoryTable::new(vec![CategoryRule::new("esp", &["ESP32"])], "misc").unwrap();
    assert_eq!(table.classify("esp32 devkit"), "esp");
}

#[test]
fn test_table_validation() {
    assert_eq!(CategoryTable::new(vec![], " ").unwrap_err(), TableError::EmptyFallback);
    assert_eq!(
        CategoryTable::new(vec![CategoryRule::new("led", &["led"]), CategoryRule::new("", &["x"])], "misc")
            .unwrap_err(),
        TableError::EmptyCategoryName(2)
    );
}

#[test]
fn test_invalid_table_is_rejected_while_parsing() {
    let json = r#"{"rules":[{"name":"led","keywords":[""]}],"fallback":"misc"}"#;
    assert!(serde_json::from_str::<CategoryTable>(json).is_err());
}

#[test]
fn test_bundled_table_classifies_persian_titles() {
    let config = ShopcrawlConfig::bundled().unwrap();
    let table = &config.categories;
    assert_eq!(table.classify("مقاومت 10 کیلو اهم"), "resistor");
    assert_eq!(table.classify("Arduino UNO R3"), "microcontroller");
    assert_eq!(table.classify("قطعه ناشناخته"), "miscellaneous");
}
