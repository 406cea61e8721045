use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Width of the `=` rule written under the `URL:` line of a record file.
pub const RECORD_RULE_WIDTH: usize = 80;

/// One product page as extracted by the crawler.
///
/// Built once per visited page and never mutated after it has been handed to
/// a [`RecordSink`](crate::store::RecordSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub specs: BTreeMap<String, String>,
    pub category: String,
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<String>,
    pub scraped_at: String,
}

impl ProductRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            title: None,
            price: None,
            short_description: None,
            full_description: None,
            specs: BTreeMap::new(),
            category: String::new(),
            subcategory: String::new(),
            breadcrumbs: Vec::new(),
            scraped_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Render the plain-text file layout: a `URL:` line, a rule, then one
    /// block per field that is present.
    pub fn to_text(&self) -> String {
        let mut out = format!("URL: {}\n{}\n\n", self.url, "=".repeat(RECORD_RULE_WIDTH));

        let blocks = [
            ("Title", &self.title),
            ("Price", &self.price),
            ("Short description", &self.short_description),
            ("Description", &self.full_description),
        ];
        for (label, value) in blocks {
            if let Some(value) = value {
                out.push_str(&format!("{}:\n{}\n\n", label, value));
            }
        }

        if !self.specs.is_empty() {
            out.push_str("Specifications:\n");
            for (name, value) in &self.specs {
                out.push_str(&format!("{}: {}\n", name, value));
            }
            out.push('\n');
        }

        out
    }

    /// One JSON-lines entry (no trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Totals for one crawl run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub session_id: String,
    pub seeds_queued: usize,
    pub pages_saved: usize,
    pub pages_skipped: usize,
    pub fetch_failures: usize,
    pub write_failures: usize,
    pub abandoned: usize,
    pub visited: usize,
    pub pending: usize,
    pub limit_reached: bool,
    pub category_counts: BTreeMap<String, usize>,
    pub records: Vec<PathBuf>,
}

impl CrawlSummary {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_skips_missing_fields() {
        let mut record = ProductRecord::new("https://shop.example/p/1".to_string());
        record.title = Some("LED 5mm red".to_string());
        record.price = None;
        record.specs.insert("Color".to_string(), "red".to_string());

        let text = record.to_text();
        assert!(text.starts_with("URL: https://shop.example/p/1\n===="));
        assert!(text.contains("Title:\nLED 5mm red\n\n"));
        assert!(!text.contains("Price:"));
        assert!(text.contains("Specifications:\nColor: red\n"));
    }

    #[test]
    fn test_json_line_uses_null_for_absent_fields() {
        let record = ProductRecord::new("https://shop.example/p/2".to_string());
        let line = record.to_json_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value["price"].is_null());
        assert!(value.get("breadcrumbs").is_none());
        assert!(!line.contains('\n'));
    }
}
