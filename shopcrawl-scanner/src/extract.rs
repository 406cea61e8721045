use crate::error::{Result, ScanError};
use crate::renderer::PageDocument;
use crate::result::ProductRecord;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CSS selectors for the product fields, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSelectors {
    pub title: String,
    pub price: String,
    pub short_description: String,
    pub full_description: String,
    pub spec_name: String,
    pub spec_value: String,
    pub breadcrumb: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            title: "h1".to_string(),
            price: "span.current-price".to_string(),
            short_description: "#product-description-short".to_string(),
            full_description: ".product-description".to_string(),
            spec_name: "dl.data-sheet dt".to_string(),
            spec_value: "dl.data-sheet dd".to_string(),
            breadcrumb: "nav.breadcrumb li".to_string(),
        }
    }
}

impl ProductSelectors {
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            title: parse_selector("title", &self.title)?,
            price: parse_selector("price", &self.price)?,
            short_description: parse_selector("short_description", &self.short_description)?,
            full_description: parse_selector("full_description", &self.full_description)?,
            spec_name: parse_selector("spec_name", &self.spec_name)?,
            spec_value: parse_selector("spec_value", &self.spec_value)?,
            breadcrumb: parse_selector("breadcrumb", &self.breadcrumb)?,
        })
    }
}

fn parse_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ScanError::InvalidConfig(format!("selector for {} ({}): {}", field, css, e)))
}

pub struct CompiledSelectors {
    title: Selector,
    price: Selector,
    short_description: Selector,
    full_description: Selector,
    spec_name: Selector,
    spec_value: Selector,
    breadcrumb: Selector,
}

/// Fill a record from a parsed page. Selector misses leave fields empty.
/// Category and subcategory are left for the caller.
pub fn extract_product(url: &str, doc: &PageDocument, selectors: &CompiledSelectors) -> ProductRecord {
    let mut record = ProductRecord::new(url.to_string());
    record.title = doc.select_text(&selectors.title);
    record.price = doc.select_text(&selectors.price);
    record.short_description = doc.select_text(&selectors.short_description);
    record.full_description = doc.select_text(&selectors.full_description);
    record.specs = extract_specs(doc, selectors);
    record.breadcrumbs = doc.select_all_text(&selectors.breadcrumb);
    record
}

fn extract_specs(doc: &PageDocument, selectors: &CompiledSelectors) -> BTreeMap<String, String> {
    let names = doc.select_all_text(&selectors.spec_name);
    let values = doc.select_all_text(&selectors.spec_value);
    names
        .into_iter()
        .zip(values)
        .map(|(name, value)| (name.trim_end_matches(':').trim().to_string(), value))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// The deepest breadcrumb above the product itself.
///
/// Breadcrumb trails usually end with the product name, so the last entry
/// is ignored when it equals the title.
pub fn subcategory_from_breadcrumbs(breadcrumbs: &[String], title: Option<&str>) -> Option<String> {
    let mut trail: Vec<&String> = breadcrumbs.iter().collect();
    if let (Some(last), Some(title)) = (trail.last(), title)
        && last.as_str() == title
    {
        trail.pop();
    }
    trail.last().map(|s| s.to_string())
}
