// Title -> category classification

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FALLBACK: &str = "miscellaneous";

/// One classification rule: a category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// True when any keyword occurs in the already lower-cased title.
    fn matches(&self, lowered_title: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowered_title.contains(&keyword.to_lowercase()))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("fallback category must not be empty")]
    EmptyFallback,

    #[error("category #{0} has no name")]
    EmptyCategoryName(usize),

    #[error("category '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

/// Ordered keyword rules plus a catch-all label.
///
/// Classification is first-match in declaration order, never best-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    fallback: String,
}

#[derive(Serialize, Deserialize)]
struct RawTable {
    rules: Vec<CategoryRule>,
    fallback: String,
}

impl TryFrom<RawTable> for CategoryTable {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        CategoryTable::new(raw.rules, &raw.fallback)
    }
}

impl From<CategoryTable> for RawTable {
    fn from(table: CategoryTable) -> Self {
        RawTable {
            rules: table.rules,
            fallback: table.fallback,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>, fallback: &str) -> Result<Self, TableError> {
        if fallback.trim().is_empty() {
            return Err(TableError::EmptyFallback);
        }
        for (idx, rule) in rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(TableError::EmptyCategoryName(idx + 1));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(TableError::EmptyKeyword(rule.name.clone()));
            }
        }
        Ok(Self {
            rules,
            fallback: fallback.to_string(),
        })
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn classify(&self, title: &str) -> &str {
        let lowered = title.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.name != self.fallback)
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.name.as_str())
            .unwrap_or(&self.fallback)
    }
}
