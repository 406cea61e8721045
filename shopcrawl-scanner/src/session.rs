use crate::error::Result;
use crate::frontier::Frontier;
use crate::visited::UrlLog;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

pub const VISITED_LOG: &str = "visited.log";
pub const FRONTIER_LOG: &str = "frontier.log";

/// All mutable crawl state for one run.
///
/// Nothing here is global: two sessions in the same process are fully
/// independent. With a state directory, visits and newly discovered URLs
/// are journaled so a later session can resume.
pub struct CrawlSession {
    id: Uuid,
    frontier: Frontier,
    visited_log: Option<UrlLog>,
    frontier_log: Option<UrlLog>,
    attempts: HashMap<String, usize>,
    saved: usize,
    abandoned: usize,
    category_counts: BTreeMap<String, usize>,
}

impl CrawlSession {
    /// A session with no persistence.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            frontier: Frontier::new(),
            visited_log: None,
            frontier_log: None,
            attempts: HashMap::new(),
            saved: 0,
            abandoned: 0,
            category_counts: BTreeMap::new(),
        }
    }

    /// Open or resume the session stored in `state_dir`.
    ///
    /// The visited set is seeded from `visited.log`; the frontier is
    /// restored from `frontier.log` minus everything visited.
    pub fn resume(state_dir: &Path) -> Result<Self> {
        let (visited_log, visited) = UrlLog::open(&state_dir.join(VISITED_LOG))?;
        let (frontier_log, journaled) = UrlLog::open(&state_dir.join(FRONTIER_LOG))?;

        let mut frontier = Frontier::with_visited(visited);
        let mut restored = 0;
        for url in journaled {
            if frontier.push(&url) {
                restored += 1;
            }
        }

        let session = Self {
            visited_log: Some(visited_log),
            frontier_log: Some(frontier_log),
            frontier,
            ..Self::new()
        };
        info!(
            "Session {} resumed from {}: {} visited, {} pending",
            session.id,
            state_dir.display(),
            session.frontier.visited_len(),
            restored
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a seed URL. Seeds already visited are skipped.
    pub fn seed(&mut self, url: &str) -> Result<bool> {
        if self.frontier.is_visited(url) {
            info!("Seed {} already visited, skipping", url);
            return Ok(false);
        }
        if !self.frontier.push(url) {
            return Ok(false);
        }
        if let Some(log) = self.frontier_log.as_mut() {
            log.append(url)?;
        }
        Ok(true)
    }

    /// Same-host links not yet seen are queued and journaled.
    pub fn discover<I>(&mut self, links: I, base_host: &str) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = Url>,
    {
        let added = self.frontier.discover(links, base_host);
        if let Some(log) = self.frontier_log.as_mut() {
            for url in &added {
                log.append(url)?;
            }
        }
        Ok(added)
    }

    pub fn next_url(&mut self) -> Option<String> {
        self.frontier.next_url()
    }

    /// Record a confirmed visit. Persisted before returning; calling it twice
    /// for the same URL writes one log line.
    pub fn mark_visited(&mut self, url: &str) -> Result<()> {
        if self.frontier.mark_visited(url)
            && let Some(log) = self.visited_log.as_mut()
        {
            log.append(url)?;
        }
        self.attempts.remove(url);
        Ok(())
    }

    /// Count a failed attempt and requeue the URL while attempts stay within
    /// `max_retries`. Returns true when the URL was requeued.
    pub fn record_failure(&mut self, url: &str, max_retries: usize) -> bool {
        let attempts = self.attempts.entry(url.to_string()).or_insert(0);
        *attempts += 1;
        if *attempts <= max_retries {
            return self.frontier.push(url);
        }
        let attempts = *attempts;
        self.abandon(url);
        warn!("Giving up on {} after {} attempts", url, attempts);
        false
    }

    /// Skip `url` for the rest of this run without persisting it, so a later
    /// run tries it again.
    pub fn abandon(&mut self, url: &str) {
        self.frontier.mark_visited(url);
        self.attempts.remove(url);
        self.abandoned += 1;
    }

    pub fn record_saved(&mut self, category: &str) {
        self.saved += 1;
        *self.category_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.frontier.is_visited(url)
    }

    pub fn saved(&self) -> usize {
        self.saved
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned
    }

    pub fn pending(&self) -> usize {
        self.frontier.pending_len()
    }

    pub fn visited_count(&self) -> usize {
        self.frontier.visited_len()
    }

    pub fn category_counts(&self) -> &BTreeMap<String, usize> {
        &self.category_counts
    }

    pub fn attempts(&self, url: &str) -> usize {
        self.attempts.get(url).copied().unwrap_or(0)
    }
}

impl Default for CrawlSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn link(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = CrawlSession::new();
        let b = CrawlSession::new();
        a.mark_visited("https://shop.example/a").unwrap();
        assert!(a.is_visited("https://shop.example/a"));
        assert!(!b.is_visited("https://shop.example/a"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_mark_visited_persists_once() {
        let dir = TempDir::new().unwrap();
        let mut session = CrawlSession::resume(dir.path()).unwrap();
        session.mark_visited("https://shop.example/a").unwrap();
        session.mark_visited("https://shop.example/a").unwrap();

        let log = fs::read_to_string(dir.path().join(VISITED_LOG)).unwrap();
        assert_eq!(log, "https://shop.example/a\n");
    }

    #[test]
    fn test_resume_restores_pending_frontier() {
        let dir = TempDir::new().unwrap();
        {
            let mut session = CrawlSession::resume(dir.path()).unwrap();
            session.seed("https://shop.example/").unwrap();
            session
                .discover(
                    vec![link("https://shop.example/a"), link("https://shop.example/b")],
                    "shop.example",
                )
                .unwrap();
            session.mark_visited("https://shop.example/").unwrap();
            session.mark_visited("https://shop.example/a").unwrap();
        }

        let mut resumed = CrawlSession::resume(dir.path()).unwrap();
        assert!(resumed.is_visited("https://shop.example/a"));
        assert_eq!(resumed.next_url(), Some("https://shop.example/b".to_string()));
        assert_eq!(resumed.next_url(), None);
    }

    #[test]
    fn test_visited_seed_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(VISITED_LOG), "https://shop.example/\n").unwrap();
        let mut session = CrawlSession::resume(dir.path()).unwrap();
        assert!(!session.seed("https://shop.example/").unwrap());
        assert_eq!(session.next_url(), None);
    }

    #[test]
    fn test_failures_requeue_until_bound() {
        let mut session = CrawlSession::new();
        let url = "https://shop.example/flaky";
        assert!(session.record_failure(url, 2));
        assert_eq!(session.next_url().as_deref(), Some(url));
        assert!(session.record_failure(url, 2));
        assert_eq!(session.next_url().as_deref(), Some(url));
        assert!(!session.record_failure(url, 2));
        assert_eq!(session.next_url(), None);
        assert!(session.is_visited(url));
        assert_eq!(session.abandoned(), 1);
    }

    #[test]
    fn test_abandoned_urls_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let mut session = CrawlSession::resume(dir.path()).unwrap();
            session.abandon("https://shop.example/broken");
            let again = session
                .discover(vec![link("https://shop.example/broken")], "shop.example")
                .unwrap();
            assert!(again.is_empty());
        }
        let log = fs::read_to_string(dir.path().join(VISITED_LOG)).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_category_counts() {
        let mut session = CrawlSession::new();
        session.record_saved("resistor");
        session.record_saved("resistor");
        session.record_saved("led");
        assert_eq!(session.saved(), 3);
        assert_eq!(session.category_counts().get("resistor"), Some(&2));
    }
}
