use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Strip the fragment and reject anything that is not http(s).
pub fn normalize_url(url: &Url) -> Option<String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    let mut url = url.clone();
    url.set_fragment(None);
    Some(url.to_string())
}

/// Host plus port when the port is not the scheme default, e.g.
/// `shop.example` or `127.0.0.1:8080`.
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Discovered-but-unvisited URLs plus the visited set guarding them.
///
/// Removal order from the pending set is unspecified.
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    visited: HashSet<String>,
    pending: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visited<I>(visited: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            visited: visited.into_iter().collect(),
            pending: HashSet::new(),
        }
    }

    /// Keep the links on `base_host` that are neither visited nor already
    /// pending, queue them, and return them in input order.
    pub fn discover<I>(&mut self, links: I, base_host: &str) -> Vec<String>
    where
        I: IntoIterator<Item = Url>,
    {
        let mut added = Vec::new();
        for link in links {
            if host_key(&link).as_deref() != Some(base_host) {
                continue;
            }
            let Some(url) = normalize_url(&link) else {
                continue;
            };
            if self.visited.contains(&url) {
                continue;
            }
            if self.pending.insert(url.clone()) {
                debug!("Queued {}", url);
                added.push(url);
            }
        }
        added
    }

    /// Queue a single URL (seeds, retries). Returns false when it is already
    /// visited or pending.
    pub fn push(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            return false;
        }
        self.pending.insert(url.to_string())
    }

    pub fn next_url(&mut self) -> Option<String> {
        let url = self.pending.iter().next()?.clone();
        self.pending.remove(&url);
        Some(url)
    }

    /// Idempotent. Returns true the first time a URL is marked.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.pending.remove(url);
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
