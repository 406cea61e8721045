use crate::error::{Result, ScanError};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) shopcrawl/0.1 (https://github.com/trapdoorsec/shopcrawl)";

/// Something that can load a page and hand back its final markup.
pub trait PageRenderer {
    fn navigate(&self, url: &Url) -> impl Future<Output = Result<RenderedPage>> + Send;
}

/// A loaded page: final URL after redirects plus the raw body.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub load_time: Duration,
}

impl RenderedPage {
    pub fn new(url: Url, body: String) -> Self {
        Self {
            url,
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body,
            load_time: Duration::from_secs(0),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(true)
    }

    pub fn document(&self) -> PageDocument {
        PageDocument {
            html: Html::parse_document(&self.body),
            base: self.url.clone(),
        }
    }
}

/// Parsed page with the small query surface the extractor needs.
pub struct PageDocument {
    html: Html,
    base: Url,
}

impl PageDocument {
    /// Inner text of the first match, or `None` when nothing matches or the
    /// match holds only whitespace.
    pub fn select_text(&self, selector: &Selector) -> Option<String> {
        self.html
            .select(selector)
            .next()
            .map(inner_text)
            .filter(|text| !text.is_empty())
    }

    /// Inner text of every non-empty match, in document order.
    pub fn select_all_text(&self, selector: &Selector) -> Vec<String> {
        self.html
            .select(selector)
            .map(inner_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    pub fn select_attr(&self, selector: &Selector, name: &str) -> Option<String> {
        self.html
            .select(selector)
            .find_map(|el| el.value().attr(name))
            .map(str::to_string)
    }

    /// Every `a[href]` resolved against the page URL.
    pub fn links(&self) -> Vec<Url> {
        let Ok(link_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        self.html
            .select(&link_selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve_url(&self.base, href))
            .collect()
    }
}

/// Text of an element with per-line whitespace trimmed, blank lines kept as
/// paragraph breaks.
fn inner_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    lines.join("\n").trim().to_string()
}

pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}

/// Static-HTML renderer on top of `reqwest`; the response finishing is the
/// load signal.
#[derive(Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new() -> Result<Self> {
        Self::with_options(30, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl PageRenderer for HttpRenderer {
    fn navigate(&self, url: &Url) -> impl Future<Output = Result<RenderedPage>> + Send {
        let client = self.client.clone();
        let url = url.clone();
        async move {
            debug!("Fetching {}", url);
            let start = Instant::now();
            let response = client.get(url.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ScanError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let final_url = response.url().clone();
            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let body = response.text().await?;

            Ok(RenderedPage {
                url: final_url,
                status_code: status.as_u16(),
                content_type,
                body,
                load_time: start.elapsed(),
            })
        }
    }
}
