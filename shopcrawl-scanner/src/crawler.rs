use crate::error::{Result, ScanError};
use crate::extract::{CompiledSelectors, ProductSelectors, extract_product, subcategory_from_breadcrumbs};
use crate::frontier::{host_key, normalize_url};
use crate::pacing::Pacing;
use crate::renderer::{PageDocument, PageRenderer};
use crate::result::{CrawlSummary, ProductRecord};
use crate::session::CrawlSession;
use crate::store::RecordSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Called before each visit with the number of pages saved so far and the
/// URL about to be fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Maps a product title (possibly empty) to a category label.
pub type CategoryCallback = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// Called with every record after it has been persisted.
pub type ResultCallback = Arc<dyn Fn(&ProductRecord) + Send + Sync>;

enum VisitOutcome {
    Saved(PathBuf),
    Skipped,
    WriteFailed,
}

/// Sequential crawler: one page at a time, a randomized pause in between.
///
/// All state lives in the [`CrawlSession`] passed to [`Crawler::crawl`], so
/// the same crawler can drive several sessions.
pub struct Crawler<R: PageRenderer> {
    renderer: R,
    selectors: CompiledSelectors,
    pacing: Pacing,
    max_pages: Option<usize>,
    max_retries: usize,
    classifier: Option<CategoryCallback>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl<R: PageRenderer> Crawler<R> {
    pub fn new(renderer: R) -> Result<Self> {
        Ok(Self {
            renderer,
            selectors: ProductSelectors::default().compile()?,
            pacing: Pacing::default(),
            max_pages: None,
            max_retries: DEFAULT_MAX_RETRIES,
            classifier: None,
            progress_callback: None,
            result_callback: None,
        })
    }

    pub fn with_selectors(mut self, selectors: &ProductSelectors) -> Result<Self> {
        self.selectors = selectors.compile()?;
        Ok(self)
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_classifier(mut self, classifier: CategoryCallback) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Crawl from `seeds` until the frontier is empty or the page limit is
    /// reached. Fetch and write failures are logged and never abort the run;
    /// only an unusable seed does.
    pub async fn crawl(
        &self,
        session: &mut CrawlSession,
        seeds: &[String],
        sink: &mut dyn RecordSink,
    ) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::new(session.id().to_string());

        for seed in seeds {
            let parsed = Url::parse(seed)
                .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;
            let url = normalize_url(&parsed)
                .ok_or_else(|| ScanError::InvalidUrl(format!("{}: not an http(s) URL", seed)))?;
            if session.seed(&url)? {
                summary.seeds_queued += 1;
            }
        }

        info!(
            "Session {} starting: {} seed(s) queued, {} pending, {} already visited",
            session.id(),
            summary.seeds_queued,
            session.pending(),
            session.visited_count()
        );

        loop {
            if let Some(limit) = self.max_pages
                && session.saved() >= limit
            {
                info!("Page limit of {} reached", limit);
                summary.limit_reached = true;
                break;
            }

            let Some(url) = session.next_url() else {
                break;
            };

            if let Some(ref callback) = self.progress_callback {
                callback(session.saved(), url.clone());
            }

            match self.visit(session, &url, sink).await {
                Ok(VisitOutcome::Saved(path)) => summary.records.push(path),
                Ok(VisitOutcome::Skipped) => summary.pages_skipped += 1,
                Ok(VisitOutcome::WriteFailed) => summary.write_failures += 1,
                Err(e) => {
                    warn!("Crawl error for {}: {}", url, e);
                    summary.fetch_failures += 1;
                    session.record_failure(&url, self.max_retries);
                }
            }

            if session.pending() > 0 {
                self.pacing.pause().await;
            }
        }

        summary.pages_saved = session.saved();
        summary.abandoned = session.abandoned();
        summary.visited = session.visited_count();
        summary.pending = session.pending();
        summary.category_counts = session.category_counts().clone();

        info!(
            "Crawl complete. Saved {} pages ({} failed fetches, {} write failures)",
            summary.pages_saved, summary.fetch_failures, summary.write_failures
        );
        Ok(summary)
    }

    async fn visit(
        &self,
        session: &mut CrawlSession,
        url: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<VisitOutcome> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        let base_host =
            host_key(&parsed).ok_or_else(|| ScanError::InvalidUrl(format!("{}: no host", url)))?;

        let page = self.renderer.navigate(&parsed).await?;
        debug!("Loaded {} in {:?}", url, page.load_time);

        if !page.is_html() {
            debug!("Skipping non-HTML page {}", url);
            session.mark_visited(url)?;
            return Ok(VisitOutcome::Skipped);
        }

        let (record, links) = {
            let doc = page.document();
            (self.build_record(url, &doc), doc.links())
        };

        let added = session.discover(links, &base_host)?;
        debug!("{} new link(s) from {}", added.len(), url);

        match sink.persist(&record) {
            Ok(path) => {
                session.mark_visited(url)?;
                session.record_saved(&record.category);
                info!(
                    "Saved [{}] {} -> {}",
                    session.saved(),
                    record.title.as_deref().unwrap_or(url),
                    path.display()
                );
                if let Some(ref callback) = self.result_callback {
                    callback(&record);
                }
                Ok(VisitOutcome::Saved(path))
            }
            Err(e) => {
                warn!("Could not write record for {}: {}", url, e);
                session.abandon(url);
                Ok(VisitOutcome::WriteFailed)
            }
        }
    }

    fn build_record(&self, url: &str, doc: &PageDocument) -> ProductRecord {
        let mut record = extract_product(url, doc, &self.selectors);
        let title = record.title.as_deref().unwrap_or("");
        record.category = match self.classifier {
            Some(ref classify) => classify(title),
            None => DEFAULT_CATEGORY.to_string(),
        };
        record.subcategory = subcategory_from_breadcrumbs(&record.breadcrumbs, record.title.as_deref())
            .unwrap_or_else(|| record.category.clone());
        record
    }
}
