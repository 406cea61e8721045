use crate::classify::CategoryTable;
use crate::config::{ShopcrawlConfig, expand_path};
use indicatif::{ProgressBar, ProgressStyle};
use shopcrawl_scanner::extract::ProductSelectors;
use shopcrawl_scanner::result::{CrawlSummary, ProductRecord};
use shopcrawl_scanner::{CrawlSession, Crawler, FileStore, HttpRenderer, Pacing};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub output_dir: PathBuf,
    pub jsonl: Option<PathBuf>,
    /// Persisted visited/frontier logs. `None` keeps everything in memory.
    pub state_dir: Option<PathBuf>,
    pub max_pages: Option<usize>,
    pub max_retries: usize,
    pub pacing: Pacing,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub selectors: ProductSelectors,
    pub categories: CategoryTable,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    /// Options taken from the `crawl`, `selectors` and `categories`
    /// sections of a config, seeded with its base URL.
    pub fn from_config(config: &ShopcrawlConfig) -> crate::config::Result<Self> {
        let crawl = &config.crawl;
        Ok(Self {
            seeds: vec![crawl.base_url.clone()],
            output_dir: expand_path(&crawl.output_dir),
            jsonl: crawl.jsonl.as_deref().map(expand_path),
            state_dir: crawl.state_dir.as_deref().map(expand_path),
            max_pages: crawl.max_pages,
            max_retries: crawl.max_retries,
            pacing: crawl.pacing()?,
            timeout_secs: crawl.timeout_secs,
            user_agent: crawl.user_agent.clone(),
            selectors: config.selectors.clone(),
            categories: config.categories.clone(),
            show_progress_bars: true,
        })
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting each saved record as it lands
pub type CrawlRecordCallback = Arc<dyn Fn(&ProductRecord) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
/// Returns the run summary
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    record_callback: Option<CrawlRecordCallback>,
) -> Result<CrawlSummary, String> {
    let CrawlOptions {
        seeds,
        output_dir,
        jsonl,
        state_dir,
        max_pages,
        max_retries,
        pacing,
        timeout_secs,
        user_agent,
        selectors,
        categories,
        show_progress_bars,
    } = options;

    if seeds.is_empty() {
        return Err("No seed URLs given".to_string());
    }

    let mut session = match state_dir {
        Some(ref dir) => {
            let session = CrawlSession::resume(dir).map_err(|e| format!("Failed to open crawl state: {}", e))?;
            if let Some(ref callback) = progress_callback {
                callback(format!(
                    "Resuming from {}: {} visited, {} pending",
                    dir.display(),
                    session.visited_count(),
                    session.pending()
                ));
            }
            session
        }
        None => CrawlSession::new(),
    };

    let mut store = FileStore::new(&output_dir).map_err(|e| format!("Failed to open output directory: {}", e))?;
    if let Some(ref path) = jsonl {
        store = store
            .with_jsonl(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    }

    let renderer = HttpRenderer::with_options(timeout_secs, &user_agent).map_err(|e| e.to_string())?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let visited_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: shopcrawl_scanner::ProgressCallback = match progress_bar.clone() {
        Some(pb) => {
            let count = visited_count.clone();
            Arc::new(move |saved: usize, url: String| {
                count.fetch_add(1, Ordering::Relaxed);
                pb.set_message(format!("[{} saved] {}", saved, extract_url_path(&url)));
                pb.tick();
            })
        }
        None => {
            let count = visited_count.clone();
            Arc::new(move |_saved: usize, _url: String| {
                count.fetch_add(1, Ordering::Relaxed);
            })
        }
    };

    let table = Arc::new(categories);
    let classifier: shopcrawl_scanner::CategoryCallback =
        Arc::new(move |title: &str| table.classify(title).to_string());

    let mut crawler = Crawler::new(renderer)
        .and_then(|c| c.with_selectors(&selectors))
        .map_err(|e| e.to_string())?
        .with_pacing(pacing)
        .with_max_pages(max_pages)
        .with_max_retries(max_retries)
        .with_classifier(classifier)
        .with_progress_callback(internal_progress_callback);

    if let Some(cb) = record_callback {
        let pb_clone = progress_bar.clone();
        let result_cb: shopcrawl_scanner::ResultCallback = Arc::new(move |record: &ProductRecord| match pb_clone {
            Some(ref pb) => pb.suspend(|| cb(record)),
            None => cb(record),
        });
        crawler = crawler.with_result_callback(result_cb);
    }

    let result = crawler.crawl(&mut session, &seeds, &mut store).await;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = visited_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    result.map_err(|e| format!("Crawl failed: {}", e))
}

/// Generate a crawl report from a run summary
pub fn generate_crawl_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Session: {}\n", summary.session_id));
    report.push_str(&format!("  Pages saved: {}\n", summary.pages_saved));
    report.push_str(&format!("  Pages skipped: {}\n", summary.pages_skipped));
    report.push_str(&format!("  Failed fetches: {}\n", summary.fetch_failures));
    report.push_str(&format!("  Write failures: {}\n", summary.write_failures));
    report.push_str(&format!("  Abandoned URLs: {}\n", summary.abandoned));
    report.push_str(&format!("  Visited (total): {}\n", summary.visited));
    report.push_str(&format!("  Still pending: {}\n", summary.pending));
    if summary.limit_reached {
        report.push_str("  Stopped at the page limit\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if !summary.category_counts.is_empty() {
        report.push_str("## Categories\n");
        let mut counts: Vec<(&String, &usize)> = summary.category_counts.iter().collect();
        // Largest first, ties by name
        counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (category, count) in counts {
            report.push_str(&format!("  {:>5}  {}\n", count, category));
        }
        report.push('\n');
    }

    if !summary.records.is_empty() {
        report.push_str(&format!("## Records written this run ({})\n", summary.records.len()));
        for path in &summary.records {
            report.push_str(&format!("  {}\n", path.display()));
        }
        report.push('\n');
    }

    report
}
