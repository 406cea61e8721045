use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use shopcrawl_core::ShopcrawlConfig;
use shopcrawl_core::config::{DEFAULT_CONFIG_PATH, expand_path, write_default_config};
use shopcrawl_core::merge::{MergeLayout, generate_merge_report, merge_corpus};
use shopcrawl_scanner::{Pacing, ProductRecord};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(url: Option<&Url>, hosts_file: Option<&PathBuf>) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file. Blank lines and `#` comments are skipped.
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|host| host.contains('.') || host == "localhost")
    {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// The config named on the command line, else the one `init` wrote, else
/// the bundled defaults.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<ShopcrawlConfig> {
    if let Some(path) = explicit {
        return ShopcrawlConfig::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let user_config = expand_path(DEFAULT_CONFIG_PATH);
    if user_config.is_file() {
        info!("Using {}", user_config.display());
        return ShopcrawlConfig::load(&user_config).with_context(|| format!("loading {}", user_config.display()));
    }
    ShopcrawlConfig::bundled().context("loading bundled configuration")
}

// Re-export crawl types and functions from shopcrawl-core
pub use shopcrawl_core::crawl::{
    CrawlOptions, CrawlProgressCallback, CrawlRecordCallback, execute_crawl, extract_url_path, generate_crawl_report,
};

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  SHOPCRAWL INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let force = args.get_flag("force");
    let config_path = expand_path(raw_path);

    println!("{} Target: {}", "→".blue(), config_path.display().to_string().bright_white());

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A configuration file already exists. Re-run with --force to overwrite it.");
        println!();
        bail!("{} already exists", config_path.display());
    }

    write_default_config(&config_path, force)?;
    let config = ShopcrawlConfig::load(&config_path)?;

    println!("{} Configuration written", "✓".green().bold());
    println!(
        "  {} categories, {} name mappings, seed {}",
        config.categories.rules().len(),
        config.merge.name_map.len(),
        config.crawl.base_url.bright_white()
    );
    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    Ok(())
}

/// Build crawl options from the config with command-line overrides applied.
pub fn crawl_options_from_args(sub_matches: &ArgMatches, config: &ShopcrawlConfig) -> Result<CrawlOptions> {
    let mut options = CrawlOptions::from_config(config)?;

    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    if url.is_some() || hosts_file.is_some() {
        options.seeds = load_urls_from_source(url, hosts_file).map_err(|e| anyhow!(e))?;
    }

    if let Some(dir) = sub_matches.get_one::<PathBuf>("output") {
        options.output_dir = dir.clone();
    }
    if let Some(path) = sub_matches.get_one::<PathBuf>("jsonl") {
        options.jsonl = Some(path.clone());
    }
    if let Some(dir) = sub_matches.get_one::<PathBuf>("state") {
        options.state_dir = Some(dir.clone());
    }
    if let Some(max_pages) = sub_matches.get_one::<usize>("max-pages") {
        options.max_pages = Some(*max_pages);
    }
    if let Some(retries) = sub_matches.get_one::<usize>("retries") {
        options.max_retries = *retries;
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        if *timeout == 0 {
            bail!("--timeout must be positive");
        }
        options.timeout_secs = *timeout;
    }

    let min_delay = sub_matches.get_one::<f64>("min-delay").copied();
    let max_delay = sub_matches.get_one::<f64>("max-delay").copied();
    if min_delay.is_some() || max_delay.is_some() {
        options.pacing = Pacing::from_secs_f64(
            min_delay.unwrap_or(config.crawl.min_delay_secs),
            max_delay.unwrap_or(config.crawl.max_delay_secs),
        )?;
    }

    Ok(options)
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let config = load_config(sub_matches.get_one::<PathBuf>("config"))?;
    let mut options = crawl_options_from_args(sub_matches, &config)?;
    options.show_progress_bars = !quiet;

    if !quiet {
        println!("\n🕷️  Crawling {} seed(s)", options.seeds.len());
        println!("Output: {}", options.output_dir.display());
        if let Some(ref state) = options.state_dir {
            println!("State: {}", state.display());
        }
        println!(
            "Pause: {:.1}s - {:.1}s between pages",
            options.pacing.min().as_secs_f64(),
            options.pacing.max().as_secs_f64()
        );
        if let Some(limit) = options.max_pages {
            println!("Page limit: {}", limit);
        }
        println!();
    }

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| println!("{}", msg)))
    };
    let record_callback: Option<CrawlRecordCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|record: &ProductRecord| {
            println!(
                "{} [{}] {}",
                "✓".green(),
                record.category.cyan(),
                record.title.as_deref().unwrap_or(&record.url)
            );
        }))
    };

    let summary = execute_crawl(options, progress_callback, record_callback)
        .await
        .map_err(|e| anyhow!(e))?;

    if !quiet {
        println!("\n✓ Crawl complete!\n");
    }
    print!("{}", generate_crawl_report(&summary));
    Ok(())
}

pub fn handle_merge(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let config = load_config(sub_matches.get_one::<PathBuf>("config"))?;
    let mut options = config.merge.to_options();

    if let Some(dir) = sub_matches.get_one::<PathBuf>("input") {
        options.input_root = dir.clone();
    }
    if let Some(dir) = sub_matches.get_one::<PathBuf>("output") {
        options.output_root = dir.clone();
    }
    if sub_matches.get_flag("flat") {
        options.layout = MergeLayout::Flat;
    }
    if let Some(max_files) = sub_matches.get_one::<usize>("max-files") {
        options.max_files = Some(*max_files);
    }
    if let Some(min_chars) = sub_matches.get_one::<usize>("min-chars") {
        options.min_chars = *min_chars;
    }
    if sub_matches.get_flag("keep-url") {
        options.keep_source_url = true;
    }

    if !quiet {
        print_merge_plan(&options.input_root, &options.output_root);
    }

    let summary = merge_corpus(&options)?;
    print!("{}", generate_merge_report(&summary));
    Ok(())
}

fn print_merge_plan(input: &Path, output: &Path) {
    println!(
        "{} Merging {} {} {}",
        "→".blue(),
        input.display().to_string().bright_white(),
        "→".blue(),
        output.display().to_string().bright_white()
    );
    println!();
}
