use clap::ArgMatches;
use colored::Colorize;
use shopcrawl::commands::command_argument_builder;
use shopcrawl::handlers::{handle_crawl, handle_init, handle_merge};
use shopcrawl_core::print_banner;
use tracing::Level;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(&chosen_command, quiet);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("merge", primary_command)) => handle_merge(primary_command, quiet),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so reports on stdout stay clean.
fn init_tracing(matches: &ArgMatches, quiet: bool) {
    let level = match (quiet, matches.get_count("verbose")) {
        (true, 0) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
