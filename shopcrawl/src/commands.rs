use crate::CLAP_STYLING;
use clap::{arg, command};
use shopcrawl_core::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("shopcrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("shopcrawl")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" ...)
                .help("Increase log verbosity (-v debug, -vv trace)")
                .required(false),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default shopcrawl configuration to your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the configuration file")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite an existing configuration file at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Politely crawl a shop, classify every product page and save it as a text \
                record. Resumes where the previous run stopped.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl (default: base_url from the config)")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(PathBuf))
                        .conflicts_with("url"),
                )
                .arg(config_arg())
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory for the per-product record files")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"jsonl" <PATH>)
                        .required(false)
                        .help("Also append every record as one JSON line to this file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"state" <DIR>)
                        .required(false)
                        .help("Directory holding the visited and frontier logs")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Stop after saving this many pages")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"min-delay" <SECONDS>)
                        .required(false)
                        .help("Shortest pause between page visits")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"max-delay" <SECONDS>)
                        .required(false)
                        .help("Longest pause between page visits")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"retries" <N>)
                        .required(false)
                        .help("Retries for a failed fetch before the URL is abandoned for this run")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            command!("merge")
                .about(
                    "Clean the saved records and merge them into one corpus file per \
                subcategory.",
                )
                .arg(config_arg())
                .arg(
                    arg!(-i --"input" <DIR>)
                        .required(false)
                        .help("Root of the saved records")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Where merged corpus files are written")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"flat")
                        .required(false)
                        .help("Input is one level of folders; write output/merged_<folder>.txt")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"max-files" <N>)
                        .required(false)
                        .help("Merge at most this many files per folder")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"min-chars" <N>)
                        .required(false)
                        .help("Discard records with less cleaned content than this")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"keep-url")
                        .required(false)
                        .help("Prefix every merged entry with its source URL line")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

fn config_arg() -> clap::Arg {
    arg!(-c --"config" <PATH>)
        .required(false)
        .help("Configuration file (default: the bundled configuration)")
        .value_parser(clap::value_parser!(PathBuf))
}
