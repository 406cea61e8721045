pub mod classify;
pub mod clean;
pub mod config;
pub mod crawl;
pub mod merge;
pub mod naming;

pub use classify::{CategoryRule, CategoryTable};
pub use config::{ConfigError, ShopcrawlConfig};
pub use merge::{MergeError, MergeLayout, MergeOptions, MergeSummary, merge_corpus};
pub use naming::NameMap;

const BANNER: &str = r#"
     _                                    _
 ___| |__   ___  _ __   ___ _ __ __ ___      _| |
/ __| '_ \ / _ \| '_ \ / __| '__/ _` \ \ /\ / / |
\__ \ | | | (_) | |_) | (__| | | (_| |\ V  V /| |
|___/_| |_|\___/| .__/ \___|_|  \__,_| \_/\_/ |_|
                |_|
"#;

pub fn print_banner() {
    println!("{}", BANNER);
    println!("  shopcrawl v{} - catalog crawler and corpus builder\n", env!("CARGO_PKG_VERSION"));
}
