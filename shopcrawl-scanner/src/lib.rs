pub mod crawler;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod pacing;
pub mod renderer;
pub mod result;
pub mod session;
pub mod store;
pub mod visited;

pub use crawler::{CategoryCallback, Crawler, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use extract::ProductSelectors;
pub use frontier::Frontier;
pub use pacing::Pacing;
pub use renderer::{HttpRenderer, PageRenderer, RenderedPage};
pub use result::{CrawlSummary, ProductRecord};
pub use session::CrawlSession;
pub use store::{FileStore, RecordSink};
