//! nass_revenue: CLI scraper for USDA NASS state agriculture overviews, outputting one
//! aggregated CSV per run.

pub mod cli;
pub mod config;
pub mod export;
pub mod model;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use export::{output_file_name, write_csv, ExportError};
pub use model::{CommodityRecord, FetchPair, ScrapeRequest};
pub use scraper::{
    collect_revenue, FetchedPage, HttpClient, HttpClientBuilder, MissingTableBehavior,
    PageSource, ScrapeEvent, ScrapeOptions, ScraperError,
};
