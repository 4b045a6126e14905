//! Shared error type for fetching and parsing state overview pages.

use thiserror::Error;

/// Scraper error for URL building, HTTP, parsing, and the aggregate result.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid request URL for {state} {year}: {reason}")]
    InvalidUrl {
        state: String,
        year: i32,
        reason: String,
    },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    // Parsing
    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("No table with border=\"1\" on the overview page for {state} {year}.")]
    MissingTable { state: String, year: i32 },

    #[error("Row {row} for {state} {year} has {cells} cells; expected at least 7 (page layout may have changed).")]
    MalformedRow {
        state: String,
        year: i32,
        row: usize,
        cells: usize,
    },

    #[error("No overview tables could be retrieved (all requests failed or returned no tables).")]
    NoRecordsRetrieved,
}
