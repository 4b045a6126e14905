//! Fetching and the scrape loop. Page source trait, shared client, and the state overview
//! adapter.

mod client;
mod error;

pub mod overview;

pub use client::{HttpClient, HttpClientBuilder};
pub use error::ScraperError;

use crate::model::{CommodityRecord, FetchPair, ScrapeRequest};

/// How to handle a successfully fetched page that has no commodity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTableBehavior {
    /// Warn and skip the pair (default).
    Skip,
    /// Abort the run.
    Fail,
}

/// Result of fetching one overview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedPage {
    /// HTTP 200 with the page body.
    Html(String),
    /// Any other HTTP status.
    Status(u16),
}

/// Source of overview pages. Implemented by [HttpClient]; tests substitute canned pages.
pub trait PageSource {
    /// Fetch the page for one pair. Transport failures are errors; non-200 responses are
    /// returned as [FetchedPage::Status].
    fn fetch(&mut self, pair: &FetchPair) -> Result<FetchedPage, ScraperError>;
}

/// Progress notifications from [collect_revenue].
#[derive(Debug, Clone, Copy)]
pub enum ScrapeEvent<'a> {
    /// A state's year loop is starting; `years` is the number of pairs to fetch.
    StateStarted { state: &'a str, years: u32 },
    /// One pair finished (successfully or skipped).
    YearDone { state: &'a str, year: i32 },
    /// All years for a state are done.
    StateFinished { state: &'a str, records: usize },
}

/// Options for a scrape run: progress callback and missing-table handling.
pub struct ScrapeOptions<'a> {
    pub progress: Option<&'a dyn Fn(ScrapeEvent<'_>)>,
    pub missing_table: MissingTableBehavior,
}

impl Default for ScrapeOptions<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            missing_table: MissingTableBehavior::Skip,
        }
    }
}

impl ScrapeOptions<'_> {
    fn emit(&self, event: ScrapeEvent<'_>) {
        if let Some(p) = self.progress {
            p(event);
        }
    }
}

/// Fetch one pair and turn its table into tagged records.
///
/// Returns `Ok(None)` when the pair is skipped (non-200, or missing table in skip mode).
pub fn scrape_pair(
    source: &mut dyn PageSource,
    pair: &FetchPair,
    missing_table: MissingTableBehavior,
) -> Result<Option<Vec<CommodityRecord>>, ScraperError> {
    let html = match source.fetch(pair)? {
        FetchedPage::Html(html) => html,
        FetchedPage::Status(status) => {
            tracing::warn!(
                state = %pair.state,
                year = pair.year,
                status,
                "Failed to retrieve the webpage. Status code: {}",
                status
            );
            return Ok(None);
        }
    };
    match overview::parse_overview_table(&html, pair)? {
        Some(rows) => {
            let records = overview::into_records(rows, pair);
            tracing::debug!(
                state = %pair.state,
                year = pair.year,
                records = records.len(),
                "parsed overview table"
            );
            Ok(Some(records))
        }
        None => match missing_table {
            MissingTableBehavior::Skip => {
                tracing::warn!(
                    state = %pair.state,
                    year = pair.year,
                    "No commodity table on overview page. Skipped."
                );
                Ok(None)
            }
            MissingTableBehavior::Fail => Err(ScraperError::MissingTable {
                state: pair.state.clone(),
                year: pair.year,
            }),
        },
    }
}

/// Run the state × year loop and accumulate every record in iteration order.
///
/// States are visited in the given order and years ascending. Network errors abort the
/// run. The run fails with [ScraperError::NoRecordsRetrieved] only when no pair yielded a
/// table; a table whose rows were all filtered out still counts and yields no records.
pub fn collect_revenue(
    source: &mut dyn PageSource,
    request: &ScrapeRequest,
    options: &ScrapeOptions<'_>,
) -> Result<Vec<CommodityRecord>, ScraperError> {
    let mut all = Vec::new();
    let mut tables = 0usize;
    for state in &request.states {
        options.emit(ScrapeEvent::StateStarted {
            state: state.as_str(),
            years: request.year_count(),
        });
        let before = all.len();
        for year in request.years() {
            let pair = FetchPair {
                state: state.clone(),
                year,
            };
            if let Some(records) = scrape_pair(source, &pair, options.missing_table)? {
                tables += 1;
                all.extend(records);
            }
            options.emit(ScrapeEvent::YearDone {
                state: state.as_str(),
                year,
            });
        }
        options.emit(ScrapeEvent::StateFinished {
            state: state.as_str(),
            records: all.len() - before,
        });
    }
    if tables == 0 {
        return Err(ScraperError::NoRecordsRetrieved);
    }
    tracing::info!(tables, records = all.len(), "scrape complete");
    Ok(all)
}
