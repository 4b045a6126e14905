//! Data model for scraped state overview statistics.
//!
//! All scraped values stay as strings; the upstream table is not numerically typed
//! (thousands separators, "(D)" suppression markers, and so on).

use serde::Serialize;

/// CSV header names, in output order.
pub const COLUMNS: [&str; 11] = [
    "Commodity",
    "Planted All Purpose Acres",
    "Harvested Acres",
    "Yield",
    "Production",
    "Price per Unit",
    "Value of Production in Dollars",
    "Unit",
    "Amount Produced",
    "Year",
    "State",
];

/// One commodity row for a given state and year.
///
/// Field order matches [COLUMNS]; serde renames produce the CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommodityRecord {
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Planted All Purpose Acres")]
    pub planted_acres: String,
    #[serde(rename = "Harvested Acres")]
    pub harvested_acres: String,
    #[serde(rename = "Yield")]
    pub yield_per_acre: String,
    /// Magnitude and unit, e.g. `"123,456 BU"`.
    #[serde(rename = "Production")]
    pub production: String,
    /// Value and unit, e.g. `"12.50 / BU"`.
    #[serde(rename = "Price per Unit")]
    pub price_per_unit: String,
    #[serde(rename = "Value of Production in Dollars")]
    pub value_of_production: String,
    /// Text after the last `/` of the price per unit.
    #[serde(rename = "Unit")]
    pub unit: String,
    /// Text before the first space of the production.
    #[serde(rename = "Amount Produced")]
    pub amount_produced: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Lowercased state name.
    #[serde(rename = "State")]
    pub state: String,
}

/// One (state, year) combination; drives exactly one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPair {
    pub state: String,
    pub year: i32,
}

/// What to scrape: states in the given order, years inclusive.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub states: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
}

impl ScrapeRequest {
    /// Years in ascending order. Empty when `start_year > end_year`.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }

    /// Number of years per state.
    pub fn year_count(&self) -> u32 {
        let span = i64::from(self.end_year) - i64::from(self.start_year) + 1;
        span.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// All fetch pairs, states outer and years inner.
    pub fn pairs(&self) -> impl Iterator<Item = FetchPair> + '_ {
        self.states.iter().flat_map(move |state| {
            self.years().map(move |year| FetchPair {
                state: state.clone(),
                year,
            })
        })
    }
}
