//! USDA NASS state overview adapter. Fetches one page per (state, year), extracts the
//! commodity table, and derives unit and amount produced.

use crate::model::{CommodityRecord, FetchPair};
use crate::scraper::error::ScraperError;
use crate::scraper::{FetchedPage, HttpClient, PageSource};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

pub const OVERVIEW_URL: &str = "https://www.nass.usda.gov/Quick_Stats/Ag_Overview/stateOverview.php";

/// Number of data columns per commodity row.
const CELLS_PER_ROW: usize = 7;

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::Selector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Overview URL for a fetch pair. The state is uppercased in the query.
pub fn overview_url(pair: &FetchPair) -> Result<Url, ScraperError> {
    let year = pair.year.to_string();
    Url::parse_with_params(
        OVERVIEW_URL,
        &[("state", pair.state.to_uppercase().as_str()), ("year", year.as_str())],
    )
    .map_err(|e| ScraperError::InvalidUrl {
        state: pair.state.clone(),
        year: pair.year,
        reason: e.to_string(),
    })
}

impl PageSource for HttpClient {
    fn fetch(&mut self, pair: &FetchPair) -> Result<FetchedPage, ScraperError> {
        let url = overview_url(pair)?;
        let url_str = url.to_string();
        tracing::debug!(url = %url_str, "GET");
        let response = self.get(url).map_err(|e| ScraperError::Network {
            url: url_str.clone(),
            source: e,
        })?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Ok(FetchedPage::Status(status.as_u16()));
        }
        let body = response.text().map_err(|e| ScraperError::BodyRead {
            url: url_str,
            source: e,
        })?;
        Ok(FetchedPage::Html(body))
    }
}

/// One table row as scraped, before filtering and derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub commodity: String,
    pub planted_acres: String,
    pub harvested_acres: String,
    pub yield_per_acre: String,
    pub production: String,
    pub price_per_unit: String,
    pub value_of_production: String,
}

/// Text of an element: each text fragment trimmed, then concatenated.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// Extract rows from the first `table[border="1"]`.
///
/// Returns `Ok(None)` when the page has no such table. The first row is the header and is
/// skipped; rows with one cell or fewer are ignored. A row with fewer than seven cells is an
/// error since the column layout can no longer be trusted.
pub fn parse_overview_table(
    html: &str,
    pair: &FetchPair,
) -> Result<Option<Vec<RawRow>>, ScraperError> {
    let doc = Html::parse_document(html);
    let table_sel = parse_selector("table[border=\"1\"]")?;
    let tr_sel = parse_selector("tr")?;
    let td_sel = parse_selector("td")?;

    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(None);
    };

    let mut rows = Vec::new();
    for (row_index, tr) in table.select(&tr_sel).enumerate().skip(1) {
        let cells: Vec<String> = tr.select(&td_sel).map(cell_text).collect();
        if cells.len() <= 1 {
            continue;
        }
        if cells.len() < CELLS_PER_ROW {
            return Err(ScraperError::MalformedRow {
                state: pair.state.clone(),
                year: pair.year,
                row: row_index,
                cells: cells.len(),
            });
        }
        let mut it = cells.into_iter();
        let mut next = || it.next().unwrap_or_default();
        rows.push(RawRow {
            commodity: next(),
            planted_acres: next(),
            harvested_acres: next(),
            yield_per_acre: next(),
            production: next(),
            price_per_unit: next(),
            value_of_production: next(),
        });
    }
    Ok(Some(rows))
}

/// Unit of the price per unit: text after the last `/`, trimmed. No `/` yields the whole
/// trimmed string.
pub fn derive_unit(price_per_unit: &str) -> String {
    price_per_unit
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Leading magnitude of the production: text before the first space, trimmed.
pub fn derive_amount_produced(production: &str) -> String {
    production
        .split(' ')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Drop rows with a blank value of production, derive unit and amount produced, and tag
/// each row with the pair's year and lowercased state.
pub fn into_records(rows: Vec<RawRow>, pair: &FetchPair) -> Vec<CommodityRecord> {
    let state = pair.state.to_lowercase();
    rows.into_iter()
        .filter(|r| !r.value_of_production.trim().is_empty())
        .map(|r| CommodityRecord {
            unit: derive_unit(&r.price_per_unit),
            amount_produced: derive_amount_produced(&r.production),
            commodity: r.commodity,
            planted_acres: r.planted_acres,
            harvested_acres: r.harvested_acres,
            yield_per_acre: r.yield_per_acre,
            production: r.production,
            price_per_unit: r.price_per_unit,
            value_of_production: r.value_of_production,
            year: pair.year,
            state: state.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(state: &str, year: i32) -> FetchPair {
        FetchPair {
            state: state.to_string(),
            year,
        }
    }

    const OVERVIEW_HTML: &str = r#"<!DOCTYPE html><html><body>
<table><tr><td>Layout table</td><td>ignored</td></tr></table>
<table border="1">
<tr><th>Commodity</th><th>Planted All Purpose Acres</th><th>Harvested Acres</th><th>Yield</th><th>Production</th><th>Price per Unit</th><th>Value of Production in Dollars</th></tr>
<tr><td> CORN </td><td>70,000</td><td>20,000</td><td>180 BU / ACRE</td><td>3,600,000 BU</td><td>$ 4.50 / BU</td><td>16,200,000</td></tr>
<tr><td>HAY</td><td></td><td>600,000</td><td>3.8 TONS / ACRE</td><td>2,280,000 TONS</td><td>$ 180.00 / TON</td><td>410,400,000</td></tr>
<tr><td>BARLEY</td><td>35,000</td><td>25,000</td><td></td><td></td><td></td><td>  </td></tr>
<tr><td colspan="7">Footnote</td></tr>
</table>
</body></html>"#;

    #[test]
    fn overview_url_uppercases_state() -> Result<(), ScraperError> {
        let url = overview_url(&pair("utah", 2010))?;
        assert_eq!(
            url.as_str(),
            "https://www.nass.usda.gov/Quick_Stats/Ag_Overview/stateOverview.php?state=UTAH&year=2010"
        );
        Ok(())
    }

    #[test]
    fn overview_url_encodes_multi_word_state() -> Result<(), ScraperError> {
        let url = overview_url(&pair("New Mexico", 2020))?;
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            vec![
                ("state".to_string(), "NEW MEXICO".to_string()),
                ("year".to_string(), "2020".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_table_skips_header_and_single_cell_rows() -> Result<(), ScraperError> {
        let rows = parse_overview_table(OVERVIEW_HTML, &pair("UTAH", 2010))?
            .ok_or(ScraperError::MissingTable {
                state: "UTAH".into(),
                year: 2010,
            })?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].commodity, "CORN");
        assert_eq!(rows[0].price_per_unit, "$ 4.50 / BU");
        assert_eq!(rows[1].planted_acres, "");
        assert_eq!(rows[2].value_of_production, "");
        Ok(())
    }

    #[test]
    fn parse_table_missing_returns_none() -> Result<(), ScraperError> {
        let html = "<html><body><table border=\"0\"><tr><td>a</td></tr></table></body></html>";
        assert!(parse_overview_table(html, &pair("UTAH", 2010))?.is_none());
        Ok(())
    }

    #[test]
    fn parse_table_short_row_is_malformed() {
        let html = r#"<table border="1"><tr><th>h</th></tr><tr><td>A</td><td>1</td><td>2</td></tr></table>"#;
        match parse_overview_table(html, &pair("UTAH", 2010)) {
            Err(ScraperError::MalformedRow { cells, row, .. }) => {
                assert_eq!(cells, 3);
                assert_eq!(row, 1);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn cell_text_joins_trimmed_fragments() {
        let html = r#"<table border="1"><tr><th>h</th></tr>
<tr><td><b> WHEAT </b>
 WINTER</td><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td></tr></table>"#;
        let rows = parse_overview_table(html, &pair("UTAH", 2010))
            .ok()
            .flatten()
            .unwrap_or_default();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commodity, "WHEATWINTER");
    }

    #[test]
    fn derive_unit_takes_text_after_last_slash() {
        assert_eq!(derive_unit("12.50 / BU"), "BU");
        assert_eq!(derive_unit("$ 1.20 / LB / CWT"), "CWT");
    }

    #[test]
    fn derive_unit_without_slash_is_whole_string() {
        assert_eq!(derive_unit("  (D)  "), "(D)");
        assert_eq!(derive_unit(""), "");
    }

    #[test]
    fn derive_amount_produced_takes_text_before_first_space() {
        assert_eq!(derive_amount_produced("123456 BU"), "123456");
        assert_eq!(derive_amount_produced("3,600,000 BU"), "3,600,000");
    }

    #[test]
    fn derive_amount_produced_without_space_is_whole_string() {
        assert_eq!(derive_amount_produced("123456"), "123456");
        assert_eq!(derive_amount_produced(""), "");
    }

    #[test]
    fn into_records_filters_blank_value_and_tags_rows() -> Result<(), ScraperError> {
        let p = pair("UTAH", 2010);
        let rows = parse_overview_table(OVERVIEW_HTML, &p)?.unwrap_or_default();
        let records = into_records(rows, &p);
        assert_eq!(records.len(), 2);
        let corn = &records[0];
        assert_eq!(corn.commodity, "CORN");
        assert_eq!(corn.unit, "BU");
        assert_eq!(corn.amount_produced, "3,600,000");
        assert_eq!(corn.value_of_production, "16,200,000");
        assert_eq!(records[1].unit, "TON");
        assert_eq!(records[1].amount_produced, "2,280,000");
        for r in &records {
            assert_eq!(r.year, 2010);
            assert_eq!(r.state, "utah");
        }
        Ok(())
    }
}
