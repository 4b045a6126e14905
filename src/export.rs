//! CSV output. Consumes accumulated commodity records and writes one file per run.

use crate::model::{CommodityRecord, COLUMNS};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the CSV writer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV: {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// File name for a run, e.g. `agg_revenue_2010-2012.csv`.
pub fn output_file_name(start_year: i32, end_year: i32) -> String {
    format!("agg_revenue_{}-{}.csv", start_year, end_year)
}

/// Full output path inside `output_dir`.
pub fn output_path(output_dir: &Path, start_year: i32, end_year: i32) -> PathBuf {
    output_dir.join(output_file_name(start_year, end_year))
}

/// Write records as CSV with a header row and no index column. Overwrites `path`.
///
/// Returns the number of data rows written.
pub fn write_csv(records: &[CommodityRecord], path: &Path) -> Result<usize, ExportError> {
    tracing::debug!(path = %path.display(), rows = records.len(), "writing CSV");
    let csv_err = |source: csv::Error| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // Header is written explicitly so an empty slice still yields a valid file.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    wtr.write_record(COLUMNS).map_err(csv_err)?;
    for record in records {
        wtr.serialize(record).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(records.len())
}
