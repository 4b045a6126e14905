//! CLI parsing and orchestration. Parses args, runs the state × year scrape, writes the
//! aggregated CSV. Maps errors to exit codes.

use crate::config;
use crate::export::{self, ExportError};
use crate::model::ScrapeRequest;
use crate::scraper::overview::overview_url;
use crate::scraper::{
    collect_revenue, HttpClient, MissingTableBehavior, ScrapeEvent, ScrapeOptions, ScraperError,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(_) => 2,
            CliRunError::Export(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nass-revenue")]
#[command(
    about = "Scrape USDA NASS state agriculture overviews for a range of years and write one aggregated CSV"
)]
#[command(
    after_help = "Config file keys (output_dir, user_agent, timeout_secs, missing_table) are read from ./nass-revenue.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// First year to fetch (inclusive).
    #[arg(long = "start_year", visible_alias = "start-year", default_value_t = 2002)]
    pub start_year: i32,

    /// Last year to fetch (inclusive).
    #[arg(long = "end_year", visible_alias = "end-year", default_value_t = 2023)]
    pub end_year: i32,

    /// One or more state names, case-insensitive (e.g. UTAH TEXAS "new mexico").
    #[arg(
        long = "states",
        visible_alias = "state",
        num_args = 1..,
        default_value = "UTAH"
    )]
    pub states: Vec<String>,

    /// Directory for agg_revenue_<start>-<end>.csv. Default: config output_dir, else ".".
    #[arg(long = "output_path", visible_alias = "output-path")]
    pub output_path: Option<PathBuf>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Page fetched without a commodity table: skip (default) or fail.
    #[arg(long, value_parser = parse_missing_table)]
    pub missing_table: Option<MissingTableBehavior>,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and verbose error chain.
    #[arg(long)]
    pub verbose: bool,

    /// Print the fetch plan and output path without making any requests.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_missing_table(s: &str) -> Result<MissingTableBehavior, String> {
    match s.trim().to_lowercase().as_str() {
        "skip" => Ok(MissingTableBehavior::Skip),
        "fail" => Ok(MissingTableBehavior::Fail),
        _ => Err(format!(
            "Invalid --missing-table value: '{}'. Use skip or fail.",
            s
        )),
    }
}

/// Output directory must already exist.
fn validate_output_dir(dir: &Path) -> Result<(), CliRunError> {
    if !dir.is_dir() {
        return Err(CliRunError::InvalidInput(format!(
            "Cannot write output: {}: directory does not exist.",
            dir.display()
        )));
    }
    Ok(())
}

fn new_state_bar(years: u32) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(years as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
    {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let output_dir: PathBuf = args
        .output_path
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));
    validate_output_dir(&output_dir)?;

    let missing_table = match args.missing_table {
        Some(b) => b,
        None => match config.as_ref().and_then(|c| c.missing_table.as_deref()) {
            Some(s) => parse_missing_table(s)
                .map_err(|e| CliRunError::InvalidInput(format!("Invalid config: {}", e)))?,
            None => MissingTableBehavior::Skip,
        },
    };
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));

    let request = ScrapeRequest {
        states: args.states.clone(),
        start_year: args.start_year,
        end_year: args.end_year,
    };
    let output_path = export::output_path(&output_dir, args.start_year, args.end_year);

    if args.dry_run {
        let mut pairs = request.pairs();
        let first = pairs.next();
        eprintln!("Requests: {}", usize::from(first.is_some()) + pairs.count());
        if let Some(pair) = first {
            eprintln!("First: {}", overview_url(&pair)?);
        }
        eprintln!("Output: {}", output_path.display());
        return Ok(());
    }

    let mut builder = HttpClient::builder().timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |event: ScrapeEvent<'_>| match event {
        ScrapeEvent::StateStarted { state, years } => {
            eprintln!("===== {} =====", state);
            *progress_state.borrow_mut() = Some(new_state_bar(years));
        }
        ScrapeEvent::YearDone { state, year } => {
            if let Some(pb) = progress_state.borrow().as_ref() {
                pb.inc(1);
                pb.set_message(format!("{} {}", state, year));
            }
        }
        ScrapeEvent::StateFinished { state, records } => {
            if let Some(pb) = progress_state.borrow_mut().take() {
                pb.disable_steady_tick();
                pb.finish_and_clear();
            }
            tracing::info!(state, records, "state done");
        }
    };
    let options = ScrapeOptions {
        progress: if args.quiet { None } else { Some(&progress_cb) },
        missing_table,
    };

    let result = collect_revenue(&mut client, &request, &options);
    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.finish_and_clear();
    }
    let records = result?;

    let rows = export::write_csv(&records, &output_path)?;
    if !args.quiet {
        eprintln!("Wrote {} ({} rows)", output_path.display(), rows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["nass-revenue"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn args_defaults() {
        let args = parse(&[]);
        assert_eq!(args.start_year, 2002);
        assert_eq!(args.end_year, 2023);
        assert_eq!(args.states, vec!["UTAH".to_string()]);
        assert!(args.output_path.is_none());
        assert!(args.missing_table.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn args_underscore_flags() {
        let args = parse(&[
            "--start_year",
            "2010",
            "--end_year",
            "2012",
            "--states",
            "UTAH",
            "texas",
            "--output_path",
            "out",
        ]);
        assert_eq!(args.start_year, 2010);
        assert_eq!(args.end_year, 2012);
        assert_eq!(args.states, vec!["UTAH".to_string(), "texas".to_string()]);
        assert_eq!(args.output_path, Some(PathBuf::from("out")));
    }

    #[test]
    fn args_kebab_aliases() {
        let args = parse(&["--start-year", "2015", "--end-year", "2016", "--output-path", "x"]);
        assert_eq!(args.start_year, 2015);
        assert_eq!(args.end_year, 2016);
        assert_eq!(args.output_path, Some(PathBuf::from("x")));
    }

    #[test]
    fn args_states_requires_a_value() {
        assert!(Args::try_parse_from(["nass-revenue", "--states"]).is_err());
    }

    #[test]
    fn args_missing_table_flag() {
        let args = parse(&["--missing-table", "FAIL"]);
        assert_eq!(args.missing_table, Some(MissingTableBehavior::Fail));
        assert!(Args::try_parse_from(["nass-revenue", "--missing-table", "ignore"]).is_err());
    }

    #[test]
    fn parse_missing_table_all() {
        assert_eq!(
            parse_missing_table("skip").unwrap(),
            MissingTableBehavior::Skip
        );
        assert_eq!(
            parse_missing_table(" Fail ").unwrap(),
            MissingTableBehavior::Fail
        );
        assert!(parse_missing_table("other").is_err());
    }

    #[test]
    fn validate_output_dir_exists() {
        assert!(validate_output_dir(&std::env::temp_dir()).is_ok());
    }

    #[test]
    fn validate_output_dir_missing() {
        let result = validate_output_dir(Path::new("/nonexistent_dir_nass_revenue_xyz"));
        match result {
            Err(CliRunError::InvalidInput(msg)) => {
                assert!(msg.contains("directory does not exist"))
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn run_rejects_missing_output_dir() {
        let args = parse(&["--output_path", "/nonexistent_dir_nass_revenue_xyz", "--dry-run"]);
        let err = run(&args).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn run_dry_run_makes_no_requests_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_string_lossy().into_owned();
        let args = parse(&[
            "--start_year",
            "2010",
            "--end_year",
            "2012",
            "--output_path",
            &out,
            "--dry-run",
            "--quiet",
        ]);
        run(&args).unwrap();
        assert!(!dir.path().join("agg_revenue_2010-2012.csv").exists());
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(
            CliRunError::Scraper(ScraperError::NoRecordsRetrieved).exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Export(ExportError::Io {
                path: PathBuf::from("x.csv"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
            .exit_code(),
            3
        );
    }
}
