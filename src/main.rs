use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing::info_span;

use espn_match_crawler::config::{self, CrawlConfig};
use espn_match_crawler::logging;
use espn_match_crawler::pipeline::{CrawlSummary, Crawler};

/// Crawl ESPN soccer scoreboards day by day and collect match statistics.
///
/// Every flag falls back to its CRAWL_* environment variable (also read from
/// .env / .env.local), then to the built-in default.
#[derive(Parser, Debug)]
#[command(name = "espn_match_crawler", version)]
struct Cli {
    /// League code, e.g. eng.1, esp.1, per.1
    #[arg(long)]
    league: Option<String>,
    /// First date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Last date (inclusive), YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
    /// Pause after each scoreboard request
    #[arg(long)]
    scoreboard_delay_ms: Option<u64>,
    /// Pause after each summary request
    #[arg(long)]
    summary_delay_ms: Option<u64>,
    /// Total attempts per request
    #[arg(long)]
    retries: Option<u32>,
    /// Backoff unit; attempt n waits n times this
    #[arg(long)]
    retry_base_ms: Option<u64>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    api_base: Option<String>,
    /// Directory for the default output file names
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// JSONL record log path
    #[arg(long)]
    log: Option<PathBuf>,
    /// Table path; .xlsx writes a workbook, anything else CSV
    #[arg(long)]
    table: Option<PathBuf>,
    /// Skip match ids already in the record log and keep its rows in the table
    #[arg(long)]
    resume: bool,
}

impl Cli {
    fn apply(self, mut cfg: CrawlConfig) -> CrawlConfig {
        if let Some(league) = self.league {
            cfg.league_code = league;
        }
        if let Some(start) = self.start {
            cfg.start = start;
        }
        if let Some(end) = self.end {
            cfg.end = end;
        }
        if let Some(ms) = self.scoreboard_delay_ms {
            cfg.scoreboard_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.summary_delay_ms {
            cfg.summary_delay = Duration::from_millis(ms);
        }
        if let Some(n) = self.retries {
            cfg.max_attempts = n;
        }
        if let Some(ms) = self.retry_base_ms {
            cfg.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.timeout_secs {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(base) = self.api_base {
            cfg.api_base = base;
        }
        if let Some(dir) = self.out_dir {
            cfg.out_dir = dir;
        }
        cfg.log_path = self.log.or(cfg.log_path);
        cfg.table_path = self.table.or(cfg.table_path);
        cfg.resume |= self.resume;
        cfg
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    config::parse_date_arg(raw).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    config::load_dotenv();
    let _guard = logging::init_logging();

    let cfg = Cli::parse().apply(CrawlConfig::from_env()?);
    cfg.validate()?;

    let run_id = logging::run_id();
    let span = info_span!("crawl", %run_id, league = %cfg.league_code);
    let _entered = span.enter();

    println!("Scraping ESPN API");
    println!("League: {}", cfg.league_label());
    println!("Range: {} -> {}", cfg.start, cfg.end);

    let summary = Crawler::from_config(&cfg)?.run()?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &CrawlSummary) {
    println!();
    println!("Crawl complete");
    println!(
        "Dates: {} scanned, {} with matches",
        summary.dates_total, summary.dates_with_events
    );
    println!(
        "Events: {} seen, {} duplicates skipped, {} without id",
        summary.events_seen, summary.duplicates_skipped, summary.events_without_id
    );
    println!(
        "Details: {} ok, {} failed",
        summary.details_succeeded, summary.details_failed
    );
    println!("Matches extracted: {}", summary.records_written);
    if summary.resumed_records > 0 {
        println!("Carried over from earlier runs: {}", summary.resumed_records);
    }
    println!("Time: {:.1}s", summary.elapsed.as_secs_f64());
    if summary.records_written == 0 {
        println!(
            "No matches extracted. ESPN may have no coverage of {} for this range, or requests failed.",
            summary.league_label
        );
    }
    println!("Log: {}", summary.log_path.display());
    println!("Table: {} ({} rows)", summary.table_path.display(), summary.table_rows);
}
