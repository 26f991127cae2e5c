use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};

use crate::dates::{self, DateRange};
use crate::http_client::{Politeness, RetryPolicy};

pub const DEFAULT_API_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/soccer";
pub const DEFAULT_LEAGUE: &str = "eng.1";
pub const DEFAULT_START: &str = "2010-01-01";

const DEFAULT_SCOREBOARD_DELAY_MS: u64 = 250;
const DEFAULT_SUMMARY_DELAY_MS: u64 = 600;
const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_RETRY_BASE_MS: u64 = 2_000;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const LEAGUE_LABELS: &[(&str, &str)] = &[
    ("eng.1", "Premier League"),
    ("esp.1", "LaLiga (España)"),
    ("fra.1", "Ligue 1"),
    ("ger.1", "Bundesliga"),
    ("ita.1", "Serie A"),
    ("per.1", "Liga 1 (Perú)"),
];

/// Human label for a league code; unknown codes label as themselves.
pub fn league_label(code: &str) -> String {
    LEAGUE_LABELS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code.trim()))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.trim().to_string())
}

#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub base_url: String,
}

impl ApiEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn scoreboard_url(&self, league_code: &str) -> String {
        format!("{}/{league_code}/scoreboard", self.base_url)
    }

    pub fn summary_url(&self, league_code: &str) -> String {
        format!("{}/{league_code}/summary", self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub league_code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub scoreboard_delay: Duration,
    pub summary_delay: Duration,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub timeout: Duration,
    pub api_base: String,
    pub out_dir: PathBuf,
    pub log_path: Option<PathBuf>,
    pub table_path: Option<PathBuf>,
    pub resume: bool,
}

impl CrawlConfig {
    pub fn defaults() -> Self {
        let start = NaiveDate::parse_from_str(DEFAULT_START, "%Y-%m-%d").unwrap_or(NaiveDate::MIN);
        Self {
            league_code: DEFAULT_LEAGUE.to_string(),
            start,
            end: Local::now().date_naive(),
            scoreboard_delay: Duration::from_millis(DEFAULT_SCOREBOARD_DELAY_MS),
            summary_delay: Duration::from_millis(DEFAULT_SUMMARY_DELAY_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_base: DEFAULT_API_BASE.to_string(),
            out_dir: PathBuf::from("."),
            log_path: None,
            table_path: None,
            resume: false,
        }
    }

    /// Defaults overridden by `CRAWL_*` / `ESPN_API_BASE` variables. Call
    /// `load_dotenv` first if `.env` files should count.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::defaults();
        if let Some(league) = env_string("CRAWL_LEAGUE") {
            cfg.league_code = league;
        }
        if let Some(raw) = env_string("CRAWL_START") {
            cfg.start = parse_date_arg(&raw).context("CRAWL_START")?;
        }
        if let Some(raw) = env_string("CRAWL_END") {
            cfg.end = parse_date_arg(&raw).context("CRAWL_END")?;
        }
        if let Some(ms) = env_parse::<u64>("CRAWL_SCOREBOARD_DELAY_MS")? {
            cfg.scoreboard_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("CRAWL_SUMMARY_DELAY_MS")? {
            cfg.summary_delay = Duration::from_millis(ms);
        }
        if let Some(n) = env_parse::<u32>("CRAWL_MAX_ATTEMPTS")? {
            cfg.max_attempts = n;
        }
        if let Some(ms) = env_parse::<u64>("CRAWL_RETRY_BASE_MS")? {
            cfg.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("CRAWL_TIMEOUT_SECS")? {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(base) = env_string("ESPN_API_BASE") {
            cfg.api_base = base;
        }
        if let Some(dir) = env_string("CRAWL_OUT_DIR") {
            cfg.out_dir = PathBuf::from(dir);
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.league_code.trim().is_empty() {
            return Err(anyhow!("league code must not be empty"));
        }
        if self.max_attempts == 0 {
            return Err(anyhow!("retry count must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(anyhow!("request timeout must be positive"));
        }
        if self.api_base.trim().is_empty() {
            return Err(anyhow!("api base url must not be empty"));
        }
        Ok(())
    }

    pub fn league_label(&self) -> String {
        league_label(&self.league_code)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_base_delay,
        }
    }

    pub fn politeness(&self) -> Politeness {
        Politeness {
            scoreboard: self.scoreboard_delay,
            summary: self.summary_delay,
        }
    }

    pub fn endpoints(&self) -> ApiEndpoints {
        ApiEndpoints::new(self.api_base.clone())
    }

    fn file_stem(&self) -> String {
        format!(
            "espn_{}_{}_to_{}",
            self.league_code,
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    pub fn resolved_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| self.out_dir.join(format!("{}.jsonl", self.file_stem())))
    }

    pub fn resolved_table_path(&self) -> PathBuf {
        self.table_path
            .clone()
            .unwrap_or_else(|| self.out_dir.join(format!("{}.csv", self.file_stem())))
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Accepts `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.contains('T') || trimmed.contains(char::is_whitespace) {
        return Err(anyhow!("expected a date without time: {trimmed}"));
    }
    dates::parse_loose(trimmed).ok_or_else(|| anyhow!("invalid date: {trimmed}"))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{key}: invalid value {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_labels_fall_back_to_code() {
        assert_eq!(league_label("eng.1"), "Premier League");
        assert_eq!(league_label("PER.1"), "Liga 1 (Perú)");
        assert_eq!(league_label("usa.1"), "usa.1");
    }

    #[test]
    fn default_output_names() {
        let mut cfg = CrawlConfig::defaults();
        cfg.league_code = "per.1".to_string();
        cfg.start = parse_date_arg("2010-01-01").unwrap();
        cfg.end = parse_date_arg("20250928").unwrap();
        cfg.out_dir = PathBuf::from("out");
        assert_eq!(
            cfg.resolved_log_path(),
            PathBuf::from("out/espn_per.1_2010-01-01_to_2025-09-28.jsonl")
        );
        assert_eq!(
            cfg.resolved_table_path(),
            PathBuf::from("out/espn_per.1_2010-01-01_to_2025-09-28.csv")
        );
        cfg.table_path = Some(PathBuf::from("x.xlsx"));
        assert_eq!(cfg.resolved_table_path(), PathBuf::from("x.xlsx"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = CrawlConfig::defaults();
        assert!(cfg.validate().is_ok());
        cfg.max_attempts = 0;
        assert!(cfg.validate().is_err());
        cfg.max_attempts = 2;
        cfg.league_code = " ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        let api = ApiEndpoints::new("http://localhost:9/soccer/");
        assert_eq!(api.scoreboard_url("eng.1"), "http://localhost:9/soccer/eng.1/scoreboard");
        assert_eq!(api.summary_url("eng.1"), "http://localhost:9/soccer/eng.1/summary");
    }

    #[test]
    fn date_args_reject_timestamps() {
        assert!(parse_date_arg("2024-05-01T00:00Z").is_err());
        assert!(parse_date_arg("2024-05-01 00:00").is_err());
        assert!(parse_date_arg("not a date").is_err());
    }
}
