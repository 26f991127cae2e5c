use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{ApiEndpoints, CrawlConfig};
use crate::dates::DateRange;
use crate::dedup::DedupStore;
use crate::event_parse::parse_basic;
use crate::http_client::{ReqwestTransport, ResilientClient, Transport};
use crate::record::MatchRecord;
use crate::scoreboard::fetch_scoreboard;
use crate::sink::{self, RecordSink};
use crate::stats;
use crate::summary::fetch_summary;

/// Lifecycle of one match id within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Discovered,
    DetailRequested,
    DetailSucceeded,
    DetailFailed,
    Persisted,
}

impl MatchState {
    pub fn can_advance_to(self, next: MatchState) -> bool {
        use MatchState::*;
        matches!(
            (self, next),
            (Discovered, DetailRequested)
                | (DetailRequested, DetailSucceeded)
                | (DetailRequested, DetailFailed)
                | (DetailSucceeded, Persisted)
                | (DetailFailed, Persisted)
        )
    }

    pub fn is_final(self) -> bool {
        self == MatchState::Persisted
    }
}

fn advance(state: &mut MatchState, next: MatchState, match_id: &str) {
    debug_assert!(state.can_advance_to(next), "{state:?} -> {next:?}");
    debug!(match_id, from = ?*state, to = ?next, "match state");
    *state = next;
}

#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub league_code: String,
    pub league_label: String,
    pub log_path: PathBuf,
    pub table_path: PathBuf,
    pub dates_total: usize,
    pub dates_with_events: usize,
    pub events_seen: usize,
    pub events_without_id: usize,
    pub duplicates_skipped: usize,
    pub details_succeeded: usize,
    pub details_failed: usize,
    pub records_written: usize,
    pub resumed_records: usize,
    pub table_rows: usize,
    pub elapsed: Duration,
}

/// Sequential crawl: dates in order, events in response order, one detail
/// fetch per new match id, one log line per finished match.
pub struct Crawler<T = ReqwestTransport> {
    client: ResilientClient<T>,
    api: ApiEndpoints,
    league_code: String,
    league_label: String,
    range: DateRange,
    dedup: DedupStore,
    sink: RecordSink,
    records: Vec<MatchRecord>,
    resumed: usize,
}

impl Crawler<ReqwestTransport> {
    pub fn from_config(cfg: &CrawlConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(cfg.timeout)?;
        Self::with_transport(cfg, transport)
    }
}

impl<T: Transport> Crawler<T> {
    pub fn with_transport(cfg: &CrawlConfig, transport: T) -> Result<Self> {
        cfg.validate()?;
        let log_path = cfg.resolved_log_path();
        let table_path = cfg.resolved_table_path();

        let (dedup, records) = if cfg.resume {
            let prior = sink::read_log(&log_path)?;
            info!(
                path = %log_path.display(),
                records = prior.records.len(),
                corrupt = prior.corrupt_lines,
                "resuming from existing log"
            );
            (DedupStore::seeded(prior.match_ids()), prior.records)
        } else {
            (DedupStore::new(), Vec::new())
        };
        let sink = RecordSink::open(&log_path, &table_path)?;

        Ok(Self {
            client: ResilientClient::new(transport, cfg.retry_policy(), cfg.politeness()),
            api: cfg.endpoints(),
            league_code: cfg.league_code.trim().to_string(),
            league_label: cfg.league_label(),
            range: cfg.date_range(),
            dedup,
            sink,
            resumed: records.len(),
            records,
        })
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    pub fn run(mut self) -> Result<CrawlSummary> {
        let started = Instant::now();
        let mut summary = CrawlSummary {
            league_code: self.league_code.clone(),
            league_label: self.league_label.clone(),
            log_path: self.sink.log_path().to_path_buf(),
            table_path: self.sink.table_path().to_path_buf(),
            dates_total: self.range.len(),
            resumed_records: self.resumed,
            ..CrawlSummary::default()
        };
        info!(
            league = %self.league_label,
            start = %self.range.start(),
            end = %self.range.end(),
            days = summary.dates_total,
            "crawl started"
        );

        let range = self.range;
        for (idx, date) in range.iter().enumerate() {
            self.process_date(date, &mut summary)?;
            if (idx + 1) % 100 == 0 {
                info!(
                    done = idx + 1,
                    total = summary.dates_total,
                    records = summary.records_written,
                    "progress"
                );
            }
        }

        self.sink.flush_table(&self.records)?;
        summary.table_rows = self.records.len();
        summary.elapsed = started.elapsed();
        info!(
            records = summary.records_written,
            details_failed = summary.details_failed,
            elapsed_s = summary.elapsed.as_secs(),
            "crawl finished"
        );
        Ok(summary)
    }

    fn process_date(&mut self, date: NaiveDate, summary: &mut CrawlSummary) -> Result<()> {
        let events = fetch_scoreboard(&self.client, &self.api, date, &self.league_code);
        if events.is_empty() {
            return Ok(());
        }
        info!(%date, events = events.len(), "scoreboard");
        summary.dates_with_events += 1;
        for event in &events {
            summary.events_seen += 1;
            self.process_event(event, date, summary)?;
        }
        Ok(())
    }

    fn process_event(
        &mut self,
        event: &Value,
        bucket: NaiveDate,
        summary: &mut CrawlSummary,
    ) -> Result<()> {
        let parsed = parse_basic(event, &self.league_label, bucket);
        if !parsed.has_id() {
            debug!(%bucket, "event without id skipped");
            summary.events_without_id += 1;
            return Ok(());
        }
        let mut record = parsed.record;
        if !self.dedup.should_process(&record.match_id) {
            debug!(match_id = %record.match_id, "already processed");
            summary.duplicates_skipped += 1;
            return Ok(());
        }
        if !parsed.defaulted.is_empty() {
            debug!(match_id = %record.match_id, fields = ?parsed.defaulted, "fields defaulted");
        }

        let mut state = MatchState::Discovered;
        advance(&mut state, MatchState::DetailRequested, &record.match_id);
        let payload = fetch_summary(&self.client, &self.api, &record.match_id, &self.league_code);
        self.dedup.mark_processed(&record.match_id);

        if payload.is_some() {
            summary.details_succeeded += 1;
            advance(&mut state, MatchState::DetailSucceeded, &record.match_id);
        } else {
            summary.details_failed += 1;
            advance(&mut state, MatchState::DetailFailed, &record.match_id);
        }
        record.stats = stats::normalize(payload.as_ref());

        self.sink.append(&record)?;
        advance(&mut state, MatchState::Persisted, &record.match_id);
        self.records.push(record);
        summary.records_written += 1;
        debug_assert!(state.is_final());
        Ok(())
    }
}
