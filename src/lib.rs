pub mod config;
pub mod dates;
pub mod dedup;
pub mod event_parse;
pub mod fields;
pub mod http_client;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod scoreboard;
pub mod sink;
pub mod stats;
pub mod summary;

pub use config::CrawlConfig;
pub use pipeline::{CrawlSummary, Crawler};
pub use record::{COLUMNS, MatchRecord, MatchStats, StatValue};
