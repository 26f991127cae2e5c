use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::Value;
use std::hint::black_box;

use espn_match_crawler::event_parse::parse_basic;
use espn_match_crawler::scoreboard::scoreboard_events;
use espn_match_crawler::sink::write_table;
use espn_match_crawler::stats::{normalize, normalize_number_str};

fn bench_number_coercion(c: &mut Criterion) {
    let inputs = ["58.5%", "1,012", "7", "--", "abc%", "  12.0 "];
    c.bench_function("number_coercion", |b| {
        b.iter(|| {
            for raw in inputs {
                black_box(normalize_number_str(black_box(raw)));
            }
        })
    });
}

fn bench_summary_normalize(c: &mut Criterion) {
    let payload: Value = serde_json::from_str(SUMMARY_JSON).expect("valid fixture json");
    c.bench_function("summary_normalize", |b| {
        b.iter(|| {
            let stats = normalize(Some(black_box(&payload)));
            black_box(stats.is_empty());
        })
    });
}

fn bench_scoreboard_parse(c: &mut Criterion) {
    let bucket = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    c.bench_function("scoreboard_parse", |b| {
        b.iter(|| {
            let body: Value = serde_json::from_str(black_box(SCOREBOARD_JSON)).unwrap();
            for event in scoreboard_events(body) {
                black_box(parse_basic(&event, "Premier League", bucket));
            }
        })
    });
}

fn bench_table_write(c: &mut Criterion) {
    let bucket = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let payload: Value = serde_json::from_str(SUMMARY_JSON).expect("valid fixture json");
    let body: Value = serde_json::from_str(SCOREBOARD_JSON).expect("valid fixture json");
    let template = scoreboard_events(body)
        .first()
        .map(|event| parse_basic(event, "Premier League", bucket).record)
        .expect("fixture has an event");
    let records = (0..500)
        .map(|idx| {
            let mut rec = template.clone();
            rec.match_id = format!("{}", 400 + idx);
            rec.stats = normalize(Some(&payload));
            rec
        })
        .collect::<Vec<_>>();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bench.csv");
    c.bench_function("table_write_500", |b| {
        b.iter(|| {
            write_table(&path, black_box(&records)).unwrap();
        })
    });
}

criterion_group!(
    perf,
    bench_number_coercion,
    bench_summary_normalize,
    bench_scoreboard_parse,
    bench_table_write
);
criterion_main!(perf);

static SCOREBOARD_JSON: &str = include_str!("../tests/fixtures/scoreboard_2024-05-01.json");
static SUMMARY_JSON: &str = include_str!("../tests/fixtures/summary_400.json");
