use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{info, warn};

use crate::record::{COLUMNS, Cell, MatchRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "Matches";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    pub fn for_path(path: &Path) -> Self {
        let is_xlsx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if is_xlsx {
            TableFormat::Xlsx
        } else {
            TableFormat::Csv
        }
    }
}

/// Append-only JSONL log plus the end-of-run table.
pub struct RecordSink {
    log_path: PathBuf,
    table_path: PathBuf,
    log: File,
    appended: usize,
}

impl RecordSink {
    /// Opens (creating if needed) the log for appending. Existing lines are
    /// left untouched.
    pub fn open(log_path: &Path, table_path: &Path) -> Result<Self> {
        ensure_parent(log_path)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("open record log {}", log_path.display()))?;
        Ok(Self {
            log_path: log_path.to_path_buf(),
            table_path: table_path.to_path_buf(),
            log,
            appended: 0,
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Writes one record as a JSON line and syncs it to disk before
    /// returning.
    pub fn append(&mut self, record: &MatchRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("serialize match record")?;
        line.push('\n');
        self.log
            .write_all(line.as_bytes())
            .with_context(|| format!("append to {}", self.log_path.display()))?;
        self.log
            .sync_data()
            .with_context(|| format!("sync {}", self.log_path.display()))?;
        self.appended += 1;
        Ok(())
    }

    pub fn flush_table(&self, records: &[MatchRecord]) -> Result<TableFormat> {
        write_table(&self.table_path, records)
    }
}

/// Writes the consolidated table. The header is always `COLUMNS`, whatever
/// the records happen to carry.
pub fn write_table(path: &Path, records: &[MatchRecord]) -> Result<TableFormat> {
    ensure_parent(path)?;
    let format = TableFormat::for_path(path);
    match format {
        TableFormat::Csv => write_csv(path, records)?,
        TableFormat::Xlsx => write_xlsx(path, records)?,
    }
    info!(path = %path.display(), rows = records.len(), ?format, "table written");
    Ok(format)
}

fn write_csv(path: &Path, records: &[MatchRecord]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("create table {}", path.display()))?;
    file.write_all(UTF8_BOM).context("write byte-order mark")?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(COLUMNS).context("write csv header")?;
    for record in records {
        let row: Vec<String> = record.cells().iter().map(Cell::render).collect();
        writer
            .write_record(&row)
            .with_context(|| format!("write csv row for match {}", record.match_id))?;
    }
    writer.flush().context("flush csv")?;
    Ok(())
}

fn write_xlsx(path: &Path, records: &[MatchRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, name) in COLUMNS.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *name)
                .with_context(|| format!("write header cell {col}"))?;
        }
        for (idx, record) in records.iter().enumerate() {
            write_row(sheet, (idx + 1) as u32, &record.cells())?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_row(sheet: &mut Worksheet, row: u32, cells: &[Cell]) -> Result<()> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        let written = match cell {
            Cell::Null => continue,
            Cell::Text(s) => sheet.write_string(row, col, s),
            Cell::Int(n) => sheet.write_number(row, col, *n as f64),
            Cell::Float(f) => sheet.write_number(row, col, *f),
        };
        written.with_context(|| format!("write cell ({row},{col})"))?;
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct LogContents {
    pub records: Vec<MatchRecord>,
    pub corrupt_lines: usize,
    pub duplicates: usize,
}

impl LogContents {
    pub fn match_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.match_id.as_str())
    }
}

/// Reads a record log back. A missing file is an empty log; lines that do
/// not decode (a crash mid-write leaves at most one) are counted and
/// skipped, and repeated ids keep their first occurrence.
pub fn read_log(path: &Path) -> Result<LogContents> {
    let mut out = LogContents::default();
    if !path.exists() {
        return Ok(out);
    }
    let file = File::open(path).with_context(|| format!("open record log {}", path.display()))?;
    let mut seen = HashSet::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read line {} of {}", idx + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MatchRecord>(&line) {
            Ok(record) => {
                if seen.insert(record.match_id.clone()) {
                    out.records.push(record);
                } else {
                    out.duplicates += 1;
                }
            }
            Err(err) => {
                warn!(line = idx + 1, error = %err, "skipping undecodable log line");
                out.corrupt_lines += 1;
            }
        }
    }
    Ok(out)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StatValue;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(id: &str) -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        MatchRecord::new(id.to_string(), date, "LaLiga (España)".to_string())
    }

    #[test]
    fn append_writes_one_line_per_record() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("nested").join("log.jsonl");
        let mut sink = RecordSink::open(&log, &dir.path().join("t.csv")).unwrap();
        sink.append(&record("1")).unwrap();
        sink.append(&record("2")).unwrap();
        assert_eq!(sink.appended(), 2);

        let raw = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["match_id"], "1");
        assert!(first["possession_home"].is_null());
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("log.jsonl");
        let table = dir.path().join("t.csv");
        RecordSink::open(&log, &table).unwrap().append(&record("1")).unwrap();
        RecordSink::open(&log, &table).unwrap().append(&record("2")).unwrap();
        let back = read_log(&log).unwrap();
        assert_eq!(back.match_ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn csv_has_fixed_header_and_empty_nulls() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("t.csv");
        let mut rec = record("9");
        rec.stats.yellow_cards_away = Some(StatValue::Int(3));
        assert_eq!(write_table(&table, &[rec]).unwrap(), TableFormat::Csv);

        let raw = fs::read_to_string(&table).unwrap();
        let raw = raw.strip_prefix('\u{feff}').unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        let row: Vec<_> = lines.next().unwrap().split(',').collect();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], "9");
        assert_eq!(row[2], "LaLiga (España)");
        assert_eq!(row[3], "");
        assert_eq!(row[16], "3");
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("t.csv");
        write_table(&table, &[]).unwrap();
        let raw = fs::read_to_string(&table).unwrap();
        assert_eq!(raw.trim_start_matches('\u{feff}').trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn xlsx_extension_selects_workbook() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("t.XLSX");
        assert_eq!(write_table(&table, &[record("1")]).unwrap(), TableFormat::Xlsx);
        let bytes = fs::read(&table).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn read_log_skips_corrupt_and_duplicate_lines() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("log.jsonl");
        let good = serde_json::to_string(&record("1")).unwrap();
        let other = serde_json::to_string(&record("2")).unwrap();
        fs::write(&log, format!("{good}\n\n{{\"match_id\": \n{good}\n{other}\n")).unwrap();
        let back = read_log(&log).unwrap();
        assert_eq!(back.records.len(), 2);
        assert_eq!(back.corrupt_lines, 1);
        assert_eq!(back.duplicates, 1);
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempdir().unwrap();
        let back = read_log(&dir.path().join("absent.jsonl")).unwrap();
        assert!(back.records.is_empty());
    }
}
