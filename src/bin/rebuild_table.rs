use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use espn_match_crawler::{logging, sink};

fn main() -> Result<()> {
    let _guard = logging::init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let log_path = parse_path_arg(&args, "log").context("missing --log <record log path>")?;
    let table_path =
        parse_path_arg(&args, "table").unwrap_or_else(|| log_path.with_extension("csv"));
    if table_path == log_path {
        return Err(anyhow!("table path must differ from the log path"));
    }
    if !log_path.exists() {
        return Err(anyhow!("record log {} does not exist", log_path.display()));
    }

    let contents = sink::read_log(&log_path)?;
    let format = sink::write_table(&table_path, &contents.records)?;

    println!("Table rebuilt");
    println!("Log: {}", log_path.display());
    println!("Table: {} ({:?})", table_path.display(), format);
    println!("Rows: {}", contents.records.len());
    if contents.duplicates > 0 {
        println!("Duplicate ids dropped: {}", contents.duplicates);
    }
    if contents.corrupt_lines > 0 {
        println!("Undecodable lines skipped: {}", contents.corrupt_lines);
    }
    Ok(())
}

/// `--name value` or `--name=value`. A value that is itself a flag does not
/// count.
fn parse_path_arg(args: &[String], name: &str) -> Option<PathBuf> {
    let prefix = format!("--{name}=");
    let flag = format!("--{name}");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() && !trimmed.starts_with("--") {
                return Some(PathBuf::from(trimmed));
            }
        }
        if *arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
            && !next.starts_with("--")
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_both_flag_forms() {
        let a = args(&["--log", "runs/a.jsonl", "--table=out.xlsx"]);
        assert_eq!(parse_path_arg(&a, "log"), Some(PathBuf::from("runs/a.jsonl")));
        assert_eq!(parse_path_arg(&a, "table"), Some(PathBuf::from("out.xlsx")));
    }

    #[test]
    fn flag_is_not_taken_as_value() {
        let a = args(&["--log", "--table", "out.csv"]);
        assert_eq!(parse_path_arg(&a, "log"), None);
        assert_eq!(parse_path_arg(&a, "table"), Some(PathBuf::from("out.csv")));
        assert_eq!(parse_path_arg(&args(&["--log=--table"]), "log"), None);
    }
}
