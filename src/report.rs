//! CSV export of per-game records.

use std::io;

use crate::error::ExportError;
use crate::types::GameRecord;

pub const CSV_HEADER: &str = "algorithm,objective,dims,win,clicks,time_ms,guesses,completion";

/// Benchmark sweeps also carry the per-game seed.
pub const BENCHMARK_HEADER: &str = "algorithm,objective,dims,seed,win,clicks,time_ms,guesses,completion";

fn row(r: &GameRecord) -> String {
    row_with(r, None)
}

fn row_with(r: &GameRecord, seed: Option<String>) -> String {
    let dims = r.dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("x");
    let objective = r.objective.map_or_else(|| "N/A".to_string(), |o| o.to_string());
    let prefix = match seed {
        Some(seed) => format!("{},{},{},{}", r.algorithm, objective, dims, seed),
        None => format!("{},{},{}", r.algorithm, objective, dims),
    };
    format!(
        "{},{},{},{},{},{:.2}",
        prefix,
        if r.win { "TRUE" } else { "FALSE" },
        r.clicks,
        r.time_ms,
        r.guesses,
        r.completion
    )
}

/// Render `records` as CSV, one row per game under [`CSV_HEADER`].
///
/// Refuses to produce a header-only document.
pub fn to_csv(records: &[GameRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    let mut csv = String::with_capacity(64 * (records.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for r in records {
        csv.push_str(&row(r));
        csv.push('\n');
    }
    Ok(csv)
}

/// Like [`to_csv`] with a `seed` column after `dims` (`N/A` for unseeded games).
pub fn to_benchmark_csv(records: &[GameRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    let mut csv = String::with_capacity(72 * (records.len() + 1));
    csv.push_str(BENCHMARK_HEADER);
    csv.push('\n');
    for r in records {
        let seed = r.seed.map_or_else(|| "N/A".to_string(), |s| s.to_string());
        csv.push_str(&row_with(r, Some(seed)));
        csv.push('\n');
    }
    Ok(csv)
}

/// Streaming variant of [`to_csv`].
pub fn write_csv<W: io::Write>(mut out: W, records: &[GameRecord]) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    writeln!(out, "{CSV_HEADER}")?;
    for r in records {
        writeln!(out, "{}", row(r))?;
    }
    out.flush()?;
    Ok(())
}
