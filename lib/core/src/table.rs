//! Delimited text reader
//!
//! Parses header + rows from comma, tab or sniffed-delimiter text. Attempts run in that
//! order and the first one that parses cleanly wins.

use crate::error::{Error, Result};
use tracing::debug;

/// Delimiters considered when sniffing
const SNIFF_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Lines inspected when sniffing
const SNIFF_LINES: usize = 10;

/// Cell spellings treated as an absent value
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell denotes a missing value
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// A parsed delimited table, rows padded to the header width
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parses delimited text: comma first, then tab, then a sniffed delimiter
pub fn read_delimited(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(Error::Parse("input table is empty".to_string()));
    }

    let mut failures = Vec::new();
    for delimiter in [b',', b'\t'] {
        match parse_with(text, delimiter) {
            Ok(table) => return Ok(table),
            Err(e) => {
                debug!("Delimiter {:?} rejected: {}", delimiter as char, e);
                failures.push(e.to_string());
            }
        }
    }

    let sniffed = sniff_delimiter(text).ok_or_else(|| {
        Error::Parse(format!(
            "could not determine delimiter ({})",
            failures.join("; ")
        ))
    })?;
    parse_with(text, sniffed)
}

/// Parses `text` with one fixed delimiter
///
/// Rejects rows wider than the header and single-column parses whose header still
/// contains another candidate delimiter.
pub fn parse_with(text: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    if headers.len() == 1 {
        let other = SNIFF_CANDIDATES
            .iter()
            .find(|&&d| d != delimiter && headers[0].as_bytes().contains(&d));
        if let Some(other) = other {
            return Err(Error::Parse(format!(
                "single column header contains {:?}",
                *other as char
            )));
        }
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(Error::Parse(format!(
                "expected {} fields in row {}, saw {}",
                headers.len(),
                line + 1,
                record.len()
            )));
        }
        if record.len() == 1 && record[0].trim().is_empty() && headers.len() > 1 {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { delimiter, headers, rows })
}

/// Picks the candidate occurring the same non-zero number of times on every sampled
/// line, preferring the highest count. Falls back to the most frequent candidate on
/// the first line.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let first = lines.first()?;

    let count = |line: &str, d: u8| line.bytes().filter(|&b| b == d).count();

    let consistent = SNIFF_CANDIDATES
        .iter()
        .filter_map(|&d| {
            let n = count(first, d);
            (n > 0 && lines.iter().all(|l| count(l, d) == n)).then_some((d, n))
        })
        .max_by_key(|&(_, n)| n)
        .map(|(d, _)| d);

    consistent.or_else(|| {
        SNIFF_CANDIDATES
            .iter()
            .map(|&d| (d, count(first, d)))
            .filter(|&(_, n)| n > 0)
            .max_by_key(|&(_, n)| n)
            .map(|(d, _)| d)
    })
}
