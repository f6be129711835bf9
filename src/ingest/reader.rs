//! Station Daily Data Reader
//!
//! Parses one station file into raw daily readings. Files are tab-delimited with
//! no header row and exactly four columns:
//!
//! ```text
//! date      tmax   tmin   precip
//! 19850101	  -22	 -128	   94
//! ```
//!
//! Numeric columns are padded with spaces in the published files, so every field
//! is trimmed before parsing. The station id is never read from the file; the
//! caller derives it from the file name and it is attached to every row.
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::ingest::models::RawReading;

/// Number of columns in a station file line
pub const FIELD_COUNT: usize = 4;

/// Fixed date format of the first column (e.g. "20230101")
pub const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Line {line}: expected 4 tab-separated fields, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("Line {line}: invalid date '{value}' (expected YYYYMMDD)")]
    InvalidDate { line: u64, value: String },

    #[error("Line {line}: invalid {field} value '{value}'")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("Failed to read station file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed station file: {0}")]
    Csv(#[from] csv::Error),
}

/// Read every reading from a station file on disk.
///
/// This is synchronous; async callers should run it on `spawn_blocking`.
#[instrument(skip(path), fields(path = %path.display(), site_id = %site_id))]
pub fn read_station_file(path: &Path, site_id: &str) -> Result<Vec<RawReading>, ParseError> {
    let file = File::open(path)?;
    let readings = read_station_records(file, site_id)?;
    debug!("Read {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Read readings from any byte source in station file format.
///
/// Values are returned exactly as written, sentinel codes included.
pub fn read_station_records<R: Read>(
    source: R,
    site_id: &str,
) -> Result<Vec<RawReading>, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut readings = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount {
                line,
                found: record.len(),
            });
        }

        readings.push(RawReading {
            site_id: site_id.to_string(),
            date: parse_date(line, &record[0])?,
            tmax: Some(parse_number(line, "tmax", &record[1])?),
            tmin: Some(parse_number(line, "tmin", &record[2])?),
            precip: Some(parse_number(line, "precip", &record[3])?),
        });
    }

    Ok(readings)
}

fn parse_date(line: u64, value: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate {
        line,
        value: value.to_string(),
    };

    // chrono accepts shorter numeric fields for %Y, so pin the width first
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn parse_number(line: u64, field: &'static str, value: &str) -> Result<i32, ParseError> {
    value.parse::<i32>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}
