//! Tolerant parser for body-composition CSV exports.
//!
//! Column order is fixed:
//! `time,weight,height,bmi,fatRate,bodyWaterRate,boneMass,metabolism,muscleRate,visceralFat`.
//! The first line is a header and is never validated. Fields are split on `,`
//! with no quoting support. Rows that cannot produce a record are dropped and
//! reported through `tracing`, never to the caller.

use crate::domain::model::BodyCompositionRecord;
use crate::utils::error::{ImportError, Result};
use chrono::{DateTime, FixedOffset};
use csv::{ByteRecord, ReaderBuilder};
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";
/// chrono's `%z` also takes `+00:00` and unpadded dates, so the shape is checked first.
const TIME_SHAPE: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}[+-]\d{4}$";
pub const MIN_COLUMNS: usize = 10;

const TIME: usize = 0;
const WEIGHT: usize = 1;
const HEIGHT: usize = 2;
const BMI: usize = 3;
const FAT_RATE: usize = 4;
const BODY_WATER_RATE: usize = 5;
const BONE_MASS: usize = 6;
const METABOLISM: usize = 7;
const MUSCLE_RATE: usize = 8;
const VISCERAL_FAT: usize = 9;

/// Why a data row did not become a record.
#[derive(Debug)]
pub enum RowRejection {
    Blank,
    TooFewColumns(usize),
    MissingRequired(&'static str),
    InvalidTimestamp(ImportError),
}

/// Per-call counters, for diagnostics only. Empty lines never reach the row
/// parser and are not counted; whitespace-only lines count as `skipped_blank`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub rows_seen: usize,
    pub parsed: usize,
    pub skipped_blank: usize,
    pub skipped_too_few_columns: usize,
    pub skipped_missing_required: usize,
    pub skipped_invalid_timestamp: usize,
    pub skipped_unreadable: usize,
}

impl ParseSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_blank
            + self.skipped_too_few_columns
            + self.skipped_missing_required
            + self.skipped_invalid_timestamp
            + self.skipped_unreadable
    }

    fn record(&mut self, rejection: &RowRejection) {
        match rejection {
            RowRejection::Blank => self.skipped_blank += 1,
            RowRejection::TooFewColumns(_) => self.skipped_too_few_columns += 1,
            RowRejection::MissingRequired(_) => self.skipped_missing_required += 1,
            RowRejection::InvalidTimestamp(_) => self.skipped_invalid_timestamp += 1,
        }
    }
}

/// Stateless; every call reads its input from the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse<R: Read>(&self, reader: R) -> Vec<BodyCompositionRecord> {
        self.parse_with_summary(reader).0
    }

    pub fn parse_str(&self, content: &str) -> Vec<BodyCompositionRecord> {
        self.parse(content.as_bytes())
    }

    pub fn parse_with_summary<R: Read>(&self, mut reader: R) -> (Vec<BodyCompositionRecord>, ParseSummary) {
        let mut records = Vec::new();
        let mut summary = ParseSummary::default();

        let mut input = Vec::new();
        if let Err(e) = reader.read_to_end(&mut input) {
            tracing::warn!("Stopped reading CSV input: {}", e);
        }

        // 不處理引號，純粹以逗號切割
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(skip_header_line(&input));

        let mut raw = ByteRecord::new();
        loop {
            match rdr.read_byte_record(&mut raw) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    summary.rows_seen += 1;
                    summary.skipped_unreadable += 1;
                    tracing::warn!("Skipping unreadable CSV row: {}", e);
                    continue;
                }
            }
            summary.rows_seen += 1;

            let columns = match decode_columns(&raw) {
                Some(columns) => columns,
                None => {
                    summary.skipped_unreadable += 1;
                    tracing::warn!("Skipping row with invalid UTF-8: {:?}", raw);
                    continue;
                }
            };

            match parse_row(&columns) {
                Ok(record) => {
                    summary.parsed += 1;
                    records.push(record);
                }
                Err(rejection) => {
                    log_rejection(&columns, &rejection);
                    summary.record(&rejection);
                }
            }
        }

        (records, summary)
    }
}

/// Everything after the first physical line, whatever that line holds.
/// `\n`, `\r\n` and a lone `\r` all end a line.
fn skip_header_line(input: &[u8]) -> &[u8] {
    match input.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(end) if input[end] == b'\r' && input.get(end + 1) == Some(&b'\n') => &input[end + 2..],
        Some(end) => &input[end + 1..],
        None => &[],
    }
}

fn decode_columns(raw: &ByteRecord) -> Option<Vec<&str>> {
    raw.iter().map(|field| std::str::from_utf8(field).ok()).collect()
}

fn log_rejection(columns: &[&str], rejection: &RowRejection) {
    let line = columns.join(",");
    match rejection {
        RowRejection::Blank => {}
        RowRejection::TooFewColumns(count) => {
            tracing::debug!("Skipping row with {} columns (need {}): {}", count, MIN_COLUMNS, line);
        }
        RowRejection::MissingRequired(column) => {
            tracing::debug!("Skipping row without {}: {}", column, line);
        }
        RowRejection::InvalidTimestamp(e) => {
            tracing::warn!("Error parsing line: {} - {}", line, e);
        }
    }
}

/// Turns the columns of one data row into a record.
pub fn parse_row(columns: &[&str]) -> std::result::Result<BodyCompositionRecord, RowRejection> {
    if columns.len() == 1 && columns[0].trim().is_empty() {
        return Err(RowRejection::Blank);
    }
    if columns.len() < MIN_COLUMNS {
        return Err(RowRejection::TooFewColumns(columns.len()));
    }

    for (index, name) in [(TIME, "time"), (WEIGHT, "weight"), (HEIGHT, "height")] {
        if is_absent(columns[index]) {
            return Err(RowRejection::MissingRequired(name));
        }
    }

    let time = parse_timestamp(columns[TIME]).map_err(RowRejection::InvalidTimestamp)?;
    let field = |index: usize| parse_f64_or_default(columns[index], 0.0);

    Ok(BodyCompositionRecord {
        time,
        weight: field(WEIGHT),
        height: field(HEIGHT),
        bmi: field(BMI),
        fat_rate: field(FAT_RATE),
        body_water_rate: field(BODY_WATER_RATE),
        bone_mass: field(BONE_MASS),
        // 轉為整數時直接截斷
        metabolism: field(METABOLISM) as i32,
        muscle_rate: field(MUSCLE_RATE),
        visceral_fat: field(VISCERAL_FAT),
    })
}

/// Empty, whitespace-only and `null` (any case) all mean "no value".
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

/// Absent and unparsable values both map to `default`.
pub fn parse_f64_or_default(value: &str, default: f64) -> f64 {
    if is_absent(value) {
        return default;
    }
    value.trim().parse::<f64>().unwrap_or(default)
}

/// Parses `2024-04-29 12:12:32+0000`, keeping the offset.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    static SHAPE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

    let trimmed = value.trim();
    let reason = match SHAPE.get_or_init(|| Regex::new(TIME_SHAPE)) {
        Ok(shape) if shape.is_match(trimmed) => None,
        Ok(_) => Some("expected yyyy-MM-dd HH:mm:ss±ZZZZ".to_string()),
        Err(e) => Some(e.to_string()),
    };
    if let Some(reason) = reason {
        return Err(ImportError::MalformedTimestamp {
            value: trimmed.to_string(),
            reason,
        });
    }

    DateTime::parse_from_str(trimmed, TIME_FORMAT).map_err(|source| ImportError::InvalidTimestamp {
        value: trimmed.to_string(),
        source,
    })
}
