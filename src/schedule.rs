//! Weekly route schedule loading and date selection.
//!
//! The schedule is a small operator-maintained table (one row per run week)
//! kept either as a CSV export or the original `.xlsx` workbook. Loading is
//! strict: a missing column or an unparseable date fails the whole load,
//! since the table is tiny and reviewed by hand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use calamine::{Data, Reader};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to read schedule file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("schedule file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("schedule workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("schedule workbook has no usable sheet")]
    NoSheet,
    #[error("schedule is missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("schedule row {row}: cannot parse date {value:?}")]
    BadDate { row: usize, value: String },
}

/// One week of the run-club schedule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub week: String,
    pub date: NaiveDate,
    pub meeting_point: String,
    pub route_8k: String,
    pub link_8k: Option<String>,
    pub route_5k: String,
    pub link_5k: Option<String>,
}

const COL_WEEK: &str = "Week";
const COL_DATE: &str = "Date";
const COL_MEETING_POINT: &str = "Meeting point";
const COL_ROUTE_8K: &str = "8k Route";
const COL_LINK_8K: &str = "8k Strava link";
const COL_ROUTE_5K: &str = "5k Route";
const COL_LINK_5K: &str = "5k Strava link";

struct ColumnMap {
    week: usize,
    date: usize,
    meeting_point: usize,
    route_8k: usize,
    link_8k: usize,
    route_5k: usize,
    link_5k: usize,
}

impl ColumnMap {
    /// Locates every required column by its whitespace-trimmed header name.
    fn locate(headers: &[String]) -> Result<Self, DataSourceError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DataSourceError::MissingColumn(name))
        };
        Ok(Self {
            week: find(COL_WEEK)?,
            date: find(COL_DATE)?,
            meeting_point: find(COL_MEETING_POINT)?,
            route_8k: find(COL_ROUTE_8K)?,
            link_8k: find(COL_LINK_8K)?,
            route_5k: find(COL_ROUTE_5K)?,
            link_5k: find(COL_LINK_5K)?,
        })
    }
}

/// Loads the schedule at `path`, dispatching on the file extension:
/// `.xlsx`/`.xls` are read as workbooks, anything else as CSV.
pub fn load(path: &Path) -> Result<Vec<ScheduleRow>, DataSourceError> {
    let is_workbook = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"));

    if is_workbook {
        load_workbook(path)
    } else {
        load_csv(path)
    }
}

fn load_csv(path: &Path) -> Result<Vec<ScheduleRow>, DataSourceError> {
    let file = std::fs::File::open(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns = ColumnMap::locate(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();

        // Header is line 1, so the first data row is line 2.
        let row_number = i + 2;
        let date_text = cell(columns.date);
        let date = parse_date_text(&date_text).ok_or(DataSourceError::BadDate {
            row: row_number,
            value: date_text,
        })?;

        rows.push(ScheduleRow {
            week: cell(columns.week).trim().to_string(),
            date,
            meeting_point: cell(columns.meeting_point).trim().to_string(),
            route_8k: cell(columns.route_8k).trim().to_string(),
            link_8k: opt_link(&cell(columns.link_8k)),
            route_5k: cell(columns.route_5k).trim().to_string(),
            link_5k: opt_link(&cell(columns.link_5k)),
        });
    }

    debug!(path = %path.display(), rows = rows.len(), "Schedule CSV loaded");
    Ok(rows)
}

fn load_workbook(path: &Path) -> Result<Vec<ScheduleRow>, DataSourceError> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DataSourceError::NoSheet)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or(DataSourceError::NoSheet)?
        .iter()
        .map(cell_to_string)
        .collect();
    let columns = ColumnMap::locate(&headers)?;

    let mut rows = Vec::new();
    for (i, sheet_row) in sheet_rows.enumerate() {
        let text = |idx: usize| sheet_row.get(idx).map(cell_to_string).unwrap_or_default();

        let row_number = i + 2;
        let date = sheet_row
            .get(columns.date)
            .and_then(cell_to_date)
            .ok_or_else(|| DataSourceError::BadDate {
                row: row_number,
                value: text(columns.date),
            })?;

        rows.push(ScheduleRow {
            week: text(columns.week).trim().to_string(),
            date,
            meeting_point: text(columns.meeting_point).trim().to_string(),
            route_8k: text(columns.route_8k).trim().to_string(),
            link_8k: opt_link(&text(columns.link_8k)),
            route_5k: text(columns.route_5k).trim().to_string(),
            link_5k: opt_link(&text(columns.link_5k)),
        });
    }

    debug!(path = %path.display(), sheet = %sheet_name, rows = rows.len(), "Schedule workbook loaded");
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => {
            // Whole-number floats (how spreadsheets store week numbers) print
            // without the trailing ".0".
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({e:?})"),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn cell_to_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|dt| dt.date()),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    }
}

/// Parses the calendar-date text forms seen in club exports.
fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            // ISO datetime, as written by some spreadsheet exports.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn opt_link(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The run date a fresh session should preselect: the nearest date on or
/// after `today`, falling back to the table's first date when every run is
/// in the past.
pub fn next_run_date(rows: &[ScheduleRow], today: NaiveDate) -> Option<NaiveDate> {
    rows.iter()
        .map(|row| row.date)
        .filter(|date| *date >= today)
        .min()
        .or_else(|| rows.first().map(|row| row.date))
}

struct CacheEntry {
    modified: Option<SystemTime>,
    rows: Arc<Vec<ScheduleRow>>,
}

/// Read-through schedule cache keyed by path and file modification time.
///
/// Owned by the caller: one instance lives for the session, repeated loads of
/// an untouched file reuse the parsed table, and editing the file (new mtime)
/// triggers a re-parse on the next load.
#[derive(Default)]
pub struct ScheduleCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Vec<ScheduleRow>>, DataSourceError> {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        if let Some(entry) = self.entries.get(path) {
            if entry.modified.is_some() && entry.modified == modified {
                debug!(path = %path.display(), "Schedule served from cache");
                return Ok(Arc::clone(&entry.rows));
            }
        }

        let rows = Arc::new(load(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                rows: Arc::clone(&rows),
            },
        );
        Ok(rows)
    }
}
