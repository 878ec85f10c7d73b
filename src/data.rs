//! Traffic count data handling: loading, interval decoding, reshaping and
//! site selection

use crate::error::{Result, TrafficError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::config::MINUTES_PER_DAY;

/// Column holding the site identifier
pub const SITE_COLUMN: &str = "SCATS Number";
/// Column holding the observation date
pub const DATE_COLUMN: &str = "Date";
/// One-letter prefix of the periodic slot columns
pub const SLOT_PREFIX: char = 'V';

/// Marker prefix of artifact columns produced by upstream exports
const ARTIFACT_PREFIX: &str = "Unnamed";

/// Day-first date formats accepted in the date column
const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y"];

/// Wide-format periodic traffic count table.
///
/// One row per (site, date); one column per sub-day interval slot, named with
/// the slot prefix and a two-digit zero-based index (`V00`..`V95` for
/// 15-minute granularity).
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
}

impl RawTable {
    /// Load a raw count table from a CSV file.
    ///
    /// The first physical row is an extra header line and is skipped; columns
    /// whose name is empty or carries an upstream artifact marker are dropped.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .with_skip_rows(1)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Wrap an existing DataFrame, dropping artifact columns
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        let df = Self::drop_artifact_columns(df)?;
        Ok(Self { df })
    }

    fn drop_artifact_columns(df: DataFrame) -> Result<DataFrame> {
        let keep: Vec<String> = df
            .get_column_names()
            .iter()
            .filter(|name| {
                !name.is_empty()
                    && !name.starts_with(ARTIFACT_PREFIX)
                    && !name.starts_with("_duplicated_")
            })
            .map(|name| name.to_string())
            .collect();

        if keep.len() == df.width() {
            return Ok(df);
        }
        Ok(df.select(keep)?)
    }

    /// Get the underlying DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of (site, date) rows in the table
    pub fn num_rows(&self) -> usize {
        self.df.height()
    }
}

/// Whether a column name has the interval slot shape: the slot prefix
/// followed by a two-digit index
pub fn is_slot_label(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some(SLOT_PREFIX)
        && name.len() == 3
        && name[1..].chars().all(|c| c.is_ascii_digit())
}

/// Decode a slot label (`"V"` + two-digit zero-based index) into a
/// time-of-day.
///
/// Index 0 is midnight; each step advances by `1440 / slots_per_day` minutes.
/// Fails with `MalformedIntervalLabel` if the label does not match the
/// expected format or the index falls outside `[0, slots_per_day)`.
pub fn slot_time(label: &str, slots_per_day: usize) -> Result<NaiveTime> {
    let malformed = || TrafficError::MalformedIntervalLabel(label.to_string());

    if !is_slot_label(label) {
        return Err(malformed());
    }

    let index: usize = label[1..].parse().map_err(|_| malformed())?;
    if index >= slots_per_day {
        return Err(malformed());
    }

    let slot_minutes = MINUTES_PER_DAY / slots_per_day;
    let minutes_of_day = index * slot_minutes;
    NaiveTime::from_hms_opt(minutes_of_day as u32 / 60, minutes_of_day as u32 % 60, 0)
        .ok_or_else(malformed)
}

/// One observation in the long, chronological form of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    /// Site identifier, kept as text
    pub site_id: String,
    /// Date plus decoded slot time-of-day
    pub timestamp: NaiveDateTime,
    /// Observed traffic volume
    pub volume: f64,
}

/// Unpivot a wide count table into a long record sequence.
///
/// Emits one record per (row, interval column), with the timestamp built from
/// the day-first date and the decoded slot time. Columns that are not the
/// site, date, or a slot label are ignored. The result is sorted by
/// (site, timestamp); ties keep original row order.
pub fn reshape(table: &RawTable, slots_per_day: usize) -> Result<Vec<LongRecord>> {
    let df = table.dataframe();

    let sites = column_as_string(df, SITE_COLUMN)?;
    let dates = column_as_string(df, DATE_COLUMN)?
        .iter()
        .map(|s| parse_dayfirst_date(s))
        .collect::<Result<Vec<NaiveDate>>>()?;

    let mut slot_columns: Vec<(String, NaiveTime, Vec<Option<f64>>)> = Vec::new();
    for name in df.get_column_names() {
        if is_slot_label(name) {
            let time = slot_time(name, slots_per_day)?;
            let values = column_as_f64(df, name)?;
            slot_columns.push((name.to_string(), time, values));
        }
    }

    let mut records = Vec::with_capacity(sites.len() * slot_columns.len());
    for row in 0..sites.len() {
        for (name, time, values) in &slot_columns {
            let volume = values[row].ok_or_else(|| {
                TrafficError::DataError(format!(
                    "Missing volume in column '{}' for site {} on {}",
                    name, sites[row], dates[row]
                ))
            })?;

            records.push(LongRecord {
                site_id: sites[row].clone(),
                timestamp: dates[row].and_time(*time),
                volume,
            });
        }
    }

    // Stable sort keeps original row order for equal keys
    records.sort_by(|a, b| {
        a.site_id
            .cmp(&b.site_id)
            .then(a.timestamp.cmp(&b.timestamp))
    });

    Ok(records)
}

/// Parse a date string with day before month
fn parse_dayfirst_date(text: &str) -> Result<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    Err(TrafficError::DataError(format!(
        "Cannot parse date '{}' with day-first convention",
        text
    )))
}

/// The chronologically ordered value sequence of a single site
#[derive(Debug, Clone)]
pub struct SiteSeries {
    site_id: String,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl SiteSeries {
    /// Filter a long record sequence down to one site.
    ///
    /// The site identifier is compared as text. Fails with `NoDataForSite`
    /// when the filtered result is empty, since an empty series cannot feed
    /// model training.
    pub fn select(records: &[LongRecord], site_id: &str) -> Result<Self> {
        let mut selected: Vec<&LongRecord> = records
            .iter()
            .filter(|record| record.site_id == site_id)
            .collect();

        if selected.is_empty() {
            return Err(TrafficError::NoDataForSite(site_id.to_string()));
        }

        selected.sort_by_key(|record| record.timestamp);

        Ok(Self {
            site_id: site_id.to_string(),
            timestamps: selected.iter().map(|r| r.timestamp).collect(),
            values: selected.iter().map(|r| r.volume).collect(),
        })
    }

    /// The site identifier this series belongs to
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Observation timestamps, ascending
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Observed values in timestamp order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read a column as text, accepting integer-typed site identifiers
fn column_as_string(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
    let col = df.column(column_name).map_err(|e| {
        TrafficError::DataError(format!("Column '{}' not found: {}", column_name, e))
    })?;

    let missing = || {
        TrafficError::DataError(format!("Missing value in column '{}'", column_name))
    };

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()
            .map_err(TrafficError::from)?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()).ok_or_else(missing))
            .collect(),
        DataType::Int64 => col
            .i64()
            .map_err(TrafficError::from)?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()).ok_or_else(missing))
            .collect(),
        DataType::Int32 => col
            .i32()
            .map_err(TrafficError::from)?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()).ok_or_else(missing))
            .collect(),
        _ => Err(TrafficError::DataError(format!(
            "Column '{}' cannot be read as text",
            column_name
        ))),
    }
}

/// Read a numeric column as optional f64 values
fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
    let col = df.column(column_name).map_err(|e| {
        TrafficError::DataError(format!("Column '{}' not found: {}", column_name, e))
    })?;

    let cast = col.cast(&DataType::Float64).map_err(|_| {
        TrafficError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            column_name
        ))
    })?;

    Ok(cast
        .f64()
        .map_err(TrafficError::from)?
        .into_iter()
        .collect())
}
