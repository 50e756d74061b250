//! Telemetry Adapters
//!
//! Normalized access to battery asset telemetry and event logs. The brain
//! consumes the `TelemetrySource` contract and does not care where rows are
//! stored; concrete sources load CSV files or serve fixtures from memory.

pub mod csv;
pub mod memory;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use csv::CsvTelemetrySource;
pub use memory::MemoryTelemetrySource;

/// Errors raised by telemetry sources. The brain layer converts these into
/// low-confidence responses; they never cross the router boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unknown asset_id: {0}")]
    AssetNotFound(String),

    #[error("unsupported signal: {0}")]
    UnsupportedSignal(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("backing file not found: {0}")]
    MissingFile(String),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Parse an ISO-8601 timestamp. Accepts an explicit offset or `Z`; naive
/// timestamps are assumed UTC.
pub fn parse_iso(ts: &str) -> AdapterResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| AdapterError::InvalidTimestamp(ts.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn from_iso(start_iso: &str, end_iso: &str) -> AdapterResult<Self> {
        Ok(Self {
            start: parse_iso(start_iso)?,
            end: parse_iso(end_iso)?,
        })
    }

    /// Whether an instant falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Half-open overlap test against an event interval. A zero-duration
    /// event never overlaps any window.
    pub fn overlaps_event(&self, event_start: DateTime<Utc>, event_end: DateTime<Utc>) -> bool {
        !(event_end <= self.start || event_start >= self.end)
    }
}

/// Telemetry signals a source can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Soc,
    Soh,
    Temperature,
    Power,
    Status,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::Soc,
        Signal::Soh,
        Signal::Temperature,
        Signal::Power,
        Signal::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Soc => "soc",
            Signal::Soh => "soh",
            Signal::Temperature => "temperature",
            Signal::Power => "power",
            Signal::Status => "status",
        }
    }

    pub fn parse(name: &str) -> AdapterResult<Self> {
        match name {
            "soc" => Ok(Signal::Soc),
            "soh" => Ok(Signal::Soh),
            "temperature" => Ok(Signal::Temperature),
            "power" => Ok(Signal::Power),
            "status" => Ok(Signal::Status),
            other => Err(AdapterError::UnsupportedSignal(other.to_string())),
        }
    }
}

/// Per-row marker distinguishing genuine readings from placeholder entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityFlag {
    Ok,
    Missing,
}

impl QualityFlag {
    pub fn is_missing(&self) -> bool {
        matches!(self, QualityFlag::Missing)
    }
}

/// One normalized telemetry row. Signals that were not requested, could not
/// be coerced to a number, or belong to a missing placeholder row are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub data_quality_flag: QualityFlag,
}

impl TelemetryRow {
    pub fn placeholder(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            soc: None,
            soh: None,
            temperature: None,
            power: None,
            status: None,
            data_quality_flag: QualityFlag::Missing,
        }
    }

    /// Numeric value of a signal, if present on this row.
    pub fn numeric(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::Soc => self.soc,
            Signal::Soh => self.soh,
            Signal::Temperature => self.temperature,
            Signal::Power => self.power,
            Signal::Status => None,
        }
    }
}

/// Result of a timeseries query: the rows plus the query echo used for
/// evidence recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesFrame {
    pub asset_id: String,
    pub signals: Vec<Signal>,
    pub time_window: Option<TimeWindow>,
    pub rows: Vec<TelemetryRow>,
}

impl TimeseriesFrame {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.data_quality_flag.is_missing())
            .count()
    }
}

/// Operational event attached to an asset, half-open `[start_ts, end_ts)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub asset_id: String,
    pub event_type: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub severity: String,
    pub notes: String,
}

/// Asset metadata returned by `get_asset_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetContext {
    pub asset_id: String,
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_asset_id: Option<String>,
    pub metadata: serde_json::Value,
}

/// Contract the brain consumes. Implementations own loading, filtering and
/// normalization; the brain only sees rows.
pub trait TelemetrySource {
    /// Fetch rows for one asset, restricted to the requested signals and
    /// window. With `include_missing`, placeholder rows are returned with
    /// null values; otherwise they are dropped.
    fn get_timeseries(
        &self,
        asset_id: &str,
        signals: &[Signal],
        window: Option<&TimeWindow>,
        include_missing: bool,
    ) -> AdapterResult<TimeseriesFrame>;

    /// Events overlapping the window, ordered by start time.
    fn get_events(
        &self,
        asset_id: &str,
        window: Option<&TimeWindow>,
    ) -> AdapterResult<Vec<EventRecord>>;

    /// Metadata for a known asset; `AssetNotFound` otherwise.
    fn get_asset_context(&self, asset_id: &str) -> AdapterResult<AssetContext>;

    /// Short label recorded in evidence bundles as the data source name.
    fn source_name(&self) -> &str;
}
