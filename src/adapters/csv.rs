//! CSV-backed telemetry source.
//!
//! Backed by three files in a base directory:
//! - `assets.json`   asset hierarchy and metadata
//! - `telemetry.csv` 15-minute telemetry rows
//! - `events.csv`    operational event log
//!
//! Files are loaded once at construction; queries filter in memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::{
    parse_iso, AdapterError, AdapterResult, AssetContext, EventRecord, QualityFlag, Signal,
    TelemetryRow, TelemetrySource, TimeWindow, TimeseriesFrame,
};

/// Raw telemetry record as it appears on disk, before signal selection.
#[derive(Debug, Clone)]
struct RawTelemetry {
    timestamp: DateTime<Utc>,
    asset_id: String,
    fields: HashMap<String, String>,
    quality: QualityFlag,
}

pub struct CsvTelemetrySource {
    source_name: String,
    assets: Value,
    asset_index: HashMap<String, Value>,
    telemetry: Vec<RawTelemetry>,
    events: Vec<EventRecord>,
}

impl CsvTelemetrySource {
    pub fn open(base_dir: impl AsRef<Path>) -> AdapterResult<Self> {
        let base = base_dir.as_ref();
        let assets = Self::load_assets(&base.join("assets.json"))?;
        let asset_index = Self::index_assets(&assets);
        let telemetry = Self::load_telemetry(&base.join("telemetry.csv"))?;
        let events = Self::load_events(&base.join("events.csv"))?;

        let source_name = base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.display().to_string());

        debug!(
            telemetry_rows = telemetry.len(),
            events = events.len(),
            assets = asset_index.len(),
            "loaded csv telemetry source"
        );

        Ok(Self {
            source_name,
            assets,
            asset_index,
            telemetry,
            events,
        })
    }

    fn load_assets(path: &PathBuf) -> AdapterResult<Value> {
        if !path.exists() {
            return Err(AdapterError::MissingFile(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| AdapterError::Malformed(format!("{}: {e}", path.display())))
    }

    fn index_assets(doc: &Value) -> HashMap<String, Value> {
        let mut idx = HashMap::new();
        if let Some(list) = doc.get("assets").and_then(Value::as_array) {
            for a in list {
                if let Some(id) = a.get("asset_id").and_then(Value::as_str) {
                    idx.insert(id.to_string(), a.clone());
                }
            }
        }
        idx
    }

    fn load_telemetry(path: &PathBuf) -> AdapterResult<Vec<RawTelemetry>> {
        let records = read_csv(path)?;
        let mut out = Vec::with_capacity(records.len());
        for rec in records {
            let ts_raw = rec
                .get("timestamp")
                .ok_or_else(|| AdapterError::Malformed("telemetry row without timestamp".into()))?;
            let asset_id = rec
                .get("asset_id")
                .cloned()
                .ok_or_else(|| AdapterError::Malformed("telemetry row without asset_id".into()))?;
            let quality = match rec.get("data_quality_flag").map(String::as_str) {
                Some("missing") => QualityFlag::Missing,
                _ => QualityFlag::Ok,
            };
            out.push(RawTelemetry {
                timestamp: parse_iso(ts_raw)?,
                asset_id,
                fields: rec,
                quality,
            });
        }
        Ok(out)
    }

    fn load_events(path: &PathBuf) -> AdapterResult<Vec<EventRecord>> {
        let records = read_csv(path)?;
        let mut out = Vec::with_capacity(records.len());
        for rec in records {
            let field = |k: &str| -> AdapterResult<String> {
                rec.get(k)
                    .cloned()
                    .ok_or_else(|| AdapterError::Malformed(format!("event row without {k}")))
            };
            out.push(EventRecord {
                event_id: field("event_id")?,
                asset_id: field("asset_id")?,
                event_type: field("event_type")?,
                start_ts: parse_iso(&field("start_ts")?)?,
                end_ts: parse_iso(&field("end_ts")?)?,
                severity: field("severity")?,
                notes: rec.get("notes").cloned().unwrap_or_default(),
            });
        }
        Ok(out)
    }

    /// Soft numeric coercion: anything unparsable degrades to `None`.
    fn numeric(fields: &HashMap<String, String>, key: &str) -> Option<f64> {
        fields.get(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    fn select_row(raw: &RawTelemetry, signals: &[Signal]) -> TelemetryRow {
        if raw.quality.is_missing() {
            // Placeholder rows carry null values regardless of raw payload.
            return TelemetryRow::placeholder(raw.timestamp);
        }
        let mut row = TelemetryRow {
            timestamp: raw.timestamp,
            soc: None,
            soh: None,
            temperature: None,
            power: None,
            status: None,
            data_quality_flag: QualityFlag::Ok,
        };
        for s in signals {
            match s {
                Signal::Soc => row.soc = Self::numeric(&raw.fields, "soc"),
                Signal::Soh => row.soh = Self::numeric(&raw.fields, "soh"),
                Signal::Temperature => row.temperature = Self::numeric(&raw.fields, "temperature"),
                Signal::Power => row.power = Self::numeric(&raw.fields, "power"),
                Signal::Status => {
                    row.status = raw
                        .fields
                        .get("status")
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                }
            }
        }
        row
    }
}

impl TelemetrySource for CsvTelemetrySource {
    fn get_timeseries(
        &self,
        asset_id: &str,
        signals: &[Signal],
        window: Option<&TimeWindow>,
        include_missing: bool,
    ) -> AdapterResult<TimeseriesFrame> {
        if !self.asset_index.contains_key(asset_id) {
            return Err(AdapterError::AssetNotFound(asset_id.to_string()));
        }

        let mut rows = Vec::new();
        for raw in &self.telemetry {
            if raw.asset_id != asset_id {
                continue;
            }
            if let Some(w) = window {
                if !w.contains(raw.timestamp) {
                    continue;
                }
            }
            if raw.quality.is_missing() && !include_missing {
                continue;
            }
            rows.push(Self::select_row(raw, signals));
        }

        Ok(TimeseriesFrame {
            asset_id: asset_id.to_string(),
            signals: signals.to_vec(),
            time_window: window.copied(),
            rows,
        })
    }

    fn get_events(
        &self,
        asset_id: &str,
        window: Option<&TimeWindow>,
    ) -> AdapterResult<Vec<EventRecord>> {
        let mut out: Vec<EventRecord> = self
            .events
            .iter()
            .filter(|e| e.asset_id == asset_id)
            .filter(|e| match window {
                Some(w) => w.overlaps_event(e.start_ts, e.end_ts),
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by_key(|e| e.start_ts);
        Ok(out)
    }

    fn get_asset_context(&self, asset_id: &str) -> AdapterResult<AssetContext> {
        if let Some(site) = self.assets.get("site") {
            if site.get("asset_id").and_then(Value::as_str) == Some(asset_id) {
                return Ok(AssetContext {
                    asset_id: asset_id.to_string(),
                    asset_type: site
                        .get("asset_type")
                        .and_then(Value::as_str)
                        .unwrap_or("site")
                        .to_string(),
                    parent_asset_id: None,
                    metadata: site.clone(),
                });
            }
        }

        let asset = self
            .asset_index
            .get(asset_id)
            .ok_or_else(|| AdapterError::AssetNotFound(asset_id.to_string()))?;

        Ok(AssetContext {
            asset_id: asset_id.to_string(),
            asset_type: asset
                .get("asset_type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            parent_asset_id: asset
                .get("parent_asset_id")
                .and_then(Value::as_str)
                .map(String::from),
            metadata: serde_json::json!({
                "chemistry": asset.get("chemistry").cloned().unwrap_or(Value::Null),
                "install_date": asset.get("install_date").cloned().unwrap_or(Value::Null),
                "nominal_capacity_kwh": asset.get("nominal_capacity_kwh").cloned().unwrap_or(Value::Null),
            }),
        })
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Read a headered CSV file into one map per row. Handles double-quoted
/// fields; embedded newlines are not supported.
fn read_csv(path: &PathBuf) -> AdapterResult<Vec<HashMap<String, String>>> {
    if !path.exists() {
        return Err(AdapterError::MissingFile(path.display().to_string()));
    }
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines();
    let header = match lines.next() {
        Some(h) => split_csv_line(h),
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values = split_csv_line(line);
        let mut rec = HashMap::with_capacity(header.len());
        for (key, value) in header.iter().zip(values) {
            rec.insert(key.clone(), value);
        }
        out.push(rec);
    }
    Ok(out)
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_fields() {
        let fields = split_csv_line(r#"a,"b, c","d ""e"""#);
        assert_eq!(fields, vec!["a", "b, c", r#"d "e""#]);
    }

    #[test]
    fn splits_trailing_empty_field() {
        assert_eq!(split_csv_line("a,b,"), vec!["a", "b", ""]);
    }
}
