//! In-memory telemetry source.
//!
//! Serves the same contract as the CSV source from vectors, for tests and
//! for synthetic datasets that never touch disk.

use std::collections::HashMap;

use super::{
    AdapterError, AdapterResult, AssetContext, EventRecord, Signal, TelemetryRow, TelemetrySource,
    TimeWindow, TimeseriesFrame,
};

#[derive(Default)]
pub struct MemoryTelemetrySource {
    source_name: String,
    rows: HashMap<String, Vec<TelemetryRow>>,
    events: HashMap<String, Vec<EventRecord>>,
    contexts: HashMap<String, AssetContext>,
}

impl MemoryTelemetrySource {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Default::default()
        }
    }

    pub fn with_asset(mut self, context: AssetContext, rows: Vec<TelemetryRow>) -> Self {
        self.rows.insert(context.asset_id.clone(), rows);
        self.contexts.insert(context.asset_id.clone(), context);
        self
    }

    pub fn with_events(mut self, asset_id: impl Into<String>, events: Vec<EventRecord>) -> Self {
        self.events.insert(asset_id.into(), events);
        self
    }
}

impl TelemetrySource for MemoryTelemetrySource {
    fn get_timeseries(
        &self,
        asset_id: &str,
        signals: &[Signal],
        window: Option<&TimeWindow>,
        include_missing: bool,
    ) -> AdapterResult<TimeseriesFrame> {
        let all = self
            .rows
            .get(asset_id)
            .ok_or_else(|| AdapterError::AssetNotFound(asset_id.to_string()))?;

        let rows = all
            .iter()
            .filter(|r| match window {
                Some(w) => w.contains(r.timestamp),
                None => true,
            })
            .filter(|r| include_missing || !r.data_quality_flag.is_missing())
            .map(|r| {
                // Mask out signals the caller did not ask for.
                let mut row = TelemetryRow {
                    timestamp: r.timestamp,
                    soc: None,
                    soh: None,
                    temperature: None,
                    power: None,
                    status: None,
                    data_quality_flag: r.data_quality_flag,
                };
                for s in signals {
                    match s {
                        Signal::Soc => row.soc = r.soc,
                        Signal::Soh => row.soh = r.soh,
                        Signal::Temperature => row.temperature = r.temperature,
                        Signal::Power => row.power = r.power,
                        Signal::Status => row.status = r.status.clone(),
                    }
                }
                row
            })
            .collect();

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
            .get(asset_id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
            .iter()
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
        self.contexts
            .get(asset_id)
            .cloned()
            .ok_or_else(|| AdapterError::AssetNotFound(asset_id.to_string()))
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}
