//! battery-brain
//!
//! Decision-support pipeline for battery asset telemetry:
//! - Intent routing over natural-language-like questions
//! - Analytic intents (SoH trend comparison, anomaly scan, linked reasoning)
//! - Calibrated confidence scoring with a bounded, explainable breakdown
//! - Append-only evidence bundles behind every answer

pub mod adapters;
pub mod brain;
pub mod confidence;
pub mod evidence;
pub mod synthetic;

// Re-exports for convenience
pub use adapters::{CsvTelemetrySource, MemoryTelemetrySource, TelemetrySource, TimeWindow};
pub use brain::{route, BrainResponse, Intent};
pub use confidence::{ConfidenceEngine, ConfidenceSignals};
pub use evidence::{EvidenceBuilder, EvidenceBundle};
