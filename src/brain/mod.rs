//! Brain Module
//!
//! The reasoning pipeline: a router that maps questions to analytic
//! intents, the intents themselves, and the response contract they share.
//! Each intent pulls rows from a telemetry source, computes one narrow
//! statistic, records an evidence trail, and lets the confidence engine
//! judge the result.

pub mod anomaly;
pub mod contracts;
pub mod linked;
pub mod router;
pub mod stats;
pub mod trend;

pub use anomaly::{anomaly_scan, anomaly_scan_with, AnomalyScanConfig};
pub use contracts::{BrainResponse, Evidence, Intent, LinkedEvidence, LinkedIntentRef, RouterEvidence};
pub use linked::linked_degradation_analysis;
pub use router::{infer_intent, route, supported_intents};
pub use trend::{compare_soh_trend, AssetTrend, TrendComparison};
