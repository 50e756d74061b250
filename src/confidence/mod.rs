//! Confidence Module
//!
//! Turns heterogeneous, partially-missing evidence signals into one bounded,
//! comparable judgment: a score, a band, reasons, and an escalation action.

pub mod engine;
pub mod signals;

pub use engine::ConfidenceEngine;
pub use signals::{Band, ConfidenceBreakdown, ConfidenceResult, ConfidenceSignals, Escalation};
