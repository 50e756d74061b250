//! Evidence Module
//!
//! Append-only audit trail behind every answer: the data consulted, the
//! computations performed, the rules applied, and the gaps and assumptions
//! acknowledged along the way.

pub mod builder;

pub use builder::{
    AssumptionRecord, ComputationRecord, DataUsedRecord, EvidenceBuilder, EvidenceBundle,
    KbRuleRecord, ModelCallRecord,
};
