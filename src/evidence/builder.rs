//! Evidence bundle builder.
//!
//! This module is intentionally strict and boring:
//! - it records what happened
//! - it does NOT calculate confidence
//! - it does NOT perform computations
//! - it does NOT interpret data
//!
//! The builder is exclusively owned by one intent invocation and sealed into
//! an immutable `EvidenceBundle` snapshot via `finalize`.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One data source consulted while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataUsedRecord {
    pub source_type: String,
    pub source_name: String,
    pub query: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    pub quality_notes: String,
}

/// One computation performed, with an opaque intent-defined output payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRecord {
    pub name: String,
    pub inputs: Vec<String>,
    pub method: String,
    pub outputs: Value,
    pub assumptions_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCallRecord {
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub inputs_summary: Value,
    pub outputs_summary: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_confidence: Option<Value>,
    pub limitations: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbRuleRecord {
    pub kb_ref: String,
    pub rule_summary: String,
    pub impact_on_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRecord {
    #[serde(rename = "ref")]
    pub reference: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionsAndGaps {
    pub assumptions: Vec<AssumptionRecord>,
    pub gaps: Vec<String>,
    pub risk_notes: String,
}

/// Sealed, immutable audit record behind one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub evidence_id: String,
    pub generated_at: String,
    pub question: String,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub data_used: Vec<DataUsedRecord>,
    pub computations: Vec<ComputationRecord>,
    pub model_calls: Vec<ModelCallRecord>,
    pub kb_rules_applied: Vec<KbRuleRecord>,
    pub assumptions_and_gaps: AssumptionsAndGaps,
    pub attachments: BTreeMap<String, Vec<String>>,
}

/// Accumulates the audit trail for one question-answering invocation.
/// Every recorder appends; nothing mutates prior entries.
#[derive(Debug, Clone)]
pub struct EvidenceBuilder {
    evidence_id: String,
    generated_at: String,
    question: String,
    intent: String,
    role: Option<String>,
    data_used: Vec<DataUsedRecord>,
    computations: Vec<ComputationRecord>,
    model_calls: Vec<ModelCallRecord>,
    kb_rules_applied: Vec<KbRuleRecord>,
    assumptions: Vec<AssumptionRecord>,
    gaps: Vec<String>,
    risk_notes: Vec<String>,
    attachments: BTreeMap<String, Vec<String>>,
}

fn new_evidence_id() -> String {
    // Readable and monotonic-ish by generation time; uuid keeps it unique.
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let tail = Uuid::new_v4().simple().to_string();
    format!("ev_{stamp}_{}", &tail[..8])
}

impl EvidenceBuilder {
    pub fn start(question: impl Into<String>, intent: impl Into<String>, role: Option<&str>) -> Self {
        let mut attachments = BTreeMap::new();
        for kind in ["charts", "tables", "links"] {
            attachments.insert(kind.to_string(), Vec::new());
        }
        Self {
            evidence_id: new_evidence_id(),
            generated_at: Utc::now().to_rfc3339(),
            question: question.into(),
            intent: intent.into(),
            role: role.map(String::from),
            data_used: Vec::new(),
            computations: Vec::new(),
            model_calls: Vec::new(),
            kb_rules_applied: Vec::new(),
            assumptions: Vec::new(),
            gaps: Vec::new(),
            risk_notes: Vec::new(),
            attachments,
        }
    }

    pub fn evidence_id(&self) -> &str {
        &self.evidence_id
    }

    pub fn add_data_used(
        &mut self,
        source_type: impl Into<String>,
        source_name: impl Into<String>,
        query: Value,
        time_window: Option<Value>,
        row_count: Option<u64>,
        quality_notes: impl Into<String>,
    ) {
        self.data_used.push(DataUsedRecord {
            source_type: source_type.into(),
            source_name: source_name.into(),
            query,
            time_window,
            row_count,
            quality_notes: quality_notes.into(),
        });
    }

    pub fn add_computation(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<String>,
        method: impl Into<String>,
        outputs: Value,
        assumptions_refs: Vec<String>,
    ) {
        self.computations.push(ComputationRecord {
            name: name.into(),
            inputs,
            method: method.into(),
            outputs,
            assumptions_refs,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_model_call(
        &mut self,
        model_name: impl Into<String>,
        model_version: Option<String>,
        inputs_summary: Value,
        outputs_summary: Value,
        model_confidence: Option<Value>,
        limitations: impl Into<String>,
    ) {
        self.model_calls.push(ModelCallRecord {
            model_name: model_name.into(),
            model_version,
            inputs_summary,
            outputs_summary,
            model_confidence,
            limitations: limitations.into(),
        });
    }

    pub fn add_kb_rule(
        &mut self,
        kb_ref: impl Into<String>,
        rule_summary: impl Into<String>,
        impact_on_answer: impl Into<String>,
    ) {
        self.kb_rules_applied.push(KbRuleRecord {
            kb_ref: kb_ref.into(),
            rule_summary: rule_summary.into(),
            impact_on_answer: impact_on_answer.into(),
        });
    }

    pub fn add_assumption(&mut self, reference: impl Into<String>, description: impl Into<String>) {
        self.assumptions.push(AssumptionRecord {
            reference: reference.into(),
            description: description.into(),
        });
    }

    pub fn add_gap(&mut self, gap: impl Into<String>) {
        self.gaps.push(gap.into());
    }

    pub fn add_risk_note(&mut self, note: impl Into<String>) {
        self.risk_notes.push(note.into());
    }

    /// Unknown kinds get their bucket created lazily.
    pub fn add_attachment(&mut self, kind: impl Into<String>, reference: impl Into<String>) {
        self.attachments
            .entry(kind.into())
            .or_default()
            .push(reference.into());
    }

    /// Seal the current state into an immutable snapshot. Idempotent:
    /// repeated calls with no intervening recorders return equal bundles,
    /// with the same id and generation timestamp.
    pub fn finalize(&self) -> EvidenceBundle {
        EvidenceBundle {
            evidence_id: self.evidence_id.clone(),
            generated_at: self.generated_at.clone(),
            question: self.question.clone(),
            intent: self.intent.clone(),
            role: self.role.clone(),
            data_used: self.data_used.clone(),
            computations: self.computations.clone(),
            model_calls: self.model_calls.clone(),
            kb_rules_applied: self.kb_rules_applied.clone(),
            assumptions_and_gaps: AssumptionsAndGaps {
                assumptions: self.assumptions.clone(),
                gaps: self.gaps.clone(),
                risk_notes: self.risk_notes.join("; "),
            },
            attachments: self.attachments.clone(),
        }
    }
}
