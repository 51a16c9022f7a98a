//! The structured risk-assessment report produced by a successful analysis.
//!
//! The generative model is prompted to return a single JSON object with eight
//! fixed keys. Deserialization is the schema gate: a payload missing any key
//! fails to parse, so no partial report can ever be persisted as `COMPLETE`.
//! Two fields are normalised at the boundary because models drift on their
//! shape: `predicted_fos_outcome` may arrive as a bare string instead of an
//! object, and financial estimates may arrive as JSON numbers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured output of a completed analysis. All eight fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub case_summary: String,
    pub frl_compliance_checks: Vec<ComplianceCheck>,
    pub historical_precedent_analysis: Vec<String>,
    pub key_risk_indicators: Vec<String>,
    pub predicted_fos_outcome: PredictedOutcome,
    pub financial_impact_assessment: FinancialImpact,
    pub recommendations: String,
    pub executive_summary: String,
}

/// One FRL compliance check: the aspect examined, the verdict, the reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub item: String,
    pub compliant: bool,
    pub reason: String,
}

/// Predicted Financial Ombudsman Service outcome with a confidence percentage.
///
/// Accepts either the instructed object form or a bare string; a bare string
/// becomes the outcome with an empty confidence, so downstream consumers
/// never branch on shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedOutcome {
    pub outcome: String,
    pub confidence: String,
}

impl<'de> Deserialize<'de> for PredictedOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Structured { outcome: String, confidence: String },
            Plain(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Structured {
                outcome,
                confidence,
            } => Ok(Self {
                outcome,
                confidence,
            }),
            Raw::Plain(outcome) => Ok(Self {
                outcome,
                confidence: String::new(),
            }),
        }
    }
}

/// Estimated financial exposure range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialImpact {
    #[serde(deserialize_with = "string_or_number")]
    pub low_estimate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub high_estimate: String,
}

/// Accept `"£500"` and `500` alike; both become strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number for estimate, got {other}"
        ))),
    }
}

/// Semantic constraints the report must satisfy beyond plain JSON typing.
#[derive(Debug, Error)]
#[error("report failed validation: {}", issues.join("; "))]
pub struct ReportValidationError {
    pub issues: Vec<String>,
}

/// Placeholder values the prompt explicitly forbids for the predicted outcome.
const OUTCOME_PLACEHOLDERS: &[&str] = &["n/a", "not predicted", "none", "null", "unknown"];

impl Report {
    /// Validate the fields the prompt marks as mandatory.
    ///
    /// The predicted outcome must be a usable prediction: a non-empty,
    /// non-placeholder outcome string. The confidence may only be empty when
    /// the model returned the tolerated bare-string form.
    pub fn validate(&self) -> Result<(), ReportValidationError> {
        let mut issues = Vec::new();

        let outcome = self.predicted_fos_outcome.outcome.trim();
        if outcome.is_empty() {
            issues.push("predicted_fos_outcome.outcome must not be empty".to_string());
        } else if OUTCOME_PLACEHOLDERS.contains(&outcome.to_lowercase().as_str()) {
            issues.push(format!(
                "predicted_fos_outcome.outcome must be a real prediction, got '{outcome}'"
            ));
        }

        if self.case_summary.trim().is_empty() {
            issues.push("case_summary must not be empty".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ReportValidationError { issues })
        }
    }
}
