//! Defensive parsing of generative output.
//!
//! The model is prompted to emit pure JSON but routinely wraps it in prose or
//! markdown fences. The load-bearing defense is substring slicing: everything
//! between the first `{` and the last `}` is the candidate document. The
//! candidate must then deserialize into the full typed [`Report`] — a
//! syntactically valid but semantically incomplete object is a parse failure,
//! never a `COMPLETE` job.

use complai_core::{Report, ReportValidationError};
use thiserror::Error;

/// How much of the raw model output to quote in error messages.
const RAW_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in generative output: {}", excerpt(raw))]
    NoJsonObject { raw: String },

    #[error("generative output was not a valid report: {source}; output: {}", excerpt(raw))]
    Json {
        source: serde_json::Error,
        raw: String,
    },

    #[error(transparent)]
    Invalid(#[from] ReportValidationError),
}

impl ParseError {
    /// The full raw model output, kept for diagnostics.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::NoJsonObject { raw } | Self::Json { raw, .. } => Some(raw),
            Self::Invalid(_) => None,
        }
    }
}

/// Extract and validate a structured report from raw generative output.
pub fn parse_report(raw: &str) -> Result<Report, ParseError> {
    let candidate = json_candidate(raw).ok_or_else(|| ParseError::NoJsonObject {
        raw: raw.to_string(),
    })?;

    let report: Report = serde_json::from_str(candidate).map_err(|source| ParseError::Json {
        source,
        raw: raw.to_string(),
    })?;

    report.validate()?;
    Ok(report)
}

/// The substring between the first `{` and the last `}`, inclusive.
fn json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() <= RAW_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < RAW_EXCERPT_CHARS)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json() -> String {
        serde_json::json!({
            "case_summary": "Fee dispute on a personal loan.",
            "frl_compliance_checks": [
                {"item": "Clarity", "compliant": true, "reason": "Clear."}
            ],
            "historical_precedent_analysis": ["DRN0060527 supports the customer."],
            "key_risk_indicators": ["Undisclosed fee"],
            "predicted_fos_outcome": {"outcome": "Likely to be Upheld", "confidence": "80%"},
            "financial_impact_assessment": {"low_estimate": "£500", "high_estimate": "£750"},
            "recommendations": "Refund the fee.",
            "executive_summary": "Likely uphold. Fee poorly disclosed. Low exposure."
        })
        .to_string()
    }

    #[test]
    fn parses_pure_json() {
        let report = parse_report(&report_json()).unwrap();
        assert_eq!(report.predicted_fos_outcome.confidence, "80%");
    }

    #[test]
    fn recovers_json_wrapped_in_prose() {
        let raw = format!("Sure, here is the analysis you asked for:\n{}\nLet me know!", report_json());
        let report = parse_report(&raw).unwrap();
        assert_eq!(report.case_summary, "Fee dispute on a personal loan.");
    }

    #[test]
    fn recovers_json_inside_markdown_fences() {
        let raw = format!("```json\n{}\n```", report_json());
        parse_report(&raw).unwrap();
    }

    #[test]
    fn output_without_braces_is_no_json_object() {
        let err = parse_report("I am unable to analyse these documents.").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject { .. }));
        assert_eq!(err.raw(), Some("I am unable to analyse these documents."));
    }

    #[test]
    fn reversed_braces_are_no_json_object() {
        let err = parse_report("} nothing useful {").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject { .. }));
    }

    #[test]
    fn truncated_json_fails_with_raw_attached() {
        let raw = r#"{"case_summary": "cut off mid-"#;
        // No closing brace at all → no candidate.
        let err = parse_report(raw).unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject { .. }));

        let raw = r#"{"case_summary": }"#;
        let err = parse_report(raw).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
        assert_eq!(err.raw(), Some(raw));
    }

    #[test]
    fn missing_predicted_outcome_is_a_parse_failure() {
        let mut value: serde_json::Value = serde_json::from_str(&report_json()).unwrap();
        value.as_object_mut().unwrap().remove("predicted_fos_outcome");
        let err = parse_report(&value.to_string()).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn placeholder_outcome_is_invalid() {
        let mut value: serde_json::Value = serde_json::from_str(&report_json()).unwrap();
        value["predicted_fos_outcome"] =
            serde_json::json!({"outcome": "N/A", "confidence": "0%"});
        let err = parse_report(&value.to_string()).unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn error_display_truncates_long_output() {
        let raw = "x".repeat(5000);
        let err = parse_report(&raw).unwrap_err();
        let message = err.to_string();
        assert!(message.len() < 400, "diagnostic must stay short: {}", message.len());
        assert_eq!(err.raw().map(str::len), Some(5000), "raw kept in full");
    }
}
