//! Terminal rendering for risk-assessment reports.
//!
//! Renders the eight report sections as a grouped, human-readable card.

use complai_core::Report;

/// Render a full report card.
pub fn render_report(job_id: &str, report: &Report) -> String {
    let mut out = String::new();

    heading(&mut out, &format!("Risk Assessment Report — job {job_id}"));

    section(&mut out, "Executive Summary");
    paragraph(&mut out, &report.executive_summary);

    section(&mut out, "Case Summary");
    paragraph(&mut out, &report.case_summary);

    section(&mut out, "Predicted FOS Outcome");
    let outcome = &report.predicted_fos_outcome;
    if outcome.confidence.is_empty() {
        paragraph(&mut out, &outcome.outcome);
    } else {
        paragraph(
            &mut out,
            &format!("{} (confidence: {})", outcome.outcome, outcome.confidence),
        );
    }

    section(&mut out, "FRL Compliance Checks");
    for check in &report.frl_compliance_checks {
        let verdict = if check.compliant { "PASS" } else { "FAIL" };
        out.push_str(&format!("  [{verdict}] {}: {}\n", check.item, check.reason));
    }
    if report.frl_compliance_checks.is_empty() {
        paragraph(&mut out, "(none)");
    }

    section(&mut out, "Historical Precedent Analysis");
    bullets(&mut out, &report.historical_precedent_analysis);

    section(&mut out, "Key Risk Indicators");
    bullets(&mut out, &report.key_risk_indicators);

    section(&mut out, "Financial Impact Assessment");
    paragraph(
        &mut out,
        &format!(
            "low: {}   high: {}",
            report.financial_impact_assessment.low_estimate,
            report.financial_impact_assessment.high_estimate
        ),
    );

    section(&mut out, "Recommendations");
    paragraph(&mut out, &report.recommendations);

    out
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("═══ {title} ═══\n"));
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("\n── {title} ──\n"));
}

fn paragraph(out: &mut String, text: &str) {
    out.push_str(&format!("  {text}\n"));
}

fn bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    for item in items {
        out.push_str(&format!("  • {item}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        serde_json::from_value(serde_json::json!({
            "case_summary": "Fee dispute on a personal loan.",
            "frl_compliance_checks": [
                {"item": "Clarity", "compliant": true, "reason": "Plain language."},
                {"item": "Timeliness", "compliant": false, "reason": "Past the deadline."}
            ],
            "historical_precedent_analysis": ["DRN0060527 supports the customer."],
            "key_risk_indicators": ["Undisclosed fee"],
            "predicted_fos_outcome": {"outcome": "Likely to be Upheld", "confidence": "85%"},
            "financial_impact_assessment": {"low_estimate": "£500", "high_estimate": "£750"},
            "recommendations": "Refund the fee.",
            "executive_summary": "Likely uphold. Fee poorly disclosed. Low exposure."
        }))
        .unwrap()
    }

    #[test]
    fn card_shows_all_sections() {
        let card = render_report("job-1", &sample_report());
        for title in [
            "Executive Summary",
            "Case Summary",
            "Predicted FOS Outcome",
            "FRL Compliance Checks",
            "Historical Precedent Analysis",
            "Key Risk Indicators",
            "Financial Impact Assessment",
            "Recommendations",
        ] {
            assert!(card.contains(title), "card must contain '{title}'");
        }
    }

    #[test]
    fn card_marks_pass_and_fail() {
        let card = render_report("job-1", &sample_report());
        assert!(card.contains("[PASS] Clarity"));
        assert!(card.contains("[FAIL] Timeliness"));
    }

    #[test]
    fn outcome_line_includes_confidence() {
        let card = render_report("job-1", &sample_report());
        assert!(card.contains("Likely to be Upheld (confidence: 85%)"));
    }
}
