//! Master prompt assembly.
//!
//! The prompt is a deterministic template: both documents verbatim, the
//! retrieved precedents delimited and prefixed with their case ids, and one
//! explicit instruction per report key. The instruction block is the schema
//! contract — every field of [`complai_core::Report`] has a matching
//! instruction, the predicted outcome is marked mandatory, and the model is
//! told to emit exactly one JSON object and nothing else.

use complai_core::PrecedentMatch;

/// Delimited concatenation of precedent entries, each prefixed with its id.
pub fn precedent_context(precedents: &[PrecedentMatch]) -> String {
    if precedents.is_empty() {
        return "No similar historical cases were found.".to_string();
    }
    precedents
        .iter()
        .map(|p| format!("Precedent Case ID: {}\n\n{}", p.case_id, p.full_text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Build the master analysis prompt.
pub fn master_prompt(
    complaint_text: &str,
    frl_text: &str,
    precedents: &[PrecedentMatch],
) -> String {
    let precedent_context = precedent_context(precedents);

    format!(
        r#"**Role:** You are an expert Financial Ombudsman Service (FOS) case analyst. Your task is to provide a detailed, structured compliance and risk assessment report.

**Input Documents:**
1.  **Customer Complaint:**
```
{complaint_text}
```

2.  **Firm's Final Response Letter (FRL):**
```
{frl_text}
```

3.  **Relevant Historical Precedents:**
```
{precedent_context}
```

**Task:**
Analyze the provided documents and generate a JSON object with the following 8 keys. Do not include any text outside of the JSON object.

1.  `case_summary`: A concise summary of the customer's complaint as a single string.
2.  `frl_compliance_checks`: An array of objects, each with 'item' (e.g., "Clarity", "Timeliness"), 'compliant' (true/false), and a 'reason' string.
3.  `historical_precedent_analysis`: **An array of strings.** Each string must be a single bullet point. For each point, you MUST cite the relevant Case ID (e.g., "DRN0060527") that supports your analysis.
4.  `key_risk_indicators`: **An array of strings.** Each string must be a single, concise bullet point identifying a key compliance or conduct risk.
5.  `predicted_fos_outcome`: **This field is MANDATORY.** You MUST provide a prediction. Generate an object with two keys: an 'outcome' string (e.g., "Likely to be Upheld", "Likely to be Rejected", "50/50 - Unclear") and a 'confidence' string (e.g., "85%", "70%", "50%"). Do NOT return "Not predicted" or "N/A".
6.  `financial_impact_assessment`: An object with a 'low_estimate' and 'high_estimate' of the potential financial impact.
7.  `recommendations`: A single string with specific, actionable steps the firm should take.
8.  `executive_summary`: A high-level, 3-sentence summary as a single string.

**Output Format:** Respond with only a valid JSON object.
"#
    )
}
