//! Follow-up explanation generation for completed analyses.
//!
//! Works from the job record alone: the complaint/FRL texts persisted at the
//! pipeline's extraction checkpoint plus the stored report. Two variants —
//! why the outcome was predicted, and why the confidence score was assigned.

use std::sync::Arc;

use complai_core::{JobRecord, Report};
use complai_llm::{Completion, LlmError};
use complai_store::{JobStore, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("job `{0}` not found")]
    JobNotFound(String),

    #[error("job `{0}` has no persisted texts or report to explain")]
    MissingContext(String),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("generative completion failed: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to serialise report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Generates bullet-point explanations for a completed job.
pub struct Explainer {
    jobs: Arc<dyn JobStore>,
    llm: Arc<dyn Completion>,
}

impl Explainer {
    pub fn new(jobs: Arc<dyn JobStore>, llm: Arc<dyn Completion>) -> Self {
        Self { jobs, llm }
    }

    /// Explain the primary reasons behind the predicted outcome.
    pub async fn explain_outcome(&self, job_id: &str) -> Result<Vec<String>, ExplainError> {
        let (complaint, frl, report) = self.context(job_id).await?;
        let report_json = serde_json::to_string(&report)?;
        let prompt = outcome_prompt(&report_json, &complaint, &frl);

        info!(job_id, "generating outcome explanation");
        let response = self.llm.complete(&prompt).await?;
        Ok(split_bullets(&response))
    }

    /// Explain the factors behind the confidence score.
    pub async fn explain_confidence(&self, job_id: &str) -> Result<Vec<String>, ExplainError> {
        let (complaint, frl, report) = self.context(job_id).await?;
        let outcome = &report.predicted_fos_outcome;
        let prompt = confidence_prompt(&outcome.outcome, &outcome.confidence, &complaint, &frl);

        info!(job_id, "generating confidence explanation");
        let response = self.llm.complete(&prompt).await?;
        Ok(split_bullets(&response))
    }

    /// Fetch the job and require the persisted texts and report.
    async fn context(&self, job_id: &str) -> Result<(String, String, Report), ExplainError> {
        let record: JobRecord = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| ExplainError::JobNotFound(job_id.to_string()))?;

        match (record.complaint_text, record.frl_text, record.report) {
            (Some(complaint), Some(frl), Some(report))
                if !complaint.is_empty() && !frl.is_empty() =>
            {
                Ok((complaint, frl, report))
            }
            _ => Err(ExplainError::MissingContext(job_id.to_string())),
        }
    }
}

/// Prompt for explaining the predicted outcome.
pub fn outcome_prompt(report_json: &str, complaint_text: &str, frl_text: &str) -> String {
    format!(
        r#"**Context:**
An AI model previously analyzed a customer complaint and a firm's Final Response Letter (FRL).
The model's final analysis was: {report_json}

**Original Complaint:**
{complaint_text}

**Original FRL:**
{frl_text}

**Task:**
Based on all the provided context, explain IN THREE CONCISE BULLET POINTS the primary reasons for the 'predicted_fos_outcome'. Focus on the most critical factors.
Start each point with a hyphen (-).

**Output:**
Return ONLY the three bullet points as a single string, with each point separated by a newline character.
"#
    )
}

/// Prompt for explaining the confidence score.
pub fn confidence_prompt(
    outcome: &str,
    confidence: &str,
    complaint_text: &str,
    frl_text: &str,
) -> String {
    format!(
        r#"**Context:**
An AI model previously analyzed a customer complaint and a firm's Final Response Letter (FRL).
The model predicted the FOS outcome would be "{outcome}" with a confidence score of "{confidence}".

**Original Complaint:**
{complaint_text}

**Original FRL:**
{frl_text}

**Task:**
Based on all the provided context, explain in three concise bullet points the primary reasons you assigned the confidence score of "{confidence}".
Focus on factors of certainty or uncertainty (e.g., "Confidence is high because of a clear precedent match," or "Confidence is moderate due to conflicting evidence.").
Start each point with a hyphen (-).

**Output:**
Return ONLY the three bullet points as a single string, with each point separated by a newline character.
"#
    )
}

/// Split a bullet-point response into trimmed points.
///
/// Splits on lines rather than on every hyphen so hyphenated words survive;
/// leading bullet markers are stripped.
pub fn split_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use complai_core::{JobUpdate, Report};
    use complai_store::MemoryJobStore;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl Completion for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn sample_report() -> Report {
        serde_json::from_value(serde_json::json!({
            "case_summary": "Fee dispute.",
            "frl_compliance_checks": [],
            "historical_precedent_analysis": [],
            "key_risk_indicators": [],
            "predicted_fos_outcome": {"outcome": "Likely to be Upheld", "confidence": "85%"},
            "financial_impact_assessment": {"low_estimate": "£500", "high_estimate": "£750"},
            "recommendations": "Refund.",
            "executive_summary": "Short."
        }))
        .unwrap()
    }

    async fn completed_job(store: &MemoryJobStore, job_id: &str) {
        store.create(job_id).await.unwrap();
        store
            .update(job_id, JobUpdate::texts("complaint body", "frl body"))
            .await
            .unwrap();
        store
            .update(job_id, JobUpdate::complete(sample_report()))
            .await
            .unwrap();
    }

    #[test]
    fn split_bullets_strips_markers_and_blanks() {
        let bullets = split_bullets("- first point\n\n- second point\n• third point\n");
        assert_eq!(bullets, vec!["first point", "second point", "third point"]);
    }

    #[test]
    fn split_bullets_keeps_hyphenated_words() {
        let bullets = split_bullets("- the FRL was well-structured and clear");
        assert_eq!(bullets, vec!["the FRL was well-structured and clear"]);
    }

    #[test]
    fn confidence_prompt_quotes_prediction() {
        let prompt = confidence_prompt("Likely to be Upheld", "85%", "c", "f");
        assert!(prompt.contains("\"Likely to be Upheld\""));
        assert!(prompt.contains("\"85%\""));
    }

    #[test]
    fn outcome_prompt_embeds_report_and_texts() {
        let prompt = outcome_prompt("{\"k\":1}", "complaint body", "frl body");
        assert!(prompt.contains("{\"k\":1}"));
        assert!(prompt.contains("complaint body"));
        assert!(prompt.contains("frl body"));
    }

    #[tokio::test]
    async fn explain_outcome_returns_bullets() {
        let store = Arc::new(MemoryJobStore::new());
        completed_job(&store, "job-1").await;

        let explainer = Explainer::new(
            store,
            Arc::new(CannedLlm("- clear precedent\n- late FRL\n- fee undisclosed")),
        );
        let bullets = explainer.explain_outcome("job-1").await.unwrap();
        assert_eq!(bullets.len(), 3);
        assert_eq!(bullets[0], "clear precedent");
    }

    #[tokio::test]
    async fn explain_requires_a_known_job() {
        let explainer = Explainer::new(
            Arc::new(MemoryJobStore::new()),
            Arc::new(CannedLlm("- a")),
        );
        let err = explainer.explain_outcome("missing").await.unwrap_err();
        assert!(matches!(err, ExplainError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn explain_requires_persisted_texts_and_report() {
        let store = Arc::new(MemoryJobStore::new());
        store.create("job-2").await.unwrap();
        // Texts persisted but the job never completed.
        store
            .update("job-2", JobUpdate::texts("complaint", "frl"))
            .await
            .unwrap();

        let explainer = Explainer::new(store, Arc::new(CannedLlm("- a")));
        let err = explainer.explain_confidence("job-2").await.unwrap_err();
        assert!(matches!(err, ExplainError::MissingContext(id) if id == "job-2"));
    }
}
