//! The pipeline orchestrator: owns the job state machine and drives the
//! end-to-end analysis sequence.
//!
//! One submission → one detached task → one best-effort attempt. State
//! transitions are committed to the job store at fixed checkpoints:
//! `PROCESSING` before any extraction, the extracted texts immediately after
//! extraction (so explanation generation survives later failures), and a
//! single terminal update carrying either the report or the error message.
//! Every stage failure collapses into the `ERROR` state; nothing is retried
//! and nothing is re-raised to a caller.

use std::sync::Arc;

use complai_ai::{Classifier, EncodeError, TextEncoder};
use complai_core::{JobStatus, JobUpdate};
use complai_extract::{ExtractError, TextExtractor};
use complai_llm::{Completion, LlmError};
use complai_store::{JobStore, PrecedentSearch, StoreError};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::parse::{ParseError, parse_report};
use crate::prompt::master_prompt;

/// How many precedents hybrid retrieval asks for.
pub const TOP_K_PRECEDENTS: usize = 5;

/// A stage failure; its rendered message becomes the job's `error_message`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("embedding generation failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("precedent retrieval failed: {0}")]
    Retrieve(StoreError),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("generative completion failed: {0}")]
    Generate(#[from] LlmError),

    #[error("report parsing failed: {0}")]
    Parse(#[from] ParseError),
}

/// Drives Extract → Embed → Retrieve → BuildPrompt → Invoke → Parse → Persist
/// for one job at a time; independent jobs run concurrently.
pub struct AnalysisPipeline {
    jobs: Arc<dyn JobStore>,
    extractor: Arc<dyn TextExtractor>,
    classifier: Arc<dyn Classifier>,
    encoder: Arc<dyn TextEncoder>,
    precedents: Arc<dyn PrecedentSearch>,
    llm: Arc<dyn Completion>,
}

impl AnalysisPipeline {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        extractor: Arc<dyn TextExtractor>,
        classifier: Arc<dyn Classifier>,
        encoder: Arc<dyn TextEncoder>,
        precedents: Arc<dyn PrecedentSearch>,
        llm: Arc<dyn Completion>,
    ) -> Self {
        Self {
            jobs,
            extractor,
            classifier,
            encoder,
            precedents,
            llm,
        }
    }

    /// Create a `PENDING` job and schedule its analysis as a detached task.
    ///
    /// Returns the new job id as soon as the record exists; the caller polls
    /// the job store for completion. There is no admission control — every
    /// accepted submission gets a task.
    pub async fn submit(
        self: Arc<Self>,
        complaint: Vec<u8>,
        frl: Vec<u8>,
    ) -> Result<String, StoreError> {
        let job_id = Uuid::new_v4().to_string();
        self.jobs.create(&job_id).await?;
        info!(job_id, "job submitted");

        let pipeline = Arc::clone(&self);
        let task_job_id = job_id.clone();
        tokio::spawn(async move {
            pipeline.run(&task_job_id, complaint, frl).await;
        });

        Ok(job_id)
    }

    /// Execute the full pipeline for one job.
    ///
    /// Infallible from the caller's perspective: failures are persisted to
    /// the job record, not returned.
    pub async fn run(&self, job_id: &str, complaint: Vec<u8>, frl: Vec<u8>) {
        info!(job_id, "starting analysis pipeline");
        match self.execute(job_id, &complaint, &frl).await {
            Ok(()) => info!(job_id, "analysis complete"),
            Err(err) => {
                error!(job_id, error = %err, "analysis pipeline failed");
                let update = JobUpdate::error(err.to_string());
                if let Err(store_err) = self.jobs.update(job_id, update).await {
                    // The job may now be stuck in PROCESSING; only the store
                    // coming back can resolve that.
                    error!(job_id, error = %store_err, "failed to record job failure");
                }
            }
        }
    }

    async fn execute(
        &self,
        job_id: &str,
        complaint: &[u8],
        frl: &[u8],
    ) -> Result<(), PipelineError> {
        // 1. Enter PROCESSING before touching the documents.
        self.jobs
            .update(job_id, JobUpdate::status(JobStatus::Processing))
            .await?;

        // 2. Extract both documents and persist the texts immediately.
        let complaint_text = self.extractor.extract(complaint)?;
        let frl_text = self.extractor.extract(frl)?;
        self.jobs
            .update(
                job_id,
                JobUpdate::texts(complaint_text.clone(), frl_text.clone()),
            )
            .await?;

        // 3. Coarse classification; best-effort by contract, never fatal.
        let filters = self.classifier.classify(&complaint_text);
        debug!(
            job_id,
            product = filters.product_type.as_deref().unwrap_or("-"),
            themes = filters.key_themes.len(),
            "derived case filters"
        );

        // 4–5. Embed the complaint and retrieve similar precedents.
        let embedding = self.encoder.encode(&complaint_text)?;
        let precedents = self
            .precedents
            .search(&embedding, &filters, TOP_K_PRECEDENTS)
            .await
            .map_err(PipelineError::Retrieve)?;
        info!(job_id, matches = precedents.len(), "retrieved precedents");

        // 6–8. Prompt, invoke, parse.
        let prompt = master_prompt(&complaint_text, &frl_text, &precedents);
        let raw = self.llm.complete(&prompt).await?;
        let report = parse_report(&raw)?;

        // 9. COMPLETE and the report in a single update.
        self.jobs
            .update(job_id, JobUpdate::complete(report))
            .await?;
        Ok(())
    }
}
