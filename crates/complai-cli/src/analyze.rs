//! The `analyze` subcommand: submit one complaint/FRL pair through the
//! pipeline and render the resulting report.
//!
//! Component wiring happens here: the embedding model is loaded once (a load
//! failure aborts before any job exists), shared behind [`SharedEmbedder`],
//! and injected into the orchestrator together with the store-backed
//! retriever and the Gemini client. The command then polls the job store the
//! way any client of the service would.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use complai_ai::{Embedder, KeywordClassifier, SharedEmbedder};
use complai_core::{JobRecord, JobStatus};
use complai_extract::PdfTextExtractor;
use complai_llm::GeminiClient;
use complai_pipeline::{AnalysisPipeline, Explainer};
use complai_store::{JobStore, LancePrecedentStore, MemoryJobStore};
use tracing::info;

use crate::display;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run(
    model_dir: &Path,
    db_path: &Path,
    api_key: &str,
    gen_model: &str,
    complaint_path: &Path,
    frl_path: &Path,
    explain: bool,
) -> anyhow::Result<()> {
    let embedder = Embedder::load(model_dir).context("loading embedding model")?;
    let store = LancePrecedentStore::open(db_path)
        .await
        .context("opening precedent store")?;

    let jobs = Arc::new(MemoryJobStore::new());
    let llm = Arc::new(GeminiClient::new(api_key, gen_model));
    let pipeline = Arc::new(AnalysisPipeline::new(
        jobs.clone(),
        Arc::new(PdfTextExtractor),
        Arc::new(KeywordClassifier),
        Arc::new(SharedEmbedder::new(embedder)),
        Arc::new(store),
        llm.clone(),
    ));

    let complaint = tokio::fs::read(complaint_path)
        .await
        .with_context(|| format!("reading {complaint_path:?}"))?;
    let frl = tokio::fs::read(frl_path)
        .await
        .with_context(|| format!("reading {frl_path:?}"))?;

    let job_id = pipeline.submit(complaint, frl).await?;
    info!(job_id, "job submitted, waiting for completion");

    let record = poll_until_terminal(jobs.as_ref(), &job_id).await?;
    match record.status {
        JobStatus::Complete => {
            let report = record
                .report
                .context("job completed without an attached report")?;
            println!("{}", display::render_report(&job_id, &report));
        }
        JobStatus::Error => anyhow::bail!(
            "analysis failed: {}",
            record
                .error_message
                .unwrap_or_else(|| "no error message recorded".to_string())
        ),
        status => anyhow::bail!("job ended polling in non-terminal state {status}"),
    }

    if explain {
        let explainer = Explainer::new(jobs, llm);

        println!("── Why this outcome ──");
        for bullet in explainer.explain_outcome(&job_id).await? {
            println!("  - {bullet}");
        }

        println!("\n── Why this confidence ──");
        for bullet in explainer.explain_confidence(&job_id).await? {
            println!("  - {bullet}");
        }
    }
    Ok(())
}

async fn poll_until_terminal(jobs: &dyn JobStore, job_id: &str) -> anyhow::Result<JobRecord> {
    loop {
        let record = jobs
            .get(job_id)
            .await?
            .with_context(|| format!("job {job_id} disappeared from the store"))?;
        if record.status.is_terminal() {
            return Ok(record);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
