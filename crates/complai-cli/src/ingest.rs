//! Corpus ingestion: knowledge-base documents → embedded precedent rows.
//!
//! Offline, one-shot utility using the same extraction and embedding
//! technique as the live pipeline. Walks a directory of decision documents,
//! derives coarse metadata per file, embeds a metadata summary string, and
//! rewrites the `precedents` table wholesale. Per-file failures are reported
//! and skipped — a bad scan must not abort the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use arrow::array::{FixedSizeListBuilder, Float32Builder, StringBuilder, TimestampNanosecondArray};
use arrow::record_batch::RecordBatch;
use complai_ai::{Classifier, Embedder, KeywordClassifier};
use complai_core::CaseFilters;
use complai_core::schema::precedents::{EMBED_DIM, precedent_schema};
use complai_extract::{PdfTextExtractor, TextExtractor};
use complai_store::LancePrecedentStore;
use tracing::warn;

const EMBED_BATCH_SIZE: usize = 64;

pub struct IngestStats {
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub elapsed_secs: f64,
}

struct PrecedentRow {
    case_id: String,
    full_text: String,
    filters: CaseFilters,
    fos_outcome: &'static str,
}

pub async fn run(model_dir: &Path, db_path: &Path, dir: &Path) -> anyhow::Result<()> {
    let mut embedder = Embedder::load(model_dir).context("loading embedding model")?;
    let store = LancePrecedentStore::open(db_path)
        .await
        .context("opening precedent store")?;

    let stats = run_ingest(&store, &mut embedder, &KeywordClassifier, dir).await?;
    println!(
        "Ingestion complete: {} files in {:.1}s ({} skipped)",
        stats.files_ingested, stats.elapsed_secs, stats.files_skipped
    );
    Ok(())
}

/// Run the full ingestion pipeline: read documents → embed → write to LanceDB.
pub async fn run_ingest(
    store: &LancePrecedentStore,
    embedder: &mut Embedder,
    classifier: &dyn Classifier,
    dir: &Path,
) -> anyhow::Result<IngestStats> {
    let start = Instant::now();

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading knowledge base directory {dir:?}"))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    entries.sort();

    // 1. Extract text and derive metadata per document.
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for path in &entries {
        match read_document(path) {
            Ok(Some(text)) if !text.trim().is_empty() => {
                let case_id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let filters = classifier.classify(&text);
                let fos_outcome = outcome_from_text(&text);
                rows.push(PrecedentRow {
                    case_id,
                    full_text: text,
                    filters,
                    fos_outcome,
                });
            }
            Ok(Some(_)) => {
                warn!(path = %path.display(), "no extractable text, skipping");
                skipped += 1;
            }
            Ok(None) => {} // Unsupported extension; not counted as a skip.
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to process file, skipping");
                skipped += 1;
            }
        }
    }

    anyhow::ensure!(!rows.is_empty(), "no ingestable documents found in {dir:?}");

    // 2. Embed the metadata summary strings in sub-batches.
    let summaries: Vec<String> = rows.iter().map(embedding_summary).collect();
    let mut embeddings = Vec::with_capacity(summaries.len());
    for chunk in summaries.chunks(EMBED_BATCH_SIZE) {
        let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        let batch = embedder
            .embed_batch(&refs)
            .context("generating embeddings")?;
        embeddings.extend(batch);
        eprint!("\r  Embedded {}/{}", embeddings.len(), summaries.len());
    }
    eprintln!();

    // 3. Build the Arrow batch and rewrite the precedents table.
    let batch = build_precedent_batch(&rows, &embeddings)?;
    store
        .create_precedents(vec![batch])
        .await
        .context("writing precedents table")?;

    Ok(IngestStats {
        files_ingested: rows.len(),
        files_skipped: skipped,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

/// Read a document's text: PDFs through the extractor, `.txt` as UTF-8.
/// Returns `None` for unsupported extensions.
fn read_document(path: &Path) -> anyhow::Result<Option<String>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path)?;
            let text = PdfTextExtractor.extract(&bytes)?;
            Ok(Some(text))
        }
        "txt" => Ok(Some(std::fs::read_to_string(path)?)),
        _ => Ok(None),
    }
}

/// Keyword match on the decision text, as the original corpus loader did.
fn outcome_from_text(text: &str) -> &'static str {
    if text.to_lowercase().contains("upheld") {
        "Upheld"
    } else {
        "Not Upheld"
    }
}

/// The string that gets embedded: key metadata rather than the full text,
/// which retrieves better for short complaint queries.
fn embedding_summary(row: &PrecedentRow) -> String {
    format!(
        "Case: {}. Product: {}. Themes: {}. Outcome: {}",
        row.case_id,
        row.filters.product_type.as_deref().unwrap_or("Unknown"),
        row.filters.key_themes.join(", "),
        row.fos_outcome
    )
}

fn build_precedent_batch(
    rows: &[PrecedentRow],
    embeddings: &[Vec<f32>],
) -> anyhow::Result<RecordBatch> {
    let mut case_ids = StringBuilder::new();
    let mut texts = StringBuilder::new();
    let mut products = StringBuilder::new();
    let mut themes = StringBuilder::new();
    let mut outcomes = StringBuilder::new();
    let mut vectors = FixedSizeListBuilder::new(Float32Builder::new(), EMBED_DIM);

    for (row, embedding) in rows.iter().zip(embeddings) {
        case_ids.append_value(&row.case_id);
        texts.append_value(&row.full_text);
        products.append_value(row.filters.product_type.as_deref().unwrap_or("Unknown"));
        themes.append_value(row.filters.key_themes.join(","));
        outcomes.append_value(row.fos_outcome);
        let values = vectors.values();
        for &v in embedding {
            values.append_value(v);
        }
        vectors.append(true);
    }

    let now_nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let ingested =
        TimestampNanosecondArray::from(vec![now_nanos; rows.len()]).with_timezone("UTC");

    let batch = RecordBatch::try_new(
        Arc::new(precedent_schema(EMBED_DIM)),
        vec![
            Arc::new(case_ids.finish()),
            Arc::new(texts.finish()),
            Arc::new(products.finish()),
            Arc::new(themes.finish()),
            Arc::new(outcomes.finish()),
            Arc::new(vectors.finish()),
            Arc::new(ingested),
        ],
    )?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(case_id: &str, product: &str, themes: &[&str], outcome: &'static str) -> PrecedentRow {
        PrecedentRow {
            case_id: case_id.to_string(),
            full_text: "decision text".to_string(),
            filters: CaseFilters {
                product_type: Some(product.to_string()),
                key_themes: themes.iter().map(|t| t.to_string()).collect(),
            },
            fos_outcome: outcome,
        }
    }

    #[test]
    fn embedding_summary_concatenates_metadata() {
        let summary = embedding_summary(&row(
            "DRN0060527",
            "Personal Loan",
            &["Affordability", "Fees & Charges"],
            "Upheld",
        ));
        assert_eq!(
            summary,
            "Case: DRN0060527. Product: Personal Loan. Themes: Affordability, Fees & Charges. Outcome: Upheld"
        );
    }

    #[test]
    fn outcome_detection_is_case_insensitive() {
        assert_eq!(outcome_from_text("The complaint was UPHELD."), "Upheld");
        assert_eq!(outcome_from_text("We reject this complaint."), "Not Upheld");
    }

    #[test]
    fn unsupported_extensions_are_ignored() {
        let result = read_document(Path::new("notes.docx")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn batch_carries_one_row_per_document() {
        let rows = vec![
            row("DRN001", "Mortgage", &["Fees & Charges"], "Upheld"),
            row("DRN002", "Credit Card", &["Fraud & Scams"], "Not Upheld"),
        ];
        let embeddings = vec![vec![0.0; EMBED_DIM as usize]; 2];
        let batch = build_precedent_batch(&rows, &embeddings).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 7);
    }
}
