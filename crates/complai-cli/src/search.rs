//! The `search` subcommand: free-text similarity lookup against the
//! precedent store, mainly for checking what an ingest produced.

use std::path::Path;

use anyhow::Context;
use complai_ai::Embedder;
use complai_core::CaseFilters;
use complai_store::LancePrecedentStore;

const EXCERPT_CHARS: usize = 120;

pub async fn run(model_dir: &Path, db_path: &Path, query: &str, k: usize) -> anyhow::Result<()> {
    let mut embedder = Embedder::load(model_dir).context("loading embedding model")?;
    let store = LancePrecedentStore::open(db_path)
        .await
        .context("opening precedent store")?;

    let embedding = embedder.embed(query)?;
    let matches = store
        .search_precedents(&embedding, &CaseFilters::default(), k)
        .await?;

    if matches.is_empty() {
        println!("No precedents found.");
        return Ok(());
    }

    for m in matches {
        let distance = m
            .distance
            .map(|d| format!("{d:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!("{}  distance={distance}", m.case_id);
        println!("  {}", excerpt(&m.full_text));
    }
    Ok(())
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::excerpt;

    #[test]
    fn excerpt_flattens_whitespace() {
        assert_eq!(excerpt("a\n  b\t c"), "a b c");
    }

    #[test]
    fn excerpt_truncates_long_text() {
        let long = "word ".repeat(100);
        let short = excerpt(&long);
        assert!(short.chars().count() <= 121);
        assert!(short.ends_with('…'));
    }
}
