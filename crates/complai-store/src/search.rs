//! The retrieval seam the pipeline depends on.

use async_trait::async_trait;
use complai_core::{CaseFilters, PrecedentMatch};

use crate::StoreError;

/// Similarity search over the historical precedent corpus.
///
/// Returns at most `k` matches, most-similar first; tie-break order is the
/// backend's business and need not be stable across calls. Filters that
/// match nothing degrade to pure vector similarity — only a backend failure
/// is an error.
#[async_trait]
pub trait PrecedentSearch: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        filters: &CaseFilters,
        k: usize,
    ) -> Result<Vec<PrecedentMatch>, StoreError>;
}
