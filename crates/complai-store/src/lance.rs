//! LanceDB storage layer for the precedent knowledge base.
//!
//! One table, `precedents`: full decision text plus coarse metadata and a
//! 384-dim embedding column. The corpus ingester writes it wholesale
//! (drop-and-recreate); the live pipeline only reads from it via hybrid
//! search.

use std::path::Path;

use arrow::array::{Array, Float32Array, LargeStringArray, RecordBatchIterator, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use complai_core::{CaseFilters, PrecedentMatch};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::{debug, info};

use crate::{PrecedentSearch, StoreError};

const PRECEDENTS_TABLE: &str = "precedents";

/// LanceDB-backed precedent store.
pub struct LancePrecedentStore {
    db: lancedb::Connection,
}

impl LancePrecedentStore {
    /// Connect to a LanceDB database at the given path.
    ///
    /// Creates the database directory if it doesn't exist.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self { db })
    }

    /// Create (or replace) the `precedents` table from pre-built batches.
    pub async fn create_precedents(&self, batches: Vec<RecordBatch>) -> Result<(), StoreError> {
        if batches.is_empty() {
            return Err(StoreError::Other("no record batches provided".into()));
        }

        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let schema = batches[0].schema();
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        let existing = self.db.table_names().execute().await?;
        if existing.contains(&PRECEDENTS_TABLE.to_string()) {
            self.db.drop_table(PRECEDENTS_TABLE, &[]).await?;
        }

        self.db
            .create_table(PRECEDENTS_TABLE, Box::new(reader))
            .execute()
            .await?;

        info!(
            table = PRECEDENTS_TABLE,
            rows = total_rows,
            "created precedents table"
        );
        Ok(())
    }

    /// Open the `precedents` table.
    pub async fn precedents(&self) -> Result<lancedb::Table, StoreError> {
        let table = self.db.open_table(PRECEDENTS_TABLE).execute().await?;
        Ok(table)
    }

    /// Count rows in the `precedents` table.
    pub async fn precedent_count(&self) -> Result<usize, StoreError> {
        let table = self.precedents().await?;
        let count = table.count_rows(None).await?;
        Ok(count)
    }

    /// Hybrid search: vector similarity narrowed by the metadata filters.
    ///
    /// When the filtered query matches nothing, the search degrades to pure
    /// vector similarity rather than returning empty-handed.
    pub async fn search_precedents(
        &self,
        embedding: &[f32],
        filters: &CaseFilters,
        k: usize,
    ) -> Result<Vec<PrecedentMatch>, StoreError> {
        let table = self.precedents().await?;

        if let Some(clause) = filter_clause(filters) {
            let batches: Vec<RecordBatch> = table
                .vector_search(embedding)?
                .only_if(clause.clone())
                .limit(k)
                .execute()
                .await?
                .try_collect()
                .await?;
            let matches = matches_from_batches(&batches)?;
            if !matches.is_empty() {
                return Ok(matches);
            }
            debug!(clause = %clause, "no filtered matches, degrading to pure vector search");
        }

        let batches: Vec<RecordBatch> = table
            .vector_search(embedding)?
            .limit(k)
            .execute()
            .await?
            .try_collect()
            .await?;
        matches_from_batches(&batches)
    }
}

#[async_trait]
impl PrecedentSearch for LancePrecedentStore {
    async fn search(
        &self,
        embedding: &[f32],
        filters: &CaseFilters,
        k: usize,
    ) -> Result<Vec<PrecedentMatch>, StoreError> {
        self.search_precedents(embedding, filters, k).await
    }
}

/// Build the SQL `only_if` clause for the coarse filters, if any.
fn filter_clause(filters: &CaseFilters) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(product) = &filters.product_type {
        clauses.push(format!("product_type = '{}'", escape_sql(product)));
    }
    if !filters.key_themes.is_empty() {
        let themes: Vec<String> = filters
            .key_themes
            .iter()
            .map(|theme| format!("key_themes LIKE '%{}%'", escape_sql(theme)))
            .collect();
        clauses.push(format!("({})", themes.join(" OR ")));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}

/// Convert search result batches into precedent matches, in result order.
fn matches_from_batches(batches: &[RecordBatch]) -> Result<Vec<PrecedentMatch>, StoreError> {
    let mut matches = Vec::new();

    for batch in batches {
        let case_col = batch
            .column_by_name("case_id")
            .ok_or_else(|| StoreError::Other("missing 'case_id' column".into()))?;
        let text_col = batch
            .column_by_name("full_text")
            .ok_or_else(|| StoreError::Other("missing 'full_text' column".into()))?;
        let distance_col = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..batch.num_rows() {
            let case_id = get_string(case_col.as_ref(), row)
                .ok_or_else(|| StoreError::Other("null case_id in precedent row".into()))?;
            let full_text = get_string(text_col.as_ref(), row).unwrap_or_default();
            let distance = distance_col.and_then(|arr| {
                if arr.is_null(row) {
                    None
                } else {
                    Some(arr.value(row))
                }
            });
            matches.push(PrecedentMatch {
                case_id,
                full_text,
                distance,
            });
        }
    }

    Ok(matches)
}

fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{FixedSizeListBuilder, Float32Builder, StringBuilder};
    use arrow::array::TimestampNanosecondArray;
    use complai_core::schema::precedents::precedent_schema;
    use std::sync::Arc;
    use tempfile::TempDir;

    const DIM: i32 = 4; // Small dim for tests.

    struct Row<'a> {
        case_id: &'a str,
        full_text: &'a str,
        product_type: &'a str,
        key_themes: &'a str,
        embedding: [f32; 4],
    }

    fn precedent_batch(rows: &[Row<'_>]) -> RecordBatch {
        let mut case_ids = StringBuilder::new();
        let mut texts = StringBuilder::new();
        let mut products = StringBuilder::new();
        let mut themes = StringBuilder::new();
        let mut outcomes = StringBuilder::new();
        let mut embeddings = FixedSizeListBuilder::new(Float32Builder::new(), DIM);

        for row in rows {
            case_ids.append_value(row.case_id);
            texts.append_value(row.full_text);
            products.append_value(row.product_type);
            themes.append_value(row.key_themes);
            outcomes.append_value("Upheld");
            let values = embeddings.values();
            for v in row.embedding {
                values.append_value(v);
            }
            embeddings.append(true);
        }

        let ingested =
            TimestampNanosecondArray::from(vec![0i64; rows.len()]).with_timezone("UTC");

        RecordBatch::try_new(
            Arc::new(precedent_schema(DIM)),
            vec![
                Arc::new(case_ids.finish()),
                Arc::new(texts.finish()),
                Arc::new(products.finish()),
                Arc::new(themes.finish()),
                Arc::new(outcomes.finish()),
                Arc::new(embeddings.finish()),
                Arc::new(ingested),
            ],
        )
        .unwrap()
    }

    async fn seeded_store(tmp: &TempDir) -> LancePrecedentStore {
        let store = LancePrecedentStore::open(&tmp.path().join("lancedb"))
            .await
            .unwrap();
        let batch = precedent_batch(&[
            Row {
                case_id: "DRN001",
                full_text: "Loan fee dispute upheld.",
                product_type: "Personal Loan",
                key_themes: "Affordability,Fees & Charges",
                embedding: [1.0, 0.0, 0.0, 0.0],
            },
            Row {
                case_id: "DRN002",
                full_text: "Mortgage miscalculation rejected.",
                product_type: "Mortgage",
                key_themes: "Fees & Charges",
                embedding: [0.0, 1.0, 0.0, 0.0],
            },
            Row {
                case_id: "DRN003",
                full_text: "Second loan fee dispute.",
                product_type: "Personal Loan",
                key_themes: "Customer Service",
                embedding: [0.9, 0.1, 0.0, 0.0],
            },
        ]);
        store.create_precedents(vec![batch]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let store = LancePrecedentStore::open(&tmp.path().join("lancedb"))
            .await
            .unwrap();
        drop(store);
    }

    #[tokio::test]
    async fn create_and_count() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        assert_eq!(store.precedent_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn reload_replaces_table() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let batch = precedent_batch(&[Row {
            case_id: "DRN009",
            full_text: "only row",
            product_type: "Credit Card",
            key_themes: "Fraud & Scams",
            embedding: [0.0, 0.0, 1.0, 0.0],
        }]);
        store.create_precedents(vec![batch]).await.unwrap();
        assert_eq!(store.precedent_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unfiltered_search_orders_by_similarity() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let matches = store
            .search_precedents(&[1.0, 0.0, 0.0, 0.0], &CaseFilters::default(), 2)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].case_id, "DRN001", "exact match must come first");
        assert_eq!(matches[1].case_id, "DRN003");
        assert!(matches[0].distance.is_some());
    }

    #[tokio::test]
    async fn product_filter_narrows_search() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let filters = CaseFilters {
            product_type: Some("Mortgage".to_string()),
            key_themes: vec![],
        };
        let matches = store
            .search_precedents(&[1.0, 0.0, 0.0, 0.0], &filters, 5)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].case_id, "DRN002");
    }

    #[tokio::test]
    async fn theme_filter_uses_substring_match() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let filters = CaseFilters {
            product_type: None,
            key_themes: vec!["Customer Service".to_string()],
        };
        let matches = store
            .search_precedents(&[1.0, 0.0, 0.0, 0.0], &filters, 5)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].case_id, "DRN003");
    }

    #[tokio::test]
    async fn unmatched_filters_degrade_to_vector_search() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let filters = CaseFilters {
            product_type: Some("Travel Insurance".to_string()),
            key_themes: vec![],
        };
        let matches = store
            .search_precedents(&[1.0, 0.0, 0.0, 0.0], &filters, 2)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2, "fallback must ignore the filters");
        assert_eq!(matches[0].case_id, "DRN001");
    }

    #[test]
    fn filter_clause_escapes_quotes() {
        let filters = CaseFilters {
            product_type: Some("O'Brien's Loan".to_string()),
            key_themes: vec![],
        };
        let clause = filter_clause(&filters).unwrap();
        assert_eq!(clause, "product_type = 'O''Brien''s Loan'");
    }

    #[test]
    fn empty_filters_produce_no_clause() {
        assert!(filter_clause(&CaseFilters::default()).is_none());
    }
}
