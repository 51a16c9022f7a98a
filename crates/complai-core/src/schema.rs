/// Arrow schema definitions for the precedent knowledge base.
pub mod precedents {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use std::sync::Arc;

    /// Embedding dimensionality of all-MiniLM-L6-v2.
    pub const EMBED_DIM: i32 = 384;

    /// Schema for the `precedents` table written by the corpus ingester.
    ///
    /// `key_themes` is stored comma-joined so the store can filter it with a
    /// plain SQL `LIKE` clause during hybrid search.
    pub fn precedent_schema(embed_dim: i32) -> Schema {
        Schema::new(vec![
            Field::new("case_id", DataType::Utf8, false),
            Field::new("full_text", DataType::Utf8, false),
            Field::new("product_type", DataType::Utf8, true),
            Field::new("key_themes", DataType::Utf8, true),
            Field::new("fos_outcome", DataType::Utf8, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embed_dim,
                ),
                true,
            ),
            Field::new(
                "ingested_at",
                DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
                true,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::precedents;

    #[test]
    fn precedent_schema_has_expected_fields() {
        let schema = precedents::precedent_schema(precedents::EMBED_DIM);
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name("case_id").is_ok());
        assert!(schema.field_with_name("full_text").is_ok());
        assert!(schema.field_with_name("embedding").is_ok());
    }

    #[test]
    fn embedding_column_is_fixed_size_list() {
        let schema = precedents::precedent_schema(4);
        let field = schema.field_with_name("embedding").unwrap();
        match field.data_type() {
            arrow::datatypes::DataType::FixedSizeList(_, dim) => assert_eq!(*dim, 4),
            other => panic!("unexpected embedding type: {other:?}"),
        }
    }
}
