/// Generate SQL migrations for the PostgreSQL document store
///
/// Both collections share one `documents` table keyed by
/// `(collection, id)`. The `seq` column records insertion order so that
/// find results come back in the order documents were created.
pub fn generate_migrations() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "20240601000000_documents",
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                seq BIGSERIAL NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection_seq ON documents(collection, seq);
            "#,
        ),
        (
            "20240602000000_document_indexes",
            r#"
            -- containment and path lookups on the document body
            CREATE INDEX IF NOT EXISTS idx_documents_data ON documents USING GIN (data jsonb_path_ops);

            -- children of a graph are looked up by parent on every cascade
            CREATE INDEX IF NOT EXISTS idx_documents_parent_graph
                ON documents(collection, (data->>'parent_graph'));
            "#,
        ),
    ]
}
