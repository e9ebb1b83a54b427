use async_trait::async_trait;
use goldfish_core::document::{document_id, UpdateOutcome, ID_FIELD};
use goldfish_core::{Document, DocumentCollection, Filter, StoreError, Update};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::debug;

use crate::connection::{database_error, PostgresConnection};
use crate::query::push_filter;

/// Postgres implementation of a document collection.
///
/// Documents of every collection live in the shared `documents` table,
/// scoped by the `collection` column.
#[derive(Clone)]
pub struct PostgresCollection {
    conn: PostgresConnection,
    name: String,
}

impl PostgresCollection {
    pub fn new(conn: PostgresConnection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn select(&self, filter: &Filter) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        builder.push_bind(self.name.clone());

        // by-id lookups hit the primary key directly
        match filter {
            Filter::Eq { path, value: Value::String(id) } if path == ID_FIELD => {
                builder.push(" AND id = ");
                builder.push_bind(id.clone());
            }
            _ => {
                builder.push(" AND ");
                push_filter(&mut builder, filter);
            }
        }
        builder.push(" ORDER BY seq");
        builder
    }
}

fn decode_row(row: &PgRow) -> Result<Document, StoreError> {
    let data: Value = row
        .try_get("data")
        .map_err(|e| StoreError::Serialization(format!("Error getting data: {}", e)))?;
    match data {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "stored document is not an object: {}",
            other
        ))),
    }
}

#[async_trait]
impl DocumentCollection for PostgresCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut builder = self.select(filter);
        builder.push(" LIMIT 1");
        let row = builder
            .build()
            .fetch_optional(self.conn.pool())
            .await
            .map_err(database_error)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let rows = self
            .select(filter)
            .build()
            .fetch_all(self.conn.pool())
            .await
            .map_err(database_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::Serialization("document is missing a string _id".to_string()))?
            .to_string();

        let result = sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(&self.name)
        .bind(&id)
        .bind(Json(Value::Object(document)))
        .execute(self.conn.pool())
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey(id));
        }
        debug!(collection = %self.name, %id, "Inserted document");
        Ok(())
    }

    async fn update_one(&self, id: &str, update: &Update) -> Result<UpdateOutcome, StoreError> {
        update.validate()?;

        // the row lock serializes concurrent updates to this document
        let mut tx = self.conn.pool().begin().await.map_err(database_error)?;
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE")
            .bind(&self.name)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(database_error)?;

        let mut document = match row {
            Some(row) => decode_row(&row)?,
            None => {
                tx.rollback().await.map_err(database_error)?;
                return Ok(UpdateOutcome::not_matched());
            }
        };

        let changed = update.apply(&mut document)?;
        if changed {
            sqlx::query(
                "UPDATE documents SET data = $3, updated_at = NOW() WHERE collection = $1 AND id = $2",
            )
            .bind(&self.name)
            .bind(id)
            .bind(Json(Value::Object(document)))
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        }
        tx.commit().await.map_err(database_error)?;

        Ok(UpdateOutcome::matched(changed))
    }

    async fn delete_one(&self, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(&self.name)
            .bind(id)
            .execute(self.conn.pool())
            .await
            .map_err(database_error)?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        builder.push_bind(self.name.clone());
        builder.push(" AND ");
        push_filter(&mut builder, filter);

        let result = builder
            .build()
            .execute(self.conn.pool())
            .await
            .map_err(database_error)?;
        debug!(collection = %self.name, removed = result.rows_affected(), "Deleted matching documents");
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.conn.health_check().await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.conn.close().await;
        Ok(())
    }
}
