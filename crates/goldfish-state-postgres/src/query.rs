//! Translation of document filters into SQL over the JSONB `data` column

use goldfish_core::document::filter::path_segments;
use goldfish_core::Filter;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

/// Append the SQL condition for `filter` to the builder
pub fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            builder.push("TRUE");
        }
        Filter::Eq { path, value } => push_eq(builder, path, value),
        Filter::Exists { path, exists } => {
            builder.push("(data #> ");
            builder.push_bind(bind_path(path));
            builder.push(if *exists { ") IS NOT NULL" } else { ") IS NULL" });
        }
        Filter::In { path, values } => {
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push("(");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_eq(builder, path, value);
            }
            builder.push(")");
        }
        Filter::And(clauses) => {
            if clauses.is_empty() {
                builder.push("TRUE");
                return;
            }
            builder.push("(");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                push_filter(builder, clause);
            }
            builder.push(")");
        }
    }
}

fn push_eq(builder: &mut QueryBuilder<'_, Postgres>, path: &str, value: &Value) {
    if value.is_null() {
        // null matches both a stored null and a missing field
        builder.push("((data #> ");
        builder.push_bind(bind_path(path));
        builder.push(") IS NULL OR (data #> ");
        builder.push_bind(bind_path(path));
        builder.push(") = 'null'::jsonb)");
        return;
    }

    builder.push("((data #> ");
    builder.push_bind(bind_path(path));
    builder.push(") = ");
    builder.push_bind(Json(value.clone()));

    if !value.is_array() {
        // scalar equality also matches arrays containing the value
        builder.push(" OR (jsonb_typeof(data #> ");
        builder.push_bind(bind_path(path));
        builder.push(") = 'array' AND (data #> ");
        builder.push_bind(bind_path(path));
        builder.push(") @> ");
        builder.push_bind(Json(Value::Array(vec![value.clone()])));
        builder.push(")");
    }
    builder.push(")");
}

fn bind_path(path: &str) -> Vec<String> {
    path_segments(path).into_iter().map(str::to_string).collect()
}
