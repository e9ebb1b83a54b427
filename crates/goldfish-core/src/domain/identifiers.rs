//! Identifier and timestamp helpers shared by both stores

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CoreResult;

/// Fresh opaque document identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Encode a timestamp exactly as it is stored inside documents
pub fn timestamp_value(timestamp: DateTime<Utc>) -> CoreResult<Value> {
    Ok(serde_json::to_value(timestamp)?)
}
