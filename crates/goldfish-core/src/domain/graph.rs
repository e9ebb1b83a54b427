//! Graph documents
//!
//! A graph is a research project. It owns an ordered list of process step
//! ids; the order is meaningful to clients and is preserved verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identifiers::now;
use super::validation::validate_email;
use crate::error::CoreResult;

/// Field names used in stored graph documents
pub mod fields {
    pub const PROJECT_NAME: &str = "project_name";
    pub const PROCESS_LIST: &str = "process_list";
    pub const PROCESS_META_DATA: &str = "process_meta_data";
    pub const OWNER: &str = "owner";
    pub const OWNER_EMAIL: &str = "owner_email";
    pub const DATE_UPDATED: &str = "date_updated";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub process_list: Vec<String>,
    #[serde(default)]
    pub process_meta_data: Map<String, Value>,
    pub owner: String,
    pub owner_email: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Payload for creating a graph. Everything except the id is caller
/// controlled; omitted timestamps default to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGraph {
    pub project_name: String,
    #[serde(default)]
    pub process_list: Vec<String>,
    #[serde(default)]
    pub process_meta_data: Map<String, Value>,
    pub owner: String,
    pub owner_email: String,
    #[serde(default = "now")]
    pub date_created: DateTime<Utc>,
    #[serde(default = "now")]
    pub date_updated: DateTime<Utc>,
}

impl NewGraph {
    /// Graph payload with an empty process list and current timestamps
    pub fn new(project_name: impl Into<String>, owner: impl Into<String>, owner_email: impl Into<String>) -> Self {
        let created = now();
        Self {
            project_name: project_name.into(),
            process_list: Vec::new(),
            process_meta_data: Map::new(),
            owner: owner.into(),
            owner_email: owner_email.into(),
            date_created: created,
            date_updated: created,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_email(&self.owner_email)
    }

    pub fn into_graph(self, id: String) -> Graph {
        Graph {
            id,
            project_name: self.project_name,
            process_list: self.process_list,
            process_meta_data: self.process_meta_data,
            owner: self.owner,
            owner_email: self.owner_email,
            date_created: self.date_created,
            date_updated: self.date_updated,
        }
    }
}
