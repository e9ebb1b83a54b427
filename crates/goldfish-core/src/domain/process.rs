//! Process step documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::identifiers::now;
use crate::error::CoreError;

/// Field names used in stored process documents
pub mod fields {
    pub const PARENT_GRAPH: &str = "parent_graph";
    pub const META_DATA: &str = "meta_data";
    pub const ELASTIC_DATA_PATHS: &str = "elastic_data_paths";
    pub const FILE_LOCATION_TYPE: &str = "file_location_type";
    pub const DATE_UPDATED: &str = "date_updated";
}

/// Where the files produced by a process step live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileLocationType {
    DigsLocal,
    Pool,
    Embedded,
    Mixed,
}

impl FileLocationType {
    pub const ALL: [FileLocationType; 4] = [
        FileLocationType::DigsLocal,
        FileLocationType::Pool,
        FileLocationType::Embedded,
        FileLocationType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileLocationType::DigsLocal => "digs_local",
            FileLocationType::Pool => "pool",
            FileLocationType::Embedded => "embedded",
            FileLocationType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for FileLocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileLocationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                CoreError::ValidationError(format!(
                    "file_location_type must be one of digs_local, pool, embedded, mixed (got '{}')",
                    s
                ))
            })
    }
}

/// Data category key (e.g. `pdb`) to wherever that data is indexed. Values
/// are free-form: a path list, a single path or a nested descriptor.
pub type ElasticDataPaths = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "_id")]
    pub id: String,
    pub parent_graph: String,
    #[serde(default)]
    pub meta_data: Map<String, Value>,
    #[serde(default)]
    pub elastic_data_paths: ElasticDataPaths,
    pub file_location_type: FileLocationType,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProcess {
    pub parent_graph: String,
    #[serde(default)]
    pub meta_data: Map<String, Value>,
    #[serde(default)]
    pub elastic_data_paths: ElasticDataPaths,
    pub file_location_type: FileLocationType,
    #[serde(default = "now")]
    pub date_created: DateTime<Utc>,
    #[serde(default = "now")]
    pub date_updated: DateTime<Utc>,
}

impl NewProcess {
    pub fn new(parent_graph: impl Into<String>, file_location_type: FileLocationType) -> Self {
        let created = now();
        Self {
            parent_graph: parent_graph.into(),
            meta_data: Map::new(),
            elastic_data_paths: ElasticDataPaths::new(),
            file_location_type,
            date_created: created,
            date_updated: created,
        }
    }

    /// Add locations for one data category
    pub fn with_data_paths(mut self, key: impl Into<String>, paths: impl Into<Value>) -> Self {
        self.elastic_data_paths.insert(key.into(), paths.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta_data.insert(key.into(), value.into());
        self
    }

    pub fn into_process(self, id: String) -> Process {
        Process {
            id,
            parent_graph: self.parent_graph,
            meta_data: self.meta_data,
            elastic_data_paths: self.elastic_data_paths,
            file_location_type: self.file_location_type,
            date_created: self.date_created,
            date_updated: self.date_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_location_type_uses_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_value(FileLocationType::DigsLocal).unwrap(), json!("digs_local"));
        let parsed: FileLocationType = serde_json::from_value(json!("mixed")).unwrap();
        assert_eq!(parsed, FileLocationType::Mixed);
        assert!(serde_json::from_value::<FileLocationType>(json!("cloud")).is_err());
    }

    #[test]
    fn file_location_type_parses_from_path_segments() {
        assert_eq!("pool".parse::<FileLocationType>().unwrap(), FileLocationType::Pool);
        assert!(matches!(
            "Pool".parse::<FileLocationType>(),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn new_process_defaults_maps_and_timestamps() {
        let payload: NewProcess = serde_json::from_value(json!({
            "parent_graph": "g1",
            "file_location_type": "embedded"
        }))
        .unwrap();
        assert!(payload.meta_data.is_empty());
        assert!(payload.elastic_data_paths.is_empty());
        assert!(payload.date_created <= now());
    }

    #[test]
    fn elastic_data_paths_accept_any_value_shape() {
        let payload: NewProcess = serde_json::from_value(json!({
            "parent_graph": "g1",
            "file_location_type": "pool",
            "elastic_data_paths": {
                "pdb": "/pool/a.pdb",
                "fasta": ["/pool/a.fa"],
                "silent": {"path": "/pool/a.silent", "index": 3}
            }
        }))
        .unwrap();
        assert_eq!(payload.elastic_data_paths["pdb"], json!("/pool/a.pdb"));
        assert_eq!(payload.elastic_data_paths["silent"]["index"], json!(3));

        let process = payload.into_process("p1".to_string());
        let stored = serde_json::to_value(&process).unwrap();
        let decoded: Process = serde_json::from_value(stored).unwrap();
        assert_eq!(decoded, process);
    }
}
