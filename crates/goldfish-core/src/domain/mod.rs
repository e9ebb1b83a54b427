//! Domain layer - graphs, process steps and the rules on their fields

pub mod graph;
pub mod identifiers;
pub mod process;
pub mod validation;

pub use graph::{Graph, NewGraph};
pub use process::{ElasticDataPaths, FileLocationType, NewProcess, Process};
