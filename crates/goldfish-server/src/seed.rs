//! Demo data for a fresh store
//!
//! Creates one graph with a run of process steps through the regular create
//! path, so the graph's process list is built the same way clients build it.

use goldfish_core::{CoreResult, FileLocationType, Graph, NewGraph, NewProcess, Stores};
use serde_json::json;
use tracing::info;

/// Default number of process steps in the demo graph
pub const DEFAULT_PROCESS_COUNT: usize = 10;

/// Seed one demo graph with `process_count` process steps
pub async fn seed_demo_data(stores: &Stores, process_count: usize) -> CoreResult<Graph> {
    let mut graph = NewGraph::new("demo-binder-campaign", "goldfish", "goldfish@example.org");
    graph
        .process_meta_data
        .insert("description".to_string(), json!("Seeded demo project"));
    let graph = stores.graphs.create(graph).await?;

    for step in 0..process_count {
        let process = NewProcess::new(&graph.id, FileLocationType::DigsLocal)
            .with_meta("step", step)
            .with_data_paths("pdb", json!([format!("/digs/demo/step_{:02}/design.pdb", step)]));
        stores.processes.create(process, None).await?;
    }

    info!(graph_id = %graph.id, process_count, "Seeded demo data");

    // re-read so the returned graph carries the full process list
    Ok(stores.graphs.find_by_id(&graph.id).await?.unwrap_or(graph))
}
