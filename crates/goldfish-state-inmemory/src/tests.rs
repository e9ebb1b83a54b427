use crate::InMemoryStoreProvider;
use chrono::{Duration, Utc};
use goldfish_core::{CoreError, FileLocationType, Filter, NewGraph, NewProcess, Stores};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("goldfish_core=debug,goldfish_state_inmemory=debug")
        .with_test_writer()
        .try_init();
}

fn stores() -> (InMemoryStoreProvider, Stores) {
    init_test_tracing();
    let provider = InMemoryStoreProvider::new();
    let stores = Stores::new(&provider.collections());
    (provider, stores)
}

fn lab_graph() -> NewGraph {
    let mut graph = NewGraph::new("minibinders", "ana", "ana@lab.org");
    graph.process_meta_data.insert("target".to_string(), json!("IL-7Ra"));
    graph
}

async fn process_list(stores: &Stores, graph_id: &str) -> Result<Vec<String>, CoreError> {
    Ok(stores
        .graphs
        .find_by_id(graph_id)
        .await?
        .map(|graph| graph.process_list)
        .unwrap_or_default())
}

#[tokio::test]
async fn created_graph_reads_back_with_supplied_fields() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let payload = lab_graph();

    let created = stores.graphs.create(payload.clone()).await?;
    let found = stores.graphs.find_by_id(&created.id).await?;

    assert_eq!(found, Some(payload.into_graph(created.id.clone())));
    Ok(())
}

#[tokio::test]
async fn graph_ids_are_unique() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let mut ids = HashSet::new();
    for _ in 0..50 {
        ids.insert(stores.graphs.create(lab_graph()).await?.id);
    }
    assert_eq!(ids.len(), 50);
    Ok(())
}

#[tokio::test]
async fn process_create_appends_or_inserts_at_position() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;

    let a = stores.processes.create(NewProcess::new(&graph.id, FileLocationType::Pool), None).await?;
    let b = stores.processes.create(NewProcess::new(&graph.id, FileLocationType::Pool), None).await?;
    assert_eq!(process_list(&stores, &graph.id).await?, vec![a.id.clone(), b.id.clone()]);

    let c = stores
        .processes
        .create(NewProcess::new(&graph.id, FileLocationType::Pool), Some(1))
        .await?;
    assert_eq!(
        process_list(&stores, &graph.id).await?,
        vec![a.id.clone(), c.id.clone(), b.id.clone()]
    );

    let d = stores
        .processes
        .create(NewProcess::new(&graph.id, FileLocationType::Pool), Some(0))
        .await?;
    assert_eq!(process_list(&stores, &graph.id).await?, vec![d.id, a.id, c.id, b.id]);
    Ok(())
}

#[tokio::test]
async fn process_create_for_unknown_graph_leaves_no_orphan() -> Result<(), CoreError> {
    let (provider, stores) = stores();
    let err = stores
        .processes
        .create(NewProcess::new("no-such-graph", FileLocationType::Embedded), None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(provider.processes().is_empty());
    Ok(())
}

#[tokio::test]
async fn process_delete_unlinks_from_parent() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let a = stores.processes.create(NewProcess::new(&graph.id, FileLocationType::Pool), None).await?;
    let b = stores.processes.create(NewProcess::new(&graph.id, FileLocationType::Pool), None).await?;

    stores.processes.delete(&a.id).await?;

    assert_eq!(stores.processes.find_by_id(&a.id).await?, None);
    assert_eq!(process_list(&stores, &graph.id).await?, vec![b.id]);
    Ok(())
}

#[tokio::test]
async fn deleting_unknown_process_leaves_parent_untouched() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    stores.processes.create(NewProcess::new(&graph.id, FileLocationType::Pool), None).await?;
    let before = stores.graphs.find_by_id(&graph.id).await?;

    let err = stores.processes.delete("p-unknown").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(stores.graphs.find_by_id(&graph.id).await?, before);
    Ok(())
}

#[tokio::test]
async fn graph_delete_cascades_to_children() -> Result<(), CoreError> {
    let (provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let other = stores.graphs.create(lab_graph()).await?;
    for _ in 0..3 {
        stores.processes.create(NewProcess::new(&graph.id, FileLocationType::DigsLocal), None).await?;
    }
    let survivor = stores
        .processes
        .create(NewProcess::new(&other.id, FileLocationType::DigsLocal), None)
        .await?;

    let outcome = stores.graphs.delete(&graph.id).await?;

    assert_eq!(outcome.processes_deleted, 3);
    assert_eq!(stores.graphs.find_by_id(&graph.id).await?, None);
    assert!(stores.processes.find_by_parent_graph(&graph.id).await?.is_empty());
    assert_eq!(provider.processes().len(), 1);
    assert!(stores.processes.find_by_id(&survivor.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn graph_without_children_deletes_cleanly() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;

    let outcome = stores.graphs.delete(&graph.id).await?;
    assert_eq!(outcome.processes_deleted, 0);

    let err = stores.graphs.delete(&graph.id).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn reorder_stores_exact_order_and_refreshes_timestamp() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let mut payload = lab_graph();
    payload.date_updated = Utc::now() - Duration::days(1);
    let graph = stores.graphs.create(payload).await?;

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(
            stores
                .processes
                .create(NewProcess::new(&graph.id, FileLocationType::Mixed), None)
                .await?
                .id,
        );
    }
    let reordered = vec![ids[2].clone(), ids[0].clone(), ids[3].clone(), ids[1].clone()];

    stores.graphs.update_process_list_order(&graph.id, reordered.clone()).await?;

    let stored = stores.graphs.find_by_id(&graph.id).await?.unwrap();
    assert_eq!(stored.process_list, reordered);
    assert!(stored.date_updated > graph.date_updated);
    Ok(())
}

#[tokio::test]
async fn data_key_query_matches_key_presence_only() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let with_pdb = stores
        .processes
        .create(
            NewProcess::new(&graph.id, FileLocationType::Pool).with_data_paths("pdb", json!(["/pool/1.pdb"])),
            None,
        )
        .await?;
    let empty_pdb = stores
        .processes
        .create(NewProcess::new(&graph.id, FileLocationType::Pool).with_data_paths("pdb", json!([])), None)
        .await?;
    stores
        .processes
        .create(
            NewProcess::new(&graph.id, FileLocationType::Pool).with_data_paths("fasta", json!(["/pool/1.fa"])),
            None,
        )
        .await?;

    let found: Vec<String> = stores
        .processes
        .find_by_data_key("pdb")
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(found, vec![with_pdb.id, empty_pdb.id]);
    Ok(())
}

#[tokio::test]
async fn data_paths_hold_scalars_and_nested_objects() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let process = stores
        .processes
        .create(
            NewProcess::new(&graph.id, FileLocationType::Embedded)
                .with_data_paths("pdb", "/pool/1.pdb")
                .with_data_paths("silent", json!({"path": "/pool/1.silent", "tags": 4})),
            None,
        )
        .await?;

    let found = stores.processes.find_by_data_key("silent").await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].elastic_data_paths["pdb"], json!("/pool/1.pdb"));
    assert_eq!(found[0].elastic_data_paths["silent"]["tags"], json!(4));

    let mut paths = serde_json::Map::new();
    paths.insert("msa".to_string(), json!({"a3m": "/pool/1.a3m"}));
    stores.processes.update_elastic_data_paths(&process.id, paths).await?;

    assert!(stores.processes.find_by_data_key("pdb").await?.is_empty());
    let found = stores.processes.find_by_data_key("msa").await?;
    assert_eq!(found[0].elastic_data_paths["msa"]["a3m"], json!("/pool/1.a3m"));
    Ok(())
}

#[tokio::test]
async fn field_updates_apply_and_missing_ids_are_not_found() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let process = stores
        .processes
        .create(NewProcess::new(&graph.id, FileLocationType::DigsLocal), None)
        .await?;

    stores.graphs.update_owner(&graph.id, "ben").await?;
    stores.graphs.update_owner_email(&graph.id, "ben@lab.org").await?;
    stores.graphs.update_project_name(&graph.id, "cyclic peptides").await?;
    stores
        .graphs
        .update_process_meta_data(&graph.id, json!({"stage": 2}).as_object().cloned().unwrap())
        .await?;
    stores.processes.update_file_location_type(&process.id, FileLocationType::Pool).await?;
    stores
        .processes
        .update_meta_data(&process.id, json!({"seed": 7}).as_object().cloned().unwrap())
        .await?;

    let stored = stores.graphs.find_by_id(&graph.id).await?.unwrap();
    assert_eq!(stored.owner, "ben");
    assert_eq!(stored.owner_email, "ben@lab.org");
    assert_eq!(stored.project_name, "cyclic peptides");
    assert_eq!(stored.process_meta_data["stage"], json!(2));
    assert_eq!(stored.process_list, vec![process.id.clone()]);

    let pool = stores.processes.find_by_file_location_type(FileLocationType::Pool).await?;
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].meta_data["seed"], json!(7));

    // same value again still counts as success
    stores.graphs.update_owner(&graph.id, "ben").await?;

    assert!(stores.graphs.update_owner("missing", "ben").await.unwrap_err().is_not_found());
    assert!(stores
        .processes
        .update_meta_data("missing", Default::default())
        .await
        .unwrap_err()
        .is_not_found());
    Ok(())
}

#[tokio::test]
async fn owner_queries_return_every_match() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let first = stores.graphs.create(lab_graph()).await?;
    let second = stores.graphs.create(NewGraph::new("antibodies", "ana", "ana@lab.org")).await?;
    stores.graphs.create(NewGraph::new("enzymes", "cat", "cat@lab.org")).await?;

    let owned: Vec<String> = stores.graphs.find_by_owner("ana").await?.into_iter().map(|g| g.id).collect();
    assert_eq!(owned, vec![first.id.clone(), second.id]);
    assert_eq!(stores.graphs.find_by_owner_email("cat@lab.org").await?.len(), 1);
    assert_eq!(
        stores.graphs.find_by_project_name("minibinders").await?.map(|g| g.id),
        Some(first.id)
    );
    assert!(stores.graphs.find_by_owner("nobody").await?.is_empty());

    let filtered = stores
        .graphs
        .find_many(&Filter::from_json(&json!({"owner": "ana", "project_name": "antibodies"}))?)
        .await?;
    assert_eq!(filtered.len(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_deletes_under_one_parent_do_not_lose_updates() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;
    let mut ids = Vec::new();
    for _ in 0..20 {
        ids.push(
            stores
                .processes
                .create(NewProcess::new(&graph.id, FileLocationType::Pool), None)
                .await?
                .id,
        );
    }

    let deletions = ids.iter().map(|id| {
        let processes = stores.processes.clone();
        let id = id.clone();
        tokio::spawn(async move { processes.delete(&id).await })
    });
    for result in futures::future::join_all(deletions).await {
        result.expect("delete task panicked")?;
    }

    assert!(process_list(&stores, &graph.id).await?.is_empty());
    assert!(stores.processes.find_by_parent_graph(&graph.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_all_land_in_the_list() -> Result<(), CoreError> {
    let (_provider, stores) = stores();
    let graph = stores.graphs.create(lab_graph()).await?;

    let creations = (0..20).map(|_| {
        let processes = stores.processes.clone();
        let graph_id = graph.id.clone();
        tokio::spawn(async move {
            processes
                .create(NewProcess::new(graph_id, FileLocationType::Embedded), None)
                .await
        })
    });
    let mut created = HashSet::new();
    for result in futures::future::join_all(creations).await {
        created.insert(result.expect("create task panicked")?.id);
    }

    let listed: HashSet<String> = process_list(&stores, &graph.id).await?.into_iter().collect();
    assert_eq!(listed, created);
    Ok(())
}

#[tokio::test]
async fn example_scenario_end_to_end() -> Result<(), CoreError> {
    let (_provider, stores) = stores();

    let g1 = stores.graphs.create(NewGraph::new("P", "o", "o@x.org")).await?;
    assert!(g1.process_list.is_empty());

    let p1 = stores
        .processes
        .create(
            NewProcess::new(&g1.id, FileLocationType::DigsLocal).with_data_paths("pdb", json!(["/a"])),
            None,
        )
        .await?;
    assert_eq!(process_list(&stores, &g1.id).await?, vec![p1.id.clone()]);

    let by_key: Vec<String> = stores.processes.find_by_data_key("pdb").await?.into_iter().map(|p| p.id).collect();
    assert_eq!(by_key, vec![p1.id.clone()]);

    stores.processes.delete(&p1.id).await?;
    assert!(process_list(&stores, &g1.id).await?.is_empty());
    assert_eq!(stores.processes.find_by_id(&p1.id).await?, None);

    stores.graphs.delete(&g1.id).await?;
    assert_eq!(stores.graphs.find_by_id(&g1.id).await?, None);
    Ok(())
}
