use super::*;
use crate::search::index::IndexedChunk;
use anyhow::Result;
use tempfile::TempDir;

async fn create_store() -> Result<(TempDir, Database, IndexStore)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    let store = IndexStore::new(database.clone());
    Ok((temp_dir, database, store))
}

fn sample_index() -> DocumentIndex {
    DocumentIndex::new(vec![
        IndexedChunk {
            text: "FILE: Test.txt\nRust ownership".to_string(),
            embedding: vec![0.25, -1.5, 3.0],
        },
        IndexedChunk {
            text: "Borrowing rules".to_string(),
            embedding: vec![0.0, 0.5, 0.125],
        },
    ])
}

#[tokio::test]
async fn empty_store_is_a_miss() -> Result<()> {
    let (_temp_dir, _database, store) = create_store().await?;
    assert!(store.load().await?.is_none());
    assert!(store.built_at().await?.is_none());
    assert_eq!(store.stored_bytes().await?, 0);
    Ok(())
}

#[tokio::test]
async fn saved_index_loads_back() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;
    let index = sample_index();

    store.save(&index).await?;

    assert_eq!(store.load().await?, Some(index));
    assert!(store.built_at().await?.is_some());
    assert_eq!(
        database.get_value(CHUNKS_KEY).await?.as_deref(),
        Some(r#"["FILE: Test.txt\nRust ownership","Borrowing rules"]"#)
    );
    Ok(())
}

#[tokio::test]
async fn one_slot_alone_is_a_miss() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;

    database.set_value(CHUNKS_KEY, r#"["only chunks"]"#).await?;
    assert!(store.load().await?.is_none());

    database.delete_values(&[CHUNKS_KEY]).await?;
    database.set_value(EMBEDDINGS_KEY, "[[1.0]]").await?;
    assert!(store.load().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn mismatched_lengths_are_a_miss() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;

    database
        .set_values(&[
            NewKeyValue::new(CHUNKS_KEY, r#"["a","b"]"#),
            NewKeyValue::new(EMBEDDINGS_KEY, "[[1.0]]"),
        ])
        .await?;

    assert!(store.load().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn undecodable_slots_are_a_miss() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;

    database
        .set_values(&[
            NewKeyValue::new(CHUNKS_KEY, "not json"),
            NewKeyValue::new(EMBEDDINGS_KEY, "[[1.0]]"),
        ])
        .await?;

    assert!(store.load().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn clear_removes_both_slots_only() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;

    database.set_value("openai_api_key", "sk-keep").await?;
    store.save(&sample_index()).await?;

    assert!(store.clear().await?);
    assert!(store.load().await?.is_none());
    assert!(!store.clear().await?);
    assert_eq!(database.list_keys().await?, vec!["openai_api_key"]);
    Ok(())
}

#[tokio::test]
async fn stored_bytes_covers_both_slots() -> Result<()> {
    let (_temp_dir, database, store) = create_store().await?;
    store.save(&sample_index()).await?;

    let chunks = database.get_value(CHUNKS_KEY).await?.unwrap_or_default();
    let embeddings = database.get_value(EMBEDDINGS_KEY).await?.unwrap_or_default();
    assert!(!chunks.is_empty() && !embeddings.is_empty());
    assert_eq!(store.stored_bytes().await?, chunks.len() + embeddings.len());

    Ok(())
}
