use super::*;
use crate::database::sqlite::Database;
use anyhow::Result;
use tempfile::TempDir;

async fn setup_test_db() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let database = Database::new(&db_path).await?;
    Ok((temp_dir, database))
}

#[tokio::test]
async fn upsert_then_get() -> Result<()> {
    let (_temp_dir, database) = setup_test_db().await?;
    let pool = database.pool();

    let mut conn = pool.acquire().await?;
    KeyValueQueries::upsert(&mut conn, &NewKeyValue::new("k", "v1")).await?;
    let first = KeyValueQueries::get(pool, "k").await?.expect("k exists");

    KeyValueQueries::upsert(&mut conn, &NewKeyValue::new("k", "v2")).await?;
    let second = KeyValueQueries::get(pool, "k").await?.expect("k exists");

    assert_eq!(first.value, "v1");
    assert_eq!(second.value, "v2");
    assert!(second.updated_date >= first.updated_date);
    Ok(())
}

#[tokio::test]
async fn delete_reports_whether_a_row_existed() -> Result<()> {
    let (_temp_dir, database) = setup_test_db().await?;
    let pool = database.pool();
    let mut conn = pool.acquire().await?;

    KeyValueQueries::upsert(&mut conn, &NewKeyValue::new("k", "v")).await?;

    assert!(KeyValueQueries::delete(&mut conn, "k").await?);
    assert!(!KeyValueQueries::delete(&mut conn, "k").await?);
    assert!(KeyValueQueries::get(pool, "k").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn rolled_back_writes_are_invisible() -> Result<()> {
    let (_temp_dir, database) = setup_test_db().await?;
    let pool = database.pool();

    let mut tx = pool.begin().await?;
    KeyValueQueries::upsert(&mut tx, &NewKeyValue::new("document_chunks", "[]")).await?;
    tx.rollback().await?;

    assert!(KeyValueQueries::list_keys(pool).await?.is_empty());
    Ok(())
}
