use std::sync::Arc;
use std::sync::atomic::Ordering;

use frontbase_middleware::engine::Datatype;
use frontbase_middleware::prelude::*;
use frontbase_middleware::test_utils::{
    MockCell, MockConnector, MockResult, MockState, column,
};

async fn open_mock() -> (FrontbaseConnection, Arc<MockState>) {
    let connector = MockConnector::new();
    let state = connector.state();
    let conn = FrontbaseConnection::open(
        Storage::file("assets", "/var/db/assets.fb", "_system", ""),
        "blob-tests",
        Box::new(connector),
    )
    .await
    .expect("open");
    (conn, state)
}

#[tokio::test]
async fn binding_a_content_blob_creates_one_handle_at_most() {
    let (conn, state) = open_mock().await;

    let blob = FrontbaseValue::Blob(FrontbaseBlob::from_bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]));

    conn.query("INSERT INTO assets (data) VALUES (?)", vec![blob.clone()])
        .await
        .expect("first insert");
    conn.query("INSERT INTO backup (data) VALUES (?)", vec![blob.clone()])
        .await
        .expect("second insert");

    assert_eq!(state.blob_creates.load(Ordering::SeqCst), 1);

    // Both statements rendered the same cached handle literal.
    let executed = state.executed_sql();
    assert_eq!(executed[1], "INSERT INTO assets (data) VALUES (@'00000000');");
    assert_eq!(executed[2], "INSERT INTO backup (data) VALUES (@'00000000');");
    assert_eq!(
        state.blob_content("@'00000000'"),
        Some(vec![0xDE, 0xAD, 0xBE, 0xEF])
    );

    // Dropping the last clone of a driver-created blob releases its
    // handle exactly once.
    drop(blob);
    conn.query("VALUES 1", vec![]).await.expect("flush");
    assert_eq!(state.blob_releases.load(Ordering::SeqCst), 1);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn fetched_blobs_read_through_once_and_cache() {
    let (conn, state) = open_mock().await;

    state.seed_blob("@'cafe'", vec![1, 2, 3]);
    state.script(
        MockResult::new(vec![column(Some("assets"), "data", Datatype::Blob)])
            .row(vec![MockCell::BlobHandle("@'cafe'".into(), 3)]),
    );

    let rows = conn
        .query("SELECT data FROM assets", vec![])
        .await
        .expect("query");
    let value = rows[0].get("data").expect("column").clone();
    let blob = value.as_blob().expect("blob value").clone();

    // Size is known without fetching anything.
    assert_eq!(blob.size(), Some(3));
    assert_eq!(blob.content(), None);
    assert_eq!(state.blob_fetches.load(Ordering::SeqCst), 0);

    assert_eq!(blob.data().await.expect("first fetch"), vec![1, 2, 3]);
    assert_eq!(blob.data().await.expect("cached fetch"), vec![1, 2, 3]);
    assert_eq!(state.blob_fetches.load(Ordering::SeqCst), 1);

    // Handles that arrived with a column belong to the engine; dropping
    // the blob must not release them.
    drop(blob);
    drop(value);
    drop(rows);
    conn.query("VALUES 1", vec![]).await.expect("flush");
    assert_eq!(state.blob_releases.load(Ordering::SeqCst), 0);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn content_blobs_serve_data_without_a_connection() {
    let blob = FrontbaseBlob::from_bytes(vec![9, 9, 9]);
    assert_eq!(blob.size(), Some(3));
    assert_eq!(blob.data().await.expect("in-memory data"), vec![9, 9, 9]);
}

#[tokio::test]
async fn blob_equality_compares_handles() {
    let (conn, state) = open_mock().await;

    state.seed_blob("@'cafe'", vec![1]);
    for _ in 0..2 {
        state.script(
            MockResult::new(vec![column(None, "data", Datatype::Blob)])
                .row(vec![MockCell::BlobHandle("@'cafe'".into(), 1)]),
        );
    }

    let first = conn
        .query("SELECT data FROM assets", vec![])
        .await
        .expect("query")[0]
        .get("data")
        .expect("column")
        .clone();
    let second = conn
        .query("SELECT data FROM assets", vec![])
        .await
        .expect("query")[0]
        .get("data")
        .expect("column")
        .clone();

    // Same handle, two separate fetches: equal by identity, not content.
    assert_eq!(first, second);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn fetching_an_unrealized_blob_after_close_fails() {
    let (conn, state) = open_mock().await;

    state.seed_blob("@'cafe'", vec![1, 2]);
    state.script(
        MockResult::new(vec![column(None, "data", Datatype::Blob)])
            .row(vec![MockCell::BlobHandle("@'cafe'".into(), 2)]),
    );

    let blob = conn
        .query("SELECT data FROM assets", vec![])
        .await
        .expect("query")[0]
        .get("data")
        .and_then(FrontbaseValue::as_blob)
        .expect("blob value")
        .clone();

    conn.close().await.expect("close");

    assert!(matches!(
        blob.data().await,
        Err(FrontbaseDbError::ConnectionClosed)
    ));
}
