use std::sync::Arc;

use frontbase_middleware::prelude::*;
use frontbase_middleware::test_utils::{MockConnector, MockState};

async fn open_mock() -> (FrontbaseConnection, Arc<MockState>) {
    let connector = MockConnector::new();
    let state = connector.state();
    let conn = FrontbaseConnection::open(
        Storage::file("moviedb", "/var/db/movies.fb", "_system", ""),
        "placeholder-tests",
        Box::new(connector),
    )
    .await
    .expect("open");
    (conn, state)
}

#[tokio::test]
async fn question_mark_inside_literal_is_not_a_placeholder() {
    let (conn, state) = open_mock().await;

    conn.query(
        "SELECT a FROM t WHERE b = 'What?' OR c = ?",
        vec![FrontbaseValue::Integer(9)],
    )
    .await
    .expect("query");

    let executed = state.executed_sql();
    // Index 0 is the session-mode statement issued at open.
    assert_eq!(
        executed[1],
        "SELECT a FROM t WHERE b = 'What?' OR c = 9;"
    );
    conn.close().await.expect("close");
}

#[tokio::test]
async fn question_mark_inside_quoted_identifier_is_not_a_placeholder() {
    let (conn, state) = open_mock().await;

    conn.query(
        r#"SELECT "what?" FROM t WHERE a = ?"#,
        vec![FrontbaseValue::Boolean(true)],
    )
    .await
    .expect("query");

    assert_eq!(
        state.executed_sql()[1],
        r#"SELECT "what?" FROM t WHERE a = TRUE;"#
    );
    conn.close().await.expect("close");
}

#[tokio::test]
async fn bound_text_cannot_break_out_of_its_literal() {
    let (conn, state) = open_mock().await;

    conn.query(
        "INSERT INTO users (name) VALUES (?)",
        vec![FrontbaseValue::Text("'; DROP TABLE bob;".into())],
    )
    .await
    .expect("query");

    let executed = state.executed_sql();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[1],
        "INSERT INTO users (name) VALUES ('''; DROP TABLE bob;');"
    );
    conn.close().await.expect("close");
}

#[tokio::test]
async fn values_substitute_left_to_right() {
    let (conn, state) = open_mock().await;

    conn.query(
        "INSERT INTO t VALUES (?, ?, ?)",
        vec![
            FrontbaseValue::Integer(1),
            FrontbaseValue::Text("two".into()),
            FrontbaseValue::Null,
        ],
    )
    .await
    .expect("query");

    assert_eq!(
        state.executed_sql()[1],
        "INSERT INTO t VALUES (1, 'two', NULL);"
    );
    conn.close().await.expect("close");
}

#[tokio::test]
async fn arity_mismatch_fails_before_reaching_the_engine() {
    let (conn, state) = open_mock().await;

    let too_few = conn
        .query("SELECT a FROM t WHERE b = ? AND c = ?", vec![
            FrontbaseValue::Integer(1),
        ])
        .await;
    assert!(matches!(
        too_few,
        Err(FrontbaseDbError::ParameterError(_))
    ));

    let too_many = conn
        .query("SELECT a FROM t WHERE b = ?", vec![
            FrontbaseValue::Integer(1),
            FrontbaseValue::Integer(2),
        ])
        .await;
    assert!(matches!(
        too_many,
        Err(FrontbaseDbError::ParameterError(_))
    ));

    // Only the session-mode statement ever reached the engine.
    assert_eq!(state.executed_sql().len(), 1);
    conn.close().await.expect("close");
}

#[tokio::test]
async fn unicode_text_renders_byte_for_byte() {
    let (conn, state) = open_mock().await;

    let text = "Pürtö — 音楽 🎶 ґудзик";
    conn.query(
        "INSERT INTO t (label) VALUES (?)",
        vec![FrontbaseValue::Text(text.into())],
    )
    .await
    .expect("query");

    assert_eq!(
        state.executed_sql()[1],
        format!("INSERT INTO t (label) VALUES ('{text}');")
    );
    conn.close().await.expect("close");
}
