use std::sync::Arc;

use frontbase_middleware::prelude::*;
use frontbase_middleware::test_utils::{MockConnector, MockState};
use tokio::sync::oneshot;

async fn open_mock() -> (FrontbaseConnection, Arc<MockState>) {
    let connector = MockConnector::new();
    let state = connector.state();
    let conn = FrontbaseConnection::open(
        Storage::file("ledger", "/var/db/ledger.fb", "_system", ""),
        "transaction-tests",
        Box::new(connector),
    )
    .await
    .expect("open");
    (conn, state)
}

#[tokio::test]
async fn successful_body_commits_its_statements() {
    let (conn, state) = open_mock().await;

    let value = conn
        .with_transaction(|conn| async move {
            conn.query(
                "INSERT INTO entries (amount) VALUES (?)",
                vec![FrontbaseValue::Integer(100)],
            )
            .await?;
            Ok(41 + 1)
        })
        .await
        .expect("transaction");
    assert_eq!(value, 42);

    let executed = state.executed();
    let sql: Vec<&str> = executed.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, LOCKING PESSIMISTIC, READ WRITE;",
            "VALUES 0;",
            "INSERT INTO entries (amount) VALUES (100);",
            "COMMIT;",
        ]
    );

    // The autocommit flag is lowered strictly around the body: the entry
    // round trip and the body's statement run with it off, the COMMIT
    // itself with it back on.
    assert!(executed[0].auto_commit);
    assert!(!executed[1].auto_commit);
    assert!(!executed[2].auto_commit);
    assert!(executed[3].auto_commit);

    assert_eq!(
        state.committed_sql(),
        vec![
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, LOCKING PESSIMISTIC, READ WRITE;",
            "VALUES 0;",
            "INSERT INTO entries (amount) VALUES (100);",
        ]
    );
    assert!(state.pending_sql().is_empty());

    conn.close().await.expect("close");
}

#[tokio::test]
async fn failing_body_rolls_back_and_propagates_the_original_error() {
    let (conn, state) = open_mock().await;

    let result: Result<(), FrontbaseDbError> = conn
        .with_transaction(|conn| async move {
            conn.query(
                "INSERT INTO entries (amount) VALUES (?)",
                vec![FrontbaseValue::Integer(13)],
            )
            .await?;
            Err(FrontbaseDbError::ExecutionError("application failure".into()))
        })
        .await;

    match result {
        Err(FrontbaseDbError::ExecutionError(message)) => {
            assert_eq!(message, "application failure");
        }
        other => panic!("expected the body's error, got {other:?}"),
    }

    let sql = state.executed_sql();
    assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK;"));
    // The insert was rolled back: nothing from the body is durable.
    assert!(
        !state
            .committed_sql()
            .iter()
            .any(|statement| statement.contains("INSERT")),
        "rolled-back insert must not be durable"
    );
    assert!(state.pending_sql().is_empty());

    conn.close().await.expect("close");
}

#[tokio::test]
async fn transactions_do_not_nest() {
    let (conn, state) = open_mock().await;

    let result = conn
        .with_transaction(|conn| async move {
            let nested: Result<(), FrontbaseDbError> = conn
                .with_transaction(|_conn| async move { Ok(()) })
                .await;
            match nested {
                Err(FrontbaseDbError::TransactionAlreadyOpen) => Ok(()),
                other => panic!("expected TransactionAlreadyOpen, got {other:?}"),
            }
        })
        .await;
    assert!(result.is_ok());

    // The rejected inner transaction never issued its entry round trip:
    // exactly one VALUES 0 was executed.
    let round_trips = state
        .executed_sql()
        .iter()
        .filter(|sql| sql.starts_with("VALUES 0"))
        .count();
    assert_eq!(round_trips, 1);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn a_second_concurrent_transaction_is_rejected() {
    let (conn, _state) = open_mock().await;

    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let first = {
        let conn = conn.clone();
        tokio::spawn(async move {
            conn.with_transaction(|_conn| async move {
                let _ = entered_tx.send(());
                let _ = release_rx.await;
                Ok(())
            })
            .await
        })
    };

    entered_rx.await.expect("first transaction entered");

    let second: Result<(), FrontbaseDbError> = conn
        .with_transaction(|_conn| async move { Ok(()) })
        .await;
    assert!(matches!(
        second,
        Err(FrontbaseDbError::TransactionAlreadyOpen)
    ));

    let _ = release_tx.send(());
    first
        .await
        .expect("join")
        .expect("first transaction commits");

    // With the first transaction complete, a new one is accepted again.
    conn.with_transaction(|_conn| async move { Ok(()) })
        .await
        .expect("transaction after completion");

    conn.close().await.expect("close");
}

#[tokio::test]
async fn statements_outside_a_transaction_autocommit() {
    let (conn, state) = open_mock().await;

    conn.query(
        "INSERT INTO entries (amount) VALUES (?)",
        vec![FrontbaseValue::Integer(5)],
    )
    .await
    .expect("query");

    let executed = state.executed();
    assert!(executed[1].auto_commit);
    assert_eq!(
        state.committed_sql().last().map(String::as_str),
        Some("INSERT INTO entries (amount) VALUES (5);")
    );

    conn.close().await.expect("close");
}
