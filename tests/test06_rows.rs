use std::sync::Arc;

use frontbase_middleware::engine::Datatype;
use frontbase_middleware::prelude::*;
use frontbase_middleware::test_utils::{
    MockCell, MockConnector, MockResult, MockState, column,
};
use uuid::Uuid;

async fn open_mock() -> (FrontbaseConnection, Arc<MockState>) {
    let connector = MockConnector::new();
    let state = connector.state();
    let conn = FrontbaseConnection::open(
        Storage::file("joined", "/var/db/joined.fb", "_system", ""),
        "row-tests",
        Box::new(connector),
    )
    .await
    .expect("open");
    (conn, state)
}

#[tokio::test]
async fn joined_rows_disambiguate_by_table() {
    let (conn, state) = open_mock().await;

    state.script(
        MockResult::new(vec![
            column(Some("foo"), "id", Datatype::Integer),
            column(Some("bar"), "id", Datatype::Integer),
        ])
        .row(vec![MockCell::Integer(1), MockCell::Integer(2)]),
    );

    let rows = conn
        .query(
            "SELECT foo.id, bar.id FROM foo JOIN bar ON foo.ref = bar.id",
            vec![],
        )
        .await
        .expect("query");
    let row = &rows[0];

    // Name-only lookup takes the first match in fetch order.
    assert_eq!(row.get("id"), Some(&FrontbaseValue::Integer(1)));
    assert_eq!(
        row.get_in_table("foo", "id"),
        Some(&FrontbaseValue::Integer(1))
    );
    assert_eq!(
        row.get_in_table("bar", "id"),
        Some(&FrontbaseValue::Integer(2))
    );
    assert_eq!(row.get_in_table("baz", "id"), None);

    let columns: Vec<String> = row.columns().map(ToString::to_string).collect();
    assert_eq!(columns, vec!["foo.id", "bar.id"]);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn typed_access_converts_application_types() {
    let (conn, state) = open_mock().await;

    let id = Uuid::new_v4();
    state.script(
        MockResult::new(vec![
            column(Some("t"), "key", Datatype::Bit),
            column(Some("t"), "short_key", Datatype::Bit),
            column(Some("t"), "count", Datatype::Integer),
            column(Some("t"), "label", Datatype::VCharacter),
        ])
        .row(vec![
            MockCell::Bits(id.as_bytes().to_vec()),
            MockCell::Bits(vec![7; 12]),
            MockCell::Integer(12),
            MockCell::Text("twelve".into()),
        ]),
    );

    let rows = conn.query("SELECT * FROM t", vec![]).await.expect("query");
    let row = &rows[0];

    assert_eq!(row.get_as::<Uuid>("key"), Some(id));
    assert_eq!(row.get_as::<[u8; 12]>("short_key"), Some([7u8; 12]));
    assert_eq!(row.get_as::<i64>("count"), Some(12));
    assert_eq!(row.get_as::<u8>("count"), Some(12));
    assert_eq!(row.get_as::<String>("label"), Some("twelve".to_string()));
    // Wrong shapes refuse to convert rather than guessing.
    assert_eq!(row.get_as::<Uuid>("short_key"), None);
    assert_eq!(row.get_as::<bool>("label"), None);

    conn.close().await.expect("close");
}

#[tokio::test]
async fn rows_expose_order_and_length() {
    let (conn, state) = open_mock().await;

    state.script(
        MockResult::new(vec![
            column(None, "a", Datatype::Integer),
            column(None, "b", Datatype::Integer),
        ])
        .row(vec![MockCell::Integer(10), MockCell::Integer(20)]),
    );

    let rows = conn.query("SELECT a, b FROM t", vec![]).await.expect("query");
    let row = &rows[0];
    assert_eq!(row.len(), 2);
    assert!(!row.is_empty());
    assert_eq!(row.get_by_index(0), Some(&FrontbaseValue::Integer(10)));
    assert_eq!(row.get_by_index(1), Some(&FrontbaseValue::Integer(20)));
    assert_eq!(row.get_by_index(2), None);

    conn.close().await.expect("close");
}
