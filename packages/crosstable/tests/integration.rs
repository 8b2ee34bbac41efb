use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crosstable::{
    Boundary, Client, ClientConfig, ClientError, Envelope, Host, MemoryStore, QueryBody,
    QueryOutcome, TableStore,
};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct Todo {
    #[serde(default)]
    id: u64,
    title: String,
    completed: bool,
}

fn serve(tables: &[&str]) -> (Arc<MemoryStore>, Host, Boundary) {
    let store = Arc::new(MemoryStore::new());
    for table in tables {
        store.table(*table);
    }

    let (client_side, host_side) = Boundary::pair();
    let host = Host::serve(host_side, store.clone() as Arc<dyn TableStore>);
    (store, host, client_side)
}

#[tokio::test]
async fn full_crud_flow() {
    let (_store, _host, client_side) = serve(&["todos"]);
    let client = Client::connect(client_side).unwrap();
    let todos = client.table("todos");

    let key = todos
        .add(json!({"title": "a", "completed": false}))
        .await
        .unwrap();
    assert_eq!(key, 1);

    let second = todos
        .add(json!({"title": "b", "completed": false}))
        .await
        .unwrap();
    assert_eq!(second, 2);

    let touched = todos.update(key, json!({"completed": true})).await.unwrap();
    assert_eq!(touched, 1);

    let row = todos.get(key).await.unwrap().unwrap();
    assert_eq!(row, json!({"id": 1, "title": "a", "completed": true}));

    let removed = todos.delete(second).await.unwrap();
    assert_eq!(removed, 1);

    assert_eq!(todos.count().await.unwrap(), 1);
    assert_eq!(
        todos.to_array().await.unwrap(),
        vec![json!({"id": 1, "title": "a", "completed": true})]
    );
}

#[tokio::test]
async fn typed_records_round_trip() {
    let (_store, _host, client_side) = serve(&["todos"]);
    let client = Client::connect(client_side).unwrap();
    let todos = client.table("todos");

    let todo = Todo {
        id: 0,
        title: "typed".to_string(),
        completed: false,
    };
    // The record carries id 0 explicitly, so the store keeps that key.
    let key = todos.add_value(&todo).await.unwrap();
    assert_eq!(key, 0);

    let rows: Vec<Todo> = todos.to_array_of().await.unwrap();
    assert_eq!(rows, vec![todo]);
}

#[tokio::test]
async fn insert_issued_before_handshake_resolves_after_host_comes_online() {
    let store = Arc::new(MemoryStore::new());
    store.table("todos");

    let (client_side, host_side) = Boundary::pair();
    let client = Client::connect(client_side).unwrap();
    assert!(!client.is_connected());

    // The call goes out immediately; the host appears 50ms later.
    let host_task = {
        let host_store = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Host::serve(host_side, host_store as Arc<dyn TableStore>)
        })
    };

    let key = client
        .table("todos")
        .add(json!({"title": "a", "completed": false}))
        .await
        .unwrap();

    assert_eq!(key, 1);
    assert!(client.is_connected());
    assert_eq!(store.table("todos").len(), 1);

    // Keep the host alive until the assertion is done.
    drop(host_task.await.unwrap());
}

#[tokio::test]
async fn concurrent_fetches_on_two_tables_do_not_swap() {
    let (store, _host, client_side) = serve(&["todos", "notes"]);
    store
        .table("todos")
        .seed([json!({"title": "a", "completed": false})])
        .unwrap();
    store.table("notes").seed([json!({"text": "n"})]).unwrap();

    let client = Client::connect(client_side).unwrap();
    let todos = client.table("todos");
    let notes = client.table("notes");

    let (todo_rows, note_rows) = tokio::join!(todos.to_array(), notes.to_array());

    assert_eq!(
        todo_rows.unwrap(),
        vec![json!({"id": 1, "title": "a", "completed": false})]
    );
    assert_eq!(note_rows.unwrap(), vec![json!({"id": 1, "text": "n"})]);
}

#[tokio::test]
async fn many_concurrent_calls_correlate_to_their_own_results() {
    let (_store, _host, client_side) = serve(&["todos"]);
    let client = Arc::new(Client::connect(client_side).unwrap());

    let mut tasks = Vec::new();
    for i in 0..32u64 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            let key = client
                .table("todos")
                .add(json!({"title": format!("todo-{}", i), "completed": false}))
                .await
                .unwrap();
            (i, key)
        }));
    }

    let mut keys = Vec::new();
    for task in tasks {
        let (_, key) = task.await.unwrap();
        keys.push(key);
    }

    // Every call got its own generated key, none were swapped or lost.
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 32);
    assert_eq!(client.table("todos").count().await.unwrap(), 32);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn host_execution_errors_reject_the_matching_call() {
    let (_store, _host, client_side) = serve(&["todos"]);
    let client = Client::connect(client_side).unwrap();

    // Unknown table.
    let err = client.table("missing").to_array().await.unwrap_err();
    match err {
        ClientError::Remote { message } => assert_eq!(message, "no such table: missing"),
        other => panic!("expected Remote, got {:?}", other),
    }

    // Store-level failure: inserting a non-object row.
    let err = client.table("todos").add(json!(42)).await.unwrap_err();
    match err {
        ClientError::Remote { message } => assert!(message.contains("must be a JSON object")),
        other => panic!("expected Remote, got {:?}", other),
    }

    // A healthy call on the same connection still works afterwards.
    assert_eq!(client.table("todos").count().await.unwrap(), 0);
}

#[tokio::test]
async fn unreachable_host_fails_with_timeout_not_forever() {
    let (client_side, _parked_host_side) = Boundary::pair();
    let client = Client::with_config(
        client_side,
        ClientConfig {
            timeout: Duration::from_millis(30),
        },
    )
    .unwrap();

    let err = client.table("todos").to_array().await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
}

#[tokio::test]
async fn boundary_noise_disturbs_neither_side() {
    let store = Arc::new(MemoryStore::new());
    store.table("todos");

    let (client_side, host_side) = Boundary::pair();

    // Wrap both endpoints so the test can inject junk in each direction.
    let (to_host, from_client) = client_side.split();
    let host = Host::serve(host_side, store.clone() as Arc<dyn TableStore>);

    to_host.post("%%% not even json %%%".to_string()).unwrap();
    to_host
        .post("{\"type\":\"someone-else\",\"event\":\"query\"}".to_string())
        .unwrap();

    tokio::task::yield_now().await;
    assert!(!host.is_connected());

    // Reassemble a working client over fresh endpoints against the same
    // store to show the host kept serving.
    drop((to_host, from_client));
    let (client_side, host_side) = Boundary::pair();
    let _host2 = Host::serve(host_side, store as Arc<dyn TableStore>);
    let client = Client::connect(client_side).unwrap();

    assert_eq!(client.table("todos").count().await.unwrap(), 0);
}

#[tokio::test]
async fn codec_round_trip_matches_direct_execution() {
    use crosstable::{QueryDescriptor, Table};

    let fixture = [
        json!({"title": "a", "completed": false}),
        json!({"title": "b", "completed": true}),
    ];

    // Direct execution against one store.
    let direct = MemoryStore::new();
    let direct_table = direct.table("todos");
    direct_table.seed(fixture.clone()).unwrap();
    let direct_rows = direct_table
        .execute(crosstable::BoundQuery::ToArray)
        .await
        .unwrap();

    // The same operation shipped through encode → decode → bind.
    let bridged = MemoryStore::new();
    let bridged_table = bridged.table("todos");
    bridged_table.seed(fixture).unwrap();

    let descriptor = QueryDescriptor::new("todos", QueryBody::ToArray);
    let text = descriptor.body.encode().unwrap();
    let bound = QueryBody::decode(&text)
        .unwrap()
        .bind(&descriptor.args)
        .unwrap();
    let bridged_rows = bridged_table.execute(bound).await.unwrap();

    assert_eq!(direct_rows, bridged_rows);
}

#[tokio::test]
async fn responses_for_unknown_ids_are_dropped_silently() {
    let (_store, _host, client_side) = serve(&["todos"]);

    // Speak the protocol by hand so a rogue response can be injected.
    let (tx, mut rx) = client_side.split();
    tx.post(Envelope::client_handshake().encode().unwrap())
        .unwrap();

    // Drain the handshake answer.
    loop {
        let text = rx.recv().await.unwrap();
        if let Some(envelope) = Envelope::decode(&text) {
            if matches!(envelope.event, crosstable::Event::HostHandshake) {
                break;
            }
        }
    }

    // The host ignores client-bound responses; nothing crashes and the
    // connection keeps serving queries.
    tx.post(
        Envelope::response("never-issued", "todos", QueryOutcome::Ok(json!(null)))
            .encode()
            .unwrap(),
    )
    .unwrap();

    let query = Envelope::query(
        "probe-1",
        "todos",
        serde_json::Map::new(),
        QueryBody::Count.encode().unwrap(),
    );
    tx.post(query.encode().unwrap()).unwrap();

    loop {
        let text = rx.recv().await.unwrap();
        if let Some(envelope) = Envelope::decode(&text) {
            if let crosstable::Event::Response { id, data, .. } = envelope.event {
                assert_eq!(id, "probe-1");
                assert_eq!(data.into_result(), Ok(json!(0)));
                break;
            }
        }
    }
}

#[tokio::test]
async fn modify_by_predicate_through_the_proxy() {
    let (store, _host, client_side) = serve(&["todos"]);
    store
        .table("todos")
        .seed([
            json!({"title": "a", "completed": false}),
            json!({"title": "b", "completed": true}),
            json!({"title": "c", "completed": false}),
        ])
        .unwrap();

    let client = Client::connect(client_side).unwrap();
    let todos = client.table("todos");

    let touched = todos
        .modify("completed", json!(false), json!({"completed": true}))
        .await
        .unwrap();
    assert_eq!(touched, 2);

    let rows: Vec<Todo> = todos.to_array_of().await.unwrap();
    assert!(rows.iter().all(|todo| todo.completed));

    let cleared = todos.clear().await.unwrap();
    assert_eq!(cleared, 3);
    assert!(todos.to_array().await.unwrap().is_empty());
}
