//! Integration tests for the stats request/response flow
//!
//! Covers the supervisor-side view end to end: spawn the worker against an
//! on-disk store, pipeline requests, and fan responses out to a sandboxed
//! consumer through the IPC bridge.

use super::common::store_fixtures::{create_rollback_store, create_store, insert_game, writer};
use parking_lot::Mutex;
use replaydeck::{IpcBridge, NameTally, Player, StatsRequest, StatsResponse, StatsWorker};
use rusqlite::Connection;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn sample_store(dir: &TempDir) -> std::path::PathBuf {
    create_store(
        dir.path(),
        &[
            vec![
                Player::named("A").with_connect_code("A#1"),
                Player::named("B").with_connect_code("B#2"),
            ],
            vec![Player::named("A").with_connect_code("A#1")],
            vec![Player::named("").with_connect_code("X#1")],
        ],
    )
}

#[tokio::test]
async fn test_names_and_codes_against_one_store() {
    let dir = TempDir::new().unwrap();
    let mut worker = StatsWorker::spawn(sample_store(&dir)).unwrap();

    let names = worker.request(StatsRequest::GetNames).await.unwrap();
    assert_eq!(
        names,
        StatsResponse::Names {
            data: vec![
                NameTally {
                    name: "A".into(),
                    total: 2
                },
                NameTally {
                    name: "B".into(),
                    total: 1
                },
            ]
        }
    );

    // The empty-name player is excluded from names but its connect code
    // still counts.
    let codes = worker.request(StatsRequest::GetConnectCodes).await.unwrap();
    match codes {
        StatsResponse::ConnectCodes { data } => {
            assert_eq!(data.len(), 3);
            assert_eq!(
                data[0],
                NameTally {
                    name: "A#1".into(),
                    total: 2
                }
            );
            assert!(data.iter().any(|t| t.name == "X#1" && t.total == 1));
        }
        other => panic!("expected connect codes, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pipelined_requests_resolve_positionally() {
    let dir = TempDir::new().unwrap();
    let mut worker = StatsWorker::spawn(sample_store(&dir)).unwrap();

    worker.send(StatsRequest::GetNames).await.unwrap();
    worker.send(StatsRequest::GetConnectCodes).await.unwrap();
    worker.send(StatsRequest::GetNames).await.unwrap();

    let kinds = [
        worker.recv().await.unwrap().kind(),
        worker.recv().await.unwrap().kind(),
        worker.recv().await.unwrap().kind(),
    ];
    assert_eq!(kinds, ["names", "connectCodes", "names"]);
}

#[tokio::test]
async fn test_worker_sees_rows_committed_after_spawn() {
    let dir = TempDir::new().unwrap();
    let path = create_store(dir.path(), &[vec![Player::named("A")]]);
    let mut worker = StatsWorker::spawn(&path).unwrap();

    // No caching: the ingestion writer commits a new replay and the next
    // query reflects it.
    let ingest = writer(&path);
    insert_game(&ingest, &[Player::named("A"), Player::named("B")]);

    let response = worker.request(StatsRequest::GetNames).await.unwrap();
    assert_eq!(
        response,
        StatsResponse::Names {
            data: vec![
                NameTally {
                    name: "A".into(),
                    total: 2
                },
                NameTally {
                    name: "B".into(),
                    total: 1
                },
            ]
        }
    );
}

#[tokio::test]
async fn test_request_waits_out_a_transient_writer_lock() {
    let dir = TempDir::new().unwrap();
    // Rollback journal: an exclusive writer blocks readers outright, so
    // the request only resolves once the busy handler has waited the lock
    // out. (This also runs the worker against a non-WAL store.)
    let path = create_rollback_store(dir.path(), &[vec![Player::named("A")]]);
    let mut worker = StatsWorker::spawn(&path).unwrap();

    let (locked_tx, locked_rx) = std::sync::mpsc::channel();
    let writer_path = path.clone();
    let writer = std::thread::spawn(move || {
        let conn = Connection::open(&writer_path).unwrap();
        conn.execute_batch("BEGIN EXCLUSIVE").unwrap();
        locked_tx.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(300));
        conn.execute_batch("COMMIT").unwrap();
    });
    locked_rx.recv().unwrap();

    // The lock clears well inside the 5000ms window; the request resolves
    // with data instead of failing immediately.
    let response = worker.request(StatsRequest::GetNames).await.unwrap();
    assert_eq!(
        response,
        StatsResponse::Names {
            data: vec![NameTally {
                name: "A".into(),
                total: 1
            }]
        }
    );
    writer.join().unwrap();
}

#[tokio::test]
async fn test_lock_outliving_the_wait_window_yields_an_error_response() {
    let dir = TempDir::new().unwrap();
    let path = create_rollback_store(dir.path(), &[vec![Player::named("A")]]);
    let mut worker = StatsWorker::spawn(&path).unwrap();

    let blocker = Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    // Nobody releases the lock, so the busy wait elapses and the query
    // failure comes back as an error response, not a dead worker.
    let response = worker.request(StatsRequest::GetNames).await.unwrap();
    assert!(matches!(response, StatsResponse::Error { .. }));

    blocker.execute_batch("ROLLBACK").unwrap();
    let response = worker.request(StatsRequest::GetNames).await.unwrap();
    assert!(matches!(response, StatsResponse::Names { .. }));
}

#[tokio::test]
async fn test_construction_failure_means_no_worker() {
    let dir = TempDir::new().unwrap();
    assert!(StatsWorker::spawn(dir.path().join("missing.db")).is_err());
}

#[tokio::test]
async fn test_responses_fan_out_through_the_bridge() {
    let dir = TempDir::new().unwrap();
    let mut worker = StatsWorker::spawn(sample_store(&dir)).unwrap();

    // The supervisor forwards worker responses to the sandboxed UI over a
    // named bridge channel; the renderer only ever sees serialized messages.
    let bridge = IpcBridge::new();
    let received: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    bridge.on("stats:response", move |payload: &Value| {
        sink.lock().push(payload.clone())
    });

    let response = worker.request(StatsRequest::GetNames).await.unwrap();
    bridge.send("stats:response", &serde_json::to_value(&response).unwrap());

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["type"], "names");
    assert_eq!(received[0]["data"][0]["name"], "A");
    assert_eq!(received[0]["data"][0]["total"], 2);
}

#[tokio::test]
async fn test_one_shot_subscriber_sees_a_single_response() {
    let dir = TempDir::new().unwrap();
    let mut worker = StatsWorker::spawn(sample_store(&dir)).unwrap();

    let bridge = IpcBridge::new();
    let count = Arc::new(Mutex::new(0u32));
    let counter = count.clone();
    bridge.once("stats:response", move |_| *counter.lock() += 1);

    for _ in 0..2 {
        let response = worker.request(StatsRequest::GetNames).await.unwrap();
        bridge.send("stats:response", &serde_json::to_value(&response).unwrap());
    }
    assert_eq!(*count.lock(), 1);
}
