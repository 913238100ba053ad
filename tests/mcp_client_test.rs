//! Session-engine integration tests
//!
//! Exercises the transport-agnostic `JsonRpcClient` and `start_read_loop`
//! through the public API, with an in-process channel transport standing in
//! for a real server.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{recv_json, send_error, send_result, ChannelTransport, ChannelTransportHandle};
use xzmcp::client::{start_read_loop, JsonRpcClient};
use xzmcp::error::{McpError, Result};
use xzmcp::transport::Transport;

/// Build a fully wired engine and return its test-side handle.
fn wired_client() -> (Arc<JsonRpcClient>, ChannelTransportHandle, CancellationToken) {
    let (transport, handle) = ChannelTransport::new();
    let client = Arc::new(JsonRpcClient::new(
        Arc::new(transport),
        Duration::from_secs(5),
    ));
    let token = CancellationToken::new();
    start_read_loop(Arc::clone(&client), token.clone());
    (client, handle, token)
}

#[tokio::test]
async fn test_request_ids_increase_without_gaps() {
    let (client, mut handle, _token) = wired_client();

    tokio::spawn(async move {
        for _ in 0..4 {
            let req = recv_json(&mut handle.outbound_rx).await;
            assert_eq!(req["jsonrpc"], "2.0");
            send_result(&handle.inbound_tx, &req["id"], serde_json::json!({ "id": req["id"] }));
        }
    });

    let mut seen = Vec::new();
    for _ in 0..4 {
        let v: serde_json::Value = client
            .request("ping", serde_json::json!({}), None)
            .await
            .unwrap();
        seen.push(v["id"].as_u64().unwrap());
    }
    assert_eq!(seen, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_out_of_order_responses_correlate_by_id() {
    let (client, mut handle, _token) = wired_client();

    tokio::spawn(async move {
        let first = recv_json(&mut handle.outbound_rx).await;
        let second = recv_json(&mut handle.outbound_rx).await;
        // Answer in reverse order.
        send_result(
            &handle.inbound_tx,
            &second["id"],
            serde_json::json!({ "tag": "second" }),
        );
        send_result(
            &handle.inbound_tx,
            &first["id"],
            serde_json::json!({ "tag": "first" }),
        );
    });

    let (a, b) = tokio::join!(
        client.request::<_, serde_json::Value>("one", serde_json::json!({}), None),
        client.request::<_, serde_json::Value>("two", serde_json::json!({}), None),
    );
    assert_eq!(a.unwrap()["tag"], "first");
    assert_eq!(b.unwrap()["tag"], "second");
}

#[tokio::test]
async fn test_timeout_leaves_session_usable() {
    let (client, mut handle, _token) = wired_client();

    let result: Result<serde_json::Value> = client
        .request("slow", serde_json::json!({}), Some(Duration::from_millis(50)))
        .await;
    assert!(matches!(result, Err(McpError::Timeout { .. })));

    // Drain the ignored request, then serve the next one normally.
    let _stale = recv_json(&mut handle.outbound_rx).await;
    tokio::spawn(async move {
        let req = recv_json(&mut handle.outbound_rx).await;
        send_result(&handle.inbound_tx, &req["id"], serde_json::json!({ "ok": true }));
    });

    let v: serde_json::Value = client
        .request("fast", serde_json::json!({}), None)
        .await
        .unwrap();
    assert_eq!(v["ok"], true);
}

#[tokio::test]
async fn test_remote_error_carries_original_code() {
    let (client, mut handle, _token) = wired_client();

    tokio::spawn(async move {
        let req = recv_json(&mut handle.outbound_rx).await;
        send_error(&handle.inbound_tx, &req["id"], -32700, "Parse error");
    });

    let result: Result<serde_json::Value> =
        client.request("anything", serde_json::json!({}), None).await;
    match result {
        Err(McpError::Remote { code, message, .. }) => {
            assert_eq!(code, -32700);
            assert_eq!(message, "Parse error");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_close_fans_out_to_every_pending_request() {
    let (transport, _handle) = ChannelTransport::new();
    let transport = Arc::new(transport);
    let client = Arc::new(JsonRpcClient::new(
        Arc::clone(&transport) as Arc<dyn Transport>,
        Duration::from_secs(30),
    ));
    start_read_loop(Arc::clone(&client), CancellationToken::new());

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            client
                .request::<_, serde_json::Value>("hang", serde_json::json!({}), None)
                .await
        }));
    }

    tokio::time::sleep(Duration::from_millis(30)).await;
    transport.close().await;

    for task in tasks {
        let outcome = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("pending request did not resolve after close")
            .expect("task panicked");
        assert!(matches!(outcome, Err(McpError::ConnectionClosed)));
    }
}

#[tokio::test]
async fn test_notifications_dispatch_in_arrival_order() {
    let (client, handle, _token) = wired_client();

    let seen = Arc::new(std::sync::Mutex::new(Vec::<f64>::new()));
    {
        let seen = Arc::clone(&seen);
        client.on_notification("progress", move |params| {
            seen.lock().unwrap().push(params["progress"].as_f64().unwrap());
        });
    }

    for progress in [0.1, 0.5, 0.9] {
        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "progress",
                    "params": { "requestId": "op", "progress": progress }
                }))
                .unwrap(),
            )
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*seen.lock().unwrap(), vec![0.1, 0.5, 0.9]);
}

#[tokio::test]
async fn test_unknown_notification_is_ignored_quietly() {
    let (client, mut handle, _token) = wired_client();

    let counter = Arc::new(AtomicUsize::new(0));
    {
        let counter = Arc::clone(&counter);
        client.on_notification("known", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    for method in ["unknown/one", "known", "unknown/two"] {
        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0", "method": method
                }))
                .unwrap(),
            )
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    // The session keeps serving requests afterwards.
    tokio::spawn(async move {
        let req = recv_json(&mut handle.outbound_rx).await;
        send_result(&handle.inbound_tx, &req["id"], serde_json::json!({}));
    });
    let result: Result<serde_json::Value> =
        client.request("ping", serde_json::json!({}), None).await;
    assert!(result.is_ok());
}
