//! Integration tests for the editor connection against a fake editor plugin

use futures::{SinkExt, StreamExt};
use godot_bridge::{CommandSender, ConnectionConfig, Error, GodotConnection};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

type EditorSocket = WebSocketStream<TcpStream>;

fn echo_protocol(req: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    if let Some(protocol) = req.headers().get("sec-websocket-protocol") {
        response
            .headers_mut()
            .insert("sec-websocket-protocol", protocol.clone());
    }
    Ok(response)
}

/// Start a fake editor; `session` runs once per accepted connection
async fn spawn_editor<F, Fut>(session: F) -> (String, Arc<AtomicUsize>)
where
    F: Fn(EditorSocket) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let session = Arc::new(session);

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let session = session.clone();
            tokio::spawn(async move {
                if let Ok(ws) = accept_hdr_async(stream, echo_protocol).await {
                    session(ws).await;
                }
            });
        }
    });

    (format!("ws://{}", addr), accepted)
}

fn test_config(url: String) -> ConnectionConfig {
    ConnectionConfig {
        url,
        command_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(2),
        max_retries: 2,
        retry_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

async fn next_command(ws: &mut EditorSocket) -> Option<Value> {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).ok();
        }
    }
    None
}

async fn reply(ws: &mut EditorSocket, body: Value) {
    ws.send(Message::Text(body.to_string().into())).await.unwrap();
}

/// Echoes every command back as its result
async fn echo_session(mut ws: EditorSocket) {
    while let Some(cmd) = next_command(&mut ws).await {
        let body = json!({
            "status": "success",
            "result": {"type": cmd["type"], "params": cmd["params"], "id": cmd["commandId"]},
            "commandId": cmd["commandId"],
        });
        reply(&mut ws, body).await;
    }
}

#[tokio::test]
async fn test_send_command_round_trip() {
    let (url, accepted) = spawn_editor(echo_session).await;
    let conn = GodotConnection::new(test_config(url));

    assert!(!conn.is_connected().await);
    let result = conn
        .send_command("create_node", json!({"node_type": "Sprite2D"}))
        .await
        .unwrap();

    assert!(conn.is_connected().await);
    assert_eq!(result["type"], "create_node");
    assert_eq!(result["params"]["node_type"], "Sprite2D");
    assert_eq!(result["id"], "cmd_0");

    let second = conn.send_command("list_nodes", Value::Null).await.unwrap();
    assert_eq!(second["id"], "cmd_1");
    assert_eq!(second["params"], json!({}));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(conn.pending_count().await, 0);
}

#[tokio::test]
async fn test_editor_error_status() {
    let (url, _) = spawn_editor(|mut ws: EditorSocket| async move {
        while let Some(cmd) = next_command(&mut ws).await {
            let body = json!({
                "status": "error",
                "message": "Node not found: /root/Missing",
                "commandId": cmd["commandId"],
            });
            reply(&mut ws, body).await;
        }
    })
    .await;
    let conn = GodotConnection::new(test_config(url));

    let err = conn
        .send_command("delete_node", json!({"node_path": "/root/Missing"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Godot(ref msg) if msg == "Node not found: /root/Missing"));
}

#[tokio::test]
async fn test_command_timeout_clears_pending() {
    let (url, _) = spawn_editor(|mut ws: EditorSocket| async move {
        // Read and never answer
        while next_command(&mut ws).await.is_some() {}
    })
    .await;
    let conn = GodotConnection::new(ConnectionConfig {
        command_timeout: Duration::from_millis(150),
        ..test_config(url)
    });

    let err = conn.send_command("slow_command", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(ref cmd) if cmd == "slow_command"));
    assert_eq!(err.to_string(), "Command timed out: slow_command");
    assert_eq!(conn.pending_count().await, 0);
    assert!(conn.is_connected().await);
}

#[tokio::test]
async fn test_replies_correlate_out_of_order() {
    let (url, _) = spawn_editor(|mut ws: EditorSocket| async move {
        let first = next_command(&mut ws).await.unwrap();
        let second = next_command(&mut ws).await.unwrap();
        for cmd in [second, first] {
            let body = json!({
                "status": "success",
                "result": cmd["type"],
                "commandId": cmd["commandId"],
            });
            reply(&mut ws, body).await;
        }
    })
    .await;
    let conn = Arc::new(GodotConnection::new(test_config(url)));
    conn.connect().await.unwrap();

    let a = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.send_command("alpha", json!({})).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let b = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.send_command("beta", json!({})).await })
    };

    assert_eq!(a.await.unwrap().unwrap(), json!("alpha"));
    assert_eq!(b.await.unwrap().unwrap(), json!("beta"));
}

#[tokio::test]
async fn test_unrelated_messages_are_ignored() {
    let (url, _) = spawn_editor(|mut ws: EditorSocket| async move {
        while let Some(cmd) = next_command(&mut ws).await {
            ws.send(Message::Text("garbage".into())).await.unwrap();
            reply(&mut ws, json!({"status": "success", "result": 1})).await;
            reply(&mut ws, json!({"status": "success", "result": 2, "commandId": "cmd_999"})).await;
            reply(&mut ws, json!({"status": "success", "result": 3, "commandId": cmd["commandId"]})).await;
        }
    })
    .await;
    let conn = GodotConnection::new(test_config(url));

    assert_eq!(conn.send_command("anything", json!({})).await.unwrap(), json!(3));
}

#[tokio::test]
async fn test_close_fails_pending_and_reconnects() {
    let (url, accepted) = spawn_editor(|mut ws: EditorSocket| async move {
        let cmd = next_command(&mut ws).await.unwrap();
        if cmd["type"] == "crash" {
            let _ = ws.close(None).await;
            return;
        }
        let body = json!({"status": "success", "result": "ok", "commandId": cmd["commandId"]});
        reply(&mut ws, body).await;
        echo_session(ws).await;
    })
    .await;
    let conn = GodotConnection::new(test_config(url));

    let err = conn.send_command("crash", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));

    // Give the reader task a moment to observe the close
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!conn.is_connected().await);

    let result = conn.send_command("get_project_info", json!({})).await.unwrap();
    assert_eq!(result, json!("ok"));
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connect_failure_after_retries() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let conn = GodotConnection::new(test_config(format!("ws://{}", addr)));
    let err = conn.send_command("get_project_info", json!({})).await.unwrap_err();

    assert!(matches!(err, Error::Connection(ref msg) if msg.starts_with("Failed to connect to Godot: ")));
    assert!(err.to_string().contains("2 attempts"));
    assert!(!conn.is_connected().await);
}

#[tokio::test]
async fn test_concurrent_commands_open_one_session() {
    let (url, accepted) = spawn_editor(echo_session).await;
    let conn = Arc::new(GodotConnection::new(test_config(url)));

    let calls: Vec<_> = (0..8)
        .map(|i| {
            let conn = conn.clone();
            tokio::spawn(async move { conn.send_command(&format!("command_{}", i), json!({})).await })
        })
        .collect();

    for (i, call) in calls.into_iter().enumerate() {
        let result = call.await.unwrap().unwrap();
        assert_eq!(result["type"], format!("command_{}", i));
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stalled_handshake_bounded_by_connect_timeout() {
    // Accepts TCP but never answers the WebSocket upgrade
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let conn = GodotConnection::new(ConnectionConfig {
        connect_timeout: Duration::from_millis(200),
        ..test_config(format!("ws://{}", addr))
    });

    let started = Instant::now();
    let err = conn.connect().await.unwrap_err();

    assert!(matches!(err, Error::Connection(ref msg) if msg.contains("Connection timeout")));
    // 2 attempts x 200ms plus a 10ms retry delay
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_disconnect_cancels_connect_in_progress() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let conn = Arc::new(GodotConnection::new(ConnectionConfig {
        max_retries: 3,
        retry_delay: Duration::from_secs(2),
        ..test_config(format!("ws://{}", addr))
    }));

    let connecting = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.connect().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    conn.disconnect().await;
    assert!(started.elapsed() < Duration::from_millis(500));

    let result = tokio::time::timeout(Duration::from_millis(500), connecting)
        .await
        .expect("connect should stop after disconnect")
        .unwrap();
    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert!(!conn.is_connected().await);
}

#[tokio::test]
async fn test_disconnect_fails_in_flight_command() {
    let (url, _) = spawn_editor(|mut ws: EditorSocket| async move {
        while next_command(&mut ws).await.is_some() {}
    })
    .await;
    let conn = Arc::new(GodotConnection::new(test_config(url)));
    conn.connect().await.unwrap();

    let in_flight = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.send_command("never_answered", json!({})).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(conn.pending_count().await, 1);

    conn.disconnect().await;

    assert!(matches!(in_flight.await.unwrap(), Err(Error::ConnectionClosed)));
    assert!(!conn.is_connected().await);
}

#[tokio::test]
async fn test_usable_through_command_sender() {
    let (url, _) = spawn_editor(echo_session).await;
    let sender: Arc<dyn CommandSender> = Arc::new(GodotConnection::new(test_config(url)));

    let result = sender
        .send_command("get_debug_output", json!({}))
        .await
        .unwrap();
    assert_eq!(result["type"], "get_debug_output");
}
