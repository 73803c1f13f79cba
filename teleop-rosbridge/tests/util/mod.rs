#![allow(dead_code)]

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{net::TcpListener, sync::mpsc, time};
use tokio_tungstenite::tungstenite::Message;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// What the fake rosbridge server saw.
#[derive(Debug)]
pub enum Received {
    Json(Value),
    Closed,
}

/// Accepts a single WebSocket client, sends `greeting` to it and forwards
/// every text frame it receives.
pub async fn spawn_server(greeting: Vec<Message>) -> (String, mpsc::UnboundedReceiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for msg in greeting {
            let is_close = matches!(msg, Message::Close(_));
            ws.send(msg).await.unwrap();
            if is_close {
                let _ = tx.send(Received::Closed);
                return;
            }
        }
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let _ = tx.send(Received::Json(serde_json::from_str(&text).unwrap()));
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = tx.send(Received::Closed);
    });
    (format!("ws://{addr}"), rx)
}

/// Accepts a single WebSocket client, forwards its first text frame and then
/// drops the TCP connection without a close frame.
pub async fn spawn_dropping_server() -> (String, mpsc::UnboundedReceiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = tx.send(Received::Json(serde_json::from_str(&text).unwrap()));
                break;
            }
        }
        drop(ws);
        let _ = tx.send(Received::Closed);
    });
    (format!("ws://{addr}"), rx)
}

pub async fn next_json(rx: &mut mpsc::UnboundedReceiver<Received>) -> Value {
    match time::timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap() {
        Received::Json(v) => v,
        Received::Closed => panic!("server connection closed"),
    }
}

pub async fn wait_closed(rx: &mut mpsc::UnboundedReceiver<Received>) {
    loop {
        match time::timeout(TIMEOUT, rx.recv()).await.unwrap() {
            Some(Received::Closed) | None => return,
            Some(Received::Json(_)) => {}
        }
    }
}
