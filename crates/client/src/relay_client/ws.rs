//! Socket sessions against the relay's `/ws` endpoint.

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use shared::{ws_types, WsConnectedPayload, WsEnvelope, WsErrorPayload};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A received text frame: relay control envelope or a broadcast payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Connected(String),
    Error(String),
    Message(String),
}

/// Classify a text frame. Anything that is not a known envelope is a broadcast payload.
pub fn parse_frame(text: &str) -> Frame {
    let Ok(envelope) = serde_json::from_str::<WsEnvelope>(text) else {
        return Frame::Message(text.to_string());
    };
    match envelope.r#type.as_str() {
        ws_types::CONNECTED => serde_json::from_value::<WsConnectedPayload>(envelope.payload)
            .map(|p| Frame::Connected(p.connection_id))
            .unwrap_or_else(|_| Frame::Message(text.to_string())),
        ws_types::ERROR => serde_json::from_value::<WsErrorPayload>(envelope.payload)
            .map(|p| Frame::Error(p.reason))
            .unwrap_or_else(|_| Frame::Message(text.to_string())),
        _ => Frame::Message(text.to_string()),
    }
}

/// Send body for `message`; with `json` the text is sent as a structured value.
pub fn message_body(message: &str, json: bool) -> Result<String> {
    let value = if json {
        serde_json::from_str(message)?
    } else {
        serde_json::Value::String(message.to_string())
    };
    Ok(serde_json::json!({ "message": value }).to_string())
}

/// Connect and wait for the relay to assign a connection id.
async fn connect(url: &str) -> Result<(WsStream, String)> {
    let (mut ws, _) = connect_async(url).await?;
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(t) => match parse_frame(&t) {
                Frame::Connected(id) => {
                    tracing::info!(connection_id = %id, "connected to relay");
                    return Ok((ws, id));
                }
                Frame::Error(reason) => anyhow::bail!("relay refused connection: {}", reason),
                Frame::Message(_) => continue,
            },
            Message::Close(_) => break,
            _ => continue,
        }
    }
    anyhow::bail!("relay closed before assigning a connection id")
}

fn print_frame(text: &str) {
    match parse_frame(text) {
        Frame::Message(m) => println!("{}", m),
        Frame::Error(reason) => tracing::warn!("relay error: {}", reason),
        Frame::Connected(_) => {}
    }
}

pub async fn run_listen(url: &str) -> Result<()> {
    let (ws, _) = connect(url).await?;
    let (_ws_tx, mut ws_rx) = ws.split();
    while let Some(msg) = ws_rx.next().await {
        match msg? {
            Message::Text(t) => print_frame(&t),
            Message::Close(_) => break,
            _ => continue,
        }
    }
    Ok(())
}

pub async fn run_send(url: &str, message: &str, json: bool) -> Result<()> {
    let body = message_body(message, json)?;
    let (mut ws, id) = connect(url).await?;
    ws.send(Message::Text(body)).await?;
    tracing::info!(connection_id = %id, "message sent");
    ws.close(None).await?;
    Ok(())
}

pub async fn run_chat(url: &str) -> Result<()> {
    let (ws, _) = connect(url).await?;
    let (mut ws_tx, mut ws_rx) = ws.split();

    let reader = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(t)) => print_frame(&t),
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::error!("socket error: {}", e);
                    break;
                }
                _ => continue,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        ws_tx
            .send(Message::Text(message_body(line, false)?))
            .await?;
    }

    let _ = ws_tx.send(Message::Close(None)).await;
    reader.abort();
    Ok(())
}
