//! Dashboard push channel.
//!
//! Each connection gets a bounded outbound queue drained by a writer task;
//! the hub only ever enqueues, so a slow client cannot stall a broadcast.

use crate::application::realtime::{ChannelTransport, Outbound};
use crate::infrastructure::http::middleware::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

const OUTBOUND_QUEUE: usize = 256;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (transport, mut outbound) = ChannelTransport::new(OUTBOUND_QUEUE);
    let session_id = state.hub.on_connect(Arc::new(transport)).await;

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match frame {
                Outbound::Frame(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => state.hub.on_message(&session_id, &text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary and protocol-level ping/pong
                Some(Err(e)) => {
                    tracing::debug!("WebSocket error on session {}: {}", session_id, e);
                    break;
                }
            },
            // Writer finished: hub closed the session or the socket went away
            _ = &mut writer => break,
        }
    }

    state.hub.on_disconnect(&session_id).await;
    writer.abort();
}
