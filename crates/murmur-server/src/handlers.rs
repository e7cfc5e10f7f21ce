//! Connection handlers for the Murmur server.
//!
//! This module handles the connection lifecycle: accepting WebSocket
//! upgrades, decoding inbound frames, driving the coordinator, and
//! draining each connection's outbox back onto the wire.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use murmur_core::{ConnectionId, Coordinator, EventSink};
use murmur_protocol::{codec, error_codes, ClientEvent, ServerEvent};
use murmur_transport::ConnectionHub;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The event coordinator.
    pub coordinator: Coordinator,
    /// The connection hub delivering outbound events.
    pub hub: ConnectionHub,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            coordinator: Coordinator::new(),
            hub: ConnectionHub::new(),
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Murmur server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    if state.hub.connection_count() >= state.config.limits.max_connections {
        warn!("Connection limit reached, rejecting upgrade");
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    ws.on_upgrade(move |socket| handle_websocket(socket, state))
        .into_response()
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let connection_id = ConnectionId::generate();
    debug!(connection = %connection_id, "WebSocket connected");

    // Register with the hub before anything can be broadcast
    let mut outbox = state.hub.register(&connection_id);

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Greet the client with its connection id
    state
        .hub
        .send(
            &connection_id,
            ServerEvent::Connected {
                connection_id: connection_id.as_str().to_string(),
            },
        )
        .await;

    // Read buffer for partial frames
    let mut read_buffer = BytesMut::with_capacity(4096);

    // Message processing loop
    loop {
        tokio::select! {
            biased;

            // Drain the outbox: everything the coordinator decided to
            // deliver to this connection, unicast or broadcast.
            Some(event) = outbox.recv() => {
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ingest_chunk(&data, &mut read_buffer, &connection_id, &state).await {
                            ChunkOutcome::Continue => {}
                            ChunkOutcome::Disconnect(report) => {
                                if let Some(event) = report {
                                    let _ = send_event(&mut sender, &event).await;
                                }
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        // Text frames carry the same length-prefixed stream
                        match ingest_chunk(
                            text.as_bytes(),
                            &mut read_buffer,
                            &connection_id,
                            &state,
                        )
                        .await
                        {
                            ChunkOutcome::Continue => {}
                            ChunkOutcome::Disconnect(report) => {
                                if let Some(event) = report {
                                    let _ = send_event(&mut sender, &event).await;
                                }
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: stop delivery, then release per-connection core state
    state.hub.unregister(&connection_id);
    state.coordinator.connection_closed(&connection_id);

    debug!(connection = %connection_id, "WebSocket disconnected");
}

/// What to do with the connection after ingesting one inbound chunk.
#[derive(Debug)]
enum ChunkOutcome {
    /// Keep processing.
    Continue,
    /// Close the connection, reporting an error first if present.
    Disconnect(Option<ServerEvent>),
}

/// Ingest one inbound chunk: enforce the size limit, buffer the
/// bytes, and dispatch every complete frame. Binary and text frames
/// share this path so both report malformed input the same way.
async fn ingest_chunk(
    data: &[u8],
    read_buffer: &mut BytesMut,
    connection_id: &ConnectionId,
    state: &Arc<AppState>,
) -> ChunkOutcome {
    if data.len() > state.config.limits.max_message_size {
        warn!(
            connection = %connection_id,
            size = data.len(),
            "Inbound message exceeds size limit"
        );
        metrics::record_error("oversize");
        return ChunkOutcome::Disconnect(Some(ServerEvent::error(
            error_codes::INVALID_INPUT,
            "message exceeds size limit",
        )));
    }

    metrics::record_event(data.len(), "inbound");
    read_buffer.extend_from_slice(data);

    match process_buffer(read_buffer, connection_id, state).await {
        Ok(()) => ChunkOutcome::Continue,
        Err(e) => {
            // A malformed frame desyncs the length-prefixed stream;
            // report it and drop the connection.
            warn!(connection = %connection_id, error = %e, "Protocol error");
            metrics::record_error("protocol");
            ChunkOutcome::Disconnect(Some(ServerEvent::error(
                error_codes::INVALID_INPUT,
                e.to_string(),
            )))
        }
    }
}

/// Decode and dispatch every complete frame in the read buffer.
async fn process_buffer(
    read_buffer: &mut BytesMut,
    connection_id: &ConnectionId,
    state: &Arc<AppState>,
) -> Result<(), murmur_protocol::ProtocolError> {
    while let Some(event) = codec::decode_from::<ClientEvent>(read_buffer)? {
        let start = Instant::now();

        state
            .coordinator
            .dispatch(connection_id, event, &state.hub)
            .await;

        metrics::set_messages_stored(state.coordinator.store().len());
        metrics::set_identified_connections(state.coordinator.registry().len());
        metrics::record_latency(start.elapsed().as_secs_f64());
    }
    Ok(())
}

/// Encode and send an event to the WebSocket.
async fn send_event(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<()> {
    let data = codec::encode(event)?;
    metrics::record_event(data.len(), "outbound");
    sender.send(Message::Binary(data.to_vec())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    #[tokio::test]
    async fn test_ingest_chunk_dispatches_complete_frames() {
        let state = test_state();
        let conn = ConnectionId::new("c1");
        let mut read_buffer = BytesMut::new();

        let data = codec::encode(&ClientEvent::CreateMessage {
            name: "Alice".into(),
            text: "hi".into(),
            timestamp: 1000,
        })
        .unwrap();

        let outcome = ingest_chunk(&data, &mut read_buffer, &conn, &state).await;
        assert!(matches!(outcome, ChunkOutcome::Continue));
        assert_eq!(state.coordinator.store().len(), 1);
        assert!(read_buffer.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_chunk_reports_malformed_frame() {
        let state = test_state();
        let conn = ConnectionId::new("c1");
        let mut read_buffer = BytesMut::new();

        // Valid length prefix, invalid MessagePack body
        let data = [0, 0, 0, 2, 0xc1, 0xc1];

        match ingest_chunk(&data, &mut read_buffer, &conn, &state).await {
            ChunkOutcome::Disconnect(Some(ServerEvent::Error { code, .. })) => {
                assert_eq!(code, error_codes::INVALID_INPUT);
            }
            other => panic!("Expected malformed-frame report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_chunk_rejects_oversize_chunk() {
        let mut config = Config::default();
        config.limits.max_message_size = 8;
        let state = Arc::new(AppState::new(config));
        let conn = ConnectionId::new("c1");
        let mut read_buffer = BytesMut::new();

        let data = vec![0u8; 16];

        match ingest_chunk(&data, &mut read_buffer, &conn, &state).await {
            ChunkOutcome::Disconnect(Some(ServerEvent::Error { code, .. })) => {
                assert_eq!(code, error_codes::INVALID_INPUT);
            }
            other => panic!("Expected oversize report, got {:?}", other),
        }
        // Nothing was buffered; the oversize chunk is refused outright
        assert!(read_buffer.is_empty());
    }
}
