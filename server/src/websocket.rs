//! WebSocket handshake and the per-tunnel reader/writer coroutines
//! (`spec.md` §4.3, §4.5, §4.7).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use hookshot_core::{StoredResponse, Tunnel, TunnelRegistry};
use hookshot_protocol::{decode, encode, Envelope, RegisteredPayload, Tag};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::options::{ping_period, HANDSHAKE_DEADLINE, PONG_WAIT, WRITE_DEADLINE};
use crate::state::AppState;

/// Drives one accepted WebSocket connection end to end: handshake,
/// registration, writer/reader coroutines, and deregistration on exit.
pub async fn run_tunnel_connection(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let register_envelope = match tokio::time::timeout(HANDSHAKE_DEADLINE, stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match decode(&text) {
            Ok(envelope) if envelope.tag == Tag::Register => envelope,
            _ => {
                warn!("rejecting connection: malformed or unexpected handshake envelope");
                return;
            }
        },
        _ => {
            warn!("rejecting connection: no register envelope within handshake deadline");
            return;
        }
    };

    let register = match register_envelope.as_register() {
        Ok(payload) => payload,
        Err(_) => return,
    };

    if let Some(expected) = &state.options.token {
        let provided_matches = register.token.as_deref() == Some(expected.as_str());
        if !provided_matches {
            let error = Envelope::error("unauthorized", "missing or invalid registration token");
            if let Ok(text) = encode(&error) {
                let _ = sink.send(Message::Text(text.into())).await;
            }
            let _ = sink.close().await;
            return;
        }
    }

    let (tunnel, outbound_rx) = state.registry.register(register.tunnel_id).await;
    info!(tunnel = tunnel.short_id(), "tunnel registered");

    let registered = Envelope::registered(&RegisteredPayload {
        tunnel_id: tunnel.id.clone(),
        public_url: format!("{}/t/{}", state.options.public_url_prefix, tunnel.id),
    });
    let Ok(registered_text) = encode(&registered) else {
        state.registry.unregister(&tunnel.id).await;
        return;
    };
    if sink.send(Message::Text(registered_text.into())).await.is_err() {
        state.registry.unregister(&tunnel.id).await;
        return;
    }

    let writer_handle = tokio::spawn(run_writer(sink, tunnel.clone(), outbound_rx));

    run_reader(stream, tunnel.clone(), state.registry.clone()).await;

    state.registry.unregister(&tunnel.id).await;
    let _ = writer_handle.await;
}

/// Consumes the tunnel's outbound queue and writes each envelope as a text
/// frame, with a 10s write deadline; emits a transport ping every
/// `ping_period`. Exits on the done signal or the first write error, and
/// always closes the socket on exit (`spec.md` §4.3).
async fn run_writer(
    mut sink: SplitSink<WebSocket, Message>,
    tunnel: Arc<Tunnel>,
    mut outbound_rx: mpsc::Receiver<Envelope>,
) {
    let done = tunnel.done_signal();
    let mut ping_timer = tokio::time::interval(ping_period());
    ping_timer.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            biased;
            () = done.cancelled() => break,
            _ = ping_timer.tick() => {
                let sent = tokio::time::timeout(WRITE_DEADLINE, sink.send(Message::Ping(Vec::new().into()))).await;
                if !matches!(sent, Ok(Ok(()))) {
                    break;
                }
            }
            next = outbound_rx.recv() => {
                let Some(envelope) = next else { break };
                let Ok(text) = encode(&envelope) else { continue };
                let sent = tokio::time::timeout(WRITE_DEADLINE, sink.send(Message::Text(text.into()))).await;
                if !matches!(sent, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

/// Reads envelopes with a `pong_wait` read deadline, refreshed by every
/// successful read. Routes `response` envelopes to the matching pending
/// slot and records them in the request store; everything else is either
/// a liveness no-op or dropped with a log line (`spec.md` §4.3).
async fn run_reader(mut stream: SplitStream<WebSocket>, tunnel: Arc<Tunnel>, registry: Arc<TunnelRegistry>) {
    loop {
        let next = tokio::time::timeout(PONG_WAIT, stream.next()).await;
        let message = match next {
            Ok(Some(Ok(message))) => message,
            _ => break,
        };

        match message {
            Message::Text(text) => {
                let envelope = match decode(&text) {
                    Ok(e) => e,
                    Err(_) => {
                        debug!(tunnel = tunnel.short_id(), "dropping malformed mid-session envelope");
                        continue;
                    }
                };
                match envelope.tag {
                    Tag::Response => {
                        if let Ok(response) = envelope.as_response() {
                            registry.store.store_response(StoredResponse {
                                request_id: response.request_id.clone(),
                                status_code: response.status_code,
                                headers: response.headers.clone(),
                                body: response.body.clone(),
                            });
                            tunnel.deliver_response(response);
                        }
                    }
                    Tag::Pong => {}
                    other => debug!(tunnel = tunnel.short_id(), tag = ?other, "ignoring unexpected tag mid-session"),
                }
            }
            Message::Pong(_) => {}
            Message::Close(_) => break,
            _ => {}
        }
    }
}
