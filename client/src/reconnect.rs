//! The reconnecting tunnel loop (`spec.md` §4.6 "Reconnect loop"): connect,
//! register, dispatch envelopes until the socket dies, then retry with
//! exponential backoff.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use hookshot_protocol::{decode, encode, Envelope, RegisterPayload, Tag};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::forward::{build_http_client, forward_to_target};
use crate::options::{ClientOptions, HANDSHAKE_DEADLINE, INITIAL_BACKOFF, MAX_BACKOFF, OUTBOUND_QUEUE_CAPACITY};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Runs forever: connect, register, serve the session, then on any
/// disconnection wait out the current backoff and retry. A successful
/// connection resets the backoff to its initial value (`spec.md` §4.6).
pub async fn run_client_loop(options: ClientOptions) {
    let http_client = build_http_client();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match connect_async(&options.server_url).await {
            Ok((stream, _response)) => {
                info!(server = %options.server_url, "connected to relay server");
                backoff = INITIAL_BACKOFF;
                run_session(stream, &options, &http_client).await;
                warn!("disconnected from relay server");
            }
            Err(err) => {
                warn!(error = %err, "failed to connect to relay server");
            }
        }

        debug!(delay = ?backoff, "reconnecting after backoff");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Registers, then serves the session until the socket closes or a
/// protocol-fatal condition occurs. Returns in either case so the caller
/// can reconnect.
async fn run_session(ws: WsStream, options: &ClientOptions, http_client: &reqwest::Client) {
    let (mut sink, mut stream) = ws.split();

    let register = Envelope::register(&RegisterPayload {
        tunnel_id: options.requested_id.clone(),
        token: options.token.clone(),
    });
    let Ok(text) = encode(&register) else {
        warn!("failed to encode register envelope");
        return;
    };
    if sink.send(Message::Text(text.into())).await.is_err() {
        return;
    }

    match tokio::time::timeout(HANDSHAKE_DEADLINE, stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match decode(&text) {
            Ok(envelope) if envelope.tag == Tag::Registered => {
                if let Ok(registered) = envelope.as_registered() {
                    let short_id = &registered.tunnel_id[..registered.tunnel_id.len().min(8)];
                    info!(tunnel = short_id, "tunnel registered");
                    println!("tunnel registered, forwarding webhooks from {}", registered.public_url);
                }
            }
            Ok(envelope) if envelope.tag == Tag::Error => {
                if let Ok(error) = envelope.as_error() {
                    warn!(code = %error.code, message = %error.message, "registration rejected");
                }
                return;
            }
            _ => {
                warn!("unexpected handshake response from relay server");
                return;
            }
        },
        _ => {
            warn!("no handshake response within the handshake deadline");
            return;
        }
    }

    let (outbound_tx, outbound_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_CAPACITY);
    let writer_handle = tokio::spawn(run_writer(sink, outbound_rx));

    run_reader(stream, options.clone(), http_client.clone(), outbound_tx).await;

    let _ = writer_handle.await;
}

async fn run_writer(mut sink: SplitSink<WsStream, Message>, mut outbound_rx: mpsc::Receiver<Message>) {
    while let Some(message) = outbound_rx.recv().await {
        if sink.send(message).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

/// Dispatches incoming envelopes by tag. `request` envelopes are handed to
/// a spawned task so a slow local target never blocks other in-flight
/// requests; `ping` is answered inline. Transport-level ping/pong frames
/// need no manual handling here — tungstenite answers them internally.
async fn run_reader(
    mut stream: SplitStream<WsStream>,
    options: ClientOptions,
    http_client: reqwest::Client,
    outbound_tx: mpsc::Sender<Message>,
) {
    while let Some(next) = stream.next().await {
        let message = match next {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "relay socket read failed");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let envelope = match decode(&text) {
                    Ok(envelope) => envelope,
                    Err(_) => {
                        debug!("dropping malformed envelope from relay server");
                        continue;
                    }
                };
                match envelope.tag {
                    Tag::Request => {
                        if let Ok(request) = envelope.as_request() {
                            let options = options.clone();
                            let http_client = http_client.clone();
                            let outbound_tx = outbound_tx.clone();
                            tokio::spawn(async move {
                                let response = forward_to_target(&http_client, &options, &request).await;
                                if let Ok(text) = encode(&Envelope::response(&response)) {
                                    let _ = outbound_tx.send(Message::Text(text.into())).await;
                                }
                            });
                        }
                    }
                    Tag::Ping => {
                        if let Ok(text) = encode(&Envelope::pong()) {
                            let _ = outbound_tx.send(Message::Text(text.into())).await;
                        }
                    }
                    other => debug!(tag = ?other, "ignoring unexpected tag from relay server"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
