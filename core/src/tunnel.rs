//! A single live connection between the relay server and one relay client.
//!
//! `Tunnel` owns the pending-response table and the outbound queue; it
//! does not own the socket itself (§9 "cyclic references avoided by
//! inversion") — the server and client crates drive the actual reader and
//! writer coroutines and call into `Tunnel`'s methods.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use hookshot_protocol::{Envelope, HttpRequest, HttpResponse};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Capacity of a tunnel's outbound envelope queue (`spec.md` §3).
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// One live tunnel. Cheap to clone (wrap in `Arc`); every clone observes
/// the same pending table and done signal.
pub struct Tunnel {
    /// Full secure identifier, ≥128 bits of entropy. Never logged in full
    /// (`spec.md` §3, §7) — use [`Tunnel::short_id`] for logging.
    pub id: String,
    outbound_tx: mpsc::Sender<Envelope>,
    pending: Mutex<HashMap<String, oneshot::Sender<HttpResponse>>>,
    /// Fires at most once, from whichever of reader-exit / registry
    /// close_all / forward_request's caller fires it first (§4.3, §9).
    done: CancellationToken,
}

/// RAII guard ensuring a pending-response entry is removed on every exit
/// path of `forward_request`, including the future being dropped out from
/// under a `tokio::time::timeout`.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<String, oneshot::Sender<HttpResponse>>>,
    request_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().unwrap().remove(&self.request_id);
    }
}

impl Tunnel {
    /// Create a tunnel and the receiver its writer coroutine drains.
    pub fn new(id: String) -> (Self, mpsc::Receiver<Envelope>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        (
            Self {
                id,
                outbound_tx,
                pending: Mutex::new(HashMap::new()),
                done: CancellationToken::new(),
            },
            outbound_rx,
        )
    }

    /// The external display form: first 8 characters of the full id.
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(8);
        &self.id[..end]
    }

    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Fire the done signal. Safe to call more than once; only the first
    /// call has any effect (`CancellationToken::cancel` is idempotent).
    pub fn close(&self) {
        self.done.cancel();
    }

    /// A token that resolves once this tunnel is done. Writers and
    /// readers select on this alongside their I/O to exit promptly.
    pub fn done_signal(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Forward `request` through this tunnel and wait for its correlated
    /// response, honoring `deadline` end-to-end (queue wait + response
    /// wait, §5).
    ///
    /// The pending entry is always removed on exit — success, tunnel
    /// closure, or timeout — via [`PendingGuard`].
    pub async fn forward_request(
        &self,
        request: HttpRequest,
        deadline: Duration,
    ) -> Result<HttpResponse, CoreError> {
        let request_id = request.id.clone();
        let (resp_tx, resp_rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(request_id.clone(), resp_tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id: request_id.clone(),
        };

        let attempt = async {
            let envelope = Envelope::request(&request);
            tokio::select! {
                biased;
                _ = self.done.cancelled() => return Err(CoreError::TunnelClosed),
                res = self.outbound_tx.send(envelope) => {
                    res.map_err(|_| CoreError::TunnelClosed)?;
                }
            }

            tokio::select! {
                biased;
                _ = self.done.cancelled() => Err(CoreError::TunnelClosed),
                resp = resp_rx => resp.map_err(|_| CoreError::TunnelClosed),
            }
        };

        match tokio::time::timeout(deadline, attempt).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::RequestTimeout),
        }
    }

    /// Route a response envelope to its pending waiter, if one still
    /// exists. Non-blocking; a response with no matching waiter (the
    /// requester already timed out, or this is a duplicate) is dropped
    /// silently (`spec.md` §4.3, testable property 2).
    pub fn deliver_response(&self, response: HttpResponse) {
        let waiter = self.pending.lock().unwrap().remove(&response.request_id);
        if let Some(tx) = waiter {
            let _ = tx.send(response);
        }
    }

    /// Number of requests currently awaiting a response. Exposed for
    /// tests and diagnostics only.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
