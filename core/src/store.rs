//! In-memory, per-tunnel bounded FIFO of recent request/response pairs.
//!
//! Insertion order is preserved per tunnel. When a tunnel's queue exceeds
//! `max_requests`, the oldest id is evicted from every map atomically — a
//! stored response with no surviving request is unreachable and must go
//! with it (`spec.md` §3).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// A request as captured at webhook ingress or replay time.
#[derive(Debug, Clone)]
pub struct StoredRequest {
    pub id: String,
    pub tunnel_id: String,
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// The response paired with a [`StoredRequest`] by `request_id`, once one
/// arrives.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub request_id: String,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// A listing row: everything the `/api/tunnels/{id}/requests` endpoint
/// needs, and nothing more (no bodies, no headers).
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub id: String,
    pub method: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
}

/// Per-tunnel bounded FIFO with lookup by request id and by tunnel.
pub struct RequestStore {
    max_requests: usize,
    requests: DashMap<String, StoredRequest>,
    responses: DashMap<String, StoredResponse>,
    order: DashMap<String, Mutex<VecDeque<String>>>,
}

impl RequestStore {
    pub fn new(max_requests: usize) -> Self {
        Self {
            max_requests: max_requests.max(1),
            requests: DashMap::new(),
            responses: DashMap::new(),
            order: DashMap::new(),
        }
    }

    /// Store a new request under `tunnel_id`, evicting the oldest entry if
    /// the tunnel's queue now exceeds `max_requests`.
    pub fn store(&self, tunnel_id: &str, request: StoredRequest) {
        let request_id = request.id.clone();
        self.requests.insert(request_id.clone(), request);

        let order = self
            .order
            .entry(tunnel_id.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut order = order.lock().unwrap();
        order.push_back(request_id);

        while order.len() > self.max_requests {
            if let Some(evicted) = order.pop_front() {
                self.requests.remove(&evicted);
                self.responses.remove(&evicted);
            }
        }
    }

    /// Store a response, correlated to its request by `request_id`. A
    /// response for a request no longer present (already evicted by
    /// `store()`, or never stored) is dropped rather than inserted — a
    /// response surviving its request would be unreachable from `order`
    /// and would leak forever, since eviction only ever walks ids still in
    /// `order` (`spec.md` §3).
    pub fn store_response(&self, response: StoredResponse) {
        if !self.requests.contains_key(&response.request_id) {
            return;
        }
        self.responses
            .insert(response.request_id.clone(), response);
    }

    pub fn get(&self, request_id: &str) -> Option<StoredRequest> {
        self.requests.get(request_id).map(|r| r.clone())
    }

    pub fn get_response(&self, request_id: &str) -> Option<StoredResponse> {
        self.responses.get(request_id).map(|r| r.clone())
    }

    /// Summaries for a tunnel, newest first.
    pub fn list(&self, tunnel_id: &str) -> Vec<RequestSummary> {
        let Some(order) = self.order.get(tunnel_id) else {
            return Vec::new();
        };
        let order = order.lock().unwrap();
        order
            .iter()
            .rev()
            .filter_map(|id| {
                let request = self.requests.get(id)?;
                let status_code = self.responses.get(id).map(|r| r.status_code);
                Some(RequestSummary {
                    id: request.id.clone(),
                    method: request.method.clone(),
                    path: request.path.clone(),
                    timestamp: request.timestamp,
                    status_code,
                })
            })
            .collect()
    }

    /// Drop all requests and responses recorded for a tunnel.
    pub fn clear(&self, tunnel_id: &str) {
        if let Some((_, order)) = self.order.remove(tunnel_id) {
            let order = order.into_inner().unwrap();
            for id in order {
                self.requests.remove(&id);
                self.responses.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, tunnel_id: &str) -> StoredRequest {
        StoredRequest {
            id: id.to_string(),
            tunnel_id: tunnel_id.to_string(),
            method: "GET".to_string(),
            path: "/x".to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn lists_newest_first() {
        let store = RequestStore::new(100);
        store.store("t1", req("a", "t1"));
        store.store("t1", req("b", "t1"));
        store.store("t1", req("c", "t1"));
        let ids: Vec<_> = store.list("t1").into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn evicts_oldest_beyond_max_requests() {
        let store = RequestStore::new(3);
        for id in ["a", "b", "c", "d", "e"] {
            store.store("t1", req(id, "t1"));
        }
        let ids: Vec<_> = store.list("t1").into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["e", "d", "c"]);
        assert!(store.get("a").is_none());
        assert!(store.get("b").is_none());
    }

    #[test]
    fn eviction_drops_the_paired_response_too() {
        let store = RequestStore::new(1);
        store.store("t1", req("a", "t1"));
        store.store_response(StoredResponse {
            request_id: "a".to_string(),
            status_code: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        });
        store.store("t1", req("b", "t1"));
        assert!(store.get("a").is_none());
        assert!(store.get_response("a").is_none());
    }

    #[test]
    fn store_response_for_an_already_evicted_request_is_dropped() {
        let store = RequestStore::new(1);
        store.store("t1", req("a", "t1"));
        store.store("t1", req("b", "t1")); // evicts "a"
        store.store_response(StoredResponse {
            request_id: "a".to_string(),
            status_code: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        });
        assert!(store.get_response("a").is_none());
    }

    #[test]
    fn list_carries_response_status_when_present() {
        let store = RequestStore::new(10);
        store.store("t1", req("a", "t1"));
        store.store_response(StoredResponse {
            request_id: "a".to_string(),
            status_code: 502,
            headers: HashMap::new(),
            body: Vec::new(),
        });
        let summaries = store.list("t1");
        assert_eq!(summaries[0].status_code, Some(502));
    }

    #[test]
    fn clear_removes_everything_for_a_tunnel() {
        let store = RequestStore::new(10);
        store.store("t1", req("a", "t1"));
        store.store("t2", req("b", "t2"));
        store.clear("t1");
        assert!(store.list("t1").is_empty());
        assert_eq!(store.list("t2").len(), 1);
    }

    #[test]
    fn list_on_unknown_tunnel_is_empty() {
        let store = RequestStore::new(10);
        assert!(store.list("nope").is_empty());
    }
}
