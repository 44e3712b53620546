//! Route resolution, hop-by-hop header stripping, outbound URL
//! construction, and the actual forward to the local target
//! (`spec.md` §4.6).

use std::collections::HashMap;
use std::time::Duration;

use hookshot_protocol::{HttpRequest, HttpResponse};
use reqwest::redirect::Policy;
use tracing::warn;
use url::Url;

use crate::error::ClientError;
use crate::options::{ClientOptions, RouteEntry, OUTBOUND_DEADLINE};

/// Compared case-insensitively against canonicalized header names, so the
/// set strips regardless of the casing a particular wire hop used
/// (`spec.md` §4.6 "Hop-by-hop headers").
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

fn strip_hop_by_hop(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Select the route whose `path_prefix` is the longest prefix match of
/// `path`; fall back to `default_target` when nothing matches.
pub fn resolve_target<'a>(routes: &'a [RouteEntry], default_target: &'a str, path: &str) -> &'a str {
    routes
        .iter()
        .filter(|route| path.starts_with(route.path_prefix.as_str()))
        .max_by_key(|route| route.path_prefix.len())
        .map(|route| route.target.as_str())
        .unwrap_or(default_target)
}

/// Parse `target` as a URL and resolve `path` (which may carry a query
/// string) against it as a reference, after normalizing `path` to start
/// with `/`. Because an absolute-path reference replaces the base's path
/// entirely, any base path on `target` is discarded — this is the
/// "leading-slash normalization" behavior `spec.md` §8 property 8 names.
pub fn build_outbound_url(target: &str, path: &str) -> Result<Url, url::ParseError> {
    let base = Url::parse(target)?;
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    base.join(&normalized)
}

/// Forward one relayed request to the resolved local target. Never
/// returns an error: any failure (bad target URL, connection refused,
/// timeout) is synthesized into a 502 response envelope carrying the
/// original request id, per `spec.md` §4.6 and §7 ("upstream-failure").
pub async fn forward_to_target(client: &reqwest::Client, options: &ClientOptions, request: &HttpRequest) -> HttpResponse {
    match try_forward(client, options, request).await {
        Ok(response) => response,
        Err(message) => {
            warn!(request_id = %request.id, error = %message, "forwarding to local target failed");
            HttpResponse {
                request_id: request.id.clone(),
                status_code: 502,
                headers: HashMap::new(),
                body: format!("hookshot: upstream request failed: {message}").into_bytes(),
            }
        }
    }
}

async fn try_forward(client: &reqwest::Client, options: &ClientOptions, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
    let target = resolve_target(&options.routes, &options.default_target, &request.path);
    let url = build_outbound_url(target, &request.path)?;

    let method = reqwest::Method::from_bytes(request.method.as_bytes()).unwrap_or(reqwest::Method::GET);
    let mut builder = client.request(method, url).timeout(OUTBOUND_DEADLINE);
    for (name, value) in strip_hop_by_hop(&request.headers) {
        builder = builder.header(name, value);
    }
    builder = builder.body(request.body.clone());

    let response = builder.send().await?;
    let status_code = response.status().as_u16();
    let headers = single_valued_headers(response.headers());
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        request_id: request.id.clone(),
        status_code,
        headers: strip_hop_by_hop(&headers),
        body,
    })
}

fn single_valued_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            map.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
    }
    map
}

/// Build the shared outbound client: no automatic redirects and a total
/// per-request deadline (`spec.md` §4.6).
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client configuration is static and always valid")
}
