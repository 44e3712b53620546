//! # Tunnel wire protocol
//!
//! Defines the envelope that travels over the persistent bidirectional
//! connection between a relay server and a relay client, and the payload
//! types carried inside it.
//!
//! Envelopes are serialized as self-delimited JSON text frames: one
//! `encode`/`decode` call corresponds to exactly one WebSocket text
//! message. The payload is kept as an opaque nested JSON value so the
//! codec can route by tag without knowing each payload's shape (§4.1).

mod body;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tags identifying the shape of an envelope's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Register,
    Registered,
    Request,
    Response,
    Ping,
    Pong,
    Error,
}

/// A single message unit exchanged over the tunnel transport.
///
/// `payload` is re-serialized as an opaque nested value so that routing
/// by `tag` never requires decoding the payload itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub tag: Tag,
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("envelope tag {0:?} did not carry the expected payload shape")]
    UnexpectedPayload(Tag),
}

/// Encode an envelope as a single self-delimited JSON text frame.
pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Decode exactly one text frame into an envelope.
///
/// An unknown `type` value fails deserialization outright (`serde` has no
/// tag to fall back to); callers that need the "log and drop" behavior of
/// §4.1 for unknown tags should treat any `ProtocolError` mid-session as
/// non-fatal and simply not dispatch the frame.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

fn to_payload<T: Serialize>(tag: Tag, value: &T) -> Envelope {
    Envelope {
        tag,
        payload: serde_json::to_value(value).expect("payload types are always serializable"),
    }
}

fn from_payload<T: for<'de> Deserialize<'de>>(envelope: &Envelope) -> Result<T, ProtocolError> {
    serde_json::from_value(envelope.payload.clone())
        .map_err(|_| ProtocolError::UnexpectedPayload(envelope.tag))
}

/// `{ tunnel_id?: string, token?: string }`.
///
/// `tunnel_id` is advisory only: the server accepts it for schema
/// stability but always assigns its own identifier (§9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `{ tunnel_id: string, public_url: string }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredPayload {
    pub tunnel_id: String,
    pub public_url: String,
}

/// A single HTTP request relayed through a tunnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub id: String,
    pub tunnel_id: String,
    pub method: String,
    pub path: String,
    pub headers: std::collections::HashMap<String, String>,
    #[serde(with = "body::base64_bytes")]
    pub body: Vec<u8>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// The response correlated to an [`HttpRequest`] by `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub request_id: String,
    pub status_code: u16,
    pub headers: std::collections::HashMap<String, String>,
    #[serde(with = "body::base64_bytes")]
    pub body: Vec<u8>,
}

/// Sent only at registration-time rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl Envelope {
    pub fn register(payload: &RegisterPayload) -> Self {
        to_payload(Tag::Register, payload)
    }

    pub fn registered(payload: &RegisteredPayload) -> Self {
        to_payload(Tag::Registered, payload)
    }

    pub fn request(payload: &HttpRequest) -> Self {
        to_payload(Tag::Request, payload)
    }

    pub fn response(payload: &HttpResponse) -> Self {
        to_payload(Tag::Response, payload)
    }

    pub fn ping() -> Self {
        Envelope {
            tag: Tag::Ping,
            payload: serde_json::Value::Null,
        }
    }

    pub fn pong() -> Self {
        Envelope {
            tag: Tag::Pong,
            payload: serde_json::Value::Null,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        to_payload(
            Tag::Error,
            &ErrorPayload {
                code: code.into(),
                message: message.into(),
            },
        )
    }

    pub fn as_register(&self) -> Result<RegisterPayload, ProtocolError> {
        from_payload(self)
    }

    pub fn as_registered(&self) -> Result<RegisteredPayload, ProtocolError> {
        from_payload(self)
    }

    pub fn as_request(&self) -> Result<HttpRequest, ProtocolError> {
        from_payload(self)
    }

    pub fn as_response(&self) -> Result<HttpResponse, ProtocolError> {
        from_payload(self)
    }

    pub fn as_error(&self) -> Result<ErrorPayload, ProtocolError> {
        from_payload(self)
    }
}
