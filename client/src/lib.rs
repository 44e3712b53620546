//! # Hookshot relay client
//!
//! The private half of hookshot: holds one reconnecting tunnel connection
//! to a relay server and forwards each relayed request to a local target
//! (`spec.md` §4.6).

pub mod error;
pub mod forward;
pub mod options;
pub mod reconnect;

pub use error::ClientError;
pub use options::{ClientOptions, RouteEntry};
pub use reconnect::run_client_loop;
