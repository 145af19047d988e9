//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::pose::Keypoint;
use crate::session::{FrameOutcome, SessionSnapshot};

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from clients to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Analyze one frame; an empty keypoint list means no pose was detected
    ProcessFrame {
        #[serde(default)]
        keypoints: Vec<Keypoint>,
    },

    /// Start a fresh session
    Reset,

    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to session event notifications
    Subscribe,
}

/// Responses from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Result of a processed frame
    Frame { outcome: FrameOutcome },

    /// Current daemon status
    Status(DaemonStatus),

    /// Session was reset
    ResetDone,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Session counters
    pub session: SessionSnapshot,
}

/// Length-prefix and serialize a message
pub fn encode_message<T: Serialize>(msg: &T) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_vec(msg)?;
    let mut buf = Vec::with_capacity(4 + body.len());
    buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}
