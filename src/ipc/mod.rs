//! IPC module for pose source and UI communication

mod protocol;
mod server;

pub use protocol::{encode_message, DaemonStatus, Request, Response, MAX_MESSAGE_LEN};
pub use server::Server;
