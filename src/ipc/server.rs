//! Unix domain socket server for IPC
//!
//! Pose sources submit frames and read back outcomes. Clients that
//! subscribe also receive every session event as a pushed message.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::SessionEvent;
use crate::pose::FrameSnapshot;
use crate::service::SessionHandle;

use super::protocol::{encode_message, DaemonStatus, Request, Response, MAX_MESSAGE_LEN};

/// Outgoing messages buffered per client
const CLIENT_QUEUE: usize = 64;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    context: ClientContext,
    shutdown_tx: broadcast::Sender<()>,
}

/// What each client handler needs from the server
#[derive(Clone)]
struct ClientContext {
    session: SessionHandle,
    event_tx: broadcast::Sender<SessionEvent>,
    start_time: Instant,
}

impl Server {
    /// Bind the socket and prepare to serve `session`
    pub fn new(
        socket_path: &Path,
        session: SessionHandle,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            context: ClientContext {
                session,
                event_tx,
                start_time: Instant::now(),
            },
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = self.context.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Background tasks owned by one client connection
///
/// Dropping the guard aborts both tasks, so a handler cancelled by shutdown
/// doesn't leave them running.
struct ClientTasks {
    writer: JoinHandle<()>,
    forwarder: Option<JoinHandle<()>>,
}

impl Drop for ClientTasks {
    fn drop(&mut self) {
        self.writer.abort();
        if let Some(forwarder) = &self.forwarder {
            forwarder.abort();
        }
    }
}

/// Handle a single client connection
async fn handle_client(stream: UnixStream, context: ClientContext) -> Result<()> {
    let (mut reader, writer) = stream.into_split();
    let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>(CLIENT_QUEUE);
    let mut tasks = ClientTasks {
        writer: tokio::spawn(write_loop(writer, out_rx)),
        forwarder: None,
    };

    let result = async {
        while let Some(msg_buf) = read_message(&mut reader).await? {
            let response = match serde_json::from_slice::<Request>(&msg_buf) {
                Ok(request) => {
                    debug!(?request, "received request");
                    if matches!(request, Request::Subscribe) && tasks.forwarder.is_none() {
                        tasks.forwarder = Some(tokio::spawn(forward_events(
                            context.event_tx.subscribe(),
                            out_tx.clone(),
                        )));
                        debug!("client subscribed to notifications");
                    }
                    process_request(request, &context).await
                }
                Err(e) => {
                    warn!(%e, "malformed request");
                    Response::error("bad_request", e.to_string())
                }
            };

            let bytes = encode_message(&response).context("failed to encode response")?;
            if out_tx.send(bytes).await.is_err() {
                debug!("client writer closed");
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    // Let queued responses flush before the guard tears the writer down
    if let Some(forwarder) = tasks.forwarder.take() {
        forwarder.abort();
    }
    drop(out_tx);
    let _ = (&mut tasks.writer).await;
    result
}

/// Read one length-prefixed message; `None` when the client is done
async fn read_message(reader: &mut OwnedReadHalf) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];

    // Read message length (4-byte little-endian)
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            debug!("client disconnected");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    // Read message body
    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Write queued messages until every sender is dropped
async fn write_loop(mut writer: OwnedWriteHalf, mut out_rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(bytes) = out_rx.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            debug!(?e, "client write failed");
            break;
        }
    }
}

/// Push session events to a subscribed client
async fn forward_events(mut event_rx: broadcast::Receiver<SessionEvent>, out_tx: mpsc::Sender<Vec<u8>>) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                let bytes = match encode_message(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(?e, "failed to encode session event");
                        continue;
                    }
                };
                if out_tx.send(bytes).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Process a request and return a response
async fn process_request(request: Request, context: &ClientContext) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::ProcessFrame { keypoints } => {
            match context.session.process(FrameSnapshot::new(keypoints)).await {
                Ok(outcome) => Response::Frame { outcome },
                Err(e) => Response::error("session_unavailable", e.to_string()),
            }
        }

        Request::Reset => match context.session.reset().await {
            Ok(()) => Response::ResetDone,
            Err(e) => Response::error("session_unavailable", e.to_string()),
        },

        Request::GetStatus => match context.session.snapshot().await {
            Ok(session) => Response::Status(DaemonStatus {
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_secs: context.start_time.elapsed().as_secs(),
                session,
            }),
            Err(e) => Response::error("session_unavailable", e.to_string()),
        },

        Request::Subscribe => Response::Subscribed,
    }
}
