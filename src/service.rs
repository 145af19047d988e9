//! Single-owner session worker
//!
//! The daemon shares one [`SquatSession`] between IPC clients. The session
//! lives inside a worker task and is only touched through commands sent
//! over a channel, so frames are processed one at a time, in arrival order.
//! Between commands the worker ticks the session so the celebration
//! overlay clears even when frames stop arriving.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::events::SessionEvent;
use crate::pose::FrameSnapshot;
use crate::session::{FrameOutcome, SessionSnapshot, SquatSession};

/// How often the worker checks for an expired overlay
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Errors talking to the session worker
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session worker has stopped")]
    WorkerStopped,
}

/// Commands accepted by the session worker
#[derive(Debug)]
enum SessionCommand {
    Process {
        snapshot: FrameSnapshot,
        reply: oneshot::Sender<FrameOutcome>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable handle to a running session worker
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Move `session` into a worker task
    ///
    /// Feedback and rep completions are published on `event_tx`.
    pub fn spawn<C>(session: SquatSession<C>, event_tx: broadcast::Sender<SessionEvent>) -> (Self, JoinHandle<()>)
    where
        C: Clock + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(32);
        let worker = tokio::spawn(run(session, command_rx, event_tx));
        (Self { command_tx }, worker)
    }

    /// Process one frame
    pub async fn process(&self, snapshot: FrameSnapshot) -> Result<FrameOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Process { snapshot, reply }).await?;
        rx.await.map_err(|_| SessionError::WorkerStopped)
    }

    /// Zero the session
    pub async fn reset(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Reset { reply }).await?;
        rx.await.map_err(|_| SessionError::WorkerStopped)
    }

    /// Current counters and phase
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::WorkerStopped)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::WorkerStopped)
    }
}

/// Run the worker until every handle is dropped
async fn run<C: Clock>(
    mut session: SquatSession<C>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    info!("session worker started");

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                handle_command(&mut session, command, &event_tx);
            }
            _ = ticker.tick() => {
                for event in session.tick() {
                    publish(&event_tx, SessionEvent::Feedback { event });
                }
            }
        }
    }

    info!(rep_count = session.rep_count(), "session worker stopped");
}

fn handle_command<C: Clock>(
    session: &mut SquatSession<C>,
    command: SessionCommand,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match command {
        SessionCommand::Process { snapshot, reply } => {
            let outcome = session.process(&snapshot);
            for event in &outcome.feedback {
                publish(event_tx, SessionEvent::Feedback { event: event.clone() });
            }
            if outcome.rep_completed {
                publish(event_tx, SessionEvent::RepCompleted { rep_count: outcome.rep_count });
            }
            let _ = reply.send(outcome);
        }
        SessionCommand::Reset { reply } => {
            session.reset();
            publish(event_tx, SessionEvent::SessionReset);
            let _ = reply.send(());
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
    }
}

fn publish(event_tx: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    debug!(?event, "publishing session event");
    // No subscribers is fine
    let _ = event_tx.send(event);
}
