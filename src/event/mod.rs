//! Delivery of decoded commands to consumers.
//!
//! The dispatch thread hands every received command to a [`CommandCallback`].
//! Consumers that prefer pulling commands can use [`command_channel`], whose
//! sender side is itself a callback feeding a bounded queue.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::types::Command;

/// Receiver of decoded commands.
///
/// Called from the dispatch thread, one command at a time and in the order
/// the device reported them. Implementations should return quickly: the
/// next device read starts only after this returns.
pub trait CommandCallback: Send + Sync {
    /// Handles one received command.
    fn on_command_received(&self, command: Command);
}

impl<F> CommandCallback for F
where
    F: Fn(Command) + Send + Sync,
{
    fn on_command_received(&self, command: Command) {
        self(command);
    }
}

/// Sending half of a command channel.
///
/// Register it as the adapter callback. Keep it alive for as long as
/// commands should be delivered; once it is dropped the receiver drains
/// and then reports the end of the stream.
///
/// The dispatch thread never waits on the queue: a command that arrives
/// while the queue is full is dropped and logged.
#[derive(Debug)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandCallback for CommandSender {
    fn on_command_received(&self, command: Command) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                tracing::warn!("command queue full, dropping {}", command);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("command receiver dropped");
            }
        }
    }
}

/// Receiving half of a command channel.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Receives the next command.
    ///
    /// Returns `None` once the sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for synchronous consumers.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Command> {
        self.rx.blocking_recv()
    }

    /// Returns a queued command without waiting.
    pub fn try_recv(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

impl Stream for CommandReceiver {
    type Item = Command;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Creates a bounded command channel.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn command_channel(capacity: usize) -> (Arc<CommandSender>, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (Arc::new(CommandSender { tx }), CommandReceiver { rx })
}
