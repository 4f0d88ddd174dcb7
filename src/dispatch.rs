//! Background thread draining inbound events from the device.
//!
//! The thread blocks on timed reads of one event record at a time, decodes
//! received messages and forwards them to the registered callback. It stops
//! only when asked to; the read timeout bounds how long that takes.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::event::CommandCallback;
use crate::protocol::{EVENT_RECORD_LEN, EventType, InboundEvent};
use crate::transport::Transport;

/// Pause after a failed read before the next attempt.
const READ_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Lifecycle of the dispatch thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatchState {
    /// No thread is running.
    Stopped = 0,
    /// The thread is reading events.
    Running = 1,
    /// Shutdown was requested; the thread exits once its current read returns.
    StopRequested = 2,
}

impl DispatchState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

/// Dispatch state shared between the session and its thread.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(DispatchState::Stopped as u8))
    }

    pub(crate) fn get(&self) -> DispatchState {
        DispatchState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: DispatchState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn is_stopping(&self) -> bool {
        self.get() != DispatchState::Running
    }
}

/// Handle to a running dispatch thread.
pub(crate) struct DispatchHandle {
    state: Arc<StateCell>,
    thread: JoinHandle<()>,
}

impl DispatchHandle {
    /// Requests shutdown and blocks until the thread has exited.
    pub(crate) fn stop(self) {
        self.state.set(DispatchState::StopRequested);
        if self.thread.join().is_err() {
            tracing::error!("dispatch thread panicked");
        }
        self.state.set(DispatchState::Stopped);
    }
}

/// Starts the dispatch thread.
pub(crate) fn spawn<T: Transport + 'static>(
    transport: Arc<T>,
    callback: Weak<dyn CommandCallback>,
    read_timeout: Duration,
    state: Arc<StateCell>,
) -> Result<DispatchHandle> {
    state.set(DispatchState::Running);

    let thread_state = Arc::clone(&state);
    let spawned = thread::Builder::new()
        .name("cec-dispatch".into())
        .spawn(move || run(&*transport, &callback, read_timeout, &thread_state));

    match spawned {
        Ok(thread) => Ok(DispatchHandle { state, thread }),
        Err(e) => {
            state.set(DispatchState::Stopped);
            Err(Error::Dispatch(e))
        }
    }
}

fn run<T: Transport>(
    transport: &T,
    callback: &Weak<dyn CommandCallback>,
    read_timeout: Duration,
    state: &StateCell,
) {
    let mut record = [0u8; EVENT_RECORD_LEN];
    tracing::debug!("dispatch loop started");

    while !state.is_stopping() {
        let n = match transport.read(&mut record, read_timeout) {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("device read failed: {}", e);
                thread::sleep(READ_ERROR_PAUSE.min(read_timeout));
                continue;
            }
        };

        tracing::trace!("read event record: {}", hex::encode(&record[..n]));
        match InboundEvent::parse(&record[..n]) {
            Ok(event) => handle_event(&event, callback, state),
            Err(e) => tracing::warn!("malformed event record: {}", e),
        }
    }

    tracing::debug!("dispatch loop stopped");
}

/// Forwards received messages; every other event is dropped.
fn handle_event(event: &InboundEvent, callback: &Weak<dyn CommandCallback>, state: &StateCell) {
    let (initiator, destination) = event.addresses();

    match event.event_type() {
        Some(EventType::ReceiveSuccess) => {
            let Some(command) = event.command() else {
                return;
            };
            if state.is_stopping() {
                return;
            }
            tracing::trace!("received command: {}", command);
            match callback.upgrade() {
                Some(callback) => callback.on_command_received(command),
                None => tracing::debug!("callback dropped, discarding {}", command),
            }
        }
        Some(kind) => {
            tracing::debug!(
                "ignoring {:?} event (initiator {}, destination {})",
                kind,
                initiator,
                destination
            );
        }
        None => tracing::debug!("ignoring unknown event type {}", event.raw_type),
    }
}
