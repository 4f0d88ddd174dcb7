//! Main [`CecAdapter`] session implementation.
//!
//! This module provides the adapter session that combines the device
//! transport, the outbound encoder, the dispatch thread and the capability
//! queries into one interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::dispatch::{self, DispatchHandle, DispatchState, StateCell};
use crate::error::{Error, Result};
use crate::event::CommandCallback;
use crate::protocol::{ControlRequest, RawFrame};
use crate::types::{
    AdapterMessageState, AdapterType, Command, LogicalAddress, LogicalAddresses, PhysicalAddress,
    VendorId,
};
#[cfg(unix)]
use crate::transport::{CharDevice, DeviceConfig};
use crate::transport::Transport;

/// Default wait for one inbound event before re-checking for shutdown.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for an adapter session.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Upper bound on a single device read in the dispatch thread, and so
    /// on how long [`CecAdapter::close`] waits for the thread to exit.
    pub read_timeout: Duration,
}

impl AdapterConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets the dispatch read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Transmission hints passed along with an outbound command.
///
/// The device retries and times the bus itself, so [`CecAdapter::write`]
/// accepts these for interface compatibility and ignores them.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteHints {
    /// Caller is willing to retry on failure.
    pub retry: bool,
    /// Signal free time, in bit periods.
    pub line_timeout: u8,
    /// The command answers a request.
    pub is_reply: bool,
}

#[derive(Debug, Default)]
struct Session {
    logical_address: Option<LogicalAddress>,
    last_error: String,
}

/// Session with a CEC adapter device.
///
/// Owns the transport and the dispatch thread. All methods take `&self`,
/// so a session can be shared between threads behind an `Arc`.
pub struct CecAdapter<T: Transport + 'static> {
    transport: Arc<T>,
    callback: Weak<dyn CommandCallback>,
    config: AdapterConfig,
    session: Mutex<Session>,
    dispatcher: Mutex<Option<DispatchHandle>>,
    dispatch_state: Arc<StateCell>,
    initialised: AtomicBool,
}

#[cfg(unix)]
impl CecAdapter<CharDevice> {
    /// Creates a session for the sunxi device node at `path`.
    ///
    /// The device is not opened until [`open`](Self::open) is called.
    #[must_use]
    pub fn device<C: CommandCallback + 'static>(
        path: impl Into<std::path::PathBuf>,
        callback: &Arc<C>,
    ) -> Self {
        Self::with_device_config(DeviceConfig::new(path), AdapterConfig::default(), callback)
    }

    /// Creates a session with custom device and session configuration.
    #[must_use]
    pub fn with_device_config<C: CommandCallback + 'static>(
        device: DeviceConfig,
        config: AdapterConfig,
        callback: &Arc<C>,
    ) -> Self {
        Self::with_config(CharDevice::new(device), config, callback)
    }
}

impl<T: Transport + 'static> CecAdapter<T> {
    /// Creates a session over `transport` with default configuration.
    ///
    /// Only a weak reference to `callback` is kept; commands received after
    /// the caller drops it are discarded.
    #[must_use]
    pub fn new<C: CommandCallback + 'static>(transport: T, callback: &Arc<C>) -> Self {
        Self::with_config(transport, AdapterConfig::default(), callback)
    }

    /// Creates a session with custom configuration.
    #[must_use]
    pub fn with_config<C: CommandCallback + 'static>(
        transport: T,
        config: AdapterConfig,
        callback: &Arc<C>,
    ) -> Self {
        let callback: Weak<dyn CommandCallback> = Arc::downgrade(callback) as Weak<dyn CommandCallback>;
        Self {
            transport: Arc::new(transport),
            callback,
            config,
            session: Mutex::new(Session::default()),
            dispatcher: Mutex::new(None),
            dispatch_state: Arc::new(StateCell::new()),
            initialised: AtomicBool::new(false),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, err: &Error) {
        self.session().last_error = err.to_string();
    }

    /// Opens the device and optionally starts the dispatch thread.
    ///
    /// This will:
    /// 1. Open the transport within `timeout`
    /// 2. Start the dispatch thread if `start_listening` is set
    /// 3. Issue the device start request (a failure is logged, not returned)
    ///
    /// On an open session only step 2 applies: the thread is started if
    /// listening is requested and not already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be opened or the thread
    /// cannot be started. A fresh open leaves the transport closed in both
    /// cases.
    pub fn open(&self, timeout: Duration, start_listening: bool) -> Result<()> {
        if self.is_open() {
            tracing::debug!("adapter already open");
            return if start_listening {
                self.start_dispatch()
            } else {
                Ok(())
            };
        }

        if let Err(e) = self.transport.open(timeout) {
            tracing::error!("unable to open {}: {}", self.transport.name(), e);
            self.record_error(&e);
            return Err(e);
        }

        if start_listening {
            if let Err(e) = self.start_dispatch() {
                self.transport.close();
                return Err(e);
            }
        }

        if let Err(e) = self.transport.control(ControlRequest::StartDevice) {
            tracing::error!("unable to start device: {}", e);
            self.record_error(&e);
        }

        self.initialised.store(true, Ordering::Release);
        tracing::info!("adapter opened on {}", self.transport.name());
        Ok(())
    }

    /// Starts the dispatch thread unless it is already running.
    fn start_dispatch(&self) -> Result<()> {
        let mut dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if dispatcher.is_some() {
            return Ok(());
        }

        let spawned = dispatch::spawn(
            Arc::clone(&self.transport),
            self.callback.clone(),
            self.config.read_timeout,
            Arc::clone(&self.dispatch_state),
        );
        match spawned {
            Ok(handle) => {
                *dispatcher = Some(handle);
                Ok(())
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Stops the dispatch thread and closes the device.
    ///
    /// Blocks until the thread has exited, which takes at most one read
    /// timeout. Safe to call on a closed session.
    pub fn close(&self) {
        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop();
        }

        self.initialised.store(false, Ordering::Release);
        if !self.transport.is_open() {
            return;
        }

        if let Err(e) = self.transport.control(ControlRequest::StopDevice) {
            tracing::error!("unable to stop device: {}", e);
            self.record_error(&e);
        }
        self.transport.close();
        tracing::info!("adapter closed on {}", self.transport.name());
    }

    /// Returns true if the session is initialised and the device is open.
    pub fn is_open(&self) -> bool {
        self.initialised.load(Ordering::Acquire) && self.transport.is_open()
    }

    /// Returns the last recorded error message, empty if none.
    pub fn last_error(&self) -> String {
        self.session().last_error.clone()
    }

    /// Programs the primary address of `addresses` into the device.
    ///
    /// Setting the address already held is a no-op. A set without a primary
    /// clears the held address locally; the driver has no "unset" request.
    ///
    /// The session lock is held across the device request, serializing it
    /// with [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the request; the held address
    /// is unchanged in that case.
    pub fn set_logical_addresses(&self, addresses: &LogicalAddresses) -> Result<()> {
        let mut session = self.session();
        let requested = addresses.primary();
        if session.logical_address == requested {
            return Ok(());
        }

        let Some(addr) = requested else {
            tracing::debug!("clearing logical address");
            session.logical_address = None;
            return Ok(());
        };

        if let Err(e) = self
            .transport
            .control(ControlRequest::SetLogicalAddress(addr))
        {
            tracing::error!("unable to set logical address {}: {}", addr, e);
            session.last_error = e.to_string();
            return Err(e);
        }

        tracing::debug!("logical address set to {}", addr);
        session.logical_address = Some(addr);
        Ok(())
    }

    /// Returns the held logical address as a set, empty if none is held.
    pub fn logical_addresses(&self) -> LogicalAddresses {
        self.session()
            .logical_address
            .map_or_else(LogicalAddresses::new, LogicalAddresses::single)
    }

    /// Encodes `command` and writes it to the device.
    ///
    /// Returns [`AdapterMessageState::SentAcked`] when the device accepted
    /// the whole frame and [`AdapterMessageState::Error`] otherwise. An
    /// oversized command is rejected before any I/O. Transmit failures are
    /// not told apart; the driver acknowledges by completing the write.
    pub fn write(&self, command: &Command, _hints: WriteHints) -> AdapterMessageState {
        let mut session = self.session();

        let frame = match RawFrame::encode(command) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("{}: {}", command, e);
                session.last_error = e.to_string();
                return AdapterMessageState::Error;
            }
        };

        tracing::trace!("writing frame: {}", hex::encode(frame.as_bytes()));
        let result = match self.transport.write(frame.as_bytes()) {
            Ok(written) if written == frame.len() => return AdapterMessageState::SentAcked,
            Ok(written) => Error::ShortWrite {
                written,
                expected: frame.len(),
            },
            Err(e) => e,
        };

        tracing::error!("sent command error ({}): {}", command, result);
        session.last_error = result.to_string();
        AdapterMessageState::Error
    }

    /// Reads the HDMI physical address from the device.
    ///
    /// Returns [`PhysicalAddress::INVALID`] if the request fails.
    pub fn physical_address(&self) -> PhysicalAddress {
        match self.transport.control(ControlRequest::GetPhysicalAddress) {
            Ok(info) => PhysicalAddress(info as u16),
            Err(e) => {
                tracing::error!("unable to read physical address: {}", e);
                self.record_error(&e);
                PhysicalAddress::INVALID
            }
        }
    }

    /// Firmware version of the adapter. The driver does not report one.
    #[must_use]
    pub const fn firmware_version(&self) -> u16 {
        0
    }

    /// Firmware build date as a Unix timestamp. Not reported by the driver.
    #[must_use]
    pub const fn firmware_build_date(&self) -> u32 {
        0
    }

    /// Vendor of the adapter. The driver has no vendor channel.
    #[must_use]
    pub const fn vendor_id(&self) -> VendorId {
        VendorId::UNKNOWN
    }

    /// Kind of adapter hardware.
    #[must_use]
    pub const fn adapter_type(&self) -> AdapterType {
        AdapterType::Sunxi
    }

    /// Name of the underlying device.
    pub fn port_name(&self) -> &str {
        self.transport.name()
    }

    /// Returns true if the adapter may act as a source on `addr`.
    #[must_use]
    pub fn supports_source_logical_address(&self, addr: LogicalAddress) -> bool {
        addr != LogicalAddress::Tv
    }

    /// Switches between controlled and autonomous mode.
    ///
    /// The sunxi controller has no autonomous mode, so this always succeeds.
    pub fn set_controlled_mode(&self, controlled: bool) -> Result<()> {
        tracing::debug!("controlled mode {} (no-op)", controlled);
        Ok(())
    }

    /// Returns the state of the dispatch thread.
    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatch_state.get()
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport + 'static> Drop for CecAdapter<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::event::command_channel;
    use crate::protocol::{EventType, InboundEvent};
    use crate::transport::mock::MockTransport;
    use crate::types::Opcode;

    const WAIT: Duration = Duration::from_secs(2);

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn collector() -> (Arc<impl CommandCallback>, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel();
        let callback = Arc::new(move |cmd: Command| {
            let _ = tx.send(cmd);
        });
        (callback, rx)
    }

    fn adapter(
        transport: MockTransport,
        callback: &Arc<impl CommandCallback + 'static>,
    ) -> CecAdapter<MockTransport> {
        init_tracing();
        let config = AdapterConfig::new().read_timeout(Duration::from_millis(20));
        CecAdapter::with_config(transport, config, callback)
    }

    fn standby() -> Command {
        Command::new(
            LogicalAddress::RecordingDevice1,
            LogicalAddress::PlaybackDevice1,
            Some(Opcode::STANDBY),
        )
    }

    #[test]
    fn test_adapter_config_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.read_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_open_starts_device_and_thread() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        assert!(!adapter.is_open());

        adapter.open(WAIT, true).unwrap();
        assert!(adapter.is_open());
        assert_eq!(adapter.dispatch_state(), DispatchState::Running);
        assert_eq!(adapter.transport().requests(), vec![ControlRequest::StartDevice]);

        adapter.close();
        assert!(!adapter.is_open());
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);
        assert_eq!(
            adapter.transport().requests(),
            vec![ControlRequest::StartDevice, ControlRequest::StopDevice]
        );
    }

    #[test]
    fn test_open_without_listening() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();
        assert!(adapter.is_open());
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);
    }

    #[test]
    fn test_reopen_starts_listening() {
        let (callback, rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);

        adapter.open(WAIT, true).unwrap();
        assert_eq!(adapter.dispatch_state(), DispatchState::Running);
        // The device is started once, by the first open.
        assert_eq!(adapter.transport().requests(), vec![ControlRequest::StartDevice]);

        let frame = RawFrame::encode(&standby()).unwrap();
        adapter
            .transport()
            .push_event(&InboundEvent::from_frame(EventType::ReceiveSuccess, &frame));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), standby());

        // A further open keeps the running thread.
        adapter.open(WAIT, true).unwrap();
        assert_eq!(adapter.dispatch_state(), DispatchState::Running);

        adapter.close();
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);
    }

    #[test]
    fn test_open_failure() {
        let (callback, _rx) = collector();
        let transport = MockTransport::new();
        transport.fail_open();
        let adapter = adapter(transport, &callback);

        assert!(adapter.open(WAIT, true).is_err());
        assert!(!adapter.is_open());
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);
        assert!(adapter.transport().requests().is_empty());
        assert!(!adapter.last_error().is_empty());
    }

    #[test]
    fn test_start_failure_is_not_fatal() {
        let (callback, _rx) = collector();
        let transport = MockTransport::new();
        transport.fail_control(ControlRequest::StartDevice);
        let adapter = adapter(transport, &callback);

        adapter.open(WAIT, false).unwrap();
        assert!(adapter.is_open());
        assert!(adapter.last_error().contains("HDMICEC_IOC_STARTDEVICE"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.close();
        assert!(adapter.transport().requests().is_empty());

        adapter.open(WAIT, true).unwrap();
        adapter.close();
        adapter.close();
        assert_eq!(
            adapter.transport().requests(),
            vec![ControlRequest::StartDevice, ControlRequest::StopDevice]
        );
    }

    #[test]
    fn test_open_then_close_joins_thread() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, true).unwrap();
        adapter.close();

        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);
        // Only the session still references the transport.
        assert_eq!(Arc::strong_count(&adapter.transport), 1);
    }

    #[test]
    fn test_write_standby() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();

        let state = adapter.write(&standby(), WriteHints::default());
        assert_eq!(state, AdapterMessageState::SentAcked);
        assert_eq!(adapter.transport().writes(), vec![vec![0x14, 0x36]]);
    }

    #[test]
    fn test_write_poll() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();

        let poll = Command::poll(LogicalAddress::PlaybackDevice1, LogicalAddress::PlaybackDevice1);
        assert!(adapter.write(&poll, WriteHints::default()).is_success());
        assert_eq!(adapter.transport().writes(), vec![vec![0x44]]);
    }

    #[test]
    fn test_write_too_large_skips_transport() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();

        let command = standby().with_parameters(&[0; 16]);
        let state = adapter.write(&command, WriteHints::default());
        assert_eq!(state, AdapterMessageState::Error);
        assert!(adapter.transport().writes().is_empty());
        assert!(adapter.last_error().starts_with("data size too large"));
    }

    #[test]
    fn test_short_write_is_error() {
        let (callback, _rx) = collector();
        let transport = MockTransport::new();
        transport.short_write(1);
        let adapter = adapter(transport, &callback);
        adapter.open(WAIT, false).unwrap();

        let state = adapter.write(&standby(), WriteHints::default());
        assert_eq!(state, AdapterMessageState::Error);
        assert!(adapter.last_error().contains("wrote 1 of 2 bytes"));
    }

    #[test]
    fn test_write_when_closed_is_error() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        let state = adapter.write(&standby(), WriteHints::default());
        assert_eq!(state, AdapterMessageState::Error);
        assert_eq!(adapter.last_error(), "device not open");
    }

    #[test]
    fn test_set_logical_address_once() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        let addrs = LogicalAddresses::single(LogicalAddress::PlaybackDevice1);

        adapter.set_logical_addresses(&addrs).unwrap();
        adapter.set_logical_addresses(&addrs).unwrap();

        assert_eq!(
            adapter.transport().requests(),
            vec![ControlRequest::SetLogicalAddress(LogicalAddress::PlaybackDevice1)]
        );
        assert_eq!(adapter.logical_addresses(), addrs);
    }

    #[test]
    fn test_set_logical_address_failure_keeps_previous() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter
            .set_logical_addresses(&LogicalAddresses::single(LogicalAddress::Tuner1))
            .unwrap();

        adapter
            .transport()
            .fail_control(ControlRequest::SetLogicalAddress(LogicalAddress::Tv));
        let result =
            adapter.set_logical_addresses(&LogicalAddresses::single(LogicalAddress::AudioSystem));

        assert!(matches!(result, Err(Error::Control { .. })));
        assert_eq!(
            adapter.logical_addresses().primary(),
            Some(LogicalAddress::Tuner1)
        );
        assert!(adapter.last_error().contains("SETLOGICALADDRESS"));
    }

    #[test]
    fn test_logical_addresses_empty_until_set() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        assert!(adapter.logical_addresses().is_empty());

        adapter
            .set_logical_addresses(&LogicalAddresses::single(LogicalAddress::Tuner1))
            .unwrap();
        adapter
            .set_logical_addresses(&LogicalAddresses::new())
            .unwrap();
        assert!(adapter.logical_addresses().is_empty());
        assert_eq!(adapter.transport().requests().len(), 1);
    }

    #[test]
    fn test_physical_address() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new().with_physical_address(0x2100), &callback);
        adapter.open(WAIT, false).unwrap();
        assert_eq!(adapter.physical_address(), PhysicalAddress(0x2100));
    }

    #[test]
    fn test_physical_address_failure_is_invalid() {
        let (callback, _rx) = collector();
        let transport = MockTransport::new().with_physical_address(0x2100);
        transport.fail_control(ControlRequest::GetPhysicalAddress);
        let adapter = adapter(transport, &callback);

        assert_eq!(adapter.physical_address(), PhysicalAddress::INVALID);
    }

    #[test]
    fn test_fixed_capabilities() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        assert_eq!(adapter.firmware_version(), 0);
        assert_eq!(adapter.firmware_build_date(), 0);
        assert_eq!(adapter.vendor_id(), VendorId::UNKNOWN);
        assert_eq!(adapter.adapter_type(), AdapterType::Sunxi);
        assert_eq!(adapter.port_name(), "mock");
        assert!(adapter.set_controlled_mode(true).is_ok());
        assert!(!adapter.supports_source_logical_address(LogicalAddress::Tv));
        assert!(adapter.supports_source_logical_address(LogicalAddress::PlaybackDevice1));
    }

    #[test]
    fn test_received_commands_reach_callback() {
        let (callback, rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, true).unwrap();

        let frame = RawFrame::from_bytes(&[0x14, 0x04, 0xAA, 0xBB]).unwrap();
        adapter
            .transport()
            .push_event(&InboundEvent::from_frame(EventType::NoAck, &frame));
        adapter
            .transport()
            .push_event(&InboundEvent::from_frame(EventType::ReceiveSuccess, &frame));

        let cmd = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(cmd, frame.decode());
        assert_eq!(cmd.parameters, vec![0xAA, 0xBB]);
        assert!(rx.try_recv().is_err());

        adapter.close();
    }

    #[test]
    fn test_written_frame_decodes_to_original() {
        let (callback, _rx) = collector();
        let adapter = adapter(MockTransport::new(), &callback);
        adapter.open(WAIT, false).unwrap();

        let command = Command::new(
            LogicalAddress::PlaybackDevice1,
            LogicalAddress::Broadcast,
            Some(Opcode::REPORT_PHYSICAL_ADDRESS),
        )
        .with_parameters(&[0x10, 0x00, 0x04]);
        assert!(adapter.write(&command, WriteHints::default()).is_success());

        let written = adapter.transport().writes().remove(0);
        let event = InboundEvent::from_frame(
            EventType::ReceiveSuccess,
            &RawFrame::from_bytes(&written).unwrap(),
        );
        assert_eq!(event.command(), Some(command));
    }

    #[tokio::test]
    async fn test_channel_consumer() {
        let (sender, mut rx) = command_channel(8);
        let adapter = adapter(MockTransport::new(), &sender);
        adapter.open(WAIT, true).unwrap();

        let frame = RawFrame::encode(&standby()).unwrap();
        adapter
            .transport()
            .push_event(&InboundEvent::from_frame(EventType::ReceiveSuccess, &frame));

        let cmd = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(cmd, standby());

        drop(adapter);
        drop(sender);
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_close_with_full_channel_is_bounded() {
        let (sender, mut rx) = command_channel(1);
        let adapter = Arc::new(adapter(MockTransport::new(), &sender));
        adapter.open(WAIT, true).unwrap();

        let frame = RawFrame::encode(&standby()).unwrap();
        for _ in 0..3 {
            adapter
                .transport()
                .push_event(&InboundEvent::from_frame(EventType::ReceiveSuccess, &frame));
        }
        std::thread::sleep(Duration::from_millis(100));

        let (done_tx, done_rx) = mpsc::channel();
        let closer = Arc::clone(&adapter);
        std::thread::spawn(move || {
            closer.close();
            let _ = done_tx.send(());
        });
        assert!(
            done_rx.recv_timeout(WAIT).is_ok(),
            "close() blocked while the command queue was full"
        );
        assert_eq!(adapter.dispatch_state(), DispatchState::Stopped);

        // Only the first command fit in the queue.
        assert_eq!(rx.try_recv(), Some(standby()));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_drop_closes() {
        let (callback, _rx) = collector();
        let transport = Arc::new(MockTransport::new());
        {
            // Share the mock through an Arc-backed transport wrapper.
            let adapter = adapter_over(&transport, &callback);
            adapter.open(WAIT, true).unwrap();
        }
        assert!(!transport.is_open());
        assert_eq!(
            transport.requests(),
            vec![ControlRequest::StartDevice, ControlRequest::StopDevice]
        );
    }

    struct Shared(Arc<MockTransport>);

    impl Transport for Shared {
        fn open(&self, timeout: Duration) -> Result<()> {
            self.0.open(timeout)
        }
        fn close(&self) {
            self.0.close();
        }
        fn is_open(&self) -> bool {
            self.0.is_open()
        }
        fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            self.0.read(buf, timeout)
        }
        fn write(&self, data: &[u8]) -> Result<usize> {
            self.0.write(data)
        }
        fn control(&self, request: ControlRequest) -> Result<u32> {
            self.0.control(request)
        }
        fn name(&self) -> &str {
            self.0.name()
        }
    }

    fn adapter_over(
        transport: &Arc<MockTransport>,
        callback: &Arc<impl CommandCallback + 'static>,
    ) -> CecAdapter<Shared> {
        let config = AdapterConfig::new().read_timeout(Duration::from_millis(20));
        CecAdapter::with_config(Shared(Arc::clone(transport)), config, callback)
    }
}
