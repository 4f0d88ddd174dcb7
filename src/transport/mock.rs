//! Scripted in-memory transport for tests.

use std::mem::discriminant;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::{ControlRequest, InboundEvent};
use crate::transport::Transport;

pub(crate) struct MockTransport {
    open: AtomicBool,
    fail_open: AtomicBool,
    records_tx: Mutex<mpsc::Sender<Vec<u8>>>,
    records_rx: Mutex<mpsc::Receiver<Vec<u8>>>,
    read_errors: AtomicUsize,
    writes: Mutex<Vec<Vec<u8>>>,
    write_len: Mutex<Option<usize>>,
    requests: Mutex<Vec<ControlRequest>>,
    failing: Mutex<Vec<ControlRequest>>,
    physical_address: u32,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            open: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            records_tx: Mutex::new(tx),
            records_rx: Mutex::new(rx),
            read_errors: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
            write_len: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            physical_address: 0x1000,
        }
    }

    pub(crate) fn with_physical_address(mut self, address: u32) -> Self {
        self.physical_address = address;
        self
    }

    pub(crate) fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    /// Makes every request of the same kind as `request` fail.
    pub(crate) fn fail_control(&self, request: ControlRequest) {
        self.failing.lock().unwrap().push(request);
    }

    /// Overrides the byte count reported by `write`.
    pub(crate) fn short_write(&self, len: usize) {
        *self.write_len.lock().unwrap() = Some(len);
    }

    /// Makes the next `count` reads fail.
    pub(crate) fn fail_reads(&self, count: usize) {
        self.read_errors.store(count, Ordering::SeqCst);
    }

    pub(crate) fn push_event(&self, event: &InboundEvent) {
        self.push_record(event.to_record().to_vec());
    }

    pub(crate) fn push_record(&self, record: Vec<u8>) {
        self.records_tx.lock().unwrap().send(record).unwrap();
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> Vec<ControlRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn open(&self, _timeout: Duration) -> Result<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            )));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self
            .read_errors
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Io(std::io::Error::other("injected read error")));
        }
        let rx = self.records_rx.lock().unwrap();
        match rx.recv_timeout(timeout) {
            Ok(record) => {
                let n = record.len().min(buf.len());
                buf[..n].copy_from_slice(&record[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(self.write_len.lock().unwrap().unwrap_or(data.len()))
    }

    fn control(&self, request: ControlRequest) -> Result<u32> {
        self.requests.lock().unwrap().push(request);
        let fails = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|f| discriminant(f) == discriminant(&request));
        if fails {
            return Err(Error::Control { request, status: -1 });
        }
        Ok(if request.has_output() {
            self.physical_address
        } else {
            0
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
