//! Mock serial transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command rendering, stream
//! framing, and reply correlation without a board on the other end.
//!
//! The board's output is modelled as one inbound byte stream. A matched
//! request appends its response to that stream, and [`MockHandle::push`]
//! appends unsolicited bytes (mid-run data replies, pulse-count reports).
//! `receive()` hands the stream out in chunks of at most
//! [`set_chunk_size`](MockTransport::set_chunk_size) bytes so that frame
//! reassembly across partial reads is exercised.
//!
//! # Example
//!
//! ```
//! use pthat_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends this command, the board replies with these frames.
//! mock.expect(b"I00FW*", b"RI00FW**PTHAT 5.3*CI00FW*");
//! mock.set_chunk_size(3);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pthat_core::error::{Error, Result};
use pthat_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes the board sends back once the request arrives.
    response: Vec<u8>,
}

#[derive(Debug)]
struct State {
    expectations: VecDeque<Expectation>,
    /// Bytes the board has "sent" that have not been received yet.
    inbound: VecDeque<u8>,
    /// Maximum bytes returned by a single `receive()`.
    chunk_size: Option<usize>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation, and the
/// corresponding response becomes readable.
///
/// If the data does not match, or the queue is exhausted, `send()` returns
/// [`Error::Protocol`]. `receive()` returns [`Error::Timeout`] when nothing
/// is waiting.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

/// A clone-able handle onto a [`MockTransport`] that has been moved into a
/// controller, used to push unsolicited data and inspect what was sent.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(State {
                expectations: VecDeque::new(),
                inbound: VecDeque::new(),
                chunk_size: None,
                connected: true,
                sent_log: Vec::new(),
            })),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, `response` is
    /// appended to the inbound stream. An empty response models a command
    /// the board does not answer.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        lock(&self.state).expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Limit every `receive()` to at most `n` bytes (minimum 1).
    pub fn set_chunk_size(&mut self, n: usize) {
        lock(&self.state).chunk_size = Some(n.max(1));
    }

    /// Return a handle that stays usable after the transport is boxed.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Return a copy of all data sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.handle().sent_data()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.handle().remaining_expectations()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        lock(&self.state).connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Append bytes to the inbound stream as if the board sent them unprompted.
    pub fn push(&self, data: &[u8]) {
        lock(&self.state).inbound.extend(data.iter().copied());
    }

    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent_log.clone()
    }

    /// All sent data decoded as text, one entry per `send()` call.
    pub fn sent_text(&self) -> Vec<String> {
        lock(&self.state)
            .sent_log
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    pub fn remaining_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    /// Bytes still waiting to be received.
    pub fn pending_inbound(&self) -> usize {
        lock(&self.state).inbound.len()
    }

    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    // A panic while holding the lock only happens inside a failing test.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(Error::NotConnected);
        }

        // Record what was sent.
        state.sent_log.push(data.to_vec());

        // Match against the next expectation.
        if let Some(expectation) = state.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            state.inbound.extend(expectation.response);
            Ok(())
        } else {
            Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(Error::NotConnected);
        }

        if state.inbound.is_empty() {
            return Err(Error::Timeout);
        }

        let limit = state.chunk_size.unwrap_or(usize::MAX);
        let n = state.inbound.len().min(buf.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.connected = false;
        state.inbound.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}
