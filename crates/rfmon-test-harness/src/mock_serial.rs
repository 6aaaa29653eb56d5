//! Mock transport for deterministic testing of instrument drivers.
//!
//! Instruments talk in two ways: replies to commands the host sends
//! (configuration requests), and a continuous unsolicited stream (sweeps,
//! power readings). [`MockTransport`] covers both. Command replies are
//! pre-loaded with [`expect`](MockTransport::expect); the unsolicited
//! stream is fed with [`push_incoming`](MockTransport::push_incoming).
//!
//! # Example
//!
//! ```
//! use rfmon_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the driver requests the configuration, answer with a model frame.
//! mock.expect(b"#\x04C0", b"#C2-M:003,255,01.12\r\n");
//! // The power meter streams readings on its own.
//! mock.push_incoming(b"$ -42.3 dBm$\r\n");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use rfmon_core::error::{Error, Result};
use rfmon_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing drivers without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its response
/// is queued for reading. Every `receive()` call returns at most one queued
/// chunk, so a test controls exactly how much arrives per driver poll.
/// When nothing is queued `receive()` fails with [`Error::Timeout`], like a
/// real port with no pending bytes.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// Chunks waiting to be read, in arrival order. An empty chunk marks a
    /// quiet period.
    incoming: VecDeque<Vec<u8>>,
    /// Error returned by the next `receive()` once `incoming` is empty.
    pending_error: Option<Error>,
    /// Once `incoming` is empty, reads complete with zero bytes.
    at_eof: bool,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            incoming: VecDeque::new(),
            pending_error: None,
            at_eof: false,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, `response` is
    /// queued behind any incoming data already waiting. An empty response
    /// queues nothing.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue unsolicited bytes, returned by a single future `receive()`.
    /// Empty data is ignored.
    pub fn push_incoming(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.incoming.push_back(data.to_vec());
        }
    }

    /// Queue a quiet period: the `receive()` that reaches it fails with
    /// [`Error::Timeout`] even though more data is queued behind it.
    pub fn push_idle(&mut self) {
        self.incoming.push_back(Vec::new());
    }

    /// Fail the first `receive()` that finds no queued data with `error`.
    pub fn fail_next_receive(&mut self, error: Error) {
        self.pending_error = Some(error);
    }

    /// End the stream once the queued data has been read: every later
    /// `receive()` returns `Ok(0)`, the way a read on an unplugged port
    /// does.
    pub fn end_of_stream(&mut self) {
        self.at_eof = true;
    }

    /// All data sent through this transport, one element per `send()`.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of queued chunks and quiet periods not yet read.
    pub fn pending_incoming(&self) -> usize {
        self.incoming.len()
    }

    /// Set the connected state of the mock transport.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        let Some(expectation) = self.expectations.pop_front() else {
            return Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            )));
        }
        if !expectation.response.is_empty() {
            self.incoming.push_back(expectation.response);
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let Some(mut chunk) = self.incoming.pop_front() else {
            return match self.pending_error.take() {
                Some(e) => Err(e),
                None if self.at_eof => Ok(0),
                None => Err(Error::Timeout),
            };
        };
        if chunk.is_empty() {
            return Err(Error::Timeout);
        }
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            // Whatever did not fit stays at the front for the next read.
            self.incoming.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.incoming.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_queues_expected_response() {
        let mut mock = MockTransport::new();
        mock.expect(b"#\x04C0", b"#C2-M:003,255,01.12\r\n");

        mock.send(b"#\x04C0").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"#C2-M:003,255,01.12\r\n");
    }

    #[tokio::test]
    async fn incoming_chunks_arrive_one_per_receive() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"$ -42.3$");
        mock.push_incoming(b"\r\n");

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"$ -42.3$");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"\r\n");
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn response_queues_behind_incoming() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"first");
        mock.expect(b"cmd", b"second");
        mock.send(b"cmd").await.unwrap();

        let mut buf = [0u8; 16];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"first");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"second");
    }

    #[tokio::test]
    async fn partial_receive_keeps_remainder() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut buf = [0u8; 2];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB]);
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], &[0xCC, 0xDD]);
        assert_eq!(mock.pending_incoming(), 0);
    }

    #[tokio::test]
    async fn idle_marker_times_out_once() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"head");
        mock.push_idle();
        mock.push_incoming(b"tail");

        let mut buf = [0u8; 8];
        assert!(mock.receive(&mut buf, Duration::ZERO).await.is_ok());
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::Timeout)
        ));
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"tail");
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let result = mock.send(&[0x99]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(&[0x01]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn injected_receive_error() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"ok");
        mock.fail_next_receive(Error::ConnectionLost);

        let mut buf = [0u8; 8];
        assert!(mock.receive(&mut buf, Duration::ZERO).await.is_ok());
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::ConnectionLost)
        ));
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn end_of_stream_reads_zero_bytes() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"last");
        mock.end_of_stream();

        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"last");
        assert_eq!(mock.receive(&mut buf, Duration::ZERO).await.unwrap(), 0);
        assert_eq!(mock.receive(&mut buf, Duration::ZERO).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn close_disconnects() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"data");
        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        assert!(matches!(mock.send(&[0x01]).await, Err(Error::NotConnected)));
        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn remaining_expectations_counts_down() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[]);
        mock.expect(&[0x02], &[]);
        assert_eq!(mock.remaining_expectations(), 2);

        mock.send(&[0x01]).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 1);
        assert_eq!(mock.pending_incoming(), 0);
    }
}
