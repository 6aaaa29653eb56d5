//! PM8000 power meter driver.
//!
//! Readings stream in continuously once the port is open. Each complete
//! line that parses as a reading becomes a one-step [`Sweep`] at the
//! meter's calibration frequency.

use std::time::Duration;

use async_trait::async_trait;

use rfmon_core::error::{Error, Result};
use rfmon_core::source::SweepSource;
use rfmon_core::sweep::{Sweep, SweepAxis};
use rfmon_core::transport::Transport;

use crate::protocol;

const READ_CHUNK: usize = 256;

/// Upper bound on reads per drain.
const MAX_DRAIN_READS: usize = 16;

/// A partial line longer than this is noise and gets dropped.
const MAX_LINE: usize = 256;

/// Connected PM8000 power meter.
pub struct PowerMeter {
    transport: Box<dyn Transport>,
    line: Vec<u8>,
    frequency_mhz: f64,
    latest: Option<Sweep>,
    reading_count: u64,
}

impl PowerMeter {
    pub(crate) fn new(transport: Box<dyn Transport>, frequency_mhz: f64) -> Self {
        PowerMeter {
            transport,
            line: Vec::new(),
            frequency_mhz,
            latest: None,
            reading_count: 0,
        }
    }

    /// Frequency readings are reported at, in MHz.
    pub fn frequency_mhz(&self) -> f64 {
        self.frequency_mhz
    }

    /// Select the measurement frequency and attenuator offset.
    pub async fn calibrate(&mut self, frequency_mhz: f64, offset_db: f64) -> Result<()> {
        let cmd = protocol::calibration_command(frequency_mhz, offset_db)?;
        tracing::info!(frequency_mhz, offset_db, "sending calibration");
        self.transport.send(&cmd).await?;
        self.frequency_mhz = frequency_mhz;
        Ok(())
    }

    /// Split off every complete line in the buffer and record the readings.
    fn consume_lines(&mut self) {
        while let Some(newline) = self.line.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.line.drain(..=newline).collect();
            let text = match std::str::from_utf8(&raw[..newline]) {
                Ok(text) => text.trim_end_matches('\r'),
                Err(_) => {
                    tracing::trace!(bytes = raw.len(), "dropping non-text line");
                    continue;
                }
            };
            match protocol::parse_line(text) {
                Some(dbm) => {
                    self.latest = Some(Sweep::single(self.frequency_mhz, dbm));
                    self.reading_count += 1;
                }
                None => tracing::trace!(line = text, "dropping malformed line"),
            }
        }

        if self.line.len() > MAX_LINE {
            tracing::debug!(bytes = self.line.len(), "dropping unterminated line");
            self.line.clear();
        }
    }
}

#[async_trait]
impl SweepSource for PowerMeter {
    async fn process_received(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut ended = false;
        for _ in 0..MAX_DRAIN_READS {
            match self.transport.receive(&mut chunk, Duration::ZERO).await {
                Ok(0) => {
                    ended = true;
                    break;
                }
                Ok(n) => self.line.extend_from_slice(&chunk[..n]),
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        self.consume_lines();

        if ended {
            tracing::error!(readings = self.reading_count, "power meter stream ended");
            return Err(Error::ConnectionLost);
        }
        Ok(())
    }

    fn sweep_count(&self) -> u64 {
        self.reading_count
    }

    fn latest_sweep(&self) -> Option<&Sweep> {
        self.latest.as_ref()
    }

    fn axis(&self) -> Option<SweepAxis> {
        Some(SweepAxis::single(self.frequency_mhz))
    }

    async fn close(&mut self) -> Result<()> {
        tracing::debug!(readings = self.reading_count, "closing power meter");
        self.line.clear();
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfmon_test_harness::MockTransport;

    fn meter(mock: MockTransport) -> PowerMeter {
        PowerMeter::new(Box::new(mock), 868.0)
    }

    #[tokio::test]
    async fn reading_becomes_single_step_sweep() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"$ -42.3 dBm$\r\n");
        let mut pm = meter(mock);

        pm.process_received().await.unwrap();

        assert_eq!(pm.sweep_count(), 1);
        let sweep = pm.latest_sweep().unwrap();
        assert_eq!(sweep.total_steps(), 1);
        assert_eq!(sweep.amplitude_dbm(0), Some(-42.3));
        assert_eq!(sweep.frequency_mhz(0), 868.0);
    }

    #[tokio::test]
    async fn no_data_returns_immediately() {
        let mut pm = meter(MockTransport::new());
        pm.process_received().await.unwrap();
        assert_eq!(pm.sweep_count(), 0);
        assert!(pm.latest_sweep().is_none());
    }

    #[tokio::test]
    async fn garbage_lines_are_dropped() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"garbage\r\n$ -10.0 dBm$\r\n$ oops\r\n");
        let mut pm = meter(mock);

        pm.process_received().await.unwrap();

        assert_eq!(pm.sweep_count(), 1);
        assert_eq!(pm.latest_sweep().unwrap().amplitude_dbm(0), Some(-10.0));
    }

    #[tokio::test]
    async fn partial_line_waits_for_rest() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"$ -5");
        mock.push_idle();
        mock.push_incoming(b"1.5 dBm$\r\n");
        let mut pm = meter(mock);

        pm.process_received().await.unwrap();
        assert_eq!(pm.sweep_count(), 0);

        pm.process_received().await.unwrap();
        assert_eq!(pm.sweep_count(), 1);
        assert_eq!(pm.latest_sweep().unwrap().amplitude_dbm(0), Some(-51.5));
    }

    #[tokio::test]
    async fn several_readings_keep_newest() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"$ -1.0$\r\n$ -2.0$\r\n");
        mock.push_incoming(b"$ -3.0$\r\n");
        let mut pm = meter(mock);

        pm.process_received().await.unwrap();

        assert_eq!(pm.sweep_count(), 3);
        assert_eq!(pm.latest_sweep().unwrap().amplitude_dbm(0), Some(-3.0));
    }

    #[tokio::test]
    async fn runaway_line_is_discarded() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[b'x'; MAX_LINE + 1]);
        mock.push_idle();
        mock.push_incoming(b"$ -20.0$\n");
        let mut pm = meter(mock);

        pm.process_received().await.unwrap();
        assert!(pm.line.is_empty());

        pm.process_received().await.unwrap();
        assert_eq!(pm.sweep_count(), 1);
    }

    #[tokio::test]
    async fn calibrate_sends_command_and_moves_axis() {
        let mut mock = MockTransport::new();
        mock.expect(b"$0433-03.0#", b"");
        let mut pm = meter(mock);

        pm.calibrate(433.0, -3.0).await.unwrap();

        assert_eq!(pm.frequency_mhz(), 433.0);
        assert_eq!(pm.axis(), Some(SweepAxis::single(433.0)));
    }

    #[tokio::test]
    async fn invalid_calibration_sends_nothing() {
        let mut pm = meter(MockTransport::new());
        let result = pm.calibrate(866.0, 250.0).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert_eq!(pm.frequency_mhz(), 868.0);
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let mut mock = MockTransport::new();
        mock.fail_next_receive(Error::ConnectionLost);
        let mut pm = meter(mock);

        assert!(matches!(
            pm.process_received().await,
            Err(Error::ConnectionLost)
        ));
    }

    #[tokio::test]
    async fn unplugged_meter_ends_stream() {
        let mut mock = MockTransport::new();
        mock.push_incoming(b"$ -12.0$\r\n");
        mock.end_of_stream();
        let mut pm = meter(mock);

        assert!(matches!(
            pm.process_received().await,
            Err(Error::ConnectionLost)
        ));
        assert_eq!(pm.sweep_count(), 1);
        assert!(matches!(
            pm.process_received().await,
            Err(Error::ConnectionLost)
        ));
    }

    #[tokio::test]
    async fn close_disconnects() {
        let mut pm = meter(MockTransport::new());
        pm.close().await.unwrap();
        assert!(matches!(
            pm.process_received().await,
            Err(Error::NotConnected)
        ));
    }
}
