//! RF Explorer analyzer driver.
//!
//! [`RfExplorer`] is created by [`RfExplorerBuilder`](crate::RfExplorerBuilder),
//! which performs the configuration handshake. Once built, the driver holds
//! the current analyzer configuration and the newest decoded sweep.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use rfmon_core::error::{Error, Result};
use rfmon_core::range::FrequencyLimits;
use rfmon_core::source::{Analyzer, SweepSource};
use rfmon_core::sweep::{Sweep, SweepAxis};

use crate::io::FrameReader;
use crate::protocol::{self, AnalyzerConfig, Frame, ModelInfo};

/// Longest single wait while a handshake is pending.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// Connected RF Explorer spectrum analyzer.
pub struct RfExplorer {
    reader: FrameReader,
    model: ModelInfo,
    config: AnalyzerConfig,
    limits: FrequencyLimits,
    config_updates: u64,
    latest: Option<Sweep>,
    sweep_count: u64,
    response_timeout: Duration,
}

/// Reboot the analyzer and wait for it to come back.
pub(crate) async fn reset(reader: &mut FrameReader, settle: Duration) -> Result<()> {
    tracing::info!("resetting analyzer");
    reader.send(&protocol::reset()).await?;
    tokio::time::sleep(settle).await;
    // Boot banner and whatever was in flight before the reset.
    reader.discard_pending().await
}

impl RfExplorer {
    /// Request the configuration and wait for the model and configuration
    /// frames.
    ///
    /// Fails with [`Error::Unsupported`] if the device turns out to be a
    /// signal generator, and with [`Error::Timeout`] if the device does not
    /// answer within `response_timeout`.
    pub(crate) async fn connect(
        mut reader: FrameReader,
        response_timeout: Duration,
    ) -> Result<Self> {
        reader.send(&protocol::request_config()).await?;

        let deadline = Instant::now() + response_timeout;
        let mut model: Option<ModelInfo> = None;
        let mut config: Option<AnalyzerConfig> = None;

        loop {
            while let Some(frame) = reader.next_frame() {
                match frame {
                    Frame::Model(m) => model = Some(m),
                    Frame::Config(c) => config = Some(c),
                    other => tracing::trace!(frame = ?other, "ignored during handshake"),
                }
            }

            match (&model, &config) {
                (Some(m), _) if m.is_signal_generator() => {
                    tracing::error!(firmware = %m.firmware, "device is a signal generator");
                    reader.close().await?;
                    return Err(Error::Unsupported(
                        "device is a signal generator, connect a spectrum analyzer".into(),
                    ));
                }
                (Some(_), Some(_)) => break,
                _ => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::error!(
                    model_received = model.is_some(),
                    config_received = config.is_some(),
                    "analyzer did not report its configuration"
                );
                return Err(Error::Timeout);
            }
            reader.fill(remaining.min(POLL_SLICE)).await?;
        }

        let (Some(model), Some(config)) = (model, config) else {
            return Err(Error::Protocol("handshake ended without configuration".into()));
        };
        let limits = config.limits()?;

        tracing::info!(
            model = model.main_model,
            expansion = model.expansion_model,
            firmware = %model.firmware,
            min_freq_mhz = limits.min_freq_mhz,
            max_freq_mhz = limits.max_freq_mhz,
            max_span_mhz = limits.max_span_mhz,
            "analyzer connected"
        );

        Ok(RfExplorer {
            reader,
            model,
            config,
            limits,
            config_updates: 0,
            latest: None,
            sweep_count: 0,
            response_timeout,
        })
    }

    /// Model and firmware reported by the device.
    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    /// The current analyzer configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn apply(&mut self, frame: Frame) {
        match frame {
            Frame::Sweep(amplitudes) => {
                if amplitudes.len() != self.config.sweep_steps as usize {
                    tracing::trace!(
                        steps = amplitudes.len(),
                        configured = self.config.sweep_steps,
                        "sweep length differs from configuration"
                    );
                }
                self.latest = Some(Sweep::new(self.config.axis(), amplitudes));
                self.sweep_count += 1;
            }
            Frame::Config(config) => {
                match config.limits() {
                    Ok(limits) => self.limits = limits,
                    Err(e) => tracing::warn!(error = %e, "keeping previous limits"),
                }
                tracing::debug!(
                    start_mhz = config.start_mhz(),
                    stop_mhz = config.stop_mhz(),
                    steps = config.sweep_steps,
                    "configuration updated"
                );
                if config.axis() != self.config.axis() {
                    // The newest sweep belongs to the old window.
                    self.latest = None;
                }
                self.config = config;
                self.config_updates += 1;
            }
            Frame::Model(model) => self.model = model,
            other @ (Frame::GeneratorConfig | Frame::Other) => {
                tracing::trace!(frame = ?other, "ignoring frame");
            }
        }
    }

    fn decode_pending(&mut self) {
        while let Some(frame) = self.reader.next_frame() {
            self.apply(frame);
        }
    }

    /// Adopt a window locally when the device did not echo its new
    /// configuration.
    fn assume_window(&mut self, start_mhz: f64, stop_mhz: f64) {
        let steps = self.config.sweep_steps.max(2);
        self.config.start_khz = start_mhz * 1000.0;
        self.config.step_hz = (stop_mhz - start_mhz) * 1_000_000.0 / f64::from(steps - 1);
        self.latest = None;
    }
}

#[async_trait]
impl SweepSource for RfExplorer {
    async fn process_received(&mut self) -> Result<()> {
        // Frames read before a failure are still decoded.
        let drained = self.reader.drain().await;
        self.decode_pending();
        drained
    }

    fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    fn latest_sweep(&self) -> Option<&Sweep> {
        self.latest.as_ref()
    }

    fn axis(&self) -> Option<SweepAxis> {
        Some(self.config.axis())
    }

    async fn close(&mut self) -> Result<()> {
        tracing::debug!(sweeps = self.sweep_count, "closing analyzer");
        self.reader.close().await
    }
}

#[async_trait]
impl Analyzer for RfExplorer {
    fn limits(&self) -> FrequencyLimits {
        self.limits
    }

    /// Send the new window and wait for the analyzer to confirm it with a
    /// fresh configuration frame. Sweeps that arrive meanwhile are kept.
    async fn update_range(&mut self, start_mhz: f64, stop_mhz: f64) -> Result<()> {
        let cmd = protocol::update_config(
            start_mhz,
            stop_mhz,
            self.config.amp_top_dbm,
            self.config.amp_bottom_dbm,
        )?;
        self.reader.send(&cmd).await?;

        let seen = self.config_updates;
        let deadline = Instant::now() + self.response_timeout;
        loop {
            self.decode_pending();
            if self.config_updates > seen {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.reader.fill(remaining.min(POLL_SLICE)).await?;
        }

        tracing::warn!(
            start_mhz,
            stop_mhz,
            "analyzer did not confirm the new range, assuming it was applied"
        );
        self.assume_window(start_mhz, stop_mhz);
        Ok(())
    }
}
