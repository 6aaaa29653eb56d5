//! RF Explorer serial frame encode/decode.
//!
//! Commands sent to the analyzer are `#`, a length byte counting the whole
//! command, and an ASCII body (`C0`, `r`, `C2-F:...`). Everything the
//! analyzer sends is terminated by CR/LF:
//!
//! - `#C2-F:...` analyzer configuration (comma-separated decimal fields)
//! - `#C2-M:...` model and firmware
//! - `#C3-...` signal generator configuration
//! - `$S<n><n bytes>` sweep with `n` steps
//! - `$s<n><16 * (n + 1) bytes>` large sweep
//!
//! Sweep bodies are binary: each byte is an amplitude in half-dB steps below
//! 0 dBm. They may contain CR/LF bytes, so sweeps are framed by their length
//! byte, never by the terminator.

use rfmon_core::error::{Error, Result};
use rfmon_core::range::FrequencyLimits;
use rfmon_core::sweep::SweepAxis;

/// Line terminator of every inbound frame.
pub const EOL: &[u8] = b"\r\n";

/// Main model code reported by RF Explorer signal generators.
pub const MODEL_SIGNAL_GENERATOR: u16 = 60;

/// Model code meaning "no module" in the expansion slot.
pub const MODEL_NONE: u16 = 255;

/// Text frames longer than this without a terminator are treated as noise.
pub const MAX_TEXT_FRAME: usize = 512;

/// Result of attempting to decode one frame from a byte buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// A complete frame was decoded.
    Frame {
        frame: Frame,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },

    /// The leading bytes are noise or a malformed frame and should be
    /// dropped.
    Skip(usize),

    /// The buffer does not yet contain a complete frame. More data is needed.
    Incomplete,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `#C2-F:` analyzer configuration.
    Config(AnalyzerConfig),
    /// `#C2-M:` model and firmware.
    Model(ModelInfo),
    /// Amplitudes of one sweep in dBm.
    Sweep(Vec<f32>),
    /// `#C3-` signal generator configuration. Only its presence matters.
    GeneratorConfig,
    /// A well-formed frame this driver has no use for.
    Other,
}

/// Analyzer configuration as reported in a `#C2-F:` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// First sweep frequency in kHz.
    pub start_khz: f64,
    /// Distance between sweep steps in Hz.
    pub step_hz: f64,
    /// Top of the display amplitude range in dBm.
    pub amp_top_dbm: i32,
    /// Bottom of the display amplitude range in dBm.
    pub amp_bottom_dbm: i32,
    /// Number of steps in each sweep.
    pub sweep_steps: u32,
    /// Whether the expansion module is the active one.
    pub expansion_active: bool,
    /// Current operating mode code.
    pub mode: u16,
    /// Lowest tunable frequency in kHz.
    pub min_freq_khz: f64,
    /// Highest tunable frequency in kHz.
    pub max_freq_khz: f64,
    /// Widest span in kHz.
    pub max_span_khz: f64,
    /// Resolution bandwidth in kHz, when the firmware reports it.
    pub rbw_khz: Option<f64>,
}

impl AnalyzerConfig {
    pub fn start_mhz(&self) -> f64 {
        self.start_khz / 1000.0
    }

    pub fn step_mhz(&self) -> f64 {
        self.step_hz / 1_000_000.0
    }

    /// Frequency of the last sweep step in MHz.
    pub fn stop_mhz(&self) -> f64 {
        self.axis().stop_mhz()
    }

    /// Axis that sweeps taken with this configuration use.
    pub fn axis(&self) -> SweepAxis {
        SweepAxis {
            start_mhz: self.start_mhz(),
            step_mhz: self.step_mhz(),
            steps: self.sweep_steps as usize,
        }
    }

    /// Tuning limits of the active module.
    pub fn limits(&self) -> Result<FrequencyLimits> {
        FrequencyLimits::new(
            self.min_freq_khz / 1000.0,
            self.max_freq_khz / 1000.0,
            self.max_span_khz / 1000.0,
        )
    }
}

/// Model information from a `#C2-M:` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub main_model: u16,
    pub expansion_model: u16,
    pub firmware: String,
}

impl ModelInfo {
    pub fn is_signal_generator(&self) -> bool {
        self.main_model == MODEL_SIGNAL_GENERATOR
    }

    pub fn has_expansion(&self) -> bool {
        self.expansion_model != MODEL_NONE
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Frame a command body as `#<len><body>`.
pub fn encode_command(body: &[u8]) -> Vec<u8> {
    let mut cmd = Vec::with_capacity(body.len() + 2);
    cmd.push(b'#');
    // Length counts the `#` and the length byte itself.
    cmd.push((body.len() + 2) as u8);
    cmd.extend_from_slice(body);
    cmd
}

/// Ask the analyzer to report its configuration and model.
pub fn request_config() -> Vec<u8> {
    encode_command(b"C0")
}

/// Reboot the analyzer.
pub fn reset() -> Vec<u8> {
    encode_command(b"r")
}

/// Retune the analyzer to sweep `start_mhz..=stop_mhz`, keeping the given
/// amplitude range.
///
/// Frequencies are sent in kHz as 7-digit fields and amplitudes as signed
/// 4-character fields, e.g. `C2-F:0863000,0870000,-010,-120`.
pub fn update_config(
    start_mhz: f64,
    stop_mhz: f64,
    amp_top_dbm: i32,
    amp_bottom_dbm: i32,
) -> Result<Vec<u8>> {
    let start_khz = mhz_to_khz(start_mhz)?;
    let stop_khz = mhz_to_khz(stop_mhz)?;
    if start_khz > stop_khz {
        return Err(Error::InvalidParameter(format!(
            "start {start_mhz} MHz above stop {stop_mhz} MHz"
        )));
    }
    for dbm in [amp_top_dbm, amp_bottom_dbm] {
        if !(-999..=9999).contains(&dbm) {
            return Err(Error::InvalidParameter(format!(
                "amplitude {dbm} dBm does not fit the command"
            )));
        }
    }
    let body = format!(
        "C2-F:{:07},{:07},{:04},{:04}",
        start_khz, stop_khz, amp_top_dbm, amp_bottom_dbm
    );
    Ok(encode_command(body.as_bytes()))
}

fn mhz_to_khz(mhz: f64) -> Result<u32> {
    let khz = (mhz * 1000.0).round();
    if !(0.0..=9_999_999.0).contains(&khz) {
        return Err(Error::InvalidParameter(format!(
            "frequency {mhz} MHz out of range"
        )));
    }
    Ok(khz as u32)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one frame from the front of `buf`.
///
/// Bytes that cannot start a frame are reported as [`DecodeResult::Skip`]
/// up to the next `#` or `$`, so a caller that drops skipped bytes always
/// resynchronizes on the next frame.
pub fn decode_frame(buf: &[u8]) -> DecodeResult {
    match buf.first() {
        None => DecodeResult::Incomplete,
        Some(b'$') => decode_binary(buf),
        Some(b'#') => decode_text(buf),
        Some(_) => {
            let next = buf[1..]
                .iter()
                .position(|&b| b == b'#' || b == b'$')
                .map_or(buf.len(), |p| p + 1);
            DecodeResult::Skip(next)
        }
    }
}

fn decode_binary(buf: &[u8]) -> DecodeResult {
    let Some(&kind) = buf.get(1) else {
        return DecodeResult::Incomplete;
    };
    let steps = match kind {
        b'S' | b's' => match buf.get(2) {
            Some(&n) if kind == b'S' => n as usize,
            Some(&n) => (n as usize + 1) * 16,
            None => return DecodeResult::Incomplete,
        },
        // Screen dumps and other binary frames are not used.
        _ => return decode_text(buf),
    };

    let end = 3 + steps;
    if buf.len() < end {
        return DecodeResult::Incomplete;
    }
    let amplitudes = buf[3..end].iter().map(|&b| -(b as f32) / 2.0).collect();
    let consumed = end + terminator_len(&buf[end..]);
    DecodeResult::Frame {
        frame: Frame::Sweep(amplitudes),
        consumed,
    }
}

/// Length of the CR/LF terminator at the start of `rest`, if it is there.
fn terminator_len(rest: &[u8]) -> usize {
    rest.iter()
        .zip(EOL)
        .take_while(|(a, b)| a == b)
        .count()
}

fn decode_text(buf: &[u8]) -> DecodeResult {
    let Some(eol) = buf.windows(EOL.len()).position(|w| w == EOL) else {
        if buf.len() > MAX_TEXT_FRAME {
            return DecodeResult::Skip(1);
        }
        return DecodeResult::Incomplete;
    };
    let consumed = eol + EOL.len();

    let Ok(line) = std::str::from_utf8(&buf[..eol]) else {
        return DecodeResult::Skip(consumed);
    };

    let frame = if let Some(fields) = line.strip_prefix("#C2-F:") {
        match parse_config(fields) {
            Ok(config) => Frame::Config(config),
            Err(_) => return DecodeResult::Skip(consumed),
        }
    } else if let Some(fields) = line.strip_prefix("#C2-M:") {
        match parse_model(fields) {
            Ok(model) => Frame::Model(model),
            Err(_) => return DecodeResult::Skip(consumed),
        }
    } else if line.starts_with("#C3-") {
        Frame::GeneratorConfig
    } else {
        Frame::Other
    };

    DecodeResult::Frame { frame, consumed }
}

/// Parse the comma-separated fields of a `#C2-F:` frame.
///
/// The first ten fields are required; the resolution bandwidth and anything
/// after it is optional and depends on the firmware version.
pub fn parse_config(fields: &str) -> Result<AnalyzerConfig> {
    let f: Vec<&str> = fields.split(',').map(str::trim).collect();
    if f.len() < 10 {
        return Err(Error::Protocol(format!(
            "configuration has {} fields, expected at least 10",
            f.len()
        )));
    }

    let config = AnalyzerConfig {
        start_khz: number(f[0], "start frequency")?,
        step_hz: number(f[1], "frequency step")?,
        amp_top_dbm: number(f[2], "amplitude top")?,
        amp_bottom_dbm: number(f[3], "amplitude bottom")?,
        sweep_steps: number(f[4], "sweep steps")?,
        expansion_active: f[5] == "1",
        mode: number(f[6], "mode")?,
        min_freq_khz: number(f[7], "minimum frequency")?,
        max_freq_khz: number(f[8], "maximum frequency")?,
        max_span_khz: number(f[9], "maximum span")?,
        rbw_khz: f.get(10).and_then(|s| s.parse().ok()),
    };
    // Reject configurations that cannot yield usable tuning limits.
    config.limits()?;
    Ok(config)
}

/// Parse the fields of a `#C2-M:` frame: main model, expansion model,
/// firmware version.
pub fn parse_model(fields: &str) -> Result<ModelInfo> {
    let f: Vec<&str> = fields.split(',').map(str::trim).collect();
    if f.len() < 3 {
        return Err(Error::Protocol(format!(
            "model has {} fields, expected 3",
            f.len()
        )));
    }
    Ok(ModelInfo {
        main_model: number(f[0], "main model")?,
        expansion_model: number(f[1], "expansion model")?,
        firmware: f[2].to_string(),
    })
}

fn number<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| Error::Protocol(format!("bad {what} field {field:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_LINE: &[u8] =
        b"#C2-F:0863000,0062500,-010,-120,0112,0,000,0240000,0960000,0100000,00110\r\n";

    fn sweep_frame(amplitudes: &[u8]) -> Vec<u8> {
        let mut frame = vec![b'$', b'S', amplitudes.len() as u8];
        frame.extend_from_slice(amplitudes);
        frame.extend_from_slice(EOL);
        frame
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    #[test]
    fn request_config_command() {
        assert_eq!(request_config(), b"#\x04C0");
    }

    #[test]
    fn reset_command() {
        assert_eq!(reset(), b"#\x03r");
    }

    #[test]
    fn update_config_command() {
        let cmd = update_config(863.0, 870.0, -10, -120).unwrap();
        assert_eq!(cmd.len(), 32);
        assert_eq!(&cmd[..2], b"#\x20");
        assert_eq!(&cmd[2..], b"C2-F:0863000,0870000,-010,-120");
    }

    #[test]
    fn update_config_rounds_to_khz() {
        let cmd = update_config(866.5 - 3.5, 866.5 + 3.5, 0, -100).unwrap();
        assert_eq!(&cmd[2..], b"C2-F:0863000,0870000,0000,-100");
    }

    #[test]
    fn update_config_rejects_inverted_window() {
        assert!(matches!(
            update_config(870.0, 863.0, -10, -120),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn update_config_rejects_negative_frequency() {
        assert!(update_config(-1.0, 10.0, -10, -120).is_err());
    }

    // -----------------------------------------------------------------------
    // Text frames
    // -----------------------------------------------------------------------

    #[test]
    fn decode_config_frame() {
        let DecodeResult::Frame { frame, consumed } = decode_frame(CONFIG_LINE) else {
            panic!("expected a frame");
        };
        assert_eq!(consumed, CONFIG_LINE.len());
        let Frame::Config(config) = frame else {
            panic!("expected a configuration");
        };
        assert_eq!(config.start_mhz(), 863.0);
        assert_eq!(config.step_mhz(), 0.0625);
        assert_eq!(config.amp_top_dbm, -10);
        assert_eq!(config.amp_bottom_dbm, -120);
        assert_eq!(config.sweep_steps, 112);
        assert!(!config.expansion_active);
        assert_eq!(config.rbw_khz, Some(110.0));
        assert!((config.stop_mhz() - 869.9375).abs() < 1e-9);

        let limits = config.limits().unwrap();
        assert_eq!(limits.min_freq_mhz, 240.0);
        assert_eq!(limits.max_freq_mhz, 960.0);
        assert_eq!(limits.max_span_mhz, 100.0);
    }

    #[test]
    fn decode_config_without_rbw() {
        let line = b"#C2-F:0863000,0062500,-010,-120,0112,0,000,0240000,0960000,0100000\r\n";
        let DecodeResult::Frame {
            frame: Frame::Config(config),
            ..
        } = decode_frame(line)
        else {
            panic!("expected a configuration");
        };
        assert_eq!(config.rbw_khz, None);
    }

    #[test]
    fn malformed_config_is_skipped() {
        let line = b"#C2-F:0863000,abc\r\n";
        assert_eq!(decode_frame(line), DecodeResult::Skip(line.len()));
    }

    #[test]
    fn config_with_inverted_limits_is_skipped() {
        let line = b"#C2-F:0863000,0062500,-010,-120,0112,0,000,0960000,0240000,0100000\r\n";
        assert_eq!(decode_frame(line), DecodeResult::Skip(line.len()));
    }

    #[test]
    fn decode_model_frame() {
        let line = b"#C2-M:003,255,01.12B\r\n";
        let DecodeResult::Frame {
            frame: Frame::Model(model),
            consumed,
        } = decode_frame(line)
        else {
            panic!("expected a model");
        };
        assert_eq!(consumed, line.len());
        assert_eq!(model.main_model, 3);
        assert!(!model.has_expansion());
        assert_eq!(model.firmware, "01.12B");
        assert!(!model.is_signal_generator());
    }

    #[test]
    fn signal_generator_model() {
        let model = parse_model("060,255,01.15").unwrap();
        assert!(model.is_signal_generator());
    }

    #[test]
    fn generator_config_frame() {
        let line = b"#C3-G:0500000,0001000,0100,0,0,0\r\n";
        assert!(matches!(
            decode_frame(line),
            DecodeResult::Frame {
                frame: Frame::GeneratorConfig,
                ..
            }
        ));
    }

    #[test]
    fn unknown_text_frame_is_other() {
        let line = b"#K1\r\n";
        assert_eq!(
            decode_frame(line),
            DecodeResult::Frame {
                frame: Frame::Other,
                consumed: line.len()
            }
        );
    }

    #[test]
    fn text_frame_without_terminator_is_incomplete() {
        assert_eq!(decode_frame(b"#C2-M:003,2"), DecodeResult::Incomplete);
    }

    #[test]
    fn runaway_text_frame_is_dropped() {
        let mut buf = vec![b'#'];
        buf.extend(std::iter::repeat(b'x').take(MAX_TEXT_FRAME + 1));
        assert_eq!(decode_frame(&buf), DecodeResult::Skip(1));
    }

    // -----------------------------------------------------------------------
    // Sweep frames
    // -----------------------------------------------------------------------

    #[test]
    fn decode_sweep_frame() {
        let frame = sweep_frame(&[0, 84, 240]);
        assert_eq!(
            decode_frame(&frame),
            DecodeResult::Frame {
                frame: Frame::Sweep(vec![0.0, -42.0, -120.0]),
                consumed: frame.len()
            }
        );
    }

    #[test]
    fn sweep_body_may_contain_terminator_bytes() {
        let frame = sweep_frame(&[b'\r', b'\n', 100]);
        assert_eq!(
            decode_frame(&frame),
            DecodeResult::Frame {
                frame: Frame::Sweep(vec![-6.5, -5.0, -50.0]),
                consumed: frame.len()
            }
        );
    }

    #[test]
    fn partial_sweep_is_incomplete() {
        let frame = sweep_frame(&[10, 20, 30, 40]);
        assert_eq!(decode_frame(&frame[..5]), DecodeResult::Incomplete);
        assert_eq!(decode_frame(b"$"), DecodeResult::Incomplete);
        assert_eq!(decode_frame(b"$S"), DecodeResult::Incomplete);
    }

    #[test]
    fn sweep_without_terminator_yet() {
        let frame = sweep_frame(&[10, 20]);
        let body = &frame[..frame.len() - 2];
        assert_eq!(
            decode_frame(body),
            DecodeResult::Frame {
                frame: Frame::Sweep(vec![-5.0, -10.0]),
                consumed: body.len()
            }
        );
    }

    #[test]
    fn decode_large_sweep_frame() {
        let mut frame = vec![b'$', b's', 1];
        frame.extend(std::iter::repeat(60).take(32));
        frame.extend_from_slice(EOL);
        let DecodeResult::Frame {
            frame: Frame::Sweep(amplitudes),
            consumed,
        } = decode_frame(&frame)
        else {
            panic!("expected a sweep");
        };
        assert_eq!(consumed, frame.len());
        assert_eq!(amplitudes.len(), 32);
        assert!(amplitudes.iter().all(|&a| a == -30.0));
    }

    // -----------------------------------------------------------------------
    // Resynchronization
    // -----------------------------------------------------------------------

    #[test]
    fn noise_skipped_up_to_next_frame() {
        assert_eq!(decode_frame(b"xyz#C2-M"), DecodeResult::Skip(3));
        assert_eq!(decode_frame(b"\r\n$S"), DecodeResult::Skip(2));
        assert_eq!(decode_frame(b"noise"), DecodeResult::Skip(5));
    }

    #[test]
    fn frames_back_to_back() {
        let mut buf = CONFIG_LINE.to_vec();
        buf.extend(sweep_frame(&[20, 40]));

        let DecodeResult::Frame { consumed, .. } = decode_frame(&buf) else {
            panic!("expected the configuration");
        };
        assert_eq!(
            decode_frame(&buf[consumed..]),
            DecodeResult::Frame {
                frame: Frame::Sweep(vec![-10.0, -20.0]),
                consumed: buf.len() - consumed
            }
        );
    }
}
