//! PM8000 line format.
//!
//! The meter prints one ASCII line per reading. The amplitude follows the
//! opening `$`, possibly padded with spaces, and is followed by unit text
//! and a closing `$`:
//!
//! ```text
//! $ -42.3 dBm$
//! ```
//!
//! The host can send a calibration command selecting the measurement
//! frequency and an attenuator offset: `$<freq:4><sign><offset:2>.<1>#`.

use rfmon_core::error::{Error, Result};

/// Parse the amplitude out of one meter line.
///
/// Returns `None` for anything that is not a reading: lines without the
/// `$` framing, an empty or malformed number, or a missing closing `$`.
/// A trailing CR is ignored.
///
/// ```
/// use rfmon_pm8000::protocol::parse_line;
///
/// assert_eq!(parse_line("$ -42.3 something$"), Some(-42.3));
/// assert_eq!(parse_line("garbage"), None);
/// ```
pub fn parse_line(line: &str) -> Option<f32> {
    let rest = line.strip_prefix('$')?;

    let number_len = rest
        .find(|c: char| !(c.is_whitespace() || c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(rest.len());
    if number_len == 0 {
        return None;
    }
    let (number, tail) = rest.split_at(number_len);
    if !tail.contains('$') {
        return None;
    }

    let digits: String = number.chars().filter(|&c| c != ' ').collect();
    digits.trim().parse().ok()
}

/// Build the calibration command for `freq_mhz` with an attenuator offset
/// of `offset_db`.
///
/// The frequency is rounded to whole MHz and must fit four digits; the
/// offset is rounded to 0.1 dB and must stay below 100 dB in magnitude.
///
/// ```
/// use rfmon_pm8000::protocol::calibration_command;
///
/// assert_eq!(calibration_command(866.0, 1.5).unwrap(), b"$0866+01.5#");
/// assert_eq!(calibration_command(433.0, -20.0).unwrap(), b"$0433-20.0#");
/// ```
pub fn calibration_command(freq_mhz: f64, offset_db: f64) -> Result<Vec<u8>> {
    let freq = freq_mhz.round();
    if !(0.0..=9999.0).contains(&freq) {
        return Err(Error::InvalidParameter(format!(
            "calibration frequency {freq_mhz} MHz must be between 0 and 9999"
        )));
    }

    let tenths = (offset_db.abs() * 10.0).round();
    if tenths.is_nan() || tenths >= 1000.0 {
        return Err(Error::InvalidParameter(format!(
            "calibration offset {offset_db} dB must be within +/-99.9"
        )));
    }
    let sign = if offset_db < 0.0 && tenths > 0.0 { '-' } else { '+' };

    Ok(format!("${:04}{}{:04.1}#", freq as u32, sign, tenths / 10.0).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_line
    // -----------------------------------------------------------------------

    #[test]
    fn reading_with_unit_text() {
        assert_eq!(parse_line("$ -42.3 something$"), Some(-42.3));
    }

    #[test]
    fn reading_without_padding() {
        assert_eq!(parse_line("$-7.0dBm$"), Some(-7.0));
        assert_eq!(parse_line("$12$"), Some(12.0));
    }

    #[test]
    fn spaces_inside_number_are_removed() {
        assert_eq!(parse_line("$ - 5 5.2 dBm$"), Some(-55.2));
    }

    #[test]
    fn trailing_carriage_return_is_ignored() {
        assert_eq!(parse_line("$ -10.5 dBm$\r"), Some(-10.5));
    }

    #[test]
    fn garbage_is_not_a_reading() {
        assert_eq!(parse_line("garbage"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn missing_closing_marker() {
        assert_eq!(parse_line("$ -42.3 dBm"), None);
    }

    #[test]
    fn missing_number() {
        assert_eq!(parse_line("$dBm$"), None);
        assert_eq!(parse_line("$   $"), None);
    }

    #[test]
    fn malformed_number() {
        assert_eq!(parse_line("$ --4 dBm$"), None);
        assert_eq!(parse_line("$ 4-2 dBm$"), None);
        assert_eq!(parse_line("$ - dBm$"), None);
    }

    #[test]
    fn text_before_marker_is_not_a_reading() {
        assert_eq!(parse_line("x$ -42.3 dBm$"), None);
    }

    // -----------------------------------------------------------------------
    // calibration_command
    // -----------------------------------------------------------------------

    #[test]
    fn calibration_positive_offset() {
        assert_eq!(calibration_command(866.0, 1.5).unwrap(), b"$0866+01.5#");
    }

    #[test]
    fn calibration_negative_offset() {
        assert_eq!(calibration_command(2400.0, -30.24).unwrap(), b"$2400-30.2#");
    }

    #[test]
    fn calibration_rounds_frequency() {
        assert_eq!(calibration_command(868.4, 0.0).unwrap(), b"$0868+00.0#");
    }

    #[test]
    fn calibration_negative_zero_has_plus_sign() {
        assert_eq!(calibration_command(50.0, -0.01).unwrap(), b"$0050+00.0#");
    }

    #[test]
    fn calibration_rejects_out_of_range() {
        assert!(matches!(
            calibration_command(10_000.0, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            calibration_command(-1.0, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            calibration_command(866.0, 99.96),
            Err(Error::InvalidParameter(_))
        ));
        assert!(calibration_command(866.0, f64::NAN).is_err());
    }
}
