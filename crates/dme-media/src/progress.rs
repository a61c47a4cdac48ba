//! FFmpeg progress parsing.
//!
//! FFmpeg reports progress on its status line as
//! `frame=  123 fps= 60 ... time=00:01:02.05 bitrate=... speed=1.50x`.
//! Only the `time=` token is used; progress is elapsed output time over
//! the probed source duration.

/// Highest percentage reported while the transcoder is still running.
///
/// 100 is reserved for a confirmed successful exit: the last status line can
/// reach the source duration before the muxer has flushed the file.
pub const MAX_RUNNING_PERCENT: u8 = 99;

/// Extract elapsed output time in whole seconds from a status line.
///
/// Recognizes `time=H:M:S.F` anywhere in the line. The fraction must be
/// present but is dropped. Returns `None` for lines without the token,
/// including `time=N/A`.
pub fn extract_elapsed_seconds(line: &str) -> Option<u64> {
    line.match_indices("time=")
        .find_map(|(idx, key)| parse_clock(&line[idx + key.len()..]))
}

/// Parse the `H:M:S.F` prefix of `s`.
fn parse_clock(s: &str) -> Option<u64> {
    let (hours, rest) = take_digits(s)?;
    let (minutes, rest) = take_digits(rest.strip_prefix(':')?)?;
    let (seconds, rest) = take_digits(rest.strip_prefix(':')?)?;

    // Separator plus at least one fractional digit
    let mut chars = rest.chars();
    chars.next()?;
    take_digits(chars.as_str())?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

fn take_digits(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Running progress percentage: `floor(elapsed / total * 100)` clamped to
/// `[0, 99]`. `None` when the total duration is unknown.
pub fn progress_percent(elapsed_secs: u64, total_secs: f64) -> Option<u8> {
    if total_secs.is_nan() || total_secs <= 0.0 {
        return None;
    }
    let percent = (elapsed_secs as f64 / total_secs * 100.0).floor();
    Some(percent.clamp(0.0, MAX_RUNNING_PERCENT as f64) as u8)
}

/// Per-job progress state.
///
/// Turns status lines into percentages that never decrease and never
/// repeat, so the caller only sees actual movement.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_secs: f64,
    last: Option<u8>,
}

impl ProgressTracker {
    /// Create a tracker for a source of `total_secs` (0 = unknown).
    pub fn new(total_secs: f64) -> Self {
        Self {
            total_secs,
            last: None,
        }
    }

    /// Whether the duration is known, i.e. progress can be reported at all.
    pub fn is_enabled(&self) -> bool {
        self.total_secs > 0.0
    }

    /// Feed a line; returns the new percentage if it advanced.
    pub fn update(&mut self, line: &str) -> Option<u8> {
        if !self.is_enabled() {
            return None;
        }
        let elapsed = extract_elapsed_seconds(line)?;
        let percent = progress_percent(elapsed, self.total_secs)?;

        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }

    /// Last reported percentage.
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_status_line() {
        let line = "frame=  150 fps= 30 q=28.0 size=    1024kB time=00:00:05.00 bitrate= 200.0kbits/s speed=1.50x";
        assert_eq!(extract_elapsed_seconds(line), Some(5));
    }

    #[test]
    fn test_extract_hours_minutes_seconds() {
        assert_eq!(extract_elapsed_seconds("time=01:02:03.45"), Some(3723));
        assert_eq!(extract_elapsed_seconds("out_time=00:10:00.000000"), Some(600));
    }

    #[test]
    fn test_extract_ignores_unrelated_lines() {
        assert_eq!(extract_elapsed_seconds("Duration: 00:01:02.03, start: 0.000000"), None);
        assert_eq!(extract_elapsed_seconds("frame=0 time=N/A bitrate=N/A"), None);
        assert_eq!(extract_elapsed_seconds("time=00:00:05"), None);
        assert_eq!(extract_elapsed_seconds(""), None);
    }

    #[test]
    fn test_extract_skips_invalid_token_before_valid_one() {
        assert_eq!(extract_elapsed_seconds("time=N/A time=00:00:07.5"), Some(7));
    }

    #[test]
    fn test_percent_clamped_while_running() {
        let elapsed = extract_elapsed_seconds("time=01:02:03.45").unwrap();
        assert_eq!(progress_percent(elapsed, 3723.0), Some(99));
        assert_eq!(progress_percent(10_000, 3723.0), Some(99));
        assert_eq!(progress_percent(0, 10.0), Some(0));
        assert_eq!(progress_percent(5, 10.0), Some(50));
        assert_eq!(progress_percent(1, 3.0), Some(33));
    }

    #[test]
    fn test_percent_unknown_duration() {
        assert_eq!(progress_percent(5, 0.0), None);
        assert_eq!(progress_percent(5, f64::NAN), None);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let mut tracker = ProgressTracker::new(10.0);
        assert_eq!(tracker.update("time=00:00:02.00"), Some(20));
        assert_eq!(tracker.update("time=00:00:02.50"), None);
        assert_eq!(tracker.update("time=00:00:01.00"), None);
        assert_eq!(tracker.update("size=1kB"), None);
        assert_eq!(tracker.update("time=00:00:06.00"), Some(60));
        assert_eq!(tracker.update("time=00:00:12.00"), Some(99));
        assert_eq!(tracker.last(), Some(99));
    }

    #[test]
    fn test_tracker_without_duration_reports_nothing() {
        let mut tracker = ProgressTracker::new(0.0);
        assert!(!tracker.is_enabled());
        assert_eq!(tracker.update("time=00:00:02.00"), None);
    }
}
