//! Date parsing and plausibility for embedded metadata.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Earliest year accepted from any date source.
pub const MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// Parse a metadata timestamp.
///
/// Accepts `YYYY:MM:DD HH:MM:SS` (EXIF/QuickTime), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, `HH:MM` times and date-only values. Subseconds
/// and any trailing `Z`/`±HH:MM` are ignored: the wall-clock time the
/// device recorded is what gets archived. Implausible values are `None`.
pub fn parse_metadata_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().trim_end_matches('\0').trim();
    if s.len() < 10 || !s.is_char_boundary(10) {
        return None;
    }

    let (date_part, rest) = s.split_at(10);
    let date = parse_date(date_part)?;

    let time_part = rest.trim_start_matches([' ', 'T']);
    let dt = if time_part.is_empty() {
        date.and_hms_opt(0, 0, 0)?
    } else {
        let (h, m, sec) = parse_time(time_part)?;
        date.and_hms_opt(h, m, sec)?
    };

    is_plausible(&dt).then_some(dt)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let sep_ok = |c: u8| c == b':' || c == b'-';
    if b.len() != 10 || !sep_ok(b[4]) || !sep_ok(b[7]) {
        return None;
    }
    let year = s[0..4].parse::<i32>().ok()?;
    let month = s[5..7].parse::<u32>().ok()?;
    let day = s[8..10].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_time(s: &str) -> Option<(u32, u32, u32)> {
    let digits = |r: std::ops::Range<usize>| -> Option<u32> {
        let part = s.get(r)?;
        if part.bytes().all(|c| c.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };

    let hour = digits(0..2)?;
    if s.as_bytes().get(2) != Some(&b':') {
        return None;
    }
    let minute = digits(3..5)?;
    let second = match s.as_bytes().get(5) {
        Some(b':') => digits(6..8)?,
        _ => 0,
    };
    Some((hour, minute, second))
}

/// Rejects placeholder values: years before [`MIN_PLAUSIBLE_YEAR`] and the
/// exact Unix epoch, which broken tools write for "unknown".
pub fn is_plausible(dt: &NaiveDateTime) -> bool {
    if dt.year() < MIN_PLAUSIBLE_YEAR {
        return false;
    }
    dt.and_utc().timestamp() != 0
}
