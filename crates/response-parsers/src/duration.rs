//! Durations as printed by process listings

use std::time::Duration;

type FormatFn = fn(&str) -> Option<Duration>;

/// Accepted textual forms, tried in order; the first that parses wins
const FORMATS: &[(&str, FormatFn)] = &[
    ("HH:MM:SS", parse_clock),
    ("<h>h<m>m<s>s", parse_hours_minutes_seconds),
    ("<m>m<s>s", parse_minutes_seconds),
    ("<s>s", parse_seconds_suffix),
];

/// Parse a duration in any of the supported forms
///
/// Seconds may carry a fractional part in every form, so `"00:00:01.5"` and
/// `"1.5s"` are the same duration.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    FORMATS.iter().find_map(|(_, parse)| parse(text))
}

/// Names of the supported forms, in the order they are tried
pub fn supported_formats() -> impl Iterator<Item = &'static str> {
    FORMATS.iter().map(|(name, _)| *name)
}

fn parse_clock(text: &str) -> Option<Duration> {
    let mut parts = text.split(':');
    let hours = whole(parts.next()?)?;
    let minutes = whole(parts.next()?)?;
    let seconds = seconds(parts.next()?)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= Duration::from_secs(60) {
        return None;
    }
    let whole_secs = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    Duration::from_secs(whole_secs).checked_add(seconds)
}

fn parse_hours_minutes_seconds(text: &str) -> Option<Duration> {
    let (hours, rest) = text.split_once('h')?;
    let hours = whole(hours)?;
    Duration::from_secs(hours.checked_mul(3600)?).checked_add(parse_minutes_seconds(rest)?)
}

fn parse_minutes_seconds(text: &str) -> Option<Duration> {
    let (minutes, rest) = text.split_once('m')?;
    let minutes = whole(minutes)?;
    Duration::from_secs(minutes.checked_mul(60)?).checked_add(parse_seconds_suffix(rest)?)
}

fn parse_seconds_suffix(text: &str) -> Option<Duration> {
    seconds(text.strip_suffix('s')?)
}

fn whole(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn seconds(text: &str) -> Option<Duration> {
    let (secs, fraction) = match text.split_once('.') {
        Some((secs, fraction)) => (secs, Some(fraction)),
        None => (text, None),
    };
    let secs = whole(secs)?;

    let nanos = match fraction {
        None => 0,
        Some(digits) => {
            if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let scale = 10u32.pow(9 - digits.len() as u32);
            digits.parse::<u32>().ok()? * scale
        }
    };

    Some(Duration::new(secs, nanos))
}
