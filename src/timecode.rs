//! Clock-string helpers for the cut range.
//!
//! Accepted forms are `H:M:S`, `M:S`, or a bare number of seconds. Each
//! component must be a non-negative integer; anything else is rejected
//! rather than guessed at.

/// Parse a clock string into whole seconds.
pub fn parse_clock(s: &str) -> Option<u64> {
    let s = s.trim();
    if !s.contains(':') {
        return parse_part(s);
    }
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [h, m, sec] => parse_part(h)?
            .checked_mul(3600)?
            .checked_add(parse_part(m)?.checked_mul(60)?)?
            .checked_add(parse_part(sec)?),
        [m, sec] => parse_part(m)?
            .checked_mul(60)?
            .checked_add(parse_part(sec)?),
        _ => None,
    }
}

fn parse_part(p: &str) -> Option<u64> {
    let p = p.trim();
    if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    p.parse().ok()
}

/// True when both strings parse and `end` lies strictly after `start`.
pub fn validate_times(start: &str, end: &str) -> bool {
    match (parse_clock(start), parse_clock(end)) {
        (Some(s), Some(e)) => e > s,
        _ => false,
    }
}

/// Length of the cut range, when valid.
pub fn cut_duration(start: &str, end: &str) -> Option<u64> {
    let (s, e) = (parse_clock(start)?, parse_clock(end)?);
    e.checked_sub(s).filter(|d| *d > 0)
}

/// `M:SS` rendering used next to the range inputs.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
