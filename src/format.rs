//! Human-readable formatting for panel summaries.

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with binary units and one decimal, `N/A` if absent.
pub fn format_bytes(bytes: Option<f64>) -> String {
    let Some(bytes) = bytes.filter(|b| b.is_finite()) else {
        return "N/A".to_string();
    };
    if bytes == 0.0 {
        return "0 B".to_string();
    }
    let mut value = bytes;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, BYTE_UNITS[unit])
}

/// Formats seconds as `12.3s` below a minute and `2m 5s` above.
pub fn format_duration_seconds(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite()) else {
        return "N/A".to_string();
    };
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }
    let minutes = (seconds / 60.0).floor();
    let remainder = seconds % 60.0;
    format!("{}m {:.0}s", minutes as u64, remainder)
}
