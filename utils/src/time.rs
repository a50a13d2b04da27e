//! Time formatting helpers.

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Describe a withdrawal delay and window, e.g. `"1m 0s delay, 30s window"`.
pub fn format_window(delay: u64, window: u64) -> String {
    if delay == 0 {
        return "withdrawals ungated".to_string();
    }
    format!(
        "{} delay, {} window",
        format_duration(delay),
        format_duration(window)
    )
}
