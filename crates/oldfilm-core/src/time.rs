/// Formats milliseconds as `HH:MM:SS`, rounding to the nearest second.
///
/// Zero and anything at or past 24h render as `00:00:00`.
pub fn format_hms(ms: u64) -> String {
    let secs = (ms + 500) / 1000;
    if secs == 0 || secs >= 86_400 {
        return "00:00:00".to_string();
    }
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
