/// Render a position as `m:ss`, or `h:mm:ss` past the hour
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.abs().floor() as u64
    } else {
        0
    };
    let minutes = total / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{hours}:{:02}:{:02}", minutes % 60, total % 60)
    } else {
        format!("{minutes}:{:02}", total % 60)
    }
}
