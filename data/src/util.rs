use chrono::DateTime;

/// Formats a price to a fixed number of decimals for mark labels.
/// Non-finite prices (no quote yet) render as a dash.
pub fn format_price(price: f64, decimals: usize) -> String {
    if price.is_finite() {
        format!("{price:.decimals$}")
    } else {
        "-".to_string()
    }
}

/// Formats a ns epoch timestamp for labels and log lines, second precision.
pub fn format_datetime(nanos: i64) -> String {
    DateTime::from_timestamp_nanos(nanos)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
