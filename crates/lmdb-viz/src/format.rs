//! Human-readable byte sizes.

const UNITS: [char; 4] = ['K', 'M', 'G', 'T'];

/// Formats a byte count as `"N b"` below 1 KiB, otherwise with two decimals
/// in the largest binary unit that keeps the value below 1024 (`T` is the
/// largest unit and is not capped).
pub fn render_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} b");
    }

    let mut value = bytes as f64;
    let mut unit = UNITS[0];
    for candidate in UNITS {
        value /= 1024.0;
        unit = candidate;
        if value < 1024.0 {
            break;
        }
    }
    format!("{value:.2} {unit}")
}
