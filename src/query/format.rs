//! Display helpers for traffic counters.

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

// ---

/// Human-readable byte count with binary (1024) steps.
pub fn format_bytes(bytes: u64) -> String {
    // ---
    let value = bytes as f64;
    if value < KIB {
        format!("{} B", bytes)
    } else if value < MIB {
        format!("{:.1} KB", value / KIB)
    } else if value < GIB {
        format!("{:.1} MB", value / MIB)
    } else {
        format!("{:.1} GB", value / GIB)
    }
}

/// `value / total * 100` rounded to two decimals; 0 when `total` is 0.
pub fn calculate_percentage(value: f64, total: f64) -> f64 {
    // ---
    if total == 0.0 {
        return 0.0;
    }
    ((value / total) * 100.0 * 100.0).round() / 100.0
}
