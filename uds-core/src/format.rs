/// Render a byte count with 1024-stepped units, one decimal place.
pub fn human_bytes(bytes: u64) -> String {
    const STEP: f64 = 1024.0;
    let mut value = bytes as f64;
    let mut unit = "bytes";
    for next in ["KB", "MB", "GB", "TB"] {
        if value / STEP >= 1.0 {
            value /= STEP;
            unit = next;
        } else {
            break;
        }
    }
    let rounded = (value * 10.0).round() / 10.0;
    format!("{rounded} {unit}")
}
