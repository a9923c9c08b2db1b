use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pseudo-random pair in (-1, 1) derived from a key. Used to
/// jitter freshly entering nodes so coincident spawn points separate the
/// same way every run.
pub fn stable_pair(key: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Approximate width of region label glyphs.
const LABEL_PX_PER_CHAR: f32 = 10.0;

/// Truncates a region label that would overflow the region width, appending
/// an ellipsis. Width is estimated at ~10 px per character.
pub fn ellipsize(name: &str, region_width: f32) -> String {
    let length_px = name.chars().count() as f32 * LABEL_PX_PER_CHAR;
    if length_px <= region_width {
        return name.to_string();
    }

    let excess_chars = ((length_px - region_width) / LABEL_PX_PER_CHAR).round() as usize;
    let keep = name.chars().count().saturating_sub(excess_chars);
    let mut truncated = name.chars().take(keep).collect::<String>();
    truncated.push_str("...");
    truncated
}
