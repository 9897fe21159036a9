use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_amount(amount: f64) -> String {
    const UNITS: [&str; 4] = ["", "k", "M", "B"];

    let mut value = amount.abs();
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    if unit == 0 {
        format!("{sign}{value:.0}")
    } else {
        format!("{sign}{value:.1}{}", UNITS[unit])
    }
}

pub fn short_id(id: &str) -> &str {
    id.split_once('-').map(|(_, rest)| rest).unwrap_or(id)
}

/// Deterministic pair in `[-1, 1]` derived from `id`.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
