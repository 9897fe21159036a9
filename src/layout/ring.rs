use std::f32::consts::TAU;

use eframe::egui::{Pos2, pos2};

/// Evenly spaced positions on a circle of radius `extent`, starting at the top.
pub(super) fn ring_layout(count: usize, extent: f32) -> Vec<Pos2> {
    match count {
        0 => Vec::new(),
        1 => vec![Pos2::ZERO],
        _ => (0..count)
            .map(|index| {
                let angle = (index as f32 / count as f32) * TAU - TAU / 4.0;
                pos2(angle.cos() * extent, angle.sin() * extent)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_share_one_radius() {
        let positions = ring_layout(5, 120.0);
        assert_eq!(positions.len(), 5);
        for p in &positions {
            assert!((p.to_vec2().length() - 120.0).abs() < 1e-3);
        }
        assert!(positions[0].y < 0.0);
    }
}
