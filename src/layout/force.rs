use std::f32::consts::TAU;

use eframe::egui::{Pos2, Vec2, pos2, vec2};

use crate::util::stable_pair;

const NODE_RADIUS: f32 = 6.0;

/// Spring/repulsion layout with cooling. Nodes with a seed start there and
/// run a shorter, cooler schedule; the rest start on a jittered ring. The
/// result is centred and scaled so every node lies within `extent` of the
/// origin.
pub(super) fn force_layout(
    node_ids: &[&str],
    edges: &[(usize, usize)],
    seeds: &[Option<Pos2>],
    iterations: usize,
    extent: f32,
) -> Vec<Pos2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![seeds.first().copied().flatten().unwrap_or(Pos2::ZERO)];
    }

    let base_radius = (n as f32).sqrt() * 360.0;
    let seeded = seeds.iter().filter(|seed| seed.is_some()).count();
    let warm = seeded * 2 >= n;

    // Warm seeds live in viewport units; lift them into simulation units.
    let lift = base_radius / extent.max(1.0);
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx * 160.0, jy * 160.0);
            match seeds.get(index).copied().flatten() {
                Some(seed) => seed.to_vec2() * lift + jitter * 0.05,
                None => {
                    let angle = (index as f32 / n as f32) * TAU;
                    vec2(angle.cos(), angle.sin()) * base_radius + jitter
                }
            }
        })
        .collect::<Vec<_>>();

    let area = (base_radius * 2.4).powi(2);
    let k = (area / n as f32).sqrt().max(24.0);
    let (mut temperature, iterations) = if warm {
        ((k * 1.2).max(40.0), iterations / 3)
    } else {
        ((k * 5.5).max(140.0), iterations)
    };

    for _ in 0..iterations {
        let mut disp = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;
                let min_distance = NODE_RADIUS * 2.0 * 4.2;

                let force = (k * k) / distance;
                disp[i] += direction * force;
                disp[j] -= direction * force;

                if distance < min_distance {
                    let push = (min_distance - distance) * 2.4;
                    disp[i] += direction * push;
                    disp[j] -= direction * push;
                }
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;
            let force = (distance - k) * 0.18;

            disp[from] -= direction * force;
            disp[to] += direction * force;
        }

        for (d, position) in disp.iter_mut().zip(&positions) {
            *d -= *position * 0.0012;
        }

        for (position, d) in positions.iter_mut().zip(&disp) {
            let length = d.length();
            if length > 0.0 {
                *position += *d / length * length.min(temperature) * 0.92;
            }
        }

        temperature *= 0.965;
        if temperature < 0.55 {
            break;
        }
    }

    fit_to_extent(&positions, extent)
}

fn fit_to_extent(positions: &[Vec2], extent: f32) -> Vec<Pos2> {
    let count = positions.len() as f32;
    let centroid = positions.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / count;
    let radius = positions
        .iter()
        .map(|p| (*p - centroid).length())
        .fold(0.0f32, f32::max);
    let scale = if radius > f32::EPSILON {
        extent / radius
    } else {
        1.0
    };

    positions
        .iter()
        .map(|p| {
            let v = (*p - centroid) * scale;
            pos2(v.x, v.y)
        })
        .collect()
}
