//! Deterministic force-directed layout
//!
//! A plain Fruchterman-Reingold iteration over seeded initial positions.
//! No randomness beyond the caller's RNG, so the same seed always yields
//! the same layout.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

const ITERATIONS: usize = 100;

/// Compute 2-D positions in the unit square for a graph.
pub fn spring_layout(
    nodes: usize,
    edges: &[(usize, usize)],
    rng: &mut ChaCha8Rng,
) -> Vec<(f64, f64)> {
    if nodes == 0 {
        return Vec::new();
    }

    let mut pos: Vec<(f64, f64)> = (0..nodes)
        .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect();

    // Optimal pairwise distance; the 1.5 factor spreads sparse graphs out
    let k = 1.5 / (nodes as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / ITERATIONS as f64;

    let mut disp = vec![(0.0f64, 0.0f64); nodes];

    for _ in 0..ITERATIONS {
        for d in disp.iter_mut() {
            *d = (0.0, 0.0);
        }

        // Repulsion between every pair
        for i in 0..nodes {
            for j in (i + 1)..nodes {
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
                let force = k * k / dist;
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                disp[i].0 += fx;
                disp[i].1 += fy;
                disp[j].0 -= fx;
                disp[j].1 -= fy;
            }
        }

        // Attraction along edges
        for &(u, v) in edges {
            let dx = pos[u].0 - pos[v].0;
            let dy = pos[u].1 - pos[v].1;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
            let force = dist * dist / k;
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            disp[u].0 -= fx;
            disp[u].1 -= fy;
            disp[v].0 += fx;
            disp[v].1 += fy;
        }

        // Apply displacements, capped by the current temperature
        for i in 0..nodes {
            let (dx, dy) = disp[i];
            let len = (dx * dx + dy * dy).sqrt().max(1e-9);
            let step = len.min(temperature);
            pos[i].0 += dx / len * step;
            pos[i].1 += dy / len * step;
        }

        temperature -= cooling;
    }

    pos
}

/// Rescale positions into the rectangle `[x_min, x_max] x [y_min, y_max]`,
/// rounded to one decimal as the dashboard expects.
pub fn scale_positions(
    pos: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) -> Vec<(f64, f64)> {
    let min_x = pos.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = pos.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = pos.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = pos.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let range_x = if max_x > min_x { max_x - min_x } else { 1.0 };
    let range_y = if max_y > min_y { max_y - min_y } else { 1.0 };

    pos.iter()
        .map(|&(x, y)| {
            let sx = x_min + (x_max - x_min) * (x - min_x) / range_x;
            let sy = y_min + (y_max - y_min) * (y - min_y) / range_y;
            (round1(sx), round1(sy))
        })
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
