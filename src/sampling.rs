//! Basis point set samplers.
//!
//! Each sampler is a pure function: given the same arguments (and seed, for
//! the randomized strategies) it produces the same `[P, D]` tensor on every
//! call, regardless of device.

use burn::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Sample `n_points` directions uniformly on the unit `(n_dims-1)`-sphere,
/// scaled by `radius`.
///
/// Directions are normalized Gaussian vectors, so every realized point lies
/// exactly on the sphere surface.
pub fn sample_sphere_uniform<B: Backend>(
    n_points: usize,
    n_dims: usize,
    radius: f32,
    seed: u64,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Vec::with_capacity(n_points * n_dims);

    for _ in 0..n_points {
        values.extend(unit_direction(&mut rng, n_dims).into_iter().map(|v| v * radius));
    }

    Tensor::from_data(TensorData::new(values, [n_points, n_dims]), device)
}

/// Sample `n_points` points inside the ball of `radius` with a deliberately
/// non-uniform density.
///
/// The radial coordinate is drawn as `radius * u` with `u ~ Uniform(0, 1)`,
/// which concentrates mass near the center relative to a volume-uniform
/// draw. The exact density is an implementation choice; only containment in
/// the ball and seed reproducibility are contractual.
pub fn sample_sphere_nonuniform<B: Backend>(
    n_points: usize,
    n_dims: usize,
    radius: f32,
    seed: u64,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Vec::with_capacity(n_points * n_dims);

    for _ in 0..n_points {
        let r = radius * rng.gen::<f32>();
        values.extend(unit_direction(&mut rng, n_dims).into_iter().map(|v| v * r));
    }

    Tensor::from_data(TensorData::new(values, [n_points, n_dims]), device)
}

/// Sample a regular axis-aligned grid with `grid_size` divisions per axis
/// inside `[min_v, max_v]^n_dims`.
///
/// The realized point count is `grid_size^n_dims`.
pub fn sample_grid_cube<B: Backend>(
    grid_size: usize,
    min_v: f32,
    max_v: f32,
    n_dims: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values = cube_grid_values(grid_size, min_v, max_v, n_dims);
    let total = grid_size.pow(n_dims as u32);
    Tensor::from_data(TensorData::new(values, [total, n_dims]), device)
}

/// Sample exactly `n_points` grid nodes inside the ball of `radius`.
///
/// The cube grid over `[-radius, radius]^n_dims` is grown until at least
/// `n_points` nodes fall inside the ball; the `n_points` nodes closest to
/// the origin are kept, with ties broken by grid enumeration order. When
/// `randomize` is set, each kept node is jittered by up to half a grid cell
/// per axis (seeded) and projected back into the ball.
pub fn sample_grid_sphere<B: Backend>(
    n_points: usize,
    n_dims: usize,
    radius: f32,
    randomize: bool,
    seed: u64,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut grid_size = (n_points as f64)
        .powf(1.0 / n_dims as f64)
        .ceil()
        .max(2.0) as usize;

    // Absorbs rounding error on nodes that sit exactly on the surface.
    let limit_sq = radius * radius * (1.0 + 1e-5);

    let (mut points, half_cell) = loop {
        let values = cube_grid_values(grid_size, -radius, radius, n_dims);
        let total = grid_size.pow(n_dims as u32);

        let mut inside: Vec<(f32, usize)> = (0..total)
            .filter_map(|i| {
                let node = &values[i * n_dims..(i + 1) * n_dims];
                let norm_sq: f32 = node.iter().map(|v| v * v).sum();
                (norm_sq <= limit_sq).then_some((norm_sq, i))
            })
            .collect();

        if inside.len() >= n_points {
            inside.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(core::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            inside.truncate(n_points);
            // Restore grid enumeration order for the kept nodes.
            inside.sort_by_key(|&(_, i)| i);

            let points: Vec<f32> = inside
                .iter()
                .flat_map(|&(_, i)| values[i * n_dims..(i + 1) * n_dims].iter().copied())
                .collect();
            let half_cell = radius / (grid_size - 1) as f32;
            break (points, half_cell);
        }

        grid_size += 1;
    };

    if randomize {
        let mut rng = StdRng::seed_from_u64(seed);
        for point in points.chunks_mut(n_dims) {
            for v in point.iter_mut() {
                *v += rng.gen_range(-half_cell..=half_cell);
            }
            let norm: f32 = point.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > radius {
                let scale = radius / norm;
                for v in point.iter_mut() {
                    *v *= scale;
                }
            }
        }
    }

    Tensor::from_data(TensorData::new(points, [n_points, n_dims]), device)
}

/// Draw a unit-length direction via normalized Gaussians.
fn unit_direction(rng: &mut StdRng, n_dims: usize) -> Vec<f32> {
    loop {
        let mut dir: Vec<f32> = (0..n_dims).map(|_| rng.sample(StandardNormal)).collect();
        let norm: f32 = dir.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 1e-12 {
            for v in dir.iter_mut() {
                *v /= norm;
            }
            return dir;
        }
    }
}

/// Flat row-major node coordinates of a regular cube grid.
///
/// A single division per axis collapses to the interval midpoint; otherwise
/// nodes span `[min_v, max_v]` inclusive.
fn cube_grid_values(grid_size: usize, min_v: f32, max_v: f32, n_dims: usize) -> Vec<f32> {
    let axis: Vec<f32> = if grid_size == 1 {
        vec![(min_v + max_v) * 0.5]
    } else {
        let step = (max_v - min_v) / (grid_size - 1) as f32;
        (0..grid_size).map(|k| min_v + step * k as f32).collect()
    };

    let total = grid_size.pow(n_dims as u32);
    let mut values = Vec::with_capacity(total * n_dims);
    for i in 0..total {
        let mut rem = i;
        let mut coords = vec![0.0f32; n_dims];
        for d in (0..n_dims).rev() {
            coords[d] = axis[rem % grid_size];
            rem /= grid_size;
        }
        values.extend(coords);
    }
    values
}
