//! Accelerated weighted k-means (Lloyd iteration) over the unique-color histogram.
//!
//! Starts from the Wu palette and iterates over histogram bins rather than
//! pixels. Nearest-centroid search walks each centroid's neighbors in order
//! of distance and stops once the triangle inequality rules out every
//! remaining candidate.

extern crate alloc;
use alloc::format;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use crate::argsort::{argsort, argsort_descending};
use crate::error::QuantizeError;
use crate::histogram::{HistEntry, build_histogram};
use crate::palette::Palette;
use crate::wu::quantize_wu;

/// Default cap on refinement rounds.
pub const MAX_ITERATIONS: usize = 100;

/// Default loss improvement below which refinement stops.
pub const TOLERANCE: f64 = 1e-3;

/// "Previous loss" before the first round; larger than any achievable loss.
const INITIAL_LOSS: f64 = 1e6;

/// Stopping rules for refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
        }
    }
}

impl RefineOptions {
    /// At least one round must be allowed and the tolerance must be a non-negative number.
    pub fn validate(&self) -> Result<(), QuantizeError> {
        if self.max_iterations == 0 {
            return Err(QuantizeError::InvalidRequest(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(QuantizeError::InvalidRequest(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Outcome of a refinement run.
#[derive(Debug, Clone)]
pub struct Refinement {
    /// Refined palette, heaviest color first.
    pub palette: Palette,
    /// Rounds actually run; zero when refinement was skipped.
    pub iterations: usize,
    /// Weighted within-cluster distance after each round.
    pub losses: Vec<f64>,
    /// Whether the loss improvement dropped below the tolerance.
    pub converged: bool,
}

/// Squared Euclidean distance between two RGB triples.
#[inline]
pub fn distance_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Symmetric `k x k` matrix of squared distances between centroids, row-major.
pub fn distance_matrix(centroids: &[[f64; 3]]) -> Vec<f64> {
    let k = centroids.len();
    let mut d = vec![0.0; k * k];
    for i in 0..k {
        for j in i + 1..k {
            let dist = distance_sq(&centroids[i], &centroids[j]);
            d[i * k + j] = dist;
            d[j * k + i] = dist;
        }
    }
    d
}

/// For each centroid, the other centroids in order of increasing distance.
///
/// Row `i` is a permutation of `0..k` starting with `i` itself. `distances`
/// is the row-major `k x k` output of [`distance_matrix`].
pub fn rank_matrix(distances: &[f64], k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return Vec::new();
    }
    distances
        .chunks_exact(k)
        .enumerate()
        .map(|(i, row)| {
            let mut order = argsort(row);
            // Coincident centroids tie with self at distance zero; keep self first.
            if let Some(pos) = order.iter().position(|&t| t == i) {
                order[..=pos].rotate_right(1);
            }
            order
        })
        .collect()
}

/// Refine the Wu palette of `pixels` with default options.
pub fn refine_wsm(pixels: &[rgb::RGB<u8>], k: usize) -> Result<Palette, QuantizeError> {
    Ok(refine_with_report(pixels, k, RefineOptions::default())?.palette)
}

/// Refine the Wu palette of `pixels`, reporting iterations and losses.
///
/// When Wu finds fewer than `k` colors its palette is returned unchanged.
/// Otherwise at least one full round runs.
pub fn refine_with_report(
    pixels: &[rgb::RGB<u8>],
    k: usize,
    options: RefineOptions,
) -> Result<Refinement, QuantizeError> {
    options.validate()?;
    let initial = quantize_wu(pixels, k);
    if k == 0 || initial.len() < k {
        tracing::debug!(
            colors = initial.len(),
            requested = k,
            "too few colors to refine, keeping wu palette"
        );
        return Ok(Refinement {
            palette: initial,
            iterations: 0,
            losses: Vec::new(),
            converged: true,
        });
    }

    let hist = build_histogram(pixels);
    let mut centroids: Vec<[f64; 3]> = initial
        .entries()
        .iter()
        .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
        .collect();
    let mut assignment: Vec<usize> = hist.iter().map(|e| e.index % k).collect();

    let mut losses = Vec::new();
    let mut converged = false;
    let mut prev_loss = INITIAL_LOSS;

    for iteration in 0..options.max_iterations {
        let distances = distance_matrix(&centroids);
        let ranks = rank_matrix(&distances, k);

        let moved = reassign(&hist, &centroids, &distances, &ranks, &mut assignment);
        update_centroids(&hist, &assignment, &mut centroids);

        let loss = weighted_loss(&hist, &assignment, &centroids);
        losses.push(loss);
        tracing::trace!(iteration, loss, moved, "wsm round");

        if prev_loss - loss < options.tolerance {
            converged = true;
            break;
        }
        prev_loss = loss;
    }

    tracing::debug!(
        bins = hist.len(),
        iterations = losses.len(),
        converged,
        "wsm refinement done"
    );

    Ok(Refinement {
        palette: ranked_palette(&hist, &assignment, &centroids),
        iterations: losses.len(),
        losses,
        converged,
    })
}

/// Move each bin to its nearest centroid; returns how many bins moved.
fn reassign(
    hist: &[HistEntry],
    centroids: &[[f64; 3]],
    distances: &[f64],
    ranks: &[Vec<usize>],
    assignment: &mut [usize],
) -> usize {
    let k = centroids.len();
    let mut moved = 0;

    for (entry, slot) in hist.iter().zip(assignment.iter_mut()) {
        let p = *slot;
        let prev_dist = distance_sq(&entry.color, &centroids[p]);
        let mut min_dist = prev_dist;

        for &t in &ranks[p][1..] {
            // d(p, t) >= 2 d(x, p) means t is no closer than p, nor is anything ranked after it.
            if distances[p * k + t] >= 4.0 * prev_dist {
                break;
            }
            let dist = distance_sq(&entry.color, &centroids[t]);
            if dist < min_dist {
                min_dist = dist;
                *slot = t;
            }
        }

        if *slot != p {
            moved += 1;
        }
    }
    moved
}

/// Replace each centroid by the weighted mean of its bins. Empty clusters keep their centroid.
fn update_centroids(hist: &[HistEntry], assignment: &[usize], centroids: &mut [[f64; 3]]) {
    let mut sums = vec![[0.0f64; 4]; centroids.len()];
    for (entry, &c) in hist.iter().zip(assignment) {
        let s = &mut sums[c];
        s[0] += entry.color[0] * entry.weight;
        s[1] += entry.color[1] * entry.weight;
        s[2] += entry.color[2] * entry.weight;
        s[3] += entry.weight;
    }

    for (centroid, s) in centroids.iter_mut().zip(&sums) {
        if s[3] > 0.0 {
            *centroid = [s[0] / s[3], s[1] / s[3], s[2] / s[3]];
        }
    }
}

/// Sum over bins of bin weight times squared distance to the assigned centroid.
fn weighted_loss(hist: &[HistEntry], assignment: &[usize], centroids: &[[f64; 3]]) -> f64 {
    hist.iter()
        .zip(assignment)
        .map(|(entry, &c)| entry.weight * distance_sq(&entry.color, &centroids[c]))
        .sum()
}

fn ranked_palette(hist: &[HistEntry], assignment: &[usize], centroids: &[[f64; 3]]) -> Palette {
    let mut masses = vec![0u64; centroids.len()];
    for (entry, &c) in hist.iter().zip(assignment) {
        masses[c] += entry.count;
    }

    let colors: Vec<[u8; 3]> = centroids
        .iter()
        .map(|c| [c[0] as u8, c[1] as u8, c[2] as u8])
        .collect();
    let keys: Vec<f64> = masses.iter().map(|&m| m as f64).collect();
    Palette::from_ranked(&colors, &masses, &argsort_descending(&keys))
}
