//! Wu's variance-minimizing color quantizer.
//!
//! Repeatedly picks the box with the largest weighted variance and cuts it
//! where the two halves have the smallest combined variance, until the
//! requested number of boxes exists or no box can be split further.
//! All box statistics come from the cumulative [`Moments`] in O(1).

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::argsort::argsort_descending;
use crate::histogram::{Axis, BINS, Cube, Moments, SIDE, Sums};
use crate::palette::Palette;

/// Box splitter state: the moments of one image plus the boxes cut so far.
#[derive(Debug, Clone)]
pub struct WuQuantizer {
    moments: Moments,
    /// Moment-table offset of each input pixel's cell.
    tags: Vec<u16>,
    boxes: Vec<Cube>,
}

impl WuQuantizer {
    /// Build the moment tables for `pixels`; starts with one box covering the grid.
    pub fn new(pixels: &[rgb::RGB<u8>]) -> Self {
        let (moments, tags) = Moments::from_pixels(pixels);
        Self {
            moments,
            tags,
            boxes: vec![Cube::whole()],
        }
    }

    /// Boxes produced so far, in splitting order.
    pub fn boxes(&self) -> &[Cube] {
        &self.boxes
    }

    /// The cumulative moments this quantizer splits on.
    pub fn moments(&self) -> &Moments {
        &self.moments
    }

    /// Split boxes until there are `max_colors` of them or none has positive variance.
    pub fn split(&mut self, max_colors: usize) {
        // Every box holds at least one nonempty cell, so the grid bounds the box count.
        let bound = max_colors.min(BINS * BINS * BINS);
        self.boxes.reserve(bound.saturating_sub(self.boxes.len()));
        let mut variances: Vec<f64> = self.boxes.iter().map(|c| self.box_variance(c)).collect();

        while self.boxes.len() < max_colors {
            // First box wins ties.
            let mut next = 0;
            let mut max = variances[0];
            for (i, &v) in variances.iter().enumerate().skip(1) {
                if v > max {
                    max = v;
                    next = i;
                }
            }

            if max <= 0.0 {
                tracing::debug!(
                    boxes = self.boxes.len(),
                    requested = max_colors,
                    "no splittable box left"
                );
                break;
            }

            let cut = self.cut(&self.boxes[next]);
            match cut {
                Some((lower, upper)) => {
                    variances[next] = self.box_variance(&lower);
                    variances.push(self.box_variance(&upper));
                    self.boxes[next] = lower;
                    self.boxes.push(upper);
                }
                // Settled: never try this box again, and no box was created.
                None => variances[next] = 0.0,
            }
        }
    }

    /// Weighted variance of a box; boxes of a single cell cannot be split.
    fn box_variance(&self, cube: &Cube) -> f64 {
        if cube.volume() > 1 {
            self.moments.variance(cube)
        } else {
            0.0
        }
    }

    /// Best cut of `cube` along `axis`: `(score, position)`.
    ///
    /// Maximizes the summed squared-mean statistic of both halves, which is the
    /// same as minimizing their summed variance. Cuts leaving either half
    /// without pixels are skipped.
    fn maximize(&self, cube: &Cube, axis: Axis, whole: Sums) -> (f64, Option<usize>) {
        let base = self.moments.bottom(cube, axis);
        let (lo, hi) = cube.bounds(axis);

        let mut max = 0.0;
        let mut cut = None;
        for position in lo + 1..hi {
            let lower = base + self.moments.top(cube, axis, position);
            if lower.weight == 0 {
                continue;
            }
            let upper = whole - lower;
            if upper.weight == 0 {
                continue;
            }

            let score = lower.squared_mean() + upper.squared_mean();
            if score > max {
                max = score;
                cut = Some(position);
            }
        }
        (max, cut)
    }

    /// Cut `cube` in two along its best axis, preferring red, then green, then blue on ties.
    fn cut(&self, cube: &Cube) -> Option<(Cube, Cube)> {
        let whole = self.moments.sums(cube);

        let (max_r, cut_r) = self.maximize(cube, Axis::Red, whole);
        let (max_g, cut_g) = self.maximize(cube, Axis::Green, whole);
        let (max_b, cut_b) = self.maximize(cube, Axis::Blue, whole);

        let (axis, position) = if max_r >= max_g && max_r >= max_b {
            (Axis::Red, cut_r)
        } else if max_g >= max_b {
            (Axis::Green, cut_g)
        } else {
            (Axis::Blue, cut_b)
        };

        position.map(|p| cube.split(axis, p))
    }

    /// Mean color of every box, ranked by the number of input pixels it holds.
    pub fn palette(&self) -> Palette {
        let mut owner = vec![0usize; SIDE * SIDE * SIDE];
        for (i, cube) in self.boxes.iter().enumerate() {
            cube.for_each_cell(|cell| owner[cell] = i);
        }

        let mut masses = vec![0u64; self.boxes.len()];
        for &tag in &self.tags {
            masses[owner[tag as usize]] += 1;
        }

        let colors: Vec<[u8; 3]> = self.boxes.iter().map(|c| self.mean_color(c)).collect();
        let keys: Vec<f64> = masses.iter().map(|&m| m as f64).collect();
        Palette::from_ranked(&colors, &masses, &argsort_descending(&keys))
    }

    /// Truncated mean of the pixels in `cube`; black for an empty box.
    fn mean_color(&self, cube: &Cube) -> [u8; 3] {
        let s = self.moments.sums(cube);
        if s.weight > 0 {
            [
                (s.r / s.weight) as u8,
                (s.g / s.weight) as u8,
                (s.b / s.weight) as u8,
            ]
        } else {
            [0, 0, 0]
        }
    }
}

/// Quantize `pixels` to at most `max_colors` colors with Wu's algorithm.
///
/// Returns fewer colors when the image does not support more. An empty
/// image yields an empty palette.
pub fn quantize_wu(pixels: &[rgb::RGB<u8>], max_colors: usize) -> Palette {
    if pixels.is_empty() || max_colors == 0 {
        return Palette::default();
    }

    let mut quantizer = WuQuantizer::new(pixels);
    quantizer.split(max_colors);
    tracing::debug!(
        pixels = pixels.len(),
        boxes = quantizer.boxes().len(),
        "wu box splitting done"
    );
    quantizer.palette()
}
