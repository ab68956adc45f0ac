extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use core::ops::{Add, Sub};

/// Bins per channel on the quantization grid.
pub const BINS: usize = 32;

/// Side length of the moment tables: the 32 bins plus the zero boundary at index 0.
pub const SIDE: usize = BINS + 1;

const TABLE_LEN: usize = SIDE * SIDE * SIDE;

/// Grid index (1..=32) of an 8-bit channel value.
#[inline]
pub fn bin(c: u8) -> usize {
    (c >> 3) as usize + 1
}

/// Flat offset of grid cell `(r, g, b)` in a moment table.
#[inline]
pub fn cell_index(r: usize, g: usize, b: usize) -> usize {
    (r * SIDE + g) * SIDE + b
}

/// Split direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Red,
    Green,
    Blue,
}

/// An axis-aligned box `(r0, r1] x (g0, g1] x (b0, b1]` on the quantization grid.
///
/// Lower bounds are exclusive and upper bounds inclusive, so two boxes split
/// at `p` share the boundary without counting any cell twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cube {
    pub r0: usize,
    pub r1: usize,
    pub g0: usize,
    pub g1: usize,
    pub b0: usize,
    pub b1: usize,
}

impl Cube {
    /// The box covering the whole grid, `(0, 32]^3`.
    pub const fn whole() -> Self {
        Self {
            r0: 0,
            r1: BINS,
            g0: 0,
            g1: BINS,
            b0: 0,
            b1: BINS,
        }
    }

    /// Number of grid cells inside the box.
    pub fn volume(&self) -> usize {
        (self.r1 - self.r0) * (self.g1 - self.g0) * (self.b1 - self.b0)
    }

    /// Exclusive lower and inclusive upper bound along `axis`.
    pub fn bounds(&self, axis: Axis) -> (usize, usize) {
        match axis {
            Axis::Red => (self.r0, self.r1),
            Axis::Green => (self.g0, self.g1),
            Axis::Blue => (self.b0, self.b1),
        }
    }

    /// Split at `position` along `axis`: the lower box keeps `(lo, position]`,
    /// the upper box gets `(position, hi]`.
    pub fn split(&self, axis: Axis, position: usize) -> (Cube, Cube) {
        let mut lower = *self;
        let mut upper = *self;
        match axis {
            Axis::Red => {
                lower.r1 = position;
                upper.r0 = position;
            }
            Axis::Green => {
                lower.g1 = position;
                upper.g0 = position;
            }
            Axis::Blue => {
                lower.b1 = position;
                upper.b0 = position;
            }
        }
        (lower, upper)
    }

    /// Call `f` with the flat table offset of every cell inside the box.
    pub fn for_each_cell(&self, mut f: impl FnMut(usize)) {
        for r in self.r0 + 1..=self.r1 {
            for g in self.g0 + 1..=self.g1 {
                for b in self.b0 + 1..=self.b1 {
                    f(cell_index(r, g, b));
                }
            }
        }
    }
}

/// Sum of `table` over `cube` by 8-corner inclusion-exclusion on a cumulative table.
#[inline]
fn vol<T>(cube: &Cube, table: &[T]) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T>,
{
    let at = |r, g, b| table[cell_index(r, g, b)];
    at(cube.r1, cube.g1, cube.b1) - at(cube.r1, cube.g1, cube.b0) - at(cube.r1, cube.g0, cube.b1)
        + at(cube.r1, cube.g0, cube.b0)
        - at(cube.r0, cube.g1, cube.b1)
        + at(cube.r0, cube.g1, cube.b0)
        + at(cube.r0, cube.g0, cube.b1)
        - at(cube.r0, cube.g0, cube.b0)
}

/// Per-channel statistics summed over part of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sums {
    pub weight: i64,
    pub r: i64,
    pub g: i64,
    pub b: i64,
}

impl Sums {
    /// `(r^2 + g^2 + b^2) / weight`, the squared-mean statistic of a side of a cut.
    /// Zero for an empty side.
    pub fn squared_mean(&self) -> f64 {
        if self.weight == 0 {
            return 0.0;
        }
        let (r, g, b) = (self.r as f64, self.g as f64, self.b as f64);
        (r * r + g * g + b * b) / self.weight as f64
    }
}

impl Add for Sums {
    type Output = Sums;
    fn add(self, o: Sums) -> Sums {
        Sums {
            weight: self.weight + o.weight,
            r: self.r + o.r,
            g: self.g + o.g,
            b: self.b + o.b,
        }
    }
}

impl Sub for Sums {
    type Output = Sums;
    fn sub(self, o: Sums) -> Sums {
        Sums {
            weight: self.weight - o.weight,
            r: self.r - o.r,
            g: self.g - o.g,
            b: self.b - o.b,
        }
    }
}

/// Cumulative color moments over the 33x33x33 grid.
///
/// After construction every table holds a 3-D running sum, so the total of
/// any statistic over a [`Cube`] is an O(1) lookup.
#[derive(Debug, Clone)]
pub struct Moments {
    weight: Vec<i64>,
    red: Vec<i64>,
    green: Vec<i64>,
    blue: Vec<i64>,
    squares: Vec<f64>,
}

impl Moments {
    /// Build cumulative moments from `pixels`.
    ///
    /// Also returns, for every pixel, the flat offset of the cell it fell into.
    pub fn from_pixels(pixels: &[rgb::RGB<u8>]) -> (Self, Vec<u16>) {
        let mut moments = Self {
            weight: vec![0; TABLE_LEN],
            red: vec![0; TABLE_LEN],
            green: vec![0; TABLE_LEN],
            blue: vec![0; TABLE_LEN],
            squares: vec![0.0; TABLE_LEN],
        };

        let tags: Vec<u16> = pixels.iter().map(|p| moments.add(*p) as u16).collect();
        moments.accumulate();
        (moments, tags)
    }

    fn add(&mut self, p: rgb::RGB<u8>) -> usize {
        let idx = cell_index(bin(p.r), bin(p.g), bin(p.b));
        let (r, g, b) = (p.r as i64, p.g as i64, p.b as i64);
        self.weight[idx] += 1;
        self.red[idx] += r;
        self.green[idx] += g;
        self.blue[idx] += b;
        self.squares[idx] += (r * r + g * g + b * b) as f64;
        idx
    }

    /// Turn per-cell sums into running sums over r, then g, then b.
    fn accumulate(&mut self) {
        for r in 1..SIDE {
            let mut area = [Sums::default(); SIDE];
            let mut area2 = [0.0f64; SIDE];

            for g in 1..SIDE {
                let mut line = Sums::default();
                let mut line2 = 0.0f64;
                for b in 1..SIDE {
                    let idx = cell_index(r, g, b);
                    let prev = cell_index(r - 1, g, b);

                    line = line + self.cell(idx);
                    line2 += self.squares[idx];
                    area[b] = area[b] + line;
                    area2[b] += line2;

                    self.weight[idx] = self.weight[prev] + area[b].weight;
                    self.red[idx] = self.red[prev] + area[b].r;
                    self.green[idx] = self.green[prev] + area[b].g;
                    self.blue[idx] = self.blue[prev] + area[b].b;
                    self.squares[idx] = self.squares[prev] + area2[b];
                }
            }
        }
    }

    fn cell(&self, idx: usize) -> Sums {
        Sums {
            weight: self.weight[idx],
            r: self.red[idx],
            g: self.green[idx],
            b: self.blue[idx],
        }
    }

    /// Pixel count and channel sums inside `cube`.
    pub fn sums(&self, cube: &Cube) -> Sums {
        Sums {
            weight: vol(cube, &self.weight),
            r: vol(cube, &self.red),
            g: vol(cube, &self.green),
            b: vol(cube, &self.blue),
        }
    }

    /// Pixel count inside `cube`.
    pub fn weight(&self, cube: &Cube) -> i64 {
        vol(cube, &self.weight)
    }

    /// Sum of `r^2 + g^2 + b^2` over the pixels inside `cube`.
    pub fn sum_squares(&self, cube: &Cube) -> f64 {
        vol(cube, &self.squares)
    }

    /// Weighted variance of `cube`: variance times pixel count, not normalized.
    pub fn variance(&self, cube: &Cube) -> f64 {
        let sums = self.sums(cube);
        if sums.weight == 0 {
            return 0.0;
        }
        self.sum_squares(cube) - sums.squared_mean()
    }

    /// Part of the sums over `cube` that does not depend on its upper bound along `axis`.
    pub fn bottom(&self, cube: &Cube, axis: Axis) -> Sums {
        let partial = |t: &[i64]| -> i64 {
            let at = |r, g, b| t[cell_index(r, g, b)];
            match axis {
                Axis::Red => {
                    -at(cube.r0, cube.g1, cube.b1) + at(cube.r0, cube.g1, cube.b0)
                        + at(cube.r0, cube.g0, cube.b1)
                        - at(cube.r0, cube.g0, cube.b0)
                }
                Axis::Green => {
                    -at(cube.r1, cube.g0, cube.b1) + at(cube.r1, cube.g0, cube.b0)
                        + at(cube.r0, cube.g0, cube.b1)
                        - at(cube.r0, cube.g0, cube.b0)
                }
                Axis::Blue => {
                    -at(cube.r1, cube.g1, cube.b0) + at(cube.r1, cube.g0, cube.b0)
                        + at(cube.r0, cube.g1, cube.b0)
                        - at(cube.r0, cube.g0, cube.b0)
                }
            }
        };
        self.map_tables(partial)
    }

    /// Remainder of the sums over `cube` with its upper bound along `axis` replaced by `position`.
    ///
    /// `bottom + top` is the sum over the lower half of a cut at `position`.
    pub fn top(&self, cube: &Cube, axis: Axis, position: usize) -> Sums {
        let pos = |t: &[i64]| -> i64 {
            let at = |r, g, b| t[cell_index(r, g, b)];
            match axis {
                Axis::Red => {
                    at(position, cube.g1, cube.b1) - at(position, cube.g1, cube.b0)
                        - at(position, cube.g0, cube.b1)
                        + at(position, cube.g0, cube.b0)
                }
                Axis::Green => {
                    at(cube.r1, position, cube.b1) - at(cube.r1, position, cube.b0)
                        - at(cube.r0, position, cube.b1)
                        + at(cube.r0, position, cube.b0)
                }
                Axis::Blue => {
                    at(cube.r1, cube.g1, position) - at(cube.r1, cube.g0, position)
                        - at(cube.r0, cube.g1, position)
                        + at(cube.r0, cube.g0, position)
                }
            }
        };
        self.map_tables(pos)
    }

    fn map_tables(&self, f: impl Fn(&[i64]) -> i64) -> Sums {
        Sums {
            weight: f(&self.weight),
            r: f(&self.red),
            g: f(&self.green),
            b: f(&self.blue),
        }
    }
}

/// One nonempty bin of the unique-color histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistEntry {
    /// Bin offset on the 32x32x32 grid: `r << 10 | g << 5 | b`.
    pub index: usize,
    /// Number of pixels in this bin.
    pub count: u64,
    /// Share of all pixels that fell into this bin.
    pub weight: f64,
    /// Mean color of the pixels in this bin.
    pub color: [f64; 3],
}

/// Build the unique-color histogram used by refinement, in bin order.
///
/// Cost of everything downstream is bounded by the 32768 bins rather than by
/// the pixel count.
pub fn build_histogram(pixels: &[rgb::RGB<u8>]) -> Vec<HistEntry> {
    let mut counts = vec![0u64; BINS * BINS * BINS];
    let mut sums = vec![[0u64; 3]; BINS * BINS * BINS];

    for p in pixels {
        let idx = ((p.r >> 3) as usize) << 10 | ((p.g >> 3) as usize) << 5 | (p.b >> 3) as usize;
        counts[idx] += 1;
        sums[idx][0] += p.r as u64;
        sums[idx][1] += p.g as u64;
        sums[idx][2] += p.b as u64;
    }

    let total = pixels.len() as f64;
    counts
        .iter()
        .zip(sums.iter())
        .enumerate()
        .filter(|(_, (count, _))| **count > 0)
        .map(|(index, (&count, sum))| {
            let n = count as f64;
            HistEntry {
                index,
                count,
                weight: n / total,
                color: [sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n],
            }
        })
        .collect()
}
