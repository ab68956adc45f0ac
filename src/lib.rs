//! Dominant-color palette extraction.
//!
//! Pixels go through three stages:
//!
//! 1. [`histogram`]: bin pixels on a 32x32x32 grid and build cumulative
//!    moment tables, so any box of the grid can be summed in O(1).
//! 2. [`wu`]: Wu's quantizer cuts the color cube into variance-minimizing
//!    boxes; their mean colors form the initial palette.
//! 3. [`wsm`]: optional weighted k-means refinement over the unique-color
//!    histogram, with triangle-inequality pruning of the nearest-centroid
//!    search.
//!
//! Palettes come back ordered by pixel mass, heaviest first.
//!
//! ```
//! let pixels: Vec<rgb::RGB<u8>> = (0..64u8)
//!     .map(|i| rgb::RGB { r: i * 4, g: 255 - i * 4, b: 128 })
//!     .collect();
//!
//! let palette = wuquant::quantize(&pixels, 4).unwrap();
//! assert!(palette.len() <= 4);
//! let hex = palette.hex_strings();
//! assert!(hex[0].starts_with('#'));
//! ```
//!
//! Images that hold fewer distinct colors than requested produce a shorter
//! palette; padding it is left to the caller.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod argsort;
pub mod error;
pub mod histogram;
pub mod palette;
pub mod wsm;
pub mod wu;

pub use error::QuantizeError;
pub use palette::Palette;
pub use wsm::{RefineOptions, Refinement};

use alloc::format;
use core::str::FromStr;

/// Palette extraction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Wu's box splitting only.
    #[default]
    Wu,
    /// Wu's box splitting followed by weighted k-means refinement.
    Wsm,
}

impl TryFrom<u32> for Method {
    type Error = QuantizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Method::Wu),
            1 => Ok(Method::Wsm),
            other => Err(QuantizeError::InvalidRequest(format!(
                "method selector must be 0 (wu) or 1 (wsm), got {other}"
            ))),
        }
    }
}

impl FromStr for Method {
    type Err = QuantizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("wu") {
            Ok(Method::Wu)
        } else if name.eq_ignore_ascii_case("wsm") {
            Ok(Method::Wsm)
        } else {
            Err(QuantizeError::InvalidRequest(format!(
                "unknown method {s:?}, expected \"wu\" or \"wsm\""
            )))
        }
    }
}

/// Configuration for palette extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteConfig {
    /// Maximum number of palette colors (at least 1).
    pub colors: usize,
    /// Extraction method.
    pub method: Method,
    /// Cap on refinement rounds for [`Method::Wsm`].
    pub max_iterations: usize,
    /// Refinement stops once the loss improves by less than this.
    pub tolerance: f64,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: 10,
            method: Method::Wu,
            max_iterations: wsm::MAX_ITERATIONS,
            tolerance: wsm::TOLERANCE,
        }
    }
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, n: usize) -> Self {
        self.colors = n;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<(), QuantizeError> {
        validate_colors(self.colors)?;
        self.refine_options().validate()
    }

    fn refine_options(&self) -> RefineOptions {
        RefineOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}

/// Extract up to `k` colors with Wu's quantizer.
pub fn quantize(pixels: &[rgb::RGB<u8>], k: usize) -> Result<Palette, QuantizeError> {
    validate_colors(k)?;
    Ok(wu::quantize_wu(pixels, k))
}

/// Extract up to `k` colors with Wu's quantizer followed by k-means refinement.
pub fn refine(pixels: &[rgb::RGB<u8>], k: usize) -> Result<Palette, QuantizeError> {
    validate_colors(k)?;
    wsm::refine_wsm(pixels, k)
}

/// Extract a palette as described by `config`.
pub fn extract_palette(
    pixels: &[rgb::RGB<u8>],
    config: &PaletteConfig,
) -> Result<Palette, QuantizeError> {
    config.validate()?;
    let palette = match config.method {
        Method::Wu => wu::quantize_wu(pixels, config.colors),
        Method::Wsm => {
            wsm::refine_with_report(pixels, config.colors, config.refine_options())?.palette
        }
    };
    Ok(palette)
}

/// The heaviest color of the palette described by `config`, or `None` for an empty image.
pub fn dominant_color(
    pixels: &[rgb::RGB<u8>],
    config: &PaletteConfig,
) -> Result<Option<[u8; 3]>, QuantizeError> {
    Ok(extract_palette(pixels, config)?.dominant())
}

fn validate_colors(k: usize) -> Result<(), QuantizeError> {
    if k < 1 {
        return Err(QuantizeError::InvalidRequest(format!(
            "number of colors must be at least 1, got {k}"
        )));
    }
    Ok(())
}
