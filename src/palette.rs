extern crate alloc;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// An extracted color palette, heaviest color first.
///
/// Each entry carries its mass: the number of input pixels assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
    masses: Vec<u64>,
}

impl Palette {
    /// Build a palette from per-cluster colors and masses, visited in `order`.
    pub(crate) fn from_ranked(colors: &[[u8; 3]], masses: &[u64], order: &[usize]) -> Self {
        debug_assert_eq!(colors.len(), masses.len());
        Self {
            entries: order.iter().map(|&i| colors[i]).collect(),
            masses: order.iter().map(|&i| masses[i]).collect(),
        }
    }

    /// Palette colors as `[r, g, b]`, in descending order of mass.
    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    /// Pixel mass of each entry (same order as [`entries`](Self::entries)).
    pub fn masses(&self) -> &[u64] {
        &self.masses
    }

    /// Palette colors as `rgb::RGB<u8>`.
    pub fn colors(&self) -> impl Iterator<Item = rgb::RGB<u8>> + '_ {
        self.entries.iter().map(|&[r, g, b]| rgb::RGB { r, g, b })
    }

    /// The heaviest color, if any.
    pub fn dominant(&self) -> Option<[u8; 3]> {
        self.entries.first().copied()
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries rendered as lowercase `#rrggbb` strings.
    pub fn hex_strings(&self) -> Vec<String> {
        self.entries.iter().map(|&c| to_hex(c)).collect()
    }

    /// Entry `i` as a lowercase `#rrggbb` string, or `None` past the end.
    pub fn to_hex_string(&self, i: usize) -> Option<String> {
        self.entries.get(i).map(|&c| to_hex(c))
    }
}

/// Render a color as a lowercase `#rrggbb` string.
pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
