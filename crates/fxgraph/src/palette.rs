//! Palette lookup table for the palette tone-mapping operator.
//!
//! The table maps every 6-bit-per-channel RGB triple to the closest colour of
//! a palette. The 64 x 64 x 64 RGBA entries are packed into a 512 x 512 texture:
//! entry `((r * 64 + g) * 64 + b)` starts at byte `entry * 4`.

use serde::Serialize;

/// Edge length of the square LUT texture.
pub const PALETTE_LUT_SIZE: u32 = 512;

const LUT_STEPS: usize = 64;

/// Up to 256 opaque RGB colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Builds a palette from at most 256 colours; extra entries are dropped.
    pub fn new(mut colors: Vec<[u8; 3]>) -> Self {
        colors.truncate(256);
        Self { colors }
    }

    /// 3-3-2 bit RGB palette covering the colour cube evenly.
    pub fn rgb332() -> Self {
        let colors = (0u16..256)
            .map(|index| {
                let r = ((index >> 5) & 0x7) as u32;
                let g = ((index >> 2) & 0x7) as u32;
                let b = (index & 0x3) as u32;
                [
                    (r * 255 / 7) as u8,
                    (g * 255 / 7) as u8,
                    (b * 255 / 3) as u8,
                ]
            })
            .collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::rgb332()
    }
}

/// Tuning for the nearest-colour search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaletteLookup {
    /// On ties prefer the highest palette index instead of the lowest.
    pub reverse: bool,
    /// Exponent applied to each normalised channel difference.
    pub power: f32,
}

impl Default for PaletteLookup {
    fn default() -> Self {
        Self {
            reverse: true,
            power: 2.0,
        }
    }
}

impl PaletteLookup {
    /// Replaces a non-finite or non-positive exponent with the default one.
    pub fn sanitized(self) -> Self {
        if self.power.is_finite() && self.power > 0.0 {
            self
        } else {
            Self {
                power: Self::default().power,
                ..self
            }
        }
    }
}

/// Widens a 6-bit channel value to 8 bits by replicating its top bits.
pub fn expand_6bit(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

/// Nearest-colour search with a precomputed per-difference cost table.
pub struct ColorMatcher {
    lookup: PaletteLookup,
    cost: [f64; 256],
}

impl ColorMatcher {
    pub fn new(lookup: PaletteLookup) -> Self {
        let mut cost = [0.0f64; 256];
        for (diff, slot) in cost.iter_mut().enumerate() {
            *slot = (diff as f64 / 255.0).powf(lookup.power as f64);
        }
        Self { lookup, cost }
    }

    /// Index of the palette entry closest to `rgb`, `None` for an empty palette.
    pub fn best(&self, palette: &Palette, rgb: [u8; 3]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, color) in palette.colors().iter().enumerate() {
            let distance = self.cost[rgb[0].abs_diff(color[0]) as usize]
                + self.cost[rgb[1].abs_diff(color[1]) as usize]
                + self.cost[rgb[2].abs_diff(color[2]) as usize];

            let better = match best {
                None => true,
                Some((_, best_distance)) if self.lookup.reverse => distance <= best_distance,
                Some((_, best_distance)) => distance < best_distance,
            };
            if better {
                if distance == 0.0 && !self.lookup.reverse {
                    return Some(index);
                }
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Builds the 512 x 512 RGBA8 lookup table for `palette`.
///
/// This walks all 262144 quantised colours against every palette entry, so
/// callers cache the result rather than rebuilding it per frame.
pub fn build_palette_lut(palette: &Palette, lookup: PaletteLookup) -> Vec<u8> {
    let matcher = ColorMatcher::new(lookup);
    let mut lut = vec![0u8; (PALETTE_LUT_SIZE * PALETTE_LUT_SIZE * 4) as usize];

    for r in 0..LUT_STEPS {
        for g in 0..LUT_STEPS {
            for b in 0..LUT_STEPS {
                let rgb = [
                    expand_6bit(r as u8),
                    expand_6bit(g as u8),
                    expand_6bit(b as u8),
                ];
                let color = matcher
                    .best(palette, rgb)
                    .map(|index| palette.colors()[index])
                    .unwrap_or([0, 0, 0]);
                let offset = ((r * LUT_STEPS + g) * LUT_STEPS + b) * 4;
                lut[offset..offset + 3].copy_from_slice(&color);
                lut[offset + 3] = 255;
            }
        }
    }

    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_lookup_keeps_valid_power() {
        let lookup = PaletteLookup {
            reverse: false,
            power: 1.5,
        };
        assert_eq!(lookup.sanitized(), lookup);

        for power in [f32::NAN, f32::INFINITY, 0.0, -3.0] {
            let fixed = PaletteLookup { reverse: false, power }.sanitized();
            assert_eq!(fixed.power, PaletteLookup::default().power);
            assert!(!fixed.reverse);
        }
    }

    #[test]
    fn expansion_covers_full_range() {
        assert_eq!(expand_6bit(0), 0);
        assert_eq!(expand_6bit(63), 255);
        assert_eq!(expand_6bit(32), 130);
    }

    #[test]
    fn rgb332_has_256_entries_with_extremes() {
        let palette = Palette::rgb332();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette.colors()[0], [0, 0, 0]);
        assert_eq!(palette.colors()[255], [255, 255, 255]);
    }

    #[test]
    fn matcher_picks_nearest_colour() {
        let palette = Palette::new(vec![[0, 0, 0], [255, 0, 0], [0, 0, 255]]);
        let matcher = ColorMatcher::new(PaletteLookup::default());
        assert_eq!(matcher.best(&palette, [200, 30, 10]), Some(1));
        assert_eq!(matcher.best(&palette, [10, 10, 220]), Some(2));
        assert_eq!(matcher.best(&palette, [5, 5, 5]), Some(0));
    }

    #[test]
    fn tie_breaking_follows_lookup_direction() {
        let palette = Palette::new(vec![[10, 10, 10], [10, 10, 10]]);
        let forward = ColorMatcher::new(PaletteLookup {
            reverse: false,
            power: 2.0,
        });
        let reverse = ColorMatcher::new(PaletteLookup {
            reverse: true,
            power: 2.0,
        });
        assert_eq!(forward.best(&palette, [10, 10, 10]), Some(0));
        assert_eq!(reverse.best(&palette, [10, 10, 10]), Some(1));
    }

    #[test]
    fn empty_palette_has_no_match() {
        let matcher = ColorMatcher::new(PaletteLookup::default());
        assert_eq!(matcher.best(&Palette::new(Vec::new()), [1, 2, 3]), None);
    }

    #[test]
    fn lut_maps_corners_to_palette_entries() {
        let palette = Palette::new(vec![[0, 0, 0], [255, 255, 255]]);
        let lut = build_palette_lut(&palette, PaletteLookup::default());
        assert_eq!(lut.len(), 512 * 512 * 4);
        assert_eq!(&lut[0..4], &[0, 0, 0, 255]);
        let last = lut.len() - 4;
        assert_eq!(&lut[last..], &[255, 255, 255, 255]);
        assert!(lut.chunks_exact(4).all(|px| px[3] == 255));
    }
}
