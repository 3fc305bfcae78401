use serde::Serialize;

use crate::palette::{Palette, PaletteLookup};

/// Fixed colormap index meaning "no special colormap".
pub const DEFAULT_COLORMAP: u32 = 0;
/// Index of the first entry of [`Settings::special_colormaps`].
pub const FIRST_SPECIAL_COLORMAP: u32 = 1;

/// FXAA quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FxaaQuality {
    #[default]
    Off,
    Low,
    Medium,
    High,
    Extreme,
}

impl FxaaQuality {
    pub const ENABLED: [FxaaQuality; 4] = [
        FxaaQuality::Low,
        FxaaQuality::Medium,
        FxaaQuality::High,
        FxaaQuality::Extreme,
    ];

    /// Maps a numeric setting; unknown values disable FXAA.
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => FxaaQuality::Low,
            2 => FxaaQuality::Medium,
            3 => FxaaQuality::High,
            4 => FxaaQuality::Extreme,
            _ => FxaaQuality::Off,
        }
    }

    /// `FXAA_QUALITY__PRESET` value, `None` when FXAA is off.
    pub fn preset(self) -> Option<u32> {
        match self {
            FxaaQuality::Off => None,
            FxaaQuality::Low => Some(10),
            FxaaQuality::Medium => Some(12),
            FxaaQuality::High => Some(29),
            FxaaQuality::Extreme => Some(39),
        }
    }
}

/// Tone-mapping operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TonemapOperator {
    #[default]
    None,
    Linear,
    Reinhard,
    HejlDawson,
    Uncharted2,
    Palette,
}

impl TonemapOperator {
    /// Maps a numeric setting; unknown values disable tone mapping.
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => TonemapOperator::Linear,
            2 => TonemapOperator::Reinhard,
            3 => TonemapOperator::HejlDawson,
            4 => TonemapOperator::Uncharted2,
            5 => TonemapOperator::Palette,
            _ => TonemapOperator::None,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != TonemapOperator::None
    }
}

/// Auto-exposure parameters, read every time the exposure steps are rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureSettings {
    pub base: f32,
    pub min: f32,
    pub scale: f32,
    pub speed: f32,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            base: 0.35,
            min: 0.35,
            scale: 1.3,
            speed: 0.05,
        }
    }
}

/// Linear colour remap `start + color * (end - start)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpecialColormap {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

impl SpecialColormap {
    pub const fn new(start: [f32; 3], end: [f32; 3]) -> Self {
        Self { start, end }
    }

    /// Inverted grayscale followed by the tinted ramps.
    pub fn builtin() -> Vec<SpecialColormap> {
        vec![
            SpecialColormap::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
            SpecialColormap::new([0.0, 0.0, 0.0], [1.5, 0.75, 0.0]),
            SpecialColormap::new([0.0, 0.0, 0.0], [1.25, 1.5, 1.5]),
            SpecialColormap::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.5]),
            SpecialColormap::new([0.0, 0.0, 0.0], [1.5, 0.0, 0.0]),
            SpecialColormap::new([0.0, 0.0, 0.0], [0.0, 1.5, 0.0]),
            SpecialColormap::new([0.0, 0.0, 0.0], [1.5, 0.75, 0.0]),
        ]
    }
}

/// Flat view of every live setting the post-processing graph depends on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub bloom: bool,
    pub bloom_amount: f32,
    /// Menu background blur; negative means "use `game_blur_default`".
    pub menu_blur: f32,
    pub game_blur_default: f32,
    /// SSAO debug overlay; bloom is suppressed while it is shown.
    pub ssao_debug: bool,
    pub lens: bool,
    pub lens_k: f32,
    pub lens_kcube: f32,
    pub lens_chromatic: f32,
    pub fxaa: FxaaQuality,
    pub tonemap: TonemapOperator,
    pub exposure: ExposureSettings,
    /// [`DEFAULT_COLORMAP`] or `FIRST_SPECIAL_COLORMAP + i` for special colormap `i`.
    pub fixed_colormap: u32,
    pub special_colormaps: Vec<SpecialColormap>,
    pub palette: Palette,
    pub palette_lookup: PaletteLookup,
}

impl Settings {
    /// The special colormap selected by `fixed_colormap`, if any.
    pub fn active_special_colormap(&self) -> Option<&SpecialColormap> {
        let index = self.fixed_colormap.checked_sub(FIRST_SPECIAL_COLORMAP)?;
        self.special_colormaps.get(index as usize)
    }

    /// Menu blur amount after applying the game default for negative values.
    pub fn resolved_menu_blur(&self) -> f32 {
        if self.menu_blur < 0.0 {
            self.game_blur_default
        } else {
            self.menu_blur
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bloom: false,
            bloom_amount: 1.4,
            menu_blur: -1.0,
            game_blur_default: 0.0,
            ssao_debug: false,
            lens: false,
            lens_k: -0.12,
            lens_kcube: 0.1,
            lens_chromatic: 1.12,
            fxaa: FxaaQuality::Off,
            tonemap: TonemapOperator::None,
            exposure: ExposureSettings::default(),
            fixed_colormap: DEFAULT_COLORMAP,
            special_colormaps: SpecialColormap::builtin(),
            palette: Palette::default(),
            palette_lookup: PaletteLookup::default(),
        }
    }
}
