use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use fxgraph::{
    ExposureSettings, FxaaQuality, Palette, PaletteLookup, Settings, SpecialColormap,
    TonemapOperator, DEFAULT_COLORMAP, FIRST_SPECIAL_COLORMAP,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Post-processing settings file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FxConfig {
    pub version: u32,
    #[serde(default)]
    pub bloom: BloomSection,
    #[serde(default)]
    pub blur: BlurSection,
    #[serde(default)]
    pub lens: LensSection,
    #[serde(default)]
    pub fxaa: FxaaSection,
    #[serde(default)]
    pub tonemap: TonemapSection,
    #[serde(default)]
    pub exposure: ExposureSection,
    #[serde(default)]
    pub colormap: ColormapSection,
    #[serde(default)]
    pub palette: PaletteSection,
    #[serde(default)]
    pub debug: DebugSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BloomSection {
    pub enabled: bool,
    pub amount: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlurSection {
    /// Menu background blur; negative uses `game_default`.
    pub menu: f32,
    pub game_default: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LensSection {
    pub enabled: bool,
    pub k: f32,
    pub kcube: f32,
    pub chromatic: f32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FxaaSection {
    #[serde(default, deserialize_with = "deserialize_fxaa")]
    pub quality: FxaaQuality,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TonemapSection {
    #[serde(default, deserialize_with = "deserialize_tonemap")]
    pub operator: TonemapOperator,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExposureSection {
    pub base: f32,
    pub min: f32,
    pub scale: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ColormapSection {
    /// 0 for none, otherwise 1-based index into `special`.
    pub fixed: u32,
    /// Replaces the built-in special colormaps when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<Vec<ColormapEntry>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColormapEntry {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaletteSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<HexColor>>,
    pub reverse_lookup: bool,
    pub power: f32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugSection {
    pub ssao: bool,
}

/// `#rrggbb` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub [u8; 3]);

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl std::str::FromStr for HexColor {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{raw}'; expected #rrggbb"));
        }
        let channel = |index: usize| {
            u8::from_str_radix(&digits[index..index + 2], 16)
                .map_err(|err| format!("invalid colour '{raw}': {err}"))
        };
        Ok(HexColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Serialize for HexColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            bloom: BloomSection::default(),
            blur: BlurSection::default(),
            lens: LensSection::default(),
            fxaa: FxaaSection::default(),
            tonemap: TonemapSection::default(),
            exposure: ExposureSection::default(),
            colormap: ColormapSection::default(),
            palette: PaletteSection::default(),
            debug: DebugSection::default(),
        }
    }
}

impl Default for BloomSection {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            enabled: defaults.bloom,
            amount: defaults.bloom_amount,
        }
    }
}

impl Default for BlurSection {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            menu: defaults.menu_blur,
            game_default: defaults.game_blur_default,
        }
    }
}

impl Default for LensSection {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            enabled: defaults.lens,
            k: defaults.lens_k,
            kcube: defaults.lens_kcube,
            chromatic: defaults.lens_chromatic,
        }
    }
}

impl Default for ExposureSection {
    fn default() -> Self {
        let defaults = ExposureSettings::default();
        Self {
            base: defaults.base,
            min: defaults.min,
            scale: defaults.scale,
            speed: defaults.speed,
        }
    }
}

impl Default for PaletteSection {
    fn default() -> Self {
        let defaults = PaletteLookup::default();
        Self {
            colors: None,
            reverse_lookup: defaults.reverse,
            power: defaults.power,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Helper {
    Str(String),
    Num(i64),
}

fn deserialize_fxaa<'de, D>(deserializer: D) -> Result<FxaaQuality, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => raw,
        Helper::Num(value) => value.to_string(),
    };
    parse_fxaa(&raw).map_err(de::Error::custom)
}

fn deserialize_tonemap<'de, D>(deserializer: D) -> Result<TonemapOperator, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => raw,
        Helper::Num(value) => value.to_string(),
    };
    parse_tonemap(&raw).map_err(de::Error::custom)
}

pub fn parse_fxaa(raw: &str) -> Result<FxaaQuality, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "off" | "none" | "disabled" | "0" => Ok(FxaaQuality::Off),
        "low" | "1" => Ok(FxaaQuality::Low),
        "medium" | "2" => Ok(FxaaQuality::Medium),
        "high" | "3" => Ok(FxaaQuality::High),
        "extreme" | "4" => Ok(FxaaQuality::Extreme),
        other => Err(format!("invalid fxaa quality '{other}'")),
    }
}

pub fn parse_tonemap(raw: &str) -> Result<TonemapOperator, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "off" | "none" | "disabled" | "0" => Ok(TonemapOperator::None),
        "linear" | "1" => Ok(TonemapOperator::Linear),
        "reinhard" | "2" => Ok(TonemapOperator::Reinhard),
        "hejldawson" | "hejl-dawson" | "3" => Ok(TonemapOperator::HejlDawson),
        "uncharted2" | "4" => Ok(TonemapOperator::Uncharted2),
        "palette" | "5" => Ok(TonemapOperator::Palette),
        other => Err(format!("invalid tonemap operator '{other}'")),
    }
}

impl FxConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FxConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let finite = [
            ("bloom.amount", self.bloom.amount),
            ("blur.menu", self.blur.menu),
            ("blur.game_default", self.blur.game_default),
            ("lens.k", self.lens.k),
            ("lens.kcube", self.lens.kcube),
            ("lens.chromatic", self.lens.chromatic),
            ("exposure.base", self.exposure.base),
            ("exposure.min", self.exposure.min),
            ("exposure.scale", self.exposure.scale),
            ("exposure.speed", self.exposure.speed),
            ("palette.power", self.palette.power),
        ];
        for (key, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{key} must be a finite number")));
            }
        }

        if self.lens.chromatic <= 0.0 {
            return Err(ConfigError::Invalid("lens.chromatic must be > 0".into()));
        }

        if self.exposure.scale <= 0.0 {
            return Err(ConfigError::Invalid("exposure.scale must be > 0".into()));
        }

        if !(0.0..=1.0).contains(&self.exposure.speed) {
            return Err(ConfigError::Invalid(
                "exposure.speed must be between 0 and 1".into(),
            ));
        }

        if self.palette.power <= 0.0 {
            return Err(ConfigError::Invalid("palette.power must be > 0".into()));
        }

        if let Some(colors) = &self.palette.colors {
            if colors.is_empty() || colors.len() > 256 {
                return Err(ConfigError::Invalid(format!(
                    "palette.colors must hold 1 to 256 entries, found {}",
                    colors.len()
                )));
            }
        }

        if let Some(special) = &self.colormap.special {
            for (index, entry) in special.iter().enumerate() {
                if entry.start.iter().chain(&entry.end).any(|v| !v.is_finite()) {
                    return Err(ConfigError::Invalid(format!(
                        "colormap.special[{index}] must contain finite values"
                    )));
                }
            }
        }

        let available = self.special_colormaps().len() as u32;
        let fixed = self.colormap.fixed;
        let special_range = FIRST_SPECIAL_COLORMAP..FIRST_SPECIAL_COLORMAP + available;
        if fixed != DEFAULT_COLORMAP && !special_range.contains(&fixed) {
            return Err(ConfigError::Invalid(format!(
                "colormap.fixed {fixed} is out of range; expected 0 or 1..={available}"
            )));
        }

        Ok(())
    }

    fn special_colormaps(&self) -> Vec<SpecialColormap> {
        match &self.colormap.special {
            Some(entries) => entries
                .iter()
                .map(|entry| SpecialColormap::new(entry.start, entry.end))
                .collect(),
            None => SpecialColormap::builtin(),
        }
    }

    pub fn into_settings(self) -> Settings {
        let special_colormaps = self.special_colormaps();
        let palette = match &self.palette.colors {
            Some(colors) => Palette::new(colors.iter().map(|color| color.0).collect()),
            None => Palette::default(),
        };

        Settings {
            bloom: self.bloom.enabled,
            bloom_amount: self.bloom.amount,
            menu_blur: self.blur.menu,
            game_blur_default: self.blur.game_default,
            ssao_debug: self.debug.ssao,
            lens: self.lens.enabled,
            lens_k: self.lens.k,
            lens_kcube: self.lens.kcube,
            lens_chromatic: self.lens.chromatic,
            fxaa: self.fxaa.quality,
            tonemap: self.tonemap.operator,
            exposure: ExposureSettings {
                base: self.exposure.base,
                min: self.exposure.min,
                scale: self.exposure.scale,
                speed: self.exposure.speed,
            },
            fixed_colormap: self.colormap.fixed,
            special_colormaps,
            palette,
            palette_lookup: PaletteLookup {
                reverse: self.palette.reverse_lookup,
                power: self.palette.power,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r##"
version = 1

[bloom]
enabled = true
amount = 2.0

[blur]
menu = -1
game_default = 0.5

[lens]
enabled = true
chromatic = 1.2

[fxaa]
quality = "medium"

[tonemap]
operator = 5

[exposure]
speed = 0.1

[colormap]
fixed = 2

[[colormap.special]]
start = [1.0, 1.0, 1.0]
end = [0.0, 0.0, 0.0]

[[colormap.special]]
start = [0.0, 0.0, 0.0]
end = [1.5, 0.75, 0.0]

[palette]
colors = ["#000000", "#ff8000", "#FFFFFF"]
reverse_lookup = false
"##;

    #[test]
    fn parses_sample_config() {
        let config = FxConfig::from_toml_str(SAMPLE).expect("parse config");
        let settings = config.into_settings();
        assert!(settings.bloom);
        assert_eq!(settings.bloom_amount, 2.0);
        assert_eq!(settings.resolved_menu_blur(), 0.5);
        assert!(settings.lens);
        assert_eq!(settings.lens_k, Settings::default().lens_k);
        assert_eq!(settings.lens_chromatic, 1.2);
        assert_eq!(settings.fxaa, FxaaQuality::Medium);
        assert_eq!(settings.tonemap, TonemapOperator::Palette);
        assert_eq!(settings.exposure.speed, 0.1);
        assert_eq!(settings.exposure.base, ExposureSettings::default().base);
        assert_eq!(settings.special_colormaps.len(), 2);
        assert_eq!(
            settings.active_special_colormap().map(|map| map.end),
            Some([1.5, 0.75, 0.0])
        );
        assert_eq!(settings.palette.colors(), &[[0, 0, 0], [255, 128, 0], [255, 255, 255]]);
        assert!(!settings.palette_lookup.reverse);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = FxConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.into_settings(), Settings::default());
    }

    #[test]
    fn enum_parsing_is_tolerant() {
        for (raw, expected) in [
            ("quality = \"OFF\"", FxaaQuality::Off),
            ("quality = \"none\"", FxaaQuality::Off),
            ("quality = 0", FxaaQuality::Off),
            ("quality = 4", FxaaQuality::Extreme),
            ("quality = \" High \"", FxaaQuality::High),
        ] {
            let config =
                FxConfig::from_toml_str(&format!("version = 1\n[fxaa]\n{raw}\n")).unwrap();
            assert_eq!(config.fxaa.quality, expected, "{raw}");
        }
        assert_eq!(parse_tonemap("hejl-dawson"), Ok(TonemapOperator::HejlDawson));
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let err = FxConfig::from_toml_str("version = 1\n[tonemap]\noperator = 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err =
            FxConfig::from_toml_str("version = 1\n[fxaa]\nquality = \"ultra\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_out_of_range_values() {
        for body in [
            "version = 2",
            "version = 1\n[colormap]\nfixed = 99\n",
            "version = 1\n[exposure]\nspeed = 1.5\n",
            "version = 1\n[lens]\nchromatic = 0.0\n",
            "version = 1\n[palette]\npower = -1.0\n",
            "version = 1\n[palette]\ncolors = []\n",
            "version = 1\n[bloom]\namount = nan\n",
        ] {
            let err = FxConfig::from_toml_str(body).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{body}: {err}");
        }
    }

    #[test]
    fn rejects_malformed_colours() {
        let err = FxConfig::from_toml_str("version = 1\n[palette]\ncolors = [\"#12345\"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn hex_colour_round_trips_through_display() {
        let color: HexColor = "#0a0B0c".parse().unwrap();
        assert_eq!(color, HexColor([10, 11, 12]));
        assert_eq!(color.to_string(), "#0a0b0c");
    }

    #[test]
    fn loads_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("postfx.toml");
        fs::write(&path, SAMPLE).unwrap();
        let config = FxConfig::from_path(&path).unwrap();
        assert!(config.bloom.enabled);

        let err = FxConfig::from_path(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = FxConfig::from_toml_str(SAMPLE).unwrap();
        let text = toml::to_string(&config).unwrap();
        let reparsed = FxConfig::from_toml_str(&text).unwrap();
        assert_eq!(reparsed.into_settings(), config.into_settings());
    }
}
