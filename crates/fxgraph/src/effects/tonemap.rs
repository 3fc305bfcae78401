use std::sync::Arc;

use crate::context::PipelineContext;
use crate::palette::{build_palette_lut, Palette, PaletteLookup, PALETTE_LUT_SIZE};
use crate::registry::{ShaderDescriptor, TextureDescriptor};
use crate::settings::{Settings, TonemapOperator};
use crate::step::{EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo, PixelFormat};

pub const TONEMAP_SCENE: &str = "TonemapScene";
/// Palette lookup texture bound at slot 1 by the palette operator.
pub const PALETTE_TEXTURE: &str = "Tonemap.Palette";

const OPERATORS: [(TonemapOperator, &str, &str); 5] = [
    (TonemapOperator::Linear, "Tonemap.Linear", "#define LINEAR\n"),
    (TonemapOperator::Reinhard, "Tonemap.Reinhard", "#define REINHARD\n"),
    (TonemapOperator::HejlDawson, "Tonemap.HejlDawson", "#define HEJLDAWSON\n"),
    (TonemapOperator::Uncharted2, "Tonemap.Uncharted2", "#define UNCHARTED2\n"),
    (TonemapOperator::Palette, "Tonemap.Palette", "#define PALETTE\n"),
];

/// Shader implementing `operator`, `None` when tone mapping is off.
pub fn tonemap_shader_name(operator: TonemapOperator) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|(candidate, _, _)| *candidate == operator)
        .map(|(_, name, _)| *name)
}

#[derive(Debug)]
struct CachedLut {
    palette: Palette,
    lookup: PaletteLookup,
    data: Arc<[u8]>,
}

#[derive(Debug, Default)]
pub struct Tonemap {
    lut: Option<CachedLut>,
}

impl Tonemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached palette LUT; the next palette-operator update rebuilds it.
    pub fn invalidate(&mut self) {
        self.lut = None;
    }

    /// Payload of the cached LUT, if one has been built.
    pub fn cached_lut(&self) -> Option<&Arc<[u8]>> {
        self.lut.as_ref().map(|cached| &cached.data)
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        for (_, name, defines) in OPERATORS {
            ctx.shaders_mut().declare(
                name,
                ShaderDescriptor::new("shaders/postfx/tonemap.fp").with_defines(defines),
            );
        }
    }

    pub(crate) fn update_textures(&mut self, ctx: &mut PipelineContext, settings: &Settings) {
        if settings.tonemap != TonemapOperator::Palette {
            return;
        }

        let data = self.palette_lut(&settings.palette, settings.palette_lookup.sanitized());
        ctx.textures_mut().declare(
            PALETTE_TEXTURE,
            TextureDescriptor::new(PALETTE_LUT_SIZE, PALETTE_LUT_SIZE, PixelFormat::Rgba8)
                .with_data(data),
        );
    }

    fn palette_lut(&mut self, palette: &Palette, lookup: PaletteLookup) -> Arc<[u8]> {
        if let Some(cached) = &self.lut {
            if cached.palette == *palette && cached.lookup == lookup {
                return Arc::clone(&cached.data);
            }
        }

        tracing::debug!(
            colors = palette.len(),
            reverse = lookup.reverse,
            power = lookup.power,
            "building palette lookup table"
        );
        let data: Arc<[u8]> = build_palette_lut(palette, lookup).into();
        self.lut = Some(CachedLut {
            palette: palette.clone(),
            lookup,
            data: Arc::clone(&data),
        });
        data
    }

    pub(crate) fn update_steps(
        &mut self,
        ctx: &mut PipelineContext,
        settings: &Settings,
        frame: &FrameInfo,
    ) {
        ctx.publish(self.build_steps(settings, frame));
    }

    fn build_steps(&self, settings: &Settings, frame: &FrameInfo) -> EffectList {
        let Some(shader) = tonemap_shader_name(settings.tonemap) else {
            return EffectList::disabled(TONEMAP_SCENE);
        };
        if frame.screen_viewport.is_empty() {
            return EffectList::disabled(TONEMAP_SCENE);
        }

        let mut step = Step::new(shader, frame.screen_viewport)
            .input_current(0, FilterMode::Nearest)
            .blend(BlendMode::None);
        if settings.tonemap == TonemapOperator::Palette {
            step = step.input_texture(1, PALETTE_TEXTURE, FilterMode::Nearest);
        }
        EffectList::new(TONEMAP_SCENE, vec![step])
    }
}
