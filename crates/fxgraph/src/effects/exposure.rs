//! Auto-exposure: reduces scene luminance to a single texel the bloom and
//! tonemap passes read as the camera exposure.

use crate::context::PipelineContext;
use crate::registry::{ShaderDescriptor, TextureDescriptor};
use crate::settings::Settings;
use crate::step::{EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo, PixelFormat, Viewport};
use crate::uniforms::{ExposureCombineUniforms, ExtractUniforms, UniformBlock};

pub const UPDATE_CAMERA_EXPOSURE: &str = "UpdateCameraExposure";
/// 1x1 texture holding the smoothed exposure value.
pub const EXPOSURE_CAMERA_TEXTURE: &str = "Exposure.CameraTexture";

pub const EXPOSURE_EXTRACT: &str = "ExposureExtract";
pub const EXPOSURE_AVERAGE: &str = "ExposureAverage";
pub const EXPOSURE_COMBINE: &str = "ExposureCombine";

const LEVEL_PREFIX: &str = "Exposure.Level.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureLevel {
    pub viewport: Viewport,
    pub texture: String,
}

#[derive(Debug, Default)]
pub struct CameraExposure {
    levels: Vec<ExposureLevel>,
    /// Scene size the current pyramid was built for.
    built_for: Option<(i32, i32)>,
    first_frame: bool,
}

impl CameraExposure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> &[ExposureLevel] {
        &self.levels
    }

    /// True until the first combine after a pyramid rebuild has been emitted.
    pub fn is_first_frame(&self) -> bool {
        self.first_frame
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        let shaders = ctx.shaders_mut();
        shaders.declare(
            EXPOSURE_EXTRACT,
            ShaderDescriptor::new("shaders/postfx/exposureextract.fp")
                .with_uniforms(ExtractUniforms::LAYOUT),
        );
        shaders.declare(
            EXPOSURE_AVERAGE,
            ShaderDescriptor::new("shaders/postfx/exposureaverage.fp").with_version(400),
        );
        shaders.declare(
            EXPOSURE_COMBINE,
            ShaderDescriptor::new("shaders/postfx/exposurecombine.fp")
                .with_uniforms(ExposureCombineUniforms::LAYOUT),
        );
    }

    pub(crate) fn update_textures(&mut self, ctx: &mut PipelineContext, frame: &FrameInfo) {
        let size = (frame.scene_width, frame.scene_height);
        if self.built_for == Some(size) {
            return;
        }

        ctx.textures_mut().remove_prefixed(LEVEL_PREFIX);
        self.levels.clear();
        self.built_for = None;

        if !frame.has_scene() {
            tracing::debug!(
                width = frame.scene_width,
                height = frame.scene_height,
                "no scene; exposure pyramid cleared"
            );
            return;
        }

        let (mut width, mut height) = size;
        loop {
            width = (width / 2).max(1);
            height = (height / 2).max(1);

            let level = ExposureLevel {
                viewport: Viewport::sized(width, height),
                texture: format!("{LEVEL_PREFIX}{}", self.levels.len()),
            };
            ctx.textures_mut().declare(
                level.texture.clone(),
                TextureDescriptor::new(width as u32, height as u32, PixelFormat::R32f),
            );
            self.levels.push(level);

            if width == 1 && height == 1 {
                break;
            }
        }

        ctx.textures_mut().declare(
            EXPOSURE_CAMERA_TEXTURE,
            TextureDescriptor::new(1, 1, PixelFormat::R32f),
        );
        self.built_for = Some(size);
        self.first_frame = true;

        tracing::debug!(
            width = size.0,
            height = size.1,
            levels = self.levels.len(),
            "rebuilt exposure pyramid"
        );
    }

    pub(crate) fn update_steps(
        &mut self,
        ctx: &mut PipelineContext,
        settings: &Settings,
        frame: &FrameInfo,
    ) {
        let list = self.build_steps(settings, frame);
        ctx.publish(list);
    }

    fn build_steps(&mut self, settings: &Settings, frame: &FrameInfo) -> EffectList {
        if !settings.bloom && !settings.tonemap.is_enabled() {
            return EffectList::disabled(UPDATE_CAMERA_EXPOSURE);
        }
        let (Some(first), Some(last)) = (self.levels.first(), self.levels.last()) else {
            return EffectList::disabled(UPDATE_CAMERA_EXPOSURE);
        };

        let extract = ExtractUniforms {
            scale: frame.scene_scale,
            offset: frame.scene_offset,
        };

        let mut steps = Vec::with_capacity(self.levels.len() + 1);
        steps.push(
            Step::new(EXPOSURE_EXTRACT, first.viewport)
                .uniforms(&extract)
                .input_current(0, FilterMode::Linear)
                .output_texture(&first.texture)
                .blend(BlendMode::None),
        );

        for pair in self.levels.windows(2) {
            let (level, next) = (&pair[0], &pair[1]);
            steps.push(
                Step::new(EXPOSURE_AVERAGE, next.viewport)
                    .input_texture(0, &level.texture, FilterMode::Linear)
                    .output_texture(&next.texture)
                    .blend(BlendMode::None),
            );
        }

        let combine = ExposureCombineUniforms {
            exposure_base: settings.exposure.base,
            exposure_min: settings.exposure.min,
            exposure_scale: settings.exposure.scale,
            exposure_speed: settings.exposure.speed,
        };
        let blend = if self.first_frame {
            BlendMode::None
        } else {
            BlendMode::Alpha
        };
        steps.push(
            Step::new(EXPOSURE_COMBINE, Viewport::sized(1, 1))
                .uniforms(&combine)
                .input_texture(0, &last.texture, FilterMode::Linear)
                .output_texture(EXPOSURE_CAMERA_TEXTURE)
                .blend(blend),
        );
        self.first_frame = false;

        EffectList::new(UPDATE_CAMERA_EXPOSURE, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TonemapOperator;
    use crate::step::Binding;
    use crate::types::TargetCaps;

    fn bloom_on() -> Settings {
        Settings {
            bloom: true,
            ..Settings::default()
        }
    }

    fn prepared(width: i32, height: i32) -> (CameraExposure, PipelineContext, FrameInfo) {
        let mut ctx = PipelineContext::new(TargetCaps::default());
        let mut exposure = CameraExposure::new();
        exposure.declare_shaders(&mut ctx);
        let frame = FrameInfo::fullscreen(width, height);
        exposure.update_textures(&mut ctx, &frame);
        (exposure, ctx, frame)
    }

    #[test]
    fn pyramid_ends_at_single_texel() {
        for (width, height, expected) in [
            (1920, 1080, 10),
            (1, 1, 1),
            (2, 2, 1),
            (3, 1, 1),
            (4, 4, 2),
            (1, 1024, 10),
        ] {
            let (exposure, ctx, _) = prepared(width, height);
            let levels = exposure.levels();
            assert_eq!(levels.len(), expected, "{width}x{height}");
            assert_eq!(levels.last().unwrap().viewport, Viewport::sized(1, 1));
            assert!(ctx.textures().contains(EXPOSURE_CAMERA_TEXTURE));
        }
    }

    #[test]
    fn levels_halve_with_floor() {
        let (exposure, ctx, _) = prepared(7, 5);
        let sizes: Vec<_> = exposure
            .levels()
            .iter()
            .map(|level| (level.viewport.width, level.viewport.height))
            .collect();
        assert_eq!(sizes, vec![(3, 2), (1, 1)]);
        let desc = ctx.textures().get("Exposure.Level.0").unwrap();
        assert_eq!(desc.format, PixelFormat::R32f);
    }

    #[test]
    fn unchanged_size_keeps_first_frame_state() {
        let (mut exposure, mut ctx, frame) = prepared(640, 480);
        exposure.update_steps(&mut ctx, &bloom_on(), &frame);
        assert!(!exposure.is_first_frame());

        let generation = ctx.textures().generation("Exposure.Level.0");
        exposure.update_textures(&mut ctx, &frame);
        assert!(!exposure.is_first_frame());
        assert_eq!(ctx.textures().generation("Exposure.Level.0"), generation);
    }

    #[test]
    fn combine_blends_after_first_frame() {
        let (mut exposure, mut ctx, frame) = prepared(640, 480);
        let settings = bloom_on();

        exposure.update_steps(&mut ctx, &settings, &frame);
        let first = ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap().clone();
        exposure.update_steps(&mut ctx, &settings, &frame);
        let second = ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap();

        assert_eq!(first.last().unwrap().blend, BlendMode::None);
        assert_eq!(second.last().unwrap().blend, BlendMode::Alpha);
        assert_eq!(
            second.last().unwrap().output,
            Binding::texture(EXPOSURE_CAMERA_TEXTURE)
        );

        exposure.update_textures(&mut ctx, &FrameInfo::fullscreen(800, 600));
        exposure.update_steps(&mut ctx, &settings, &frame);
        let rebuilt = ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap();
        assert_eq!(rebuilt.last().unwrap().blend, BlendMode::None);
    }

    #[test]
    fn step_chain_walks_every_level() {
        let (mut exposure, mut ctx, frame) = prepared(64, 64);
        let settings = Settings {
            tonemap: TonemapOperator::Reinhard,
            ..Settings::default()
        };
        exposure.update_steps(&mut ctx, &settings, &frame);
        let list = ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap();
        let levels = exposure.levels();
        assert_eq!(list.len(), levels.len() + 1);
        assert_eq!(list.steps[0].shader, EXPOSURE_EXTRACT);
        assert_eq!(list.steps[0].inputs[0].binding, Binding::Current);
        for (step, pair) in list.steps[1..].iter().zip(levels.windows(2)) {
            assert_eq!(step.shader, EXPOSURE_AVERAGE);
            assert_eq!(step.viewport, pair[1].viewport);
        }
        let combine = list.last().unwrap();
        let uniforms: ExposureCombineUniforms = combine.uniforms.read().unwrap();
        assert_eq!(uniforms.exposure_base, settings.exposure.base);
    }

    #[test]
    fn disabled_without_consumers_or_scene() {
        let (mut exposure, mut ctx, frame) = prepared(640, 480);
        exposure.update_steps(&mut ctx, &Settings::default(), &frame);
        assert!(ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap().is_empty());
        assert!(exposure.is_first_frame());

        exposure.update_textures(&mut ctx, &FrameInfo::fullscreen(640, 0));
        assert!(exposure.levels().is_empty());
        assert!(!ctx.textures().contains("Exposure.Level.0"));
        exposure.update_steps(&mut ctx, &bloom_on(), &frame);
        assert!(ctx.effect_list(UPDATE_CAMERA_EXPOSURE).unwrap().is_empty());
    }
}
