use crate::context::PipelineContext;
use crate::registry::ShaderDescriptor;
use crate::settings::Settings;
use crate::step::{EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo};
use crate::uniforms::{LensUniforms, UniformBlock};

pub const LENS_DISTORT_SCENE: &str = "LensDistortScene";
pub const LENS: &str = "Lens";

/// Per-channel quadratic and cubic distortion terms. Channel `i` is scaled by
/// `chromatic^i`; the fourth lane is unused.
pub fn distortion_coefficients(k: f32, kcube: f32, chromatic: f32) -> ([f32; 4], [f32; 4]) {
    let mut quadratic = [0.0f32; 4];
    let mut cubic = [0.0f32; 4];
    let mut factor = 1.0f32;
    for i in 0..3 {
        quadratic[i] = k * factor;
        cubic[i] = kcube * factor;
        factor *= chromatic;
    }
    (quadratic, cubic)
}

/// Zoom that keeps the distorted image covering the screen corners.
pub fn lens_scale(aspect: f32, quadratic: &[f32; 4], cubic: &[f32; 4]) -> f32 {
    let r2 = aspect * aspect * 0.25 + 0.25;
    let sqrt_r2 = r2.sqrt();
    let f0 = 1.0 + (r2 * (quadratic[0] + cubic[0] * sqrt_r2)).max(0.0);
    let f2 = 1.0 + (r2 * (quadratic[2] + cubic[2] * sqrt_r2)).max(0.0);
    1.0 / f0.max(f2).max(1.0)
}

#[derive(Debug, Default)]
pub struct LensDistort;

impl LensDistort {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        ctx.shaders_mut().declare(
            LENS,
            ShaderDescriptor::new("shaders/postfx/lensdistortion.fp")
                .with_uniforms(LensUniforms::LAYOUT),
        );
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
        if !settings.lens || frame.screen_viewport.is_empty() {
            return EffectList::disabled(LENS_DISTORT_SCENE);
        }
        let Some(aspect) = frame.scene_viewport.aspect() else {
            tracing::debug!(viewport = ?frame.scene_viewport, "empty scene viewport; lens distortion skipped");
            return EffectList::disabled(LENS_DISTORT_SCENE);
        };

        let (quadratic, cubic) =
            distortion_coefficients(settings.lens_k, settings.lens_kcube, settings.lens_chromatic);
        let uniforms = LensUniforms {
            aspect_ratio: aspect,
            scale: lens_scale(aspect, &quadratic, &cubic),
            padding: [0.0; 2],
            lens_distortion_coefficient: quadratic,
            cubic_distortion_value: cubic,
        };

        let step = Step::new(LENS, frame.screen_viewport)
            .uniforms(&uniforms)
            .input_current(0, FilterMode::Linear)
            .blend(BlendMode::None);
        EffectList::new(LENS_DISTORT_SCENE, vec![step])
    }
}
