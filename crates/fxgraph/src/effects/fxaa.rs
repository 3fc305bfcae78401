use crate::context::PipelineContext;
use crate::registry::ShaderDescriptor;
use crate::settings::{FxaaQuality, Settings};
use crate::step::{EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo, TargetCaps, MIN_GLSL_VERSION};
use crate::uniforms::{FxaaUniforms, UniformBlock};

pub const APPLY_FXAA: &str = "ApplyFXAA";
pub const FXAA_LUMA: &str = "FXAALuma";

const GATHER4_VERSION: u32 = 400;

/// Shader name for a quality preset; `None` when FXAA is off.
pub fn fxaa_shader_name(quality: FxaaQuality) -> Option<&'static str> {
    match quality {
        FxaaQuality::Off => None,
        FxaaQuality::Low => Some("FXAA.Low"),
        FxaaQuality::Medium => Some("FXAA.Medium"),
        FxaaQuality::High => Some("FXAA.High"),
        FxaaQuality::Extreme => Some("FXAA.Extreme"),
    }
}

/// Shader-language version the FXAA preset programs are declared with. The
/// luma pass needs no gather4 and keeps the default version.
pub fn fxaa_version(caps: TargetCaps) -> u32 {
    if caps.glsl_version >= GATHER4_VERSION {
        GATHER4_VERSION
    } else {
        MIN_GLSL_VERSION
    }
}

pub fn fxaa_defines(preset: u32, caps: TargetCaps) -> String {
    let gather4 = u32::from(caps.glsl_version >= GATHER4_VERSION);
    format!("#define FXAA_QUALITY__PRESET {preset}\n#define FXAA_GATHER4_ALPHA {gather4}\n")
}

#[derive(Debug, Default)]
pub struct Fxaa;

impl Fxaa {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        let caps = ctx.caps();
        let version = fxaa_version(caps);
        let shaders = ctx.shaders_mut();

        shaders.declare(
            FXAA_LUMA,
            ShaderDescriptor::new("shaders/postfx/fxaa.fp")
                .with_defines("#define FXAA_LUMA_PASS\n"),
        );

        for quality in FxaaQuality::ENABLED {
            let (Some(name), Some(preset)) = (fxaa_shader_name(quality), quality.preset()) else {
                continue;
            };
            shaders.declare(
                name,
                ShaderDescriptor::new("shaders/postfx/fxaa.fp")
                    .with_defines(fxaa_defines(preset, caps))
                    .with_uniforms(FxaaUniforms::LAYOUT)
                    .with_version(version),
            );
        }
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
        let Some(shader) = fxaa_shader_name(settings.fxaa) else {
            return EffectList::disabled(APPLY_FXAA);
        };
        let viewport = frame.screen_viewport;
        if viewport.is_empty() {
            tracing::debug!(?viewport, "empty screen viewport; FXAA skipped");
            return EffectList::disabled(APPLY_FXAA);
        }

        let uniforms = FxaaUniforms {
            reciprocal_resolution: [1.0 / viewport.width as f32, 1.0 / viewport.height as f32],
            padding: [0.0; 2],
        };

        let steps = vec![
            Step::new(FXAA_LUMA, viewport)
                .input_current(0, FilterMode::Nearest)
                .blend(BlendMode::None),
            Step::new(shader, viewport)
                .uniforms(&uniforms)
                .input_current(0, FilterMode::Linear)
                .blend(BlendMode::None),
        ];
        EffectList::new(APPLY_FXAA, steps)
    }
}
