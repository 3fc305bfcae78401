//! Bloom and the ambient menu blur.
//!
//! Both effects share one pyramid of half-resolution levels. Each level owns a
//! "vertical" and a "horizontal" texture that the separable blur ping-pongs
//! between:
//!
//! ```text
//!   scene ─extract─▶ L0.V ─blurH─▶ L0.H ─blurV─▶ L1.V ─ ... ─▶ L(n-1).V
//!                                                                  │
//!   scene ◀─combine(+)─ L0.V ◀─combine─ ... ◀─combine─ blurred L(n-1).V
//! ```

use crate::context::PipelineContext;
use crate::registry::{ShaderDescriptor, TextureDescriptor};
use crate::settings::{Settings, DEFAULT_COLORMAP};
use crate::step::{Binding, EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo, PixelFormat, Viewport};
use crate::uniforms::{BlurUniforms, ExtractUniforms, UniformBlock};

use super::exposure::EXPOSURE_CAMERA_TEXTURE;

/// Levels in the bloom pyramid.
pub const NUM_BLOOM_LEVELS: usize = 4;
/// Levels the menu blur walks; must not exceed [`NUM_BLOOM_LEVELS`].
pub const MENU_BLUR_LEVELS: usize = 3;

pub const BLOOM_SCENE: &str = "BloomScene";
pub const BLUR_SCENE: &str = "BlurScene";

pub const BLOOM_EXTRACT: &str = "BloomExtract";
pub const BLOOM_COMBINE: &str = "BloomCombine";
pub const BLUR_VERTICAL: &str = "BlurVertical";
pub const BLUR_HORIZONTAL: &str = "BlurHorizontal";

const TEXTURE_PREFIX: &str = "Bloom.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomLevel {
    pub viewport: Viewport,
    pub vertical: String,
    pub horizontal: String,
}

#[derive(Debug, Default)]
pub struct Bloom {
    levels: Vec<BloomLevel>,
}

impl Bloom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> &[BloomLevel] {
        &self.levels
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        let shaders = ctx.shaders_mut();
        shaders.declare(
            BLOOM_COMBINE,
            ShaderDescriptor::new("shaders/postfx/bloomcombine.fp"),
        );
        shaders.declare(
            BLOOM_EXTRACT,
            ShaderDescriptor::new("shaders/postfx/bloomextract.fp")
                .with_uniforms(ExtractUniforms::LAYOUT),
        );
        shaders.declare(
            BLUR_VERTICAL,
            ShaderDescriptor::new("shaders/postfx/blur.fp")
                .with_defines("#define BLUR_VERTICAL\n")
                .with_uniforms(BlurUniforms::LAYOUT),
        );
        shaders.declare(
            BLUR_HORIZONTAL,
            ShaderDescriptor::new("shaders/postfx/blur.fp")
                .with_defines("#define BLUR_HORIZONTAL\n")
                .with_uniforms(BlurUniforms::LAYOUT),
        );
    }

    pub(crate) fn update_textures(&mut self, ctx: &mut PipelineContext, frame: &FrameInfo) {
        if !frame.has_scene() {
            if !self.levels.is_empty() {
                tracing::debug!(
                    width = frame.scene_width,
                    height = frame.scene_height,
                    "no scene; releasing bloom pyramid"
                );
            }
            self.levels.clear();
            ctx.textures_mut().remove_prefixed(TEXTURE_PREFIX);
            return;
        }

        let mut width = half_rounded_up(frame.scene_width);
        let mut height = half_rounded_up(frame.scene_height);
        let mut levels = Vec::with_capacity(NUM_BLOOM_LEVELS);

        for index in 0..NUM_BLOOM_LEVELS {
            width = half_rounded_up(width);
            height = half_rounded_up(height);
            let level = BloomLevel {
                viewport: Viewport::sized(width, height),
                vertical: format!("Bloom.VTexture.{index}"),
                horizontal: format!("Bloom.HTexture.{index}"),
            };

            let descriptor = TextureDescriptor::new(width as u32, height as u32, PixelFormat::Rgba16f);
            ctx.textures_mut()
                .declare(level.vertical.clone(), descriptor.clone());
            ctx.textures_mut().declare(level.horizontal.clone(), descriptor);
            levels.push(level);
        }

        if levels != self.levels {
            tracing::debug!(
                scene_width = frame.scene_width,
                scene_height = frame.scene_height,
                top = ?levels.first().map(|level| level.viewport),
                "rebuilt bloom pyramid"
            );
        }
        self.levels = levels;
    }

    pub(crate) fn update_steps(
        &mut self,
        ctx: &mut PipelineContext,
        settings: &Settings,
        frame: &FrameInfo,
    ) {
        ctx.publish(self.build_bloom_steps(settings, frame));
        self.update_blur_steps(ctx, settings, frame);
    }

    /// Rebuilds the menu background blur. Runs with every bloom update but is
    /// applied by the executor only while a menu is open.
    pub(crate) fn update_blur_steps(
        &self,
        ctx: &mut PipelineContext,
        settings: &Settings,
        frame: &FrameInfo,
    ) {
        ctx.publish(self.build_blur_steps(settings, frame));
    }

    fn build_bloom_steps(&self, settings: &Settings, frame: &FrameInfo) -> EffectList {
        if !settings.bloom
            || settings.fixed_colormap != DEFAULT_COLORMAP
            || settings.ssao_debug
            || !frame.has_scene()
            || self.levels.len() < NUM_BLOOM_LEVELS
        {
            return EffectList::disabled(BLOOM_SCENE);
        }

        let Some(blur) = BlurUniforms::from_blur_amount(settings.bloom_amount) else {
            tracing::debug!(amount = settings.bloom_amount, "non-positive bloom amount; bloom disabled");
            return EffectList::disabled(BLOOM_SCENE);
        };

        let extract = ExtractUniforms {
            scale: frame.scene_scale,
            offset: frame.scene_offset,
        };
        let level0 = &self.levels[0];

        let mut steps = Vec::new();
        steps.push(
            Step::new(BLOOM_EXTRACT, level0.viewport)
                .uniforms(&extract)
                .input_current(0, FilterMode::Linear)
                .input_texture(1, EXPOSURE_CAMERA_TEXTURE, FilterMode::Nearest)
                .output_texture(&level0.vertical)
                .blend(BlendMode::None),
        );

        push_pyramid_blur(&mut steps, &self.levels, &blur);

        steps.push(
            Step::new(BLOOM_COMBINE, frame.scene_viewport)
                .input_texture(0, &level0.vertical, FilterMode::Linear)
                .output(Binding::Current)
                .blend(BlendMode::Additive),
        );

        EffectList::new(BLOOM_SCENE, steps)
    }

    fn build_blur_steps(&self, settings: &Settings, frame: &FrameInfo) -> EffectList {
        let amount = settings.resolved_menu_blur();
        if amount <= 0.0 || self.levels.len() < MENU_BLUR_LEVELS {
            return EffectList::disabled(BLUR_SCENE);
        }
        let Some(blur) = BlurUniforms::from_blur_amount(amount) else {
            return EffectList::disabled(BLUR_SCENE);
        };

        let levels = &self.levels[..MENU_BLUR_LEVELS];
        let level0 = &levels[0];

        let mut steps = Vec::new();
        steps.push(
            Step::new(BLOOM_COMBINE, level0.viewport)
                .input_current(0, FilterMode::Linear)
                .output_texture(&level0.vertical)
                .blend(BlendMode::None),
        );

        push_pyramid_blur(&mut steps, levels, &blur);

        steps.push(
            Step::new(BLOOM_COMBINE, frame.screen_viewport)
                .input_texture(0, &level0.vertical, FilterMode::Linear)
                .output(Binding::Current)
                .blend(BlendMode::None),
        );

        EffectList::new(BLUR_SCENE, steps)
    }
}

/// Blurs `levels[0].vertical` down the pyramid and back up again, leaving the
/// accumulated result in `levels[0].vertical`.
fn push_pyramid_blur(steps: &mut Vec<Step>, levels: &[BloomLevel], blur: &BlurUniforms) {
    for pair in levels.windows(2) {
        let (level, next) = (&pair[0], &pair[1]);
        steps.push(blur_step(blur, &level.vertical, &level.horizontal, level.viewport, false));
        steps.push(blur_step(blur, &level.horizontal, &next.vertical, next.viewport, true));
    }

    for pair in levels.windows(2).rev() {
        let (next, level) = (&pair[0], &pair[1]);
        steps.push(blur_step(blur, &level.vertical, &level.horizontal, level.viewport, false));
        steps.push(blur_step(blur, &level.horizontal, &level.vertical, level.viewport, true));

        steps.push(
            Step::new(BLOOM_COMBINE, next.viewport)
                .input_texture(0, &level.vertical, FilterMode::Linear)
                .output_texture(&next.vertical)
                .blend(BlendMode::None),
        );
    }

    if let Some(level0) = levels.first() {
        steps.push(blur_step(blur, &level0.vertical, &level0.horizontal, level0.viewport, false));
        steps.push(blur_step(blur, &level0.horizontal, &level0.vertical, level0.viewport, true));
    }
}

fn blur_step(
    blur: &BlurUniforms,
    input: &str,
    output: &str,
    viewport: Viewport,
    vertical: bool,
) -> Step {
    let shader = if vertical { BLUR_VERTICAL } else { BLUR_HORIZONTAL };
    Step::new(shader, viewport)
        .uniforms(blur)
        .input_texture(0, input, FilterMode::Nearest)
        .output_texture(output)
        .blend(BlendMode::None)
}

/// `ceil(v / 2)` for non-negative sizes, without the `v + 1` overflow.
fn half_rounded_up(v: i32) -> i32 {
    v / 2 + v % 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetCaps;

    fn prepared(width: i32, height: i32) -> (Bloom, PipelineContext, FrameInfo) {
        let mut ctx = PipelineContext::new(TargetCaps::default());
        let mut bloom = Bloom::new();
        bloom.declare_shaders(&mut ctx);
        let frame = FrameInfo::fullscreen(width, height);
        bloom.update_textures(&mut ctx, &frame);
        (bloom, ctx, frame)
    }

    #[test]
    fn pyramid_halves_from_half_resolution() {
        let (bloom, ctx, _) = prepared(1920, 1080);
        let sizes: Vec<_> = bloom
            .levels()
            .iter()
            .map(|level| (level.viewport.width, level.viewport.height))
            .collect();
        assert_eq!(sizes, vec![(480, 270), (240, 135), (120, 68), (60, 34)]);
        let desc = ctx.textures().get("Bloom.HTexture.2").unwrap();
        assert_eq!((desc.width, desc.height), (120, 68));
        assert_eq!(desc.format, PixelFormat::Rgba16f);
    }

    #[test]
    fn odd_sizes_round_up() {
        let (bloom, _, _) = prepared(3, 1);
        for level in bloom.levels() {
            assert_eq!(level.viewport, Viewport::sized(1, 1));
        }
    }

    #[test]
    fn largest_scene_width_does_not_overflow() {
        let (bloom, _, _) = prepared(i32::MAX, 1080);
        let top = bloom.levels()[0].viewport;
        assert_eq!((top.width, top.height), (536_870_912, 270));
        assert_eq!(half_rounded_up(i32::MAX), 1 << 30);
        assert_eq!(half_rounded_up(0), 0);
    }

    #[test]
    fn bloom_steps_follow_pyramid_order() {
        let (mut bloom, mut ctx, frame) = prepared(640, 480);
        let settings = Settings {
            bloom: true,
            ..Settings::default()
        };
        bloom.update_steps(&mut ctx, &settings, &frame);
        let list = ctx.effect_list(BLOOM_SCENE).unwrap();

        // extract + 2 per downsample + 3 per upsample + final blur pair + combine
        let n = NUM_BLOOM_LEVELS;
        assert_eq!(list.len(), 1 + 2 * (n - 1) + 3 * (n - 1) + 2 + 1);

        let first = &list.steps[0];
        assert_eq!(first.shader, BLOOM_EXTRACT);
        assert_eq!(first.inputs[0].binding, Binding::Current);
        assert_eq!(first.inputs[0].filter, FilterMode::Linear);
        assert_eq!(first.inputs[1].binding, Binding::texture(EXPOSURE_CAMERA_TEXTURE));
        assert_eq!(first.output, Binding::texture("Bloom.VTexture.0"));

        assert_eq!(list.steps[1].shader, BLUR_HORIZONTAL);
        assert_eq!(list.steps[2].shader, BLUR_VERTICAL);
        assert_eq!(list.steps[2].output, Binding::texture("Bloom.VTexture.1"));
        assert_eq!(list.steps[2].viewport, bloom.levels()[1].viewport);

        let last = list.last().unwrap();
        assert_eq!(last.shader, BLOOM_COMBINE);
        assert_eq!(last.output, Binding::Current);
        assert_eq!(last.blend, BlendMode::Additive);
        assert_eq!(last.viewport, frame.scene_viewport);
    }

    #[test]
    fn fixed_colormap_or_ssao_debug_suppress_bloom() {
        let (mut bloom, mut ctx, frame) = prepared(640, 480);
        for settings in [
            Settings {
                bloom: true,
                fixed_colormap: 1,
                ..Settings::default()
            },
            Settings {
                bloom: true,
                ssao_debug: true,
                ..Settings::default()
            },
            Settings {
                bloom: true,
                bloom_amount: 0.0,
                ..Settings::default()
            },
        ] {
            bloom.update_steps(&mut ctx, &settings, &frame);
            assert!(ctx.effect_list(BLOOM_SCENE).unwrap().is_empty());
        }
    }

    #[test]
    fn empty_scene_releases_textures() {
        let (mut bloom, mut ctx, _) = prepared(640, 480);
        assert!(ctx.textures().contains("Bloom.VTexture.0"));
        bloom.update_textures(&mut ctx, &FrameInfo::fullscreen(0, 480));
        assert!(bloom.levels().is_empty());
        assert!(ctx.textures().iter().all(|(name, _)| !name.starts_with("Bloom.")));
    }

    #[test]
    fn menu_blur_uses_three_levels_and_screen_viewport() {
        let (mut bloom, mut ctx, frame) = prepared(800, 600);
        let settings = Settings {
            menu_blur: 1.0,
            ..Settings::default()
        };
        bloom.update_steps(&mut ctx, &settings, &frame);
        let list = ctx.effect_list(BLUR_SCENE).unwrap();
        let n = MENU_BLUR_LEVELS;
        assert_eq!(list.len(), 1 + 2 * (n - 1) + 3 * (n - 1) + 2 + 1);
        assert!(list
            .iter()
            .filter_map(|step| step.texture_write())
            .all(|name| !name.ends_with(".3")));
        let last = list.last().unwrap();
        assert_eq!(last.viewport, frame.screen_viewport);
        assert_eq!(last.blend, BlendMode::None);
        assert_eq!(last.output, Binding::Current);
    }

    #[test]
    fn menu_blur_disabled_without_positive_amount() {
        let (mut bloom, mut ctx, frame) = prepared(800, 600);
        let settings = Settings {
            menu_blur: -1.0,
            game_blur_default: 0.0,
            ..Settings::default()
        };
        bloom.update_steps(&mut ctx, &settings, &frame);
        assert!(ctx.effect_list(BLUR_SCENE).unwrap().is_empty());

        let settings = Settings {
            menu_blur: -1.0,
            game_blur_default: 0.5,
            ..Settings::default()
        };
        bloom.update_steps(&mut ctx, &settings, &frame);
        assert!(!ctx.effect_list(BLUR_SCENE).unwrap().is_empty());
    }
}
