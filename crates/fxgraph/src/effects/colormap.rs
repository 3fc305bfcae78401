use crate::context::PipelineContext;
use crate::registry::ShaderDescriptor;
use crate::settings::Settings;
use crate::step::{EffectList, Step};
use crate::types::{BlendMode, FilterMode, FrameInfo};
use crate::uniforms::{ColormapUniforms, UniformBlock};

pub const COLORMAP_SCENE: &str = "ColormapScene";
pub const COLORMAP: &str = "Colormap";

#[derive(Debug, Default)]
pub struct Colormap;

impl Colormap {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn declare_shaders(&self, ctx: &mut PipelineContext) {
        ctx.shaders_mut().declare(
            COLORMAP,
            ShaderDescriptor::new("shaders/postfx/colormap.fp")
                .with_uniforms(ColormapUniforms::LAYOUT),
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
        let Some(map) = settings.active_special_colormap() else {
            return EffectList::disabled(COLORMAP_SCENE);
        };
        if frame.screen_viewport.is_empty() {
            return EffectList::disabled(COLORMAP_SCENE);
        }

        let uniforms = ColormapUniforms {
            map_start: [map.start[0], map.start[1], map.start[2], 0.0],
            map_range: [
                map.end[0] - map.start[0],
                map.end[1] - map.start[1],
                map.end[2] - map.start[2],
                0.0,
            ],
        };

        let step = Step::new(COLORMAP, frame.screen_viewport)
            .uniforms(&uniforms)
            .input_current(0, FilterMode::Nearest)
            .blend(BlendMode::None);
        EffectList::new(COLORMAP_SCENE, vec![step])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SpecialColormap, DEFAULT_COLORMAP, FIRST_SPECIAL_COLORMAP};
    use crate::types::TargetCaps;

    fn run(settings: &Settings) -> EffectList {
        let mut ctx = PipelineContext::new(TargetCaps::default());
        let mut colormap = Colormap::new();
        colormap.declare_shaders(&mut ctx);
        colormap.update_steps(&mut ctx, settings, &FrameInfo::fullscreen(320, 200));
        ctx.effect_list(COLORMAP_SCENE).cloned().unwrap()
    }

    #[test]
    fn inverse_map_has_negative_range() {
        let settings = Settings {
            fixed_colormap: FIRST_SPECIAL_COLORMAP,
            special_colormaps: vec![SpecialColormap::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0])],
            ..Settings::default()
        };
        let list = run(&settings);
        assert_eq!(list.len(), 1);
        let uniforms: ColormapUniforms = list.steps[0].uniforms.read().unwrap();
        assert_eq!(uniforms.map_start, [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(uniforms.map_range, [-1.0, -1.0, -1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_disables() {
        let base = Settings::default();
        for index in [DEFAULT_COLORMAP, FIRST_SPECIAL_COLORMAP + base.special_colormaps.len() as u32] {
            let settings = Settings {
                fixed_colormap: index,
                ..base.clone()
            };
            assert!(run(&settings).is_empty(), "index {index}");
        }
    }
}
