use crate::context::PipelineContext;
use crate::effects::bloom::BLUR_SCENE;
use crate::effects::{
    Bloom, CameraExposure, Colormap, EffectManager, Fxaa, LensDistort, Tonemap,
};
use crate::graph::{GraphError, RenderGraph};
use crate::settings::Settings;
use crate::step::EffectList;
use crate::types::{FrameInfo, TargetCaps};

/// Owns the effect managers and the context they publish into.
///
/// Managers are kept in application order; [`Pipeline::render_graph`] walks
/// their lists in the same order.
#[derive(Debug)]
pub struct Pipeline {
    context: PipelineContext,
    managers: Vec<EffectManager>,
}

impl Pipeline {
    /// Declares every shader and publishes an empty list per effect.
    pub fn new(caps: TargetCaps) -> Self {
        let mut context = PipelineContext::new(caps);
        let managers = vec![
            EffectManager::CameraExposure(CameraExposure::new()),
            EffectManager::Bloom(Bloom::new()),
            EffectManager::LensDistort(LensDistort::new()),
            EffectManager::Colormap(Colormap::new()),
            EffectManager::Tonemap(Tonemap::new()),
            EffectManager::Fxaa(Fxaa::new()),
        ];

        for manager in &managers {
            manager.declare_shaders(&mut context);
            context.publish(EffectList::disabled(manager.list_name()));
        }
        context.publish(EffectList::disabled(BLUR_SCENE));

        tracing::debug!(
            glsl_version = caps.glsl_version,
            shaders = context.shaders().len(),
            "post-processing pipeline created"
        );

        Self { context, managers }
    }

    /// Resizes textures and rebuilds every effect list for `frame`.
    pub fn update(&mut self, settings: &Settings, frame: &FrameInfo) {
        self.update_textures(settings, frame);
        self.update_steps(settings, frame);
    }

    pub fn update_textures(&mut self, settings: &Settings, frame: &FrameInfo) {
        for manager in &mut self.managers {
            manager.update_textures(&mut self.context, settings, frame);
        }
    }

    pub fn update_steps(&mut self, settings: &Settings, frame: &FrameInfo) {
        for manager in &mut self.managers {
            manager.update_steps(&mut self.context, settings, frame);
        }
    }

    pub fn effect_list(&self, name: &str) -> Option<&EffectList> {
        self.context.effect_list(name)
    }

    /// The per-frame lists in application order. The menu blur is not part of
    /// the frame; fetch it with `effect_list("BlurScene")`.
    pub fn render_graph(&self) -> RenderGraph<'_> {
        let lists = self
            .managers
            .iter()
            .filter_map(|manager| self.context.effect_list(manager.list_name()))
            .collect();
        RenderGraph::new(lists)
    }

    /// Validates the frame graph, then the menu blur on its own.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.render_graph().validate(&self.context)?;
        if let Some(blur) = self.context.effect_list(BLUR_SCENE) {
            RenderGraph::new(vec![blur]).validate(&self.context)?;
        }
        Ok(())
    }

    /// Forces the palette lookup table to be rebuilt on the next update.
    pub fn invalidate_palette_lut(&mut self) {
        for manager in &mut self.managers {
            if let EffectManager::Tonemap(tonemap) = manager {
                tonemap.invalidate();
            }
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn caps(&self) -> TargetCaps {
        self.context.caps()
    }

    pub fn managers(&self) -> &[EffectManager] {
        &self.managers
    }
}
