//! The post-processing effects. Each manager declares its shaders once,
//! sizes its textures when the scene changes, and republishes its effect list
//! on every update.

pub mod bloom;
pub mod colormap;
pub mod exposure;
pub mod fxaa;
pub mod lens;
pub mod tonemap;

use crate::context::PipelineContext;
use crate::settings::Settings;
use crate::types::FrameInfo;

pub use bloom::Bloom;
pub use colormap::Colormap;
pub use exposure::CameraExposure;
pub use fxaa::Fxaa;
pub use lens::LensDistort;
pub use tonemap::Tonemap;

#[derive(Debug)]
pub enum EffectManager {
    CameraExposure(CameraExposure),
    Bloom(Bloom),
    LensDistort(LensDistort),
    Colormap(Colormap),
    Tonemap(Tonemap),
    Fxaa(Fxaa),
}

impl EffectManager {
    /// Name of the effect list this manager publishes every update.
    pub fn list_name(&self) -> &'static str {
        match self {
            EffectManager::CameraExposure(_) => exposure::UPDATE_CAMERA_EXPOSURE,
            EffectManager::Bloom(_) => bloom::BLOOM_SCENE,
            EffectManager::LensDistort(_) => lens::LENS_DISTORT_SCENE,
            EffectManager::Colormap(_) => colormap::COLORMAP_SCENE,
            EffectManager::Tonemap(_) => tonemap::TONEMAP_SCENE,
            EffectManager::Fxaa(_) => fxaa::APPLY_FXAA,
        }
    }

    pub fn declare_shaders(&self, ctx: &mut PipelineContext) {
        match self {
            EffectManager::CameraExposure(manager) => manager.declare_shaders(ctx),
            EffectManager::Bloom(manager) => manager.declare_shaders(ctx),
            EffectManager::LensDistort(manager) => manager.declare_shaders(ctx),
            EffectManager::Colormap(manager) => manager.declare_shaders(ctx),
            EffectManager::Tonemap(manager) => manager.declare_shaders(ctx),
            EffectManager::Fxaa(manager) => manager.declare_shaders(ctx),
        }
    }

    pub fn update_textures(
        &mut self,
        ctx: &mut PipelineContext,
        settings: &Settings,
        frame: &FrameInfo,
    ) {
        match self {
            EffectManager::CameraExposure(manager) => manager.update_textures(ctx, frame),
            EffectManager::Bloom(manager) => manager.update_textures(ctx, frame),
            EffectManager::Tonemap(manager) => manager.update_textures(ctx, settings),
            EffectManager::LensDistort(_) | EffectManager::Colormap(_) | EffectManager::Fxaa(_) => {}
        }
    }

    pub fn update_steps(&mut self, ctx: &mut PipelineContext, settings: &Settings, frame: &FrameInfo) {
        match self {
            EffectManager::CameraExposure(manager) => manager.update_steps(ctx, settings, frame),
            EffectManager::Bloom(manager) => manager.update_steps(ctx, settings, frame),
            EffectManager::LensDistort(manager) => manager.update_steps(ctx, settings, frame),
            EffectManager::Colormap(manager) => manager.update_steps(ctx, settings, frame),
            EffectManager::Tonemap(manager) => manager.update_steps(ctx, settings, frame),
            EffectManager::Fxaa(manager) => manager.update_steps(ctx, settings, frame),
        }
    }
}
