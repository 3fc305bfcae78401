use std::collections::BTreeMap;

use crate::registry::{ShaderRegistry, TextureRegistry};
use crate::step::EffectList;
use crate::types::TargetCaps;

/// Shared state every effect manager reads and writes: the two registries and
/// the most recently published effect lists.
///
/// Created with the renderer and dropped with it; managers only ever see it
/// through the reference they are handed.
#[derive(Debug)]
pub struct PipelineContext {
    textures: TextureRegistry,
    shaders: ShaderRegistry,
    effects: BTreeMap<String, EffectList>,
}

impl PipelineContext {
    pub fn new(caps: TargetCaps) -> Self {
        Self {
            textures: TextureRegistry::new(),
            shaders: ShaderRegistry::new(caps),
            effects: BTreeMap::new(),
        }
    }

    pub fn caps(&self) -> TargetCaps {
        self.shaders.caps()
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        &mut self.textures
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderRegistry {
        &mut self.shaders
    }

    /// Replaces the list stored under `list.name`.
    pub fn publish(&mut self, list: EffectList) {
        self.effects.insert(list.name.clone(), list);
    }

    pub fn effect_list(&self, name: &str) -> Option<&EffectList> {
        self.effects.get(name)
    }

    pub fn effect_lists(&self) -> impl Iterator<Item = &EffectList> {
        self.effects.values()
    }
}
