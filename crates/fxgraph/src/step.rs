use serde::Serialize;

use crate::types::{BlendMode, FilterMode, Viewport};
use crate::uniforms::{UniformBlock, UniformData};

/// What a step reads from or renders into.
///
/// `Current` and `Next` refer to the executor's two ping-pong color buffers;
/// a step that writes `Next` is followed by a swap performed by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Binding {
    Texture(String),
    Current,
    Next,
}

impl Binding {
    pub fn texture(name: impl Into<String>) -> Self {
        Binding::Texture(name.into())
    }

    /// Texture name for [`Binding::Texture`], `None` for the ping-pong sentinels.
    pub fn texture_name(&self) -> Option<&str> {
        match self {
            Binding::Texture(name) => Some(name),
            Binding::Current | Binding::Next => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Input {
    pub slot: u32,
    pub binding: Binding,
    pub filter: FilterMode,
}

/// One full-screen shader pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub shader: String,
    pub viewport: Viewport,
    pub inputs: Vec<Input>,
    pub output: Binding,
    pub blend: BlendMode,
    pub uniforms: UniformData,
}

impl Step {
    /// A pass writing `Next` without blending and without inputs or uniforms.
    pub fn new(shader: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            shader: shader.into(),
            viewport,
            inputs: Vec::new(),
            output: Binding::Next,
            blend: BlendMode::None,
            uniforms: UniformData::empty(),
        }
    }

    /// Binds `binding` to `slot`, replacing whatever was bound there before.
    pub fn input(mut self, slot: u32, binding: Binding, filter: FilterMode) -> Self {
        let input = Input {
            slot,
            binding,
            filter,
        };
        match self.inputs.iter_mut().find(|existing| existing.slot == slot) {
            Some(existing) => *existing = input,
            None => {
                self.inputs.push(input);
                self.inputs.sort_by_key(|input| input.slot);
            }
        }
        self
    }

    pub fn input_current(self, slot: u32, filter: FilterMode) -> Self {
        self.input(slot, Binding::Current, filter)
    }

    pub fn input_texture(self, slot: u32, name: impl Into<String>, filter: FilterMode) -> Self {
        self.input(slot, Binding::texture(name), filter)
    }

    pub fn output(mut self, output: Binding) -> Self {
        self.output = output;
        self
    }

    pub fn output_texture(self, name: impl Into<String>) -> Self {
        self.output(Binding::texture(name))
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn uniforms<T: UniformBlock>(mut self, block: &T) -> Self {
        self.uniforms = UniformData::from_block(block);
        self
    }

    /// Named textures this step samples, in slot order.
    pub fn texture_reads(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter_map(|input| input.binding.texture_name())
    }

    pub fn texture_write(&self) -> Option<&str> {
        self.output.texture_name()
    }
}

/// Named, ordered sequence of steps. An empty list means the effect is
/// disabled for the current configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectList {
    pub name: String,
    pub steps: Vec<Step>,
}

impl EffectList {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }
}

impl<'a> IntoIterator for &'a EffectList {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
