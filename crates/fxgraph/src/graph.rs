use std::collections::BTreeSet;

use thiserror::Error;

use crate::context::PipelineContext;
use crate::step::{EffectList, Step};

/// A pass list that an executor could not run as published.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("{effect} step {step} uses undeclared shader `{shader}`")]
    UnknownShader {
        effect: String,
        step: usize,
        shader: String,
    },
    #[error("{effect} step {step} references unregistered texture `{texture}`")]
    UnknownTexture {
        effect: String,
        step: usize,
        texture: String,
    },
    #[error("{effect} step {step} reads `{texture}` before anything in the frame writes it")]
    ReadBeforeWrite {
        effect: String,
        step: usize,
        texture: String,
    },
}

/// Ordered view over the effect lists an executor runs for one frame.
#[derive(Debug, Clone)]
pub struct RenderGraph<'a> {
    lists: Vec<&'a EffectList>,
}

impl<'a> RenderGraph<'a> {
    pub fn new(lists: Vec<&'a EffectList>) -> Self {
        Self { lists }
    }

    pub fn lists(&self) -> &[&'a EffectList] {
        &self.lists
    }

    /// Lists in execution order, including disabled (empty) ones.
    pub fn iter(&self) -> impl Iterator<Item = &'a EffectList> + '_ {
        self.lists.iter().copied()
    }

    /// Every step of the frame in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &'a Step> + '_ {
        self.iter().flat_map(|list| list.iter())
    }

    pub fn step_count(&self) -> usize {
        self.lists.iter().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.step_count() == 0
    }

    /// Checks that every referenced shader and texture is registered and that
    /// each named texture a step samples is either written by an earlier step
    /// of this graph or carries an uploaded payload.
    pub fn validate(&self, ctx: &PipelineContext) -> Result<(), GraphError> {
        let mut written: BTreeSet<&str> = BTreeSet::new();

        for list in self.iter() {
            for (index, step) in list.iter().enumerate() {
                if !ctx.shaders().contains(&step.shader) {
                    return Err(GraphError::UnknownShader {
                        effect: list.name.clone(),
                        step: index,
                        shader: step.shader.clone(),
                    });
                }

                for texture in step.texture_reads() {
                    let Some(descriptor) = ctx.textures().get(texture) else {
                        return Err(GraphError::UnknownTexture {
                            effect: list.name.clone(),
                            step: index,
                            texture: texture.to_owned(),
                        });
                    };
                    if !written.contains(texture) && !descriptor.has_data() {
                        return Err(GraphError::ReadBeforeWrite {
                            effect: list.name.clone(),
                            step: index,
                            texture: texture.to_owned(),
                        });
                    }
                }

                if let Some(texture) = step.texture_write() {
                    if !ctx.textures().contains(texture) {
                        return Err(GraphError::UnknownTexture {
                            effect: list.name.clone(),
                            step: index,
                            texture: texture.to_owned(),
                        });
                    }
                    written.insert(texture);
                }
            }
        }

        Ok(())
    }
}
