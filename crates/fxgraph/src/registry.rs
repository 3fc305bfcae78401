use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::types::{PixelFormat, TargetCaps, MIN_GLSL_VERSION};
use crate::uniforms::UniformField;

/// Size, format and optional CPU-side contents of an intermediate texture.
#[derive(Debug, Clone, Serialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    #[serde(skip)]
    data: Option<Arc<[u8]>>,
}

impl TextureDescriptor {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: None,
        }
    }

    /// Attaches an immutable payload uploaded once when the texture is created.
    pub fn with_data(mut self, data: Arc<[u8]>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn data(&self) -> Option<&Arc<[u8]>> {
        self.data.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// True when `other` can reuse the allocation made for `self`.
    fn same_allocation(&self, other: &TextureDescriptor) -> bool {
        let same_data = match (&self.data, &other.data) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.width == other.width
            && self.height == other.height
            && self.format == other.format
            && same_data
    }
}

#[derive(Debug, Clone)]
struct TextureEntry {
    descriptor: TextureDescriptor,
    generation: u64,
}

/// Name-keyed store of texture descriptors.
///
/// Every (re)allocation receives a fresh generation number; the executor
/// compares generations to decide which GPU textures need recreating.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    entries: BTreeMap<String, TextureEntry>,
    next_generation: u64,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` under `name`.
    ///
    /// Returns `true` when the texture was created or reallocated and `false`
    /// when an identical descriptor was already present.
    pub fn declare(&mut self, name: impl Into<String>, descriptor: TextureDescriptor) -> bool {
        let name = name.into();
        if let Some(entry) = self.entries.get(&name) {
            if entry.descriptor.same_allocation(&descriptor) {
                return false;
            }
        }

        self.next_generation += 1;
        tracing::trace!(
            texture = %name,
            width = descriptor.width,
            height = descriptor.height,
            format = ?descriptor.format,
            generation = self.next_generation,
            "allocating texture"
        );
        self.entries.insert(
            name,
            TextureEntry {
                descriptor,
                generation: self.next_generation,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&TextureDescriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    pub fn generation(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|entry| entry.generation)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<TextureDescriptor> {
        self.entries.remove(name).map(|entry| entry.descriptor)
    }

    /// Drops every texture whose name starts with `prefix`; returns how many.
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|name, _| !name.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates textures in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TextureDescriptor)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.descriptor))
    }
}

/// Everything the backend needs to compile one shader program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaderDescriptor {
    /// Path-like reference to the fragment source; never read by this crate.
    pub source: String,
    /// Preprocessor lines prepended to the source.
    pub defines: String,
    pub uniforms: &'static [UniformField],
    /// Minimum shader-language version the program is compiled with.
    pub version: u32,
}

impl ShaderDescriptor {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            defines: String::new(),
            uniforms: &[],
            version: MIN_GLSL_VERSION,
        }
    }

    pub fn with_defines(mut self, defines: impl Into<String>) -> Self {
        self.defines = defines.into();
        self
    }

    pub fn with_uniforms(mut self, uniforms: &'static [UniformField]) -> Self {
        self.uniforms = uniforms;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

/// Name-keyed store of shader descriptors, fixed after startup.
#[derive(Debug)]
pub struct ShaderRegistry {
    caps: TargetCaps,
    shaders: BTreeMap<String, ShaderDescriptor>,
}

impl ShaderRegistry {
    pub fn new(caps: TargetCaps) -> Self {
        Self {
            caps,
            shaders: BTreeMap::new(),
        }
    }

    pub fn caps(&self) -> TargetCaps {
        self.caps
    }

    /// Declares a shader once. Later declarations under the same name are
    /// ignored and return `false`.
    ///
    /// A requested version above what the target supports is lowered to the
    /// target's version.
    pub fn declare(&mut self, name: impl Into<String>, mut descriptor: ShaderDescriptor) -> bool {
        let name = name.into();
        if self.shaders.contains_key(&name) {
            return false;
        }

        let version = self.caps.clamp_version(descriptor.version);
        if version != descriptor.version {
            tracing::warn!(
                shader = %name,
                requested = descriptor.version,
                available = self.caps.glsl_version,
                "shader version unavailable; falling back"
            );
            descriptor.version = version;
        }
        self.shaders.insert(name, descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ShaderDescriptor> {
        self.shaders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShaderDescriptor)> {
        self.shaders.iter().map(|(name, desc)| (name.as_str(), desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_identical_texture_is_a_no_op() {
        let mut registry = TextureRegistry::new();
        assert!(registry.declare("a", TextureDescriptor::new(8, 8, PixelFormat::Rgba16f)));
        let generation = registry.generation("a");
        assert!(!registry.declare("a", TextureDescriptor::new(8, 8, PixelFormat::Rgba16f)));
        assert_eq!(registry.generation("a"), generation);
    }

    #[test]
    fn changed_size_or_format_reallocates() {
        let mut registry = TextureRegistry::new();
        registry.declare("a", TextureDescriptor::new(8, 8, PixelFormat::Rgba16f));
        let first = registry.generation("a").unwrap();

        assert!(registry.declare("a", TextureDescriptor::new(8, 4, PixelFormat::Rgba16f)));
        let second = registry.generation("a").unwrap();
        assert!(second > first);

        assert!(registry.declare("a", TextureDescriptor::new(8, 4, PixelFormat::R32f)));
        assert!(registry.generation("a").unwrap() > second);
    }

    #[test]
    fn payload_identity_decides_reallocation() {
        let mut registry = TextureRegistry::new();
        let payload: Arc<[u8]> = vec![0u8; 16].into();
        let desc = TextureDescriptor::new(2, 2, PixelFormat::Rgba8).with_data(payload.clone());
        assert!(registry.declare("lut", desc.clone()));
        assert!(!registry.declare("lut", desc));

        let other: Arc<[u8]> = vec![0u8; 16].into();
        assert!(registry.declare(
            "lut",
            TextureDescriptor::new(2, 2, PixelFormat::Rgba8).with_data(other)
        ));
    }

    #[test]
    fn remove_prefixed_only_touches_matching_names() {
        let mut registry = TextureRegistry::new();
        registry.declare("Bloom.VTexture.0", TextureDescriptor::new(4, 4, PixelFormat::Rgba16f));
        registry.declare("Bloom.HTexture.0", TextureDescriptor::new(4, 4, PixelFormat::Rgba16f));
        registry.declare("Exposure.Level.0", TextureDescriptor::new(4, 4, PixelFormat::R32f));
        assert_eq!(registry.remove_prefixed("Bloom."), 2);
        assert!(registry.contains("Exposure.Level.0"));
    }

    #[test]
    fn shader_declared_once_and_version_clamped() {
        let mut registry = ShaderRegistry::new(TargetCaps::new(330));
        assert!(registry.declare("avg", ShaderDescriptor::new("avg.fp").with_version(400)));
        assert_eq!(registry.get("avg").unwrap().version, 330);
        assert!(!registry.declare("avg", ShaderDescriptor::new("other.fp")));
        assert_eq!(registry.get("avg").unwrap().source, "avg.fp");
    }
}
