//! Post-processing render-graph builder.
//!
//! The crate decides *which* full-screen passes run after the scene has been
//! drawn, in what order, at what resolution, and with which inputs. It never
//! touches a GPU: an executor takes the published [`EffectList`]s and runs each
//! [`Step`] against its own framebuffers. The flow is:
//!
//! ```text
//!   Settings + FrameInfo
//!          │
//!          ▼
//!   Pipeline::update ──▶ EffectManager::update_textures ──▶ TextureRegistry
//!          │                                                     │
//!          └─────────▶ EffectManager::update_steps ──▶ EffectList per effect
//!                                                               │
//!   executor ◀── Pipeline::render_graph() ◀─────────────────────┘
//! ```
//!
//! Steps refer to the executor's ping-pong color buffers through the
//! [`Binding::Current`] and [`Binding::Next`] sentinels; every other input or
//! output is a named texture from the [`TextureRegistry`]. Shaders are path
//! strings plus preprocessor defines and are compiled by the executor.

pub mod context;
pub mod effects;
pub mod graph;
pub mod kernel;
pub mod palette;
pub mod pipeline;
pub mod registry;
pub mod settings;
pub mod step;
pub mod types;
pub mod uniforms;

pub use context::PipelineContext;
pub use effects::EffectManager;
pub use graph::{GraphError, RenderGraph};
pub use palette::{Palette, PaletteLookup};
pub use pipeline::Pipeline;
pub use registry::{ShaderDescriptor, ShaderRegistry, TextureDescriptor, TextureRegistry};
pub use settings::{
    ExposureSettings, FxaaQuality, Settings, SpecialColormap, TonemapOperator, DEFAULT_COLORMAP,
    FIRST_SPECIAL_COLORMAP,
};
pub use step::{Binding, EffectList, Input, Step};
pub use types::{BlendMode, FilterMode, FrameInfo, PixelFormat, TargetCaps, Viewport};
pub use uniforms::{UniformBlock, UniformData, UniformField, UniformKind};
