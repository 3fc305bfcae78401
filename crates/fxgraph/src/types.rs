use serde::Serialize;

/// Lowest shader-language version every declared shader can fall back to.
pub const MIN_GLSL_VERSION: u32 = 330;

/// Rectangle in framebuffer pixels.
///
/// Sizes are signed because the surrounding renderer can hand us degenerate
/// rectangles (minimised windows, zero-height scenes); managers check
/// [`Viewport::is_empty`] and publish nothing instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Viewport {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Viewport anchored at the origin.
    pub const fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Width divided by height, or `None` for an empty viewport.
    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// Pixel formats an intermediate texture can be allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    /// 8-bit unsigned normalised RGBA.
    Rgba8,
    /// 16-bit float RGBA, used for HDR intermediates.
    Rgba16f,
    /// 32-bit float single channel, used for luminance reduction.
    R32f,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::R32f => 4,
            PixelFormat::Rgba16f => 8,
        }
    }
}

/// Sampler filter used when a step reads an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

/// How a step's output is combined with what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Overwrite the target.
    #[default]
    None,
    /// `dst + src`.
    Additive,
    /// `src * a + dst * (1 - a)`.
    Alpha,
}

/// Capabilities of the execution target that influence shader declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetCaps {
    /// Highest shader-language version the backend compiles, e.g. `330` or `450`.
    pub glsl_version: u32,
}

impl TargetCaps {
    pub fn new(glsl_version: u32) -> Self {
        Self {
            glsl_version: glsl_version.max(MIN_GLSL_VERSION),
        }
    }

    /// Clamps a requested shader version to what the target supports.
    pub fn clamp_version(&self, requested: u32) -> u32 {
        requested.clamp(MIN_GLSL_VERSION, self.glsl_version)
    }
}

impl Default for TargetCaps {
    fn default() -> Self {
        Self::new(MIN_GLSL_VERSION)
    }
}

/// Per-frame geometry supplied by the scene renderer.
///
/// The scene texture may be larger than the part of it that is visible; the
/// scale/offset pair maps screen UVs into the scene texture for the passes
/// that sample the raw scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameInfo {
    pub scene_width: i32,
    pub scene_height: i32,
    pub scene_viewport: Viewport,
    pub screen_viewport: Viewport,
    pub scene_scale: [f32; 2],
    pub scene_offset: [f32; 2],
}

impl FrameInfo {
    /// Scene and screen covering the same `width` x `height` surface.
    pub fn fullscreen(width: i32, height: i32) -> Self {
        let viewport = Viewport::sized(width, height);
        Self {
            scene_width: width,
            scene_height: height,
            scene_viewport: viewport,
            screen_viewport: viewport,
            scene_scale: [1.0, 1.0],
            scene_offset: [0.0, 0.0],
        }
    }

    pub fn has_scene(&self) -> bool {
        self.scene_width > 0 && self.scene_height > 0
    }
}
