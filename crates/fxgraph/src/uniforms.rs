use bytemuck::{Pod, Zeroable};
use serde::ser::SerializeStruct;
use serde::Serialize;

/// Scalar/vector type of one uniform block member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniformKind {
    Float,
    Vec2,
    Vec4,
}

/// One named member of a uniform block, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniformField {
    pub name: &'static str,
    pub kind: UniformKind,
}

const fn field(name: &'static str, kind: UniformKind) -> UniformField {
    UniformField { name, kind }
}

/// A `#[repr(C)]` block whose bytes are uploaded verbatim for a step.
///
/// `LAYOUT` describes the members so the backend can generate the matching
/// GLSL block declaration; it must list the fields in memory order.
pub trait UniformBlock: Pod {
    const NAME: &'static str;
    const LAYOUT: &'static [UniformField];
}

/// Scene sampling transform used by the bloom and exposure extract passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExtractUniforms {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl UniformBlock for ExtractUniforms {
    const NAME: &'static str = "ExtractUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("Scale", UniformKind::Vec2),
        field("Offset", UniformKind::Vec2),
    ];
}

/// Normalised gaussian weights for the separable blur; 7 taps plus padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurUniforms {
    pub sample_weights: [f32; 8],
}

impl UniformBlock for BlurUniforms {
    const NAME: &'static str = "BlurUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("SampleWeights0", UniformKind::Float),
        field("SampleWeights1", UniformKind::Float),
        field("SampleWeights2", UniformKind::Float),
        field("SampleWeights3", UniformKind::Float),
        field("SampleWeights4", UniformKind::Float),
        field("SampleWeights5", UniformKind::Float),
        field("SampleWeights6", UniformKind::Float),
        field("SampleWeights7", UniformKind::Float),
    ];
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LensUniforms {
    pub aspect_ratio: f32,
    pub scale: f32,
    pub padding: [f32; 2],
    pub lens_distortion_coefficient: [f32; 4],
    pub cubic_distortion_value: [f32; 4],
}

impl UniformBlock for LensUniforms {
    const NAME: &'static str = "LensUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("AspectRatio", UniformKind::Float),
        field("Scale", UniformKind::Float),
        field("Padding1", UniformKind::Float),
        field("Padding2", UniformKind::Float),
        field("LensDistortionCoefficient", UniformKind::Vec4),
        field("CubicDistortionValue", UniformKind::Vec4),
    ];
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FxaaUniforms {
    pub reciprocal_resolution: [f32; 2],
    pub padding: [f32; 2],
}

impl UniformBlock for FxaaUniforms {
    const NAME: &'static str = "FXAAUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("ReciprocalResolution", UniformKind::Vec2),
        field("Padding", UniformKind::Vec2),
    ];
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExposureCombineUniforms {
    pub exposure_base: f32,
    pub exposure_min: f32,
    pub exposure_scale: f32,
    pub exposure_speed: f32,
}

impl UniformBlock for ExposureCombineUniforms {
    const NAME: &'static str = "ExposureCombineUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("ExposureBase", UniformKind::Float),
        field("ExposureMin", UniformKind::Float),
        field("ExposureScale", UniformKind::Float),
        field("ExposureSpeed", UniformKind::Float),
    ];
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColormapUniforms {
    pub map_start: [f32; 4],
    pub map_range: [f32; 4],
}

impl UniformBlock for ColormapUniforms {
    const NAME: &'static str = "ColormapUniforms";
    const LAYOUT: &'static [UniformField] = &[
        field("MapStart", UniformKind::Vec4),
        field("MapRange", UniformKind::Vec4),
    ];
}

/// Raw uniform bytes attached to a step, tagged with the block they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformData {
    block: Option<&'static str>,
    bytes: Vec<u8>,
}

impl UniformData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_block<T: UniformBlock>(block: &T) -> Self {
        Self {
            block: Some(T::NAME),
            bytes: bytemuck::bytes_of(block).to_vec(),
        }
    }

    pub fn block_name(&self) -> Option<&'static str> {
        self.block
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the bytes back into `T` if they were produced from a `T`.
    pub fn read<T: UniformBlock>(&self) -> Option<T> {
        if self.block != Some(T::NAME) || self.bytes.len() != std::mem::size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(&self.bytes))
    }
}

impl Serialize for UniformData {
    /// Every block in this crate is made of 32-bit floats, so dumps show the
    /// values rather than raw bytes.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let words: Vec<f32> = self
            .bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        let mut state = serializer.serialize_struct("UniformData", 2)?;
        state.serialize_field("block", &self.block)?;
        state.serialize_field("values", &words)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_size(layout: &[UniformField]) -> usize {
        layout
            .iter()
            .map(|field| match field.kind {
                UniformKind::Float => 4,
                UniformKind::Vec2 => 8,
                UniformKind::Vec4 => 16,
            })
            .sum()
    }

    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(layout_size(ExtractUniforms::LAYOUT), std::mem::size_of::<ExtractUniforms>());
        assert_eq!(layout_size(BlurUniforms::LAYOUT), std::mem::size_of::<BlurUniforms>());
        assert_eq!(layout_size(LensUniforms::LAYOUT), std::mem::size_of::<LensUniforms>());
        assert_eq!(layout_size(FxaaUniforms::LAYOUT), std::mem::size_of::<FxaaUniforms>());
        assert_eq!(
            layout_size(ExposureCombineUniforms::LAYOUT),
            std::mem::size_of::<ExposureCombineUniforms>()
        );
        assert_eq!(layout_size(ColormapUniforms::LAYOUT), std::mem::size_of::<ColormapUniforms>());
    }

    #[test]
    fn read_rejects_other_blocks() {
        let data = UniformData::from_block(&ExtractUniforms {
            scale: [1.0, 0.5],
            offset: [0.0, 0.25],
        });
        assert!(data.read::<FxaaUniforms>().is_none());
        let decoded = data.read::<ExtractUniforms>().expect("extract block");
        assert_eq!(decoded.scale, [1.0, 0.5]);
        assert_eq!(decoded.offset, [0.0, 0.25]);
    }

    #[test]
    fn serializes_as_float_values() {
        let data = UniformData::from_block(&FxaaUniforms {
            reciprocal_resolution: [0.5, 0.25],
            padding: [0.0; 2],
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["block"], "FXAAUniforms");
        assert_eq!(json["values"][1], 0.25);
    }
}
