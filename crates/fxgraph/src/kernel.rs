//! Separable gaussian blur weights.

use std::f32::consts::PI;

use crate::uniforms::BlurUniforms;

/// Taps in the blur kernel: the centre sample plus three on each side.
pub const BLUR_SAMPLE_COUNT: usize = 7;

/// Unnormalised gaussian at offset `n` for blur amount `theta`.
pub fn gaussian(n: f32, theta: f32) -> f32 {
    (1.0 / (2.0 * PI * theta).sqrt()) * (-(n * n) / (2.0 * theta * theta)).exp()
}

/// Normalised 7-tap weights laid out as `[w0, w1, w1, w2, w2, w3, w3]`.
///
/// Returns `None` for a non-positive or non-finite blur amount, which callers
/// treat as "blur disabled".
pub fn blur_weights(blur_amount: f32) -> Option<[f32; BLUR_SAMPLE_COUNT]> {
    if !blur_amount.is_finite() || blur_amount <= 0.0 {
        return None;
    }

    let mut weights = [0.0f32; BLUR_SAMPLE_COUNT];
    weights[0] = gaussian(0.0, blur_amount);
    let mut total = weights[0];

    for i in 0..BLUR_SAMPLE_COUNT / 2 {
        let weight = gaussian(i as f32 + 1.0, blur_amount);
        weights[i * 2 + 1] = weight;
        weights[i * 2 + 2] = weight;
        total += weight * 2.0;
    }

    for weight in &mut weights {
        *weight /= total;
    }
    Some(weights)
}

impl BlurUniforms {
    pub fn from_blur_amount(blur_amount: f32) -> Option<Self> {
        let weights = blur_weights(blur_amount)?;
        let mut sample_weights = [0.0f32; 8];
        sample_weights[..BLUR_SAMPLE_COUNT].copy_from_slice(&weights);
        Some(Self { sample_weights })
    }
}
