//! Perceptual kernel boundary: feature extraction and spectrogram distance.
//!
//! The comparison pipeline only talks to [`PerceptualKernel`]; [`Zimtohrli`]
//! is the kernel shipped with the crate.

pub mod nsim;
pub mod rotators;
pub mod spectrogram;
mod zimtohrli;

pub use nsim::NsimConfig;
pub use rotators::RotatorBank;
pub use spectrogram::Spectrogram;
pub use zimtohrli::{KernelConfig, Zimtohrli};

use crate::error::Result;

/// A deterministic perceptual model of audio at the canonical sample rate.
///
/// Implementations must be pure: identical input bytes give bit-identical
/// spectrograms and distances, on every call and every thread.
pub trait PerceptualKernel {
    /// Channels of every spectrogram this kernel produces.
    fn num_channels(&self) -> usize;

    /// Features of canonical-rate samples. Empty input gives zero frames.
    fn analyze(&self, samples: &[f32]) -> Result<Spectrogram>;

    /// Distance in [0, 1]; 0 for identical spectrograms.
    fn distance(&self, a: &Spectrogram, b: &Spectrogram) -> Result<f32>;
}
