//! The comparison pipeline: validate, resample, analyse, measure, score.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audio::{to_canonical, AudioBuffer, Resample, SincResampler};
use crate::engine::{PerceptualKernel, Spectrogram, Zimtohrli};
use crate::error::Result;
use crate::mos::{mos_from_distance, Quality};
use crate::CANONICAL_SAMPLE_RATE;

/// Which view of a comparison a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Distance,
    Mos,
}

/// Outcome of one comparison. `mos` is always derived from `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub distance: f64,
    pub mos: f64,
}

impl Comparison {
    pub fn from_distance(distance: f64) -> Self {
        Self {
            distance,
            mos: mos_from_distance(distance),
        }
    }

    pub fn project(&self, projection: Projection) -> f64 {
        match projection {
            Projection::Distance => self.distance,
            Projection::Mos => self.mos,
        }
    }

    pub fn quality(&self) -> Quality {
        Quality::from_mos(self.mos)
    }
}

/// Reusable comparison handle.
///
/// Holds an immutable kernel and resampler; every method takes `&self`, so a
/// single comparator can be shared across threads without locking.
#[derive(Debug, Clone)]
pub struct Comparator<K = Zimtohrli, R = SincResampler> {
    kernel: K,
    resampler: R,
}

impl Comparator {
    pub fn new() -> Result<Self> {
        Ok(Self::with_parts(Zimtohrli::new()?, SincResampler::default()))
    }
}

impl<K, R> Comparator<K, R>
where
    K: PerceptualKernel + Sync,
    R: Resample + Sync,
{
    pub fn with_parts(kernel: K, resampler: R) -> Self {
        Self { kernel, resampler }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn resampler(&self) -> &R {
        &self.resampler
    }

    pub fn sample_rate(&self) -> u32 {
        CANONICAL_SAMPLE_RATE
    }

    pub fn num_channels(&self) -> usize {
        self.kernel.num_channels()
    }

    /// Spectrogram of samples already at the canonical rate.
    pub fn analyze(&self, samples: &[f32]) -> Result<Spectrogram> {
        self.kernel.analyze(samples)
    }

    /// Spectrogram of a buffer at any rate; resamples when needed.
    pub fn analyze_buffer(&self, buffer: &AudioBuffer<'_>) -> Result<Spectrogram> {
        let canonical = to_canonical(&self.resampler, buffer)?;
        log::trace!(
            "analysing {} samples ({} at {} Hz)",
            canonical.len(),
            buffer.len(),
            buffer.sample_rate()
        );
        self.kernel.analyze(&canonical)
    }

    pub fn distance(&self, a: &Spectrogram, b: &Spectrogram) -> Result<f64> {
        Ok(self.kernel.distance(a, b)? as f64)
    }

    pub fn compare_spectrograms(&self, a: &Spectrogram, b: &Spectrogram) -> Result<Comparison> {
        Ok(Comparison::from_distance(self.distance(a, b)?))
    }

    /// Compares two canonical-rate signals. No resampling happens here.
    pub fn compare(&self, a: &[f32], b: &[f32]) -> Result<Comparison> {
        let spec_a = self.analyze(a)?;
        let spec_b = self.analyze(b)?;
        self.compare_spectrograms(&spec_a, &spec_b)
    }

    pub fn compare_buffers(&self, a: &AudioBuffer<'_>, b: &AudioBuffer<'_>) -> Result<Comparison> {
        let spec_a = self.analyze_buffer(a)?;
        let spec_b = self.analyze_buffer(b)?;
        let comparison = self.compare_spectrograms(&spec_a, &spec_b)?;
        log::debug!(
            "compared {:.3}s @ {} Hz with {:.3}s @ {} Hz: distance={:.6} mos={:.3}",
            a.duration_secs(),
            a.sample_rate(),
            b.duration_secs(),
            b.sample_rate(),
            comparison.distance,
            comparison.mos
        );
        Ok(comparison)
    }

    /// Compares every test signal against one reference, analysing the
    /// reference once. Results are in input order and identical to calling
    /// [`Comparator::compare`] for each pair.
    pub fn compare_batch(&self, reference: &[f32], tests: &[&[f32]]) -> Result<Vec<Comparison>> {
        let reference = self.analyze(reference)?;
        self.compare_batch_against(&reference, tests)
    }

    /// Like [`Comparator::compare_batch`] with a cached reference spectrogram.
    pub fn compare_batch_against(
        &self,
        reference: &Spectrogram,
        tests: &[&[f32]],
    ) -> Result<Vec<Comparison>> {
        tests
            .par_iter()
            .map(|test| {
                let spec = self.analyze(test)?;
                self.compare_spectrograms(reference, &spec)
            })
            .collect()
    }
}
