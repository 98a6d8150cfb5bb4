use std::borrow::Cow;

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use serde::{Deserialize, Serialize};

use super::buffer::{validate_sample_rate, AudioBuffer};
use crate::error::{try_zeroed, Error, Result};
use crate::CANONICAL_SAMPLE_RATE;

/// Largest supported ratio between input and output rate, either direction.
pub const MAX_RATE_RATIO: f64 = 256.0;

/// Sample rate conversion of mono f32 audio.
pub trait Resample {
    fn resample(&self, samples: &[f32], from_hz: f64, to_hz: f64) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SincWindow {
    Blackman,
    Blackman2,
    BlackmanHarris,
    BlackmanHarris2,
    Hann,
    Hann2,
}

impl From<SincWindow> for WindowFunction {
    fn from(w: SincWindow) -> Self {
        match w {
            SincWindow::Blackman => WindowFunction::Blackman,
            SincWindow::Blackman2 => WindowFunction::Blackman2,
            SincWindow::BlackmanHarris => WindowFunction::BlackmanHarris,
            SincWindow::BlackmanHarris2 => WindowFunction::BlackmanHarris2,
            SincWindow::Hann => WindowFunction::Hann,
            SincWindow::Hann2 => WindowFunction::Hann2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    pub sinc_len: usize,
    pub f_cutoff: f32,
    pub oversampling_factor: usize,
    pub window: SincWindow,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            sinc_len: 256,
            f_cutoff: 0.95,
            oversampling_factor: 256,
            window: SincWindow::BlackmanHarris2,
        }
    }
}

/// Windowed-sinc resampler backed by rubato.
///
/// The whole signal is processed as one chunk, the filter delay is removed
/// and the output is cut to `ceil(len * to / from)` samples, so sample `i` of
/// the output lines up with time `i / to_hz` of the input.
#[derive(Debug, Clone, Default)]
pub struct SincResampler {
    config: ResamplerConfig,
}

impl SincResampler {
    pub fn new(config: ResamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    fn parameters(&self) -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: self.config.sinc_len,
            f_cutoff: self.config.f_cutoff,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: self.config.oversampling_factor,
            window: self.config.window.into(),
        }
    }
}

impl Resample for SincResampler {
    fn resample(&self, samples: &[f32], from_hz: f64, to_hz: f64) -> Result<Vec<f32>> {
        validate_sample_rate(from_hz)?;
        validate_sample_rate(to_hz)?;
        let ratio = to_hz / from_hz;
        if !(1.0 / MAX_RATE_RATIO..=MAX_RATE_RATIO).contains(&ratio) {
            return Err(Error::ResampleFailure(format!(
                "rate ratio {from_hz} Hz -> {to_hz} Hz is outside the supported range"
            )));
        }
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected = (samples.len() as f64 * to_hz / from_hz).ceil() as usize;

        // Zeros covering the filter delay, so even a few samples come out
        // of a single chunk.
        let padding = self.config.sinc_len / 2 + 2;
        let mut padded = try_zeroed::<f32>(samples.len() + padding)?;
        padded[..samples.len()].copy_from_slice(samples);

        let mut resampler =
            SincFixedIn::<f32>::new(ratio, 1.0, self.parameters(), padded.len(), 1)
                .map_err(|e| Error::ResampleFailure(e.to_string()))?;
        let delay = resampler.output_delay();
        let wanted = expected + delay;

        let mut output = Vec::new();
        output.try_reserve_exact(wanted)?;

        let first = resampler
            .process(&[padded.as_slice()], None)
            .map_err(|e| Error::ResampleFailure(e.to_string()))?;
        output.extend(first.into_iter().next().unwrap_or_default());

        // Rounding can leave a sample or two in the filter.
        let per_flush = ((padded.len() as f64 * ratio) as usize).max(1);
        let max_flushes = wanted.saturating_sub(output.len()).div_ceil(per_flush) + 2;
        let mut flushes = 0;
        while output.len() < wanted {
            if flushes == max_flushes {
                return Err(Error::ResampleFailure(
                    "resampler did not drain its delay line".into(),
                ));
            }
            let tail = resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| Error::ResampleFailure(e.to_string()))?;
            output.extend(tail.into_iter().next().unwrap_or_default());
            flushes += 1;
        }

        output.truncate(wanted);
        output.drain(..delay);
        log::trace!(
            "resampled {} samples @ {from_hz} Hz -> {} samples @ {to_hz} Hz (delay {delay})",
            samples.len(),
            output.len()
        );
        Ok(output)
    }
}

/// Brings a buffer to the canonical rate, borrowing when it is already there.
pub fn to_canonical<'b, R: Resample + ?Sized>(
    resampler: &R,
    buffer: &'b AudioBuffer<'_>,
) -> Result<Cow<'b, [f32]>> {
    if buffer.is_canonical() {
        return Ok(Cow::Borrowed(buffer.samples()));
    }
    let resampled = resampler.resample(
        buffer.samples(),
        buffer.sample_rate(),
        CANONICAL_SAMPLE_RATE as f64,
    )?;
    Ok(Cow::Owned(resampled))
}
