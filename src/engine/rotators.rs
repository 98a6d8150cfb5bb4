//! Rotator filterbank: the analysis half of the bundled kernel.
//!
//! Each channel is a cascade of complex one-pole resonators ("rotators")
//! tuned to a centre frequency on the ERB-rate scale. The squared magnitude
//! of the last stage is averaged over a hop and converted to dB above the
//! hearing floor.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use super::spectrogram::Spectrogram;
use crate::error::{try_zeroed, Error, Result};

pub const CASCADE_DEPTH: usize = 3;
pub const MIN_FREQUENCY_HZ: f64 = 40.0;
pub const MAX_FREQUENCY_HZ: f64 = 18_000.0;

/// dB offset so that a full-scale sine lands near 78 dB SPL.
pub const FULL_SCALE_DB: f64 = 84.0;

/// Values are floored here; silence analyses to an all-floor spectrogram.
pub const FLOOR_DB: f32 = 0.0;

const ENERGY_EPSILON: f64 = 1e-12;
const ERB_BANDWIDTH_FACTOR: f64 = 1.019;

fn erb_rate(freq_hz: f64) -> f64 {
    21.4 * (1.0 + 0.00437 * freq_hz).log10()
}

fn erb_rate_to_hz(rate: f64) -> f64 {
    (10f64.powf(rate / 21.4) - 1.0) / 0.00437
}

fn erb_bandwidth(freq_hz: f64) -> f64 {
    24.7 * (4.37 * freq_hz / 1000.0 + 1.0)
}

#[derive(Clone, Copy, Debug)]
struct Rotator {
    pole: Complex<f64>,
    gain: f64,
}

#[derive(Clone, Debug)]
pub struct RotatorBank {
    rotators: Vec<Rotator>,
    frequencies: Vec<f64>,
    hop: usize,
}

impl RotatorBank {
    pub fn new(num_channels: usize, sample_rate: f64, hop: usize) -> Result<Self> {
        if num_channels == 0 || hop == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "rotator bank needs at least one channel and a non-zero hop, got {num_channels} channels and hop {hop}"
            )));
        }
        let mut rotators = Vec::new();
        rotators.try_reserve_exact(num_channels)?;
        let mut frequencies = Vec::new();
        frequencies.try_reserve_exact(num_channels)?;

        let low = erb_rate(MIN_FREQUENCY_HZ);
        let high = erb_rate(MAX_FREQUENCY_HZ);
        let step = if num_channels > 1 {
            (high - low) / (num_channels - 1) as f64
        } else {
            0.0
        };

        for k in 0..num_channels {
            let freq = erb_rate_to_hz(low + step * k as f64);
            let radius = (-2.0 * PI * ERB_BANDWIDTH_FACTOR * erb_bandwidth(freq) / sample_rate).exp();
            let angle = 2.0 * PI * freq / sample_rate;
            rotators.push(Rotator {
                pole: Complex::from_polar(radius, angle),
                gain: 1.0 - radius,
            });
            frequencies.push(freq);
        }

        Ok(Self {
            rotators,
            frequencies,
            hop,
        })
    }

    pub fn num_channels(&self) -> usize {
        self.rotators.len()
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Centre frequencies in Hz, ascending.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Runs the bank over `samples`. One frame per started hop; the last
    /// frame averages only the samples it has.
    pub fn analyze(&self, samples: &[f32]) -> Result<Spectrogram> {
        let num_channels = self.num_channels();
        let num_frames = samples.len().div_ceil(self.hop);
        let mut spectrogram = Spectrogram::zeroed(num_channels, num_frames)?;
        if num_frames == 0 {
            return Ok(spectrogram);
        }

        let mut state: Vec<[Complex<f64>; CASCADE_DEPTH]> = try_zeroed(num_channels)?;
        let mut energy: Vec<f64> = try_zeroed(num_channels)?;

        for (frame_idx, chunk) in samples.chunks(self.hop).enumerate() {
            energy.fill(0.0);
            for &sample in chunk {
                let x = Complex::new(sample as f64, 0.0);
                for ((rotator, stages), acc) in self
                    .rotators
                    .iter()
                    .zip(state.iter_mut())
                    .zip(energy.iter_mut())
                {
                    let mut input = x;
                    for stage in stages.iter_mut() {
                        *stage = rotator.pole * *stage + input * rotator.gain;
                        input = *stage;
                    }
                    *acc += input.norm_sqr();
                }
            }

            let count = chunk.len() as f64;
            for (value, &acc) in spectrogram.frame_mut(frame_idx).iter_mut().zip(energy.iter()) {
                let db = 10.0 * (acc / count + ENERGY_EPSILON).log10() + FULL_SCALE_DB;
                *value = (db as f32).max(FLOOR_DB);
            }
        }

        Ok(spectrogram)
    }
}
