//! # zimtohrli
//!
//! Perceptual audio similarity. Two signals are brought to a common rate,
//! turned into rotator-bank spectrograms, aligned in time and compared with
//! a neurogram-similarity measure. The result is a distance in [0, 1] and a
//! mean opinion score in [1, 5].
//!
//! ## Example
//!
//! ```rust,no_run
//! use zimtohrli::{compare, Comparator, Projection};
//!
//! let reference = vec![0.0f32; 16_000];
//! let degraded = vec![0.0f32; 48_000];
//!
//! // One-shot, any sample rates.
//! let mos = compare(&reference, 16_000.0, &degraded, 48_000.0, Projection::Mos)?;
//!
//! // Many comparisons at 48 kHz: build the comparator once.
//! let comparator = Comparator::new()?;
//! let reference_spec = comparator.analyze(&degraded)?;
//! let result = comparator.compare_spectrograms(&reference_spec, &comparator.analyze(&degraded)?)?;
//! assert_eq!(result.distance, 0.0);
//! # Ok::<(), zimtohrli::Error>(())
//! ```

pub mod audio;
pub mod comparator;
pub mod config;
pub mod engine;
pub mod error;
pub mod mos;

pub use audio::{AudioBuffer, RawBuffer, Resample, ResamplerConfig, SampleFormat, SincResampler};
pub use comparator::{Comparator, Comparison, Projection};
pub use engine::{KernelConfig, PerceptualKernel, Spectrogram, Zimtohrli};
pub use error::{Error, Result, TypeMismatchKind};
pub use mos::{mos_from_distance, Quality};

/// Rate every signal is analysed at, in Hz.
pub const CANONICAL_SAMPLE_RATE: u32 = 48_000;

/// Channels in every spectrogram produced by the bundled kernel.
pub const NUM_CHANNELS: usize = 128;

/// Compares two signals at their own sample rates and returns one projection
/// of the result.
///
/// Both rates are checked before any work starts. Builds a fresh
/// [`Comparator`]; use one directly when comparing repeatedly.
pub fn compare(
    a: &[f32],
    sample_rate_a: f64,
    b: &[f32],
    sample_rate_b: f64,
    projection: Projection,
) -> Result<f64> {
    let a = AudioBuffer::new(a, sample_rate_a)?;
    let b = AudioBuffer::new(b, sample_rate_b)?;
    let comparator = Comparator::new()?;
    Ok(comparator.compare_buffers(&a, &b)?.project(projection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, rate: f64, secs: f64, amplitude: f64) -> Vec<f32> {
        let len = (rate * secs).round() as usize;
        (0..len)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / rate).sin()) as f32)
            .collect()
    }

    #[test]
    fn identity_gives_zero_distance_and_top_score() {
        for rate in [48_000.0, 16_000.0, 44_100.0] {
            let x = tone(700.0, rate, 0.2, 0.5);
            assert_eq!(compare(&x, rate, &x, rate, Projection::Distance).unwrap(), 0.0);
            assert_eq!(compare(&x, rate, &x, rate, Projection::Mos).unwrap(), 5.0);
        }
    }

    #[test]
    fn results_are_bit_reproducible() {
        let a = tone(1000.0, 48_000.0, 0.02, 0.5);
        let b = tone(440.0, 48_000.0, 0.02, 0.5);
        let comparator = Comparator::new().unwrap();
        let first = comparator.compare(&a, &b).unwrap();
        for _ in 0..100 {
            let again = comparator.compare(&a, &b).unwrap();
            assert_eq!(again.distance.to_bits(), first.distance.to_bits());
            assert_eq!(again.mos.to_bits(), first.mos.to_bits());
        }
        let one_shot = compare(&a, 48_000.0, &b, 48_000.0, Projection::Distance).unwrap();
        assert_eq!(one_shot.to_bits(), first.distance.to_bits());
    }

    #[test]
    fn canonical_rate_passes_straight_through() {
        let comparator = Comparator::new().unwrap();
        let x = tone(1000.0, 48_000.0, 0.1, 0.5);
        let buffer = AudioBuffer::new(&x, 48_000.0).unwrap();
        assert_eq!(
            comparator.analyze_buffer(&buffer).unwrap(),
            comparator.analyze(&x).unwrap()
        );
    }

    #[test]
    fn resampled_copy_of_a_tone_is_close() {
        let at_16k = tone(1000.0, 16_000.0, 1.0, 0.5);
        let at_44k = SincResampler::default()
            .resample(&at_16k, 16_000.0, 44_100.0)
            .unwrap();
        let distance =
            compare(&at_16k, 16_000.0, &at_44k, 44_100.0, Projection::Distance).unwrap();
        assert!(distance < 0.01, "distance {distance}");
    }

    #[test]
    fn short_buffers_compare_at_any_rate() {
        for rate in [16_000.0, 44_100.0, 96_000.0] {
            for len in [1, 10, 20, 31, 40] {
                let x = vec![0.1f32; len];
                assert_eq!(compare(&x, rate, &x, rate, Projection::Distance).unwrap(), 0.0);
                let canonical = vec![0.1f32; 480];
                let d = compare(&x, rate, &canonical, 48_000.0, Projection::Distance).unwrap();
                assert!((0.0..=1.0).contains(&d), "distance {d}");
            }
        }
    }

    #[test]
    fn scores_stay_in_range() {
        let a = tone(1000.0, 48_000.0, 0.2, 1.0);
        let b = tone(440.0, 48_000.0, 0.2, 1.0);
        let distance = compare(&a, 48_000.0, &b, 48_000.0, Projection::Distance).unwrap();
        let mos = compare(&a, 48_000.0, &b, 48_000.0, Projection::Mos).unwrap();
        assert!(distance > 0.0 && distance <= 1.0, "distance {distance}");
        assert!((1.0..5.0).contains(&mos), "mos {mos}");
    }

    #[test]
    fn empty_inputs_compare_equal() {
        assert_eq!(
            compare(&[], 48_000.0, &[], 16_000.0, Projection::Distance).unwrap(),
            0.0
        );
    }

    #[test]
    fn invalid_rate_is_rejected_before_work() {
        let x = tone(1000.0, 48_000.0, 0.1, 0.5);
        for bad in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compare(&x, bad, &x, 48_000.0, Projection::Mos),
                Err(Error::InvalidSampleRate(_))
            ));
            assert!(matches!(
                compare(&x, 48_000.0, &x, bad, Projection::Mos),
                Err(Error::InvalidSampleRate(_))
            ));
        }
    }

    #[test]
    fn unsupported_rate_ratio_is_a_resample_failure() {
        let x = vec![0.0f32; 64];
        assert!(matches!(
            compare(&x, 10.0, &x, 48_000.0, Projection::Distance),
            Err(Error::ResampleFailure(_))
        ));
    }

    #[test]
    fn pure_tones_match_published_reference() {
        let a = tone(1000.0, 48_000.0, 1.0, 1.0);
        let b = tone(440.0, 48_000.0, 1.0, 1.0);
        let distance = compare(&a, 48_000.0, &b, 48_000.0, Projection::Distance).unwrap();
        let mos = compare(&a, 48_000.0, &b, 48_000.0, Projection::Mos).unwrap();
        assert!((distance - 0.014).abs() <= 0.002, "distance {distance}");
        assert!((mos - 2.9).abs() <= 0.2, "mos {mos}");
    }

    #[test]
    fn mos_separates_mild_and_strong_changes() {
        let comparator = Comparator::new().unwrap();
        let reference = tone(1000.0, 48_000.0, 1.0, 1.0);
        let quieter = comparator
            .compare(&reference, &tone(1000.0, 48_000.0, 1.0, 0.5))
            .unwrap();
        let detuned = comparator
            .compare(&reference, &tone(440.0, 48_000.0, 1.0, 1.0))
            .unwrap();
        assert!(quieter.mos > 3.5, "quieter {quieter:?}");
        assert!(detuned.mos < quieter.mos, "detuned {detuned:?}");
        assert!(detuned.mos > 1.5, "detuned {detuned:?}");
    }
}
