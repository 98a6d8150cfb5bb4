//! Typed audio buffers and validation of foreign sample memory.
//!
//! Everything past this module works on `&[f32]` at a known rate; the checks
//! here run once, at the boundary, before a single sample is read.

use std::borrow::Cow;

use crate::error::{Error, Result, TypeMismatchKind};
use crate::CANONICAL_SAMPLE_RATE;

/// Element encoding advertised by a foreign buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
    F64,
    I16,
    I32,
    U8,
}

/// Descriptor of a sample buffer owned by someone else (an FFI caller, a
/// memory-mapped file, an array library). Byte order is native.
#[derive(Clone, Copy, Debug)]
pub struct RawBuffer<'a> {
    pub data: &'a [u8],
    pub format: SampleFormat,
    pub item_size: usize,
    pub shape: &'a [usize],
    pub strides: &'a [isize],
}

impl<'a> RawBuffer<'a> {
    pub fn contiguous_f32(data: &'a [u8], shape: &'a [usize], strides: &'a [isize]) -> Self {
        Self {
            data,
            format: SampleFormat::F32,
            item_size: std::mem::size_of::<f32>(),
            shape,
            strides,
        }
    }

    /// Checks element type, dimensionality and contiguity, in that order.
    pub fn validate(&self) -> Result<usize> {
        if self.format != SampleFormat::F32 || self.item_size != std::mem::size_of::<f32>() {
            return Err(Error::TypeMismatch(TypeMismatchKind::ElementType));
        }
        if self.shape.len() != 1 {
            return Err(Error::TypeMismatch(TypeMismatchKind::Dimensionality));
        }
        let len = self.shape[0];
        // A stride is meaningless for fewer than two elements.
        if len > 1 && (self.strides.len() != 1 || self.strides[0] != self.item_size as isize) {
            return Err(Error::TypeMismatch(TypeMismatchKind::Contiguity));
        }
        if len.checked_mul(self.item_size) != Some(self.data.len()) {
            return Err(Error::TypeMismatch(TypeMismatchKind::Length));
        }
        Ok(len)
    }
}

/// Mono f32 samples with a declared sample rate.
#[derive(Clone, Debug)]
pub struct AudioBuffer<'a> {
    samples: Cow<'a, [f32]>,
    sample_rate: f64,
}

impl<'a> AudioBuffer<'a> {
    pub fn new(samples: &'a [f32], sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        Ok(Self {
            samples: Cow::Borrowed(samples),
            sample_rate,
        })
    }

    pub fn from_vec(samples: Vec<f32>, sample_rate: f64) -> Result<AudioBuffer<'static>> {
        validate_sample_rate(sample_rate)?;
        Ok(AudioBuffer {
            samples: Cow::Owned(samples),
            sample_rate,
        })
    }

    /// Interprets native-endian f32 bytes. Borrows when the bytes are
    /// aligned, copies otherwise.
    pub fn from_bytes(bytes: &'a [u8], sample_rate: f64) -> Result<Self> {
        if bytes.len() % std::mem::size_of::<f32>() != 0 {
            return Err(Error::TypeMismatch(TypeMismatchKind::Length));
        }
        validate_sample_rate(sample_rate)?;
        let samples = match bytemuck::try_cast_slice::<u8, f32>(bytes) {
            Ok(samples) => Cow::Borrowed(samples),
            Err(_) => {
                log::trace!("unaligned sample bytes, copying {} bytes", bytes.len());
                Cow::Owned(bytemuck::pod_collect_to_vec::<u8, f32>(bytes))
            }
        };
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn from_raw(raw: RawBuffer<'a>, sample_rate: f64) -> Result<Self> {
        raw.validate()?;
        Self::from_bytes(raw.data, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn is_canonical(&self) -> bool {
        self.sample_rate == CANONICAL_SAMPLE_RATE as f64
    }
}

pub fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSampleRate(sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_bytes(samples: &[f32]) -> &[u8] {
        bytemuck::cast_slice(samples)
    }

    #[test]
    fn accepts_contiguous_f32() {
        let samples = [0.1f32, -0.2, 0.3];
        let shape = [3usize];
        let strides = [4isize];
        let raw = RawBuffer::contiguous_f32(as_bytes(&samples), &shape, &strides);
        let buffer = AudioBuffer::from_raw(raw, 48_000.0).unwrap();
        assert_eq!(buffer.samples(), &samples);
        assert!(buffer.is_canonical());
    }

    #[test]
    fn rejects_wrong_element_type() {
        let data = [0u8; 16];
        let shape = [2usize];
        let strides = [8isize];
        let raw = RawBuffer {
            data: &data,
            format: SampleFormat::F64,
            item_size: 8,
            shape: &shape,
            strides: &strides,
        };
        let err = AudioBuffer::from_raw(raw, 48_000.0).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::ElementType)));
    }

    #[test]
    fn rejects_two_axes() {
        let samples = [0.0f32; 4];
        let shape = [2usize, 2];
        let strides = [8isize, 4];
        let raw = RawBuffer::contiguous_f32(as_bytes(&samples), &shape, &strides);
        let err = AudioBuffer::from_raw(raw, 48_000.0).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::Dimensionality)));
    }

    #[test]
    fn rejects_strided_view() {
        let samples = [0.0f32; 4];
        let shape = [2usize];
        let strides = [8isize];
        let raw = RawBuffer::contiguous_f32(as_bytes(&samples), &shape, &strides);
        let err = AudioBuffer::from_raw(raw, 48_000.0).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::Contiguity)));
    }

    #[test]
    fn element_type_is_checked_before_shape() {
        let data = [0u8; 8];
        let shape = [2usize, 1];
        let strides = [2isize, 2];
        let raw = RawBuffer {
            data: &data,
            format: SampleFormat::I16,
            item_size: 2,
            shape: &shape,
            strides: &strides,
        };
        let err = raw.validate().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::ElementType)));
    }

    #[test]
    fn rejects_length_disagreeing_with_shape() {
        let samples = [0.0f32; 3];
        let shape = [4usize];
        let strides = [4isize];
        let raw = RawBuffer::contiguous_f32(as_bytes(&samples), &shape, &strides);
        let err = raw.validate().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::Length)));
    }

    #[test]
    fn empty_buffer_is_valid() {
        let shape = [0usize];
        let raw = RawBuffer::contiguous_f32(&[], &shape, &[]);
        let buffer = AudioBuffer::from_raw(raw, 16_000.0).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn from_bytes_handles_unaligned_input() {
        let samples = [1.0f32, 2.0, 3.0];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(as_bytes(&samples));
        let buffer = AudioBuffer::from_bytes(&bytes[1..], 44_100.0).unwrap();
        assert_eq!(buffer.samples(), &samples);
    }

    #[test]
    fn from_bytes_rejects_partial_sample() {
        let err = AudioBuffer::from_bytes(&[0u8; 6], 48_000.0).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(TypeMismatchKind::Length)));
    }

    #[test]
    fn sample_rate_validation() {
        assert!(validate_sample_rate(48_000.0).is_ok());
        assert!(validate_sample_rate(22_050.5).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                validate_sample_rate(bad),
                Err(Error::InvalidSampleRate(_))
            ));
        }
    }
}
