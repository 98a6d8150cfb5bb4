use crate::error::{try_zeroed, Error, Result, TypeMismatchKind};

/// Perceptual feature matrix: one row of `num_channels` values per frame.
///
/// Stored frame-major so each time step is a contiguous slice, which is the
/// access pattern of the alignment in [`super::nsim`].
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram {
    num_channels: usize,
    values: Vec<f32>,
}

impl Spectrogram {
    pub fn zeroed(num_channels: usize, num_frames: usize) -> Result<Self> {
        let len = num_channels
            .checked_mul(num_frames)
            .ok_or_else(|| Error::AllocationFailure("spectrogram size overflows".into()))?;
        Ok(Self {
            num_channels,
            values: try_zeroed(len)?,
        })
    }

    pub fn from_values(num_channels: usize, values: Vec<f32>) -> Result<Self> {
        if num_channels == 0 || values.len() % num_channels != 0 {
            return Err(Error::TypeMismatch(TypeMismatchKind::Length));
        }
        Ok(Self {
            num_channels,
            values,
        })
    }

    /// Restores a spectrogram exported with [`Spectrogram::as_bytes`].
    pub fn from_bytes(num_channels: usize, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % std::mem::size_of::<f32>() != 0 {
            return Err(Error::TypeMismatch(TypeMismatchKind::Length));
        }
        let mut values = Vec::new();
        values.try_reserve_exact(bytes.len() / std::mem::size_of::<f32>())?;
        values.extend(
            bytes
                .chunks_exact(4)
                .map(|b| bytemuck::pod_read_unaligned::<f32>(b)),
        );
        Self::from_values(num_channels, values)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_frames(&self) -> usize {
        if self.num_channels == 0 {
            0
        } else {
            self.values.len() / self.num_channels
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, channel: usize, frame: usize) -> f32 {
        self.values[frame * self.num_channels + channel]
    }

    pub fn frame(&self, frame: usize) -> &[f32] {
        let start = frame * self.num_channels;
        &self.values[start..start + self.num_channels]
    }

    pub(crate) fn frame_mut(&mut self, frame: usize) -> &mut [f32] {
        let start = frame * self.num_channels;
        &mut self.values[start..start + self.num_channels]
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.num_channels.max(1))
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Native-endian bytes of the frame-major values, for caching.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}
