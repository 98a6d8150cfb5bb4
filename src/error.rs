use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Which structural check a foreign sample buffer failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeMismatchKind {
    ElementType,
    Dimensionality,
    Contiguity,
    Length,
}

impl fmt::Display for TypeMismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TypeMismatchKind::ElementType => "buffer does not contain 32-bit floats",
            TypeMismatchKind::Dimensionality => "buffer must have exactly one axis",
            TypeMismatchKind::Contiguity => "buffer is not contiguous",
            TypeMismatchKind::Length => "buffer length does not match its shape",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur while comparing audio
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type mismatch: {0}")]
    TypeMismatch(TypeMismatchKind),

    #[error("Invalid sample rate: {0} Hz (must be finite and positive)")]
    InvalidSampleRate(f64),

    #[error("Resampling failed: {0}")]
    ResampleFailure(String),

    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Channel count mismatch: {left} vs {right}")]
    ChannelCountMismatch { left: usize, right: usize },

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::AllocationFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}
