pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::{validate_sample_rate, AudioBuffer, RawBuffer, SampleFormat};
pub use resample::{to_canonical, Resample, ResamplerConfig, SincResampler, SincWindow};
