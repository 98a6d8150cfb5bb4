use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::AudioBuffer;
use crate::error::{Error, Result};

pub fn decode_file(path: &Path) -> Result<AudioBuffer<'static>> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let decode_err = |e: symphonia::core::errors::Error| {
        Error::Decode(format!("{}: {}", path.display(), e))
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(decode_err)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode(format!("{}: no audio track", path.display())))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode(format!("{}: unknown sample rate", path.display())))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err(e)),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();
        all_samples.try_reserve(samples.len() / channels)?;

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                let mono: f32 = frame_samples.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        }
    }

    log::debug!(
        "Decoded {}: {} samples, {}Hz, {:.2}s",
        path.display(),
        all_samples.len(),
        sample_rate,
        all_samples.len() as f32 / sample_rate as f32
    );

    AudioBuffer::from_vec(all_samples, sample_rate as f64)
}
