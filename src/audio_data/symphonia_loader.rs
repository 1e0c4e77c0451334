use crate::{
    audio_data::{AudioResampler, LoadOptions, SoundData},
    error::{Result, SonanceError},
};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use symphonia::{
    core::{
        audio::SampleBuffer,
        codecs::DecoderOptions,
        errors::Error,
        formats::FormatOptions,
        io::{MediaSource, MediaSourceStream},
        meta::MetadataOptions,
        probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Decodes an audio file into 16-bit PCM.
pub fn load_sound_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<SoundData> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    log::debug!("Decoding {}", path.display());
    decode(Box::new(file), hint, options)
}

/// Convenience function to load a file with default options
pub fn load_sound_file_simple(path: impl AsRef<Path>) -> Result<SoundData> {
    load_sound_file(path, &LoadOptions::default())
}

/// Decodes an in-memory encoded file. `extension` (e.g. `"wav"`) helps the
/// format probe.
pub fn decode_sound_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    options: &LoadOptions,
) -> Result<SoundData> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }
    decode(Box::new(Cursor::new(bytes)), hint, options)
}

fn decode(source: Box<dyn MediaSource>, hint: Hint, options: &LoadOptions) -> Result<SoundData> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SonanceError::AudioLoading(format!("Failed to probe audio format: {:?}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SonanceError::AudioLoading("No default audio track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SonanceError::AudioLoading("Sample rate not found".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| SonanceError::AudioLoading("Channel count not found".to_string()))?
        .count() as u16;

    if let Some(ch) = options.mono_channel {
        if ch >= channels as usize {
            return Err(SonanceError::AudioFormat(format!(
                "Channel {} out of range (max: {})",
                ch,
                channels - 1
            )));
        }
    }

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SonanceError::AudioLoading(format!("Failed to create decoder: {:?}", e)))?;

    let max_frames = options
        .max_duration
        .map(|d| (d.as_secs_f64() * sample_rate as f64) as usize)
        .unwrap_or(usize::MAX);

    let mut samples: Vec<f32> = Vec::new();
    let mut frames_decoded = 0;

    while frames_decoded < max_frames {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end-of-file
            Err(e) => {
                return Err(SonanceError::AudioLoading(format!(
                    "Error reading packet: {:?}",
                    e
                )));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break,
            Err(Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(SonanceError::AudioLoading(format!(
                    "Error decoding packet: {:?}",
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        tmp.copy_interleaved_ref(decoded);

        frames_decoded += tmp.samples().len() / channels as usize;
        samples.extend_from_slice(tmp.samples());
    }

    samples.truncate(max_frames.saturating_mul(channels as usize));

    let (samples, channels) = if options.convert_to_mono && channels > 1 {
        let mono = match options.mono_channel {
            Some(ch) => samples
                .chunks_exact(channels as usize)
                .map(|frame| frame[ch])
                .collect(),
            None => samples
                .chunks_exact(channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect(),
        };
        (mono, 1)
    } else {
        (samples, channels)
    };

    let (samples, sample_rate) = match options.target_sample_rate {
        Some(target) if target != sample_rate => {
            let resampler = AudioResampler::new(sample_rate, target, channels, None)?;
            (resampler.resample_interleaved(&samples)?, target)
        }
        _ => (samples, sample_rate),
    };

    let mut data = SoundData::from_f32_samples(&samples, sample_rate, channels);
    if let Some(id) = &options.sound_id {
        data.info.id = id.clone();
    }
    log::debug!(
        "Decoded {} frames at {} Hz, {} channel(s)",
        data.info.frames,
        sample_rate,
        channels
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    fn decoded_samples(data: &SoundData) -> Vec<i16> {
        data.data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn decodes_wav_to_16_bit_pcm() {
        let samples: Vec<i16> = (0..800).map(|i| (i * 40 - 16000) as i16).collect();
        let bytes = wav_bytes(&samples, 8000, 1);

        let data = decode_sound_bytes(bytes, Some("wav"), &LoadOptions::default()).unwrap();

        assert_eq!(data.info.sample_rate, 8000);
        assert_eq!(data.info.channels, 1);
        assert_eq!(data.info.bits_per_sample, 16);
        assert_eq!(data.info.frames, 800);
        for (got, want) in decoded_samples(&data).iter().zip(&samples) {
            assert!((*got as i32 - *want as i32).abs() <= 1);
        }
    }

    #[test]
    fn downmixes_and_limits_duration() {
        let samples: Vec<i16> = (0..1600).map(|i| if i % 2 == 0 { 1000 } else { 3000 }).collect();
        let bytes = wav_bytes(&samples, 8000, 2);
        let options = LoadOptions::new()
            .convert_to_mono(true)
            .max_duration(Duration::from_millis(50))
            .sound_id("two-tone");

        let data = decode_sound_bytes(bytes, Some("wav"), &options).unwrap();

        assert_eq!(data.info.id, "two-tone");
        assert_eq!(data.info.channels, 1);
        assert_eq!(data.info.frames, 400);
        assert!(decoded_samples(&data).iter().all(|s| (*s - 2000).abs() <= 1));
    }

    #[test]
    fn garbage_is_a_loading_error() {
        let result = decode_sound_bytes(vec![1, 2, 3, 4], None, &LoadOptions::default());
        assert!(matches!(result, Err(SonanceError::AudioLoading(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_sound_file_simple("does/not/exist.wav");
        assert!(matches!(result, Err(SonanceError::Io(_))));
    }
}
