mod load_options;
mod resampler;
mod symphonia_loader;

use crate::backend::PcmFormat;
use crate::error::{Result, SonanceError};
pub use load_options::LoadOptions;
pub use resampler::AudioResampler;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub use symphonia_loader::{decode_sound_bytes, load_sound_file, load_sound_file_simple};

/// Format description of a PCM sound.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundInfo {
    /// Opaque identifier; a random UUID unless the producer names the sound
    pub id: String,
    pub duration: Duration,
    /// Samples per second (Hz)
    pub sample_rate: u32,
    /// 8 or 16
    pub bits_per_sample: u16,
    /// 1 (mono) or 2 (stereo)
    pub channels: u16,
    /// Samples per channel
    pub frames: u64,
}

impl SoundInfo {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            duration: Duration::ZERO,
            sample_rate,
            bits_per_sample,
            channels,
            frames: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Hardware format for this layout, if the hardware supports it.
    pub fn pcm_format(&self) -> Option<PcmFormat> {
        PcmFormat::from_layout(self.channels, self.bits_per_sample)
    }

    pub fn bytes_per_frame(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channels as usize
    }

    /// Sets the frame count and derives the duration from it.
    pub fn set_frames(&mut self, frames: u64) {
        self.frames = frames;
        self.duration = if self.sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
        };
    }

    /// Byte size of `duration` worth of whole frames.
    pub fn byte_size_for(&self, duration: Duration) -> usize {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64) as usize;
        frames.saturating_mul(self.bytes_per_frame())
    }
}

impl fmt::Display for SoundInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id          : {}", self.id)?;
        writeln!(f, "sample size : {} bits", self.bits_per_sample)?;
        writeln!(f, "sample rate : {} hz", self.sample_rate)?;
        writeln!(f, "channels    : {}", self.channels)?;
        writeln!(f, "frames      : {}", self.frames)?;
        write!(f, "duration    : {} seconds", self.duration.as_secs_f64())
    }
}

/// Interleaved PCM bytes (little endian, 8-bit unsigned or 16-bit signed)
/// together with their format.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundData {
    pub info: SoundInfo,
    pub data: Vec<u8>,
}

impl SoundData {
    /// Wraps `data`, deriving frame count and duration from its length.
    pub fn new(mut info: SoundInfo, data: Vec<u8>) -> Self {
        let bytes_per_frame = info.bytes_per_frame();
        if bytes_per_frame > 0 {
            info.set_frames((data.len() / bytes_per_frame) as u64);
        }
        Self { info, data }
    }

    pub fn from_i16_samples(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(SoundInfo::new(sample_rate, 16, channels), data)
    }

    pub(crate) fn from_f32_samples(samples: &[f32], sample_rate: u32, channels: u16) -> Self {
        let data = samples
            .iter()
            .flat_map(|s| ((s * 32768.0).clamp(-32768.0, 32767.0) as i16).to_le_bytes())
            .collect();
        Self::new(SoundInfo::new(sample_rate, 16, channels), data)
    }

    pub fn duration(&self) -> Duration {
        self.info.duration
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Averages left and right into one channel. Mono data is left as is.
    pub fn convert_to_mono(&mut self) -> Result<()> {
        match self.info.channels {
            1 => return Ok(()),
            2 => {}
            n => {
                return Err(SonanceError::AudioFormat(format!(
                    "mono conversion of {} channels is not supported",
                    n
                )));
            }
        }
        self.check_layout()?;

        self.data = match self.info.bits_per_sample {
            8 => self
                .data
                .chunks_exact(2)
                .map(|frame| ((frame[0] as u16 + frame[1] as u16) / 2) as u8)
                .collect(),
            _ => self
                .data
                .chunks_exact(4)
                .flat_map(|frame| {
                    let left = i16::from_le_bytes([frame[0], frame[1]]) as i32;
                    let right = i16::from_le_bytes([frame[2], frame[3]]) as i32;
                    (((left + right) / 2) as i16).to_le_bytes()
                })
                .collect(),
        };
        self.info.channels = 1;
        Ok(())
    }

    /// Duplicates the single channel into left and right.
    pub fn convert_to_stereo(&mut self) -> Result<()> {
        match self.info.channels {
            2 => return Ok(()),
            1 => {}
            n => {
                return Err(SonanceError::AudioFormat(format!(
                    "stereo conversion of {} channels is not supported",
                    n
                )));
            }
        }
        self.check_layout()?;

        let width = self.info.bits_per_sample as usize / 8;
        self.data = self
            .data
            .chunks_exact(width)
            .flat_map(|sample| sample.iter().chain(sample.iter()).copied().collect::<Vec<_>>())
            .collect();
        self.info.channels = 2;
        Ok(())
    }

    fn check_layout(&self) -> Result<()> {
        if !matches!(self.info.bits_per_sample, 8 | 16) {
            return Err(SonanceError::AudioFormat(format!(
                "{} bits per sample is not supported",
                self.info.bits_per_sample
            )));
        }
        if self.data.len() % self.info.bytes_per_frame() != 0 {
            return Err(SonanceError::AudioFormat(
                "sound buffer is not a whole number of frames".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_duration_follow_data_length() {
        let data = SoundData::new(SoundInfo::new(22050, 16, 1), vec![0; 44100]);
        assert_eq!(data.info.frames, 22050);
        assert_eq!(data.duration(), Duration::from_secs(1));
    }

    #[test]
    fn default_id_is_unique() {
        let a = SoundInfo::new(44100, 16, 2);
        let b = SoundInfo::new(44100, 16, 2);
        assert_ne!(a.id, b.id);
        assert_eq!(a.with_id("explosion").id, "explosion");
    }

    #[test]
    fn byte_size_is_frame_aligned() {
        let info = SoundInfo::new(100, 16, 2);
        assert_eq!(info.byte_size_for(Duration::from_millis(1500)), 600);
        assert_eq!(info.byte_size_for(Duration::from_millis(15)), 4);
    }

    #[test]
    fn stereo_16_bit_downmixes_to_average() {
        let mut data = SoundData::from_i16_samples(&[1000, 3000, -200, -400], 8000, 2);
        data.convert_to_mono().unwrap();

        assert_eq!(data.info.channels, 1);
        assert_eq!(data.data, [2000i16, -300].iter().flat_map(|s| s.to_le_bytes()).collect::<Vec<_>>());
        assert_eq!(data.info.frames, 2);
    }

    #[test]
    fn mono_8_bit_duplicates_to_stereo() {
        let mut data = SoundData::new(SoundInfo::new(8000, 8, 1), vec![10, 200]);
        data.convert_to_stereo().unwrap();
        assert_eq!(data.info.channels, 2);
        assert_eq!(data.data, vec![10, 10, 200, 200]);

        data.convert_to_mono().unwrap();
        assert_eq!(data.data, vec![10, 200]);
    }

    #[test]
    fn surround_conversion_is_rejected() {
        let mut data = SoundData::new(SoundInfo::new(8000, 16, 6), vec![0; 12]);
        assert!(data.convert_to_mono().is_err());
        assert_eq!(data.info.channels, 6);
    }
}
