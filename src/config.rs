//! Configuration for Sonance

use crate::backend::DistanceModel;

/// Default size of one streamed upload window, in bytes.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration descriptor for a [`SonanceWorld`](crate::SonanceWorld).
#[derive(Debug, Clone)]
pub struct SonanceWorldDesc {
    /// Bytes uploaded per `upload_chunk` call for streamed sounds.
    /// Rounded down to a whole number of sample frames per sound.
    pub stream_chunk_size: usize,
    /// Output sample rate used by the software backend and the output engine
    pub sample_rate: u32,
    /// Number of output channels (typically 2 for stereo)
    pub channels: u16,
    /// Frames rendered per output callback
    pub block_size: usize,
    /// Maximum number of concurrently allocated sources
    pub max_sources: usize,
    /// Auxiliary sends a source may use; binding more effects than this fails
    /// without reaching the hardware
    pub max_aux_sends: u32,
    /// Distance attenuation model applied by the hardware
    pub distance_model: DistanceModel,
}

impl Default for SonanceWorldDesc {
    fn default() -> Self {
        Self {
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            sample_rate: 48000,
            channels: 2,
            block_size: 1024,
            max_sources: 256,
            max_aux_sends: 4,
            distance_model: DistanceModel::Linear,
        }
    }
}

impl SonanceWorldDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_chunk_size(mut self, size: usize) -> Self {
        self.stream_chunk_size = size;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    pub fn max_aux_sends(mut self, sends: u32) -> Self {
        self.max_aux_sends = sends;
        self
    }

    pub fn distance_model(mut self, model: DistanceModel) -> Self {
        self.distance_model = model;
        self
    }

    /// Checks the descriptor for values the world cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SonanceError;

        if self.stream_chunk_size == 0 {
            return Err(SonanceError::Configuration(
                "stream_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(SonanceError::Configuration(
                "sample_rate must be greater than 0".to_string(),
            ));
        }
        if self.channels == 0 || self.channels > 2 {
            return Err(SonanceError::Configuration(format!(
                "unsupported output channel count {}",
                self.channels
            )));
        }
        if self.block_size == 0 {
            return Err(SonanceError::Configuration(
                "block_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let desc = SonanceWorldDesc::new()
            .stream_chunk_size(16384)
            .max_aux_sends(2)
            .sample_rate(44100);

        assert_eq!(desc.stream_chunk_size, 16384);
        assert_eq!(desc.max_aux_sends, 2);
        assert_eq!(desc.sample_rate, 44100);
        assert_eq!(desc.channels, 2);
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let desc = SonanceWorldDesc::default().stream_chunk_size(0);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn rejects_surround_output() {
        let desc = SonanceWorldDesc::default().channels(6);
        assert!(desc.validate().is_err());
    }
}
