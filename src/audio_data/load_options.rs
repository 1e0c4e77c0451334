use std::time::Duration;

/// Options applied while decoding a file into [`SoundData`](super::SoundData).
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Resample to this rate (None = keep the file's rate)
    pub target_sample_rate: Option<u32>,
    /// Downmix to one channel; positional playback wants mono sounds
    pub convert_to_mono: bool,
    /// Stop decoding after this much audio (None = whole file)
    pub max_duration: Option<Duration>,
    /// Channel kept when converting to mono (None = average all channels)
    pub mono_channel: Option<usize>,
    /// Identifier stored in the resulting `SoundInfo` (None = random UUID)
    pub sound_id: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = Some(rate);
        self
    }

    pub fn convert_to_mono(mut self, convert: bool) -> Self {
        self.convert_to_mono = convert;
        self
    }

    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    pub fn mono_channel(mut self, channel: usize) -> Self {
        self.mono_channel = Some(channel);
        self
    }

    pub fn sound_id(mut self, id: impl Into<String>) -> Self {
        self.sound_id = Some(id.into());
        self
    }
}
