//! Hardware abstraction consumed by the world.
//!
//! [`AudioBackend`] mirrors the object model of classic positional audio APIs:
//! buffers hold uploaded PCM, voices play queues of buffers, effect objects
//! carry a DSP type and parameters, and auxiliary slots route a voice's send
//! into an effect. Every call is synchronous and returns immediately.
//!
//! [`SoftwareBackend`] keeps that state in memory and can render playing
//! voices into an output block; [`SharedBackend`] wraps it so that an output
//! stream and the world can share it.

mod shared;
mod software;

pub use shared::SharedBackend;
pub use software::{BackendStats, SoftwareBackend};

use crate::effects::{EffectKind, EffectParams};
use crate::math::{Orientation, Vec3};
use thiserror::Error;

/// Hardware buffer object holding one uploaded chunk of PCM.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Hardware voice (one independent playback channel).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(pub u32);

/// Hardware effect object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(pub u32);

/// Hardware auxiliary effect slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuxSlotHandle(pub u32);

/// Errors reported by a hardware call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("invalid name: a bad name (ID) has been specified")]
    InvalidName,

    #[error("invalid enum: an unacceptable value has been specified for an enumerated argument")]
    InvalidEnum,

    #[error("invalid value: a numeric argument is out of range")]
    InvalidValue,

    #[error("invalid operation: the operation is not allowed in the current state")]
    InvalidOperation,

    #[error("out of memory: not enough memory left to execute the command")]
    OutOfMemory,

    #[error("device error: {0}")]
    Device(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Sample layout of an uploaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
}

impl PcmFormat {
    /// Resolves the hardware format for a channel count and sample size.
    /// Returns `None` for layouts the hardware cannot take.
    pub fn from_layout(channels: u16, bits_per_sample: u16) -> Option<Self> {
        match (channels, bits_per_sample) {
            (1, 8) => Some(Self::Mono8),
            (1, 16) => Some(Self::Mono16),
            (2, 8) => Some(Self::Stereo8),
            (2, 16) => Some(Self::Stereo16),
            _ => None,
        }
    }

    pub fn channels(self) -> u16 {
        match self {
            Self::Mono8 | Self::Mono16 => 1,
            Self::Stereo8 | Self::Stereo16 => 2,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Mono8 | Self::Stereo8 => 1,
            Self::Mono16 | Self::Stereo16 => 2,
        }
    }

    pub fn bytes_per_frame(self) -> usize {
        self.bytes_per_sample() * self.channels() as usize
    }
}

/// Transport state of a hardware voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Writable voice properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceProperty {
    Gain(f32),
    Pitch(f32),
    Position(Vec3),
    Velocity(Vec3),
    Orientation(Orientation),
    Looping(bool),
    /// Position is relative to the listener
    Relative(bool),
    RolloffFactor(f32),
    /// Distance under which no attenuation occurs
    ReferenceDistance(f32),
    /// Distance beyond which no further attenuation occurs
    MaxDistance(f32),
    /// Playback cursor in seconds
    PlaybackOffset(f32),
}

/// Writable listener properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListenerProperty {
    Gain(f32),
    Position(Vec3),
    Velocity(Vec3),
    Orientation(Orientation),
}

/// Distance attenuation model applied to every voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceModel {
    None,
    Inverse,
    InverseClamped,
    #[default]
    Linear,
    LinearClamped,
    Exponent,
    ExponentClamped,
}

/// Calls the world issues against the audio hardware.
///
/// Implementations are driven from a single thread (the one that created the
/// owning [`SonanceWorld`](crate::SonanceWorld)); the world enforces that.
pub trait AudioBackend: Send {
    /// Makes (or releases) this backend's context current.
    fn make_context_current(&mut self, _current: bool) -> BackendResult<()> {
        Ok(())
    }

    fn set_distance_model(&mut self, model: DistanceModel) -> BackendResult<()>;

    fn create_buffer(&mut self) -> BackendResult<BufferHandle>;
    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: PcmFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<()>;
    /// Fails if any of the buffers is still queued on a voice.
    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> BackendResult<()>;

    fn create_voice(&mut self) -> BackendResult<VoiceHandle>;
    fn delete_voice(&mut self, voice: VoiceHandle) -> BackendResult<()>;
    fn play_voice(&mut self, voice: VoiceHandle) -> BackendResult<()>;
    fn stop_voice(&mut self, voice: VoiceHandle) -> BackendResult<()>;
    fn pause_voice(&mut self, voice: VoiceHandle) -> BackendResult<()>;
    fn voice_state(&self, voice: VoiceHandle) -> BackendResult<VoiceState>;
    fn queue_buffers(&mut self, voice: VoiceHandle, buffers: &[BufferHandle]) -> BackendResult<()>;
    /// Detaches every queued buffer. The voice must not be playing or paused.
    fn unqueue_all_buffers(&mut self, voice: VoiceHandle) -> BackendResult<()>;
    fn queued_buffer_count(&self, voice: VoiceHandle) -> BackendResult<usize>;
    fn set_voice_property(&mut self, voice: VoiceHandle, property: VoiceProperty)
    -> BackendResult<()>;
    fn voice_gain(&self, voice: VoiceHandle) -> BackendResult<f32>;
    fn voice_pitch(&self, voice: VoiceHandle) -> BackendResult<f32>;
    fn voice_looping(&self, voice: VoiceHandle) -> BackendResult<bool>;
    /// Playback cursor in seconds
    fn voice_playback_offset(&self, voice: VoiceHandle) -> BackendResult<f32>;

    fn create_effect(&mut self) -> BackendResult<EffectHandle>;
    fn delete_effect(&mut self, effect: EffectHandle) -> BackendResult<()>;
    /// Changes the DSP type, resetting every parameter to that type's defaults.
    fn set_effect_kind(&mut self, effect: EffectHandle, kind: EffectKind) -> BackendResult<()>;
    /// Writes a full parameter block; its kind must match the effect's type.
    fn set_effect_params(&mut self, effect: EffectHandle, params: &EffectParams)
    -> BackendResult<()>;

    fn create_aux_slot(&mut self) -> BackendResult<AuxSlotHandle>;
    /// Fails while any voice send still routes into the slot.
    fn delete_aux_slot(&mut self, slot: AuxSlotHandle) -> BackendResult<()>;
    /// Loads the effect's current state into the slot.
    fn attach_effect(&mut self, slot: AuxSlotHandle, effect: EffectHandle) -> BackendResult<()>;
    /// Routes `send` of `voice` into `slot`, or disconnects it with `None`.
    fn connect_aux_send(
        &mut self,
        voice: VoiceHandle,
        send: u32,
        slot: Option<AuxSlotHandle>,
    ) -> BackendResult<()>;

    fn set_listener_property(&mut self, property: ListenerProperty) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_format_resolves_supported_layouts() {
        assert_eq!(PcmFormat::from_layout(1, 16), Some(PcmFormat::Mono16));
        assert_eq!(PcmFormat::from_layout(2, 8), Some(PcmFormat::Stereo8));
        assert_eq!(PcmFormat::from_layout(6, 16), None);
        assert_eq!(PcmFormat::from_layout(1, 24), None);
    }

    #[test]
    fn frame_size_accounts_for_channels() {
        assert_eq!(PcmFormat::Mono8.bytes_per_frame(), 1);
        assert_eq!(PcmFormat::Stereo16.bytes_per_frame(), 4);
    }
}
