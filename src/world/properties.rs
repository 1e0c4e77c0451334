use super::{SonanceWorld, logged};
use crate::backend::{VoiceProperty, VoiceState};
use crate::math::{Orientation, Vec3};
use crate::source::SourceId;
use std::time::Duration;

impl SonanceWorld {
    fn set_voice_property(&mut self, source: SourceId, property: VoiceProperty) -> bool {
        let Some(voice) = self.sources.get(&source).map(|s| s.voice) else {
            return false;
        };
        logged(
            "set_voice_property",
            self.hardware.get_mut().set_voice_property(voice, property),
        )
        .is_some()
    }

    /// Sets the loop flag and tells bound effects about it.
    pub fn set_looping(&mut self, source: SourceId, looping: bool) -> bool {
        if !self.set_voice_property(source, VoiceProperty::Looping(looping)) {
            return false;
        }
        self.notify_effects(source, |hooks, ctx| hooks.loop_changed(ctx, looping));
        true
    }

    /// Sets the gain of a source. While muted the value is stored and
    /// applied on unmute.
    pub fn set_volume(&mut self, source: SourceId, volume: f32) -> bool {
        let Self {
            sources, hardware, ..
        } = self;
        let Some(src) = sources.get_mut(&source) else {
            return false;
        };
        src.gain.set_volume(hardware.get_mut(), src.voice, volume);
        true
    }

    /// Gain of a source; the saved gain while muted.
    pub fn volume(&self, source: SourceId) -> Option<f32> {
        let src = self.sources.get(&source)?;
        Some(src.gain.volume(self.hardware.get(), src.voice))
    }

    pub fn mute(&mut self, source: SourceId) -> bool {
        let Self {
            sources, hardware, ..
        } = self;
        let Some(src) = sources.get_mut(&source) else {
            return false;
        };
        src.gain.mute(hardware.get_mut(), src.voice);
        true
    }

    pub fn unmute(&mut self, source: SourceId) -> bool {
        let Self {
            sources, hardware, ..
        } = self;
        let Some(src) = sources.get_mut(&source) else {
            return false;
        };
        src.gain.unmute(hardware.get_mut(), src.voice);
        true
    }

    pub fn is_muted(&self, source: SourceId) -> bool {
        self.sources.get(&source).is_some_and(|s| s.gain.is_muted())
    }

    pub fn set_pitch(&mut self, source: SourceId, pitch: f32) -> bool {
        self.set_voice_property(source, VoiceProperty::Pitch(pitch))
    }

    pub fn pitch(&self, source: SourceId) -> Option<f32> {
        let voice = self.sources.get(&source)?.voice;
        logged("voice_pitch", self.hardware.get().voice_pitch(voice))
    }

    pub fn set_position(&mut self, source: SourceId, position: Vec3) -> bool {
        self.set_voice_property(source, VoiceProperty::Position(position))
    }

    pub fn set_velocity(&mut self, source: SourceId, velocity: Vec3) -> bool {
        self.set_voice_property(source, VoiceProperty::Velocity(velocity))
    }

    pub fn set_orientation(&mut self, source: SourceId, orientation: Orientation) -> bool {
        self.set_voice_property(source, VoiceProperty::Orientation(orientation))
    }

    /// Interprets the source position relative to the listener when set.
    pub fn set_relative(&mut self, source: SourceId, relative: bool) -> bool {
        self.set_voice_property(source, VoiceProperty::Relative(relative))
    }

    pub fn set_rolloff_factor(&mut self, source: SourceId, factor: f32) -> bool {
        self.set_voice_property(source, VoiceProperty::RolloffFactor(factor))
    }

    /// Sets the reference distance (full gain) and the maximum distance
    /// (attenuation stops) of a source.
    pub fn set_distance(&mut self, source: SourceId, reference: f32, max: f32) -> bool {
        self.set_voice_property(source, VoiceProperty::ReferenceDistance(reference))
            && self.set_voice_property(source, VoiceProperty::MaxDistance(max))
    }

    /// Moves the playback cursor of a source.
    ///
    /// Streamed sounds are uploaded far enough to cover the target plus one
    /// second before seeking. Bound effects are notified afterwards.
    pub fn set_playback_position(&mut self, source: SourceId, position: Duration) -> bool {
        let Some(sound) = self.source_sound(source) else {
            return false;
        };
        let ahead = position.saturating_add(Duration::from_secs(1));
        let needed = self.sound_byte_size_for(sound, ahead);
        self.upload_until(sound, needed);

        if !self.set_voice_property(source, VoiceProperty::PlaybackOffset(position.as_secs_f32()))
        {
            return false;
        }
        self.notify_effects(source, |hooks, ctx| hooks.playback_position_changed(ctx));
        true
    }

    /// Current playback position of a source.
    pub fn playback_position(&self, source: SourceId) -> Duration {
        let Some(src) = self.sources.get(&source) else {
            return Duration::ZERO;
        };
        let seconds = logged(
            "voice_playback_offset",
            self.hardware.get().voice_playback_offset(src.voice),
        )
        .unwrap_or(0.0);
        Duration::from_secs_f32(seconds.max(0.0))
    }

    /// Duration of the sound bound to a source.
    pub fn playback_duration(&self, source: SourceId) -> Duration {
        self.source_sound_info(source)
            .map(|info| info.duration)
            .unwrap_or_default()
    }

    /// Hardware state of the source's voice.
    pub fn source_state(&self, source: SourceId) -> Option<VoiceState> {
        let voice = self.sources.get(&source)?.voice;
        logged("voice_state", self.hardware.get().voice_state(voice))
    }

    pub fn is_playing(&self, source: SourceId) -> bool {
        self.source_state(source) == Some(VoiceState::Playing)
    }

    pub fn is_paused(&self, source: SourceId) -> bool {
        self.source_state(source) == Some(VoiceState::Paused)
    }

    /// True for a stopped voice and for one that never played.
    pub fn is_stopped(&self, source: SourceId) -> bool {
        matches!(
            self.source_state(source),
            Some(VoiceState::Stopped | VoiceState::Initial)
        )
    }

    pub fn is_looping(&self, source: SourceId) -> bool {
        let Some(src) = self.sources.get(&source) else {
            return false;
        };
        logged("voice_looping", self.hardware.get().voice_looping(src.voice)).unwrap_or(false)
    }
}
