//! In-memory hardware state with a simple PCM mixer.

use super::{
    AudioBackend, AuxSlotHandle, BackendError, BackendResult, BufferHandle, DistanceModel,
    EffectHandle, ListenerProperty, PcmFormat, VoiceHandle, VoiceProperty, VoiceState,
};
use crate::effects::{EffectKind, EffectParams};
use crate::math::{Orientation, Vec3};
use std::collections::HashMap;

/// Counters of the hardware calls a [`SoftwareBackend`] has served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub buffers_created: usize,
    pub buffers_deleted: usize,
    pub buffer_uploads: usize,
    pub voices_created: usize,
    pub voices_deleted: usize,
    pub plays: usize,
    pub stops: usize,
    pub pauses: usize,
    pub aux_connects: usize,
    pub aux_disconnects: usize,
    pub effect_kind_changes: usize,
    pub effect_param_writes: usize,
    pub effect_attaches: usize,
}

#[derive(Debug)]
struct BufferObject {
    format: Option<PcmFormat>,
    data: Vec<u8>,
    sample_rate: u32,
}

impl BufferObject {
    fn frames(&self) -> usize {
        self.format
            .map(|format| self.data.len() / format.bytes_per_frame())
            .unwrap_or(0)
    }

    /// Left and right sample of `frame` as f32 in [-1, 1].
    fn frame(&self, frame: usize) -> (f32, f32) {
        let Some(format) = self.format else {
            return (0.0, 0.0);
        };
        let base = frame * format.bytes_per_frame();
        let sample = |index: usize| -> f32 {
            let at = base + index * format.bytes_per_sample();
            match format.bytes_per_sample() {
                1 => (self.data[at] as f32 - 128.0) / 128.0,
                _ => i16::from_le_bytes([self.data[at], self.data[at + 1]]) as f32 / 32768.0,
            }
        };
        match format.channels() {
            1 => {
                let s = sample(0);
                (s, s)
            }
            _ => (sample(0), sample(1)),
        }
    }
}

#[derive(Debug)]
struct Voice {
    state: VoiceState,
    queue: Vec<BufferHandle>,
    /// Index into `queue` of the buffer being played
    cursor_buffer: usize,
    /// Fractional frame position inside that buffer
    cursor_frame: f64,
    /// A seek happened while stopped and the next play keeps it
    offset_armed: bool,
    gain: f32,
    pitch: f32,
    looping: bool,
    relative: bool,
    position: Vec3,
    velocity: Vec3,
    orientation: Orientation,
    rolloff_factor: f32,
    reference_distance: f32,
    max_distance: f32,
    sends: HashMap<u32, AuxSlotHandle>,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            state: VoiceState::Initial,
            queue: Vec::new(),
            cursor_buffer: 0,
            cursor_frame: 0.0,
            offset_armed: false,
            gain: 1.0,
            pitch: 1.0,
            looping: false,
            relative: false,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Orientation::default(),
            rolloff_factor: 1.0,
            reference_distance: 1.0,
            max_distance: f32::MAX,
            sends: HashMap::new(),
        }
    }
}

impl Voice {
    fn rewind(&mut self) {
        self.cursor_buffer = 0;
        self.cursor_frame = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Listener {
    gain: f32,
    position: Vec3,
    velocity: Vec3,
    orientation: Orientation,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            gain: 1.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Orientation::default(),
        }
    }
}

/// Hardware state kept in memory.
///
/// Enforces the same ordering rules a real driver does: buffers still queued
/// on a voice cannot be deleted, auxiliary slots with connected sends cannot
/// be deleted, and only `max_aux_sends` sends exist per voice.
#[derive(Debug)]
pub struct SoftwareBackend {
    next_handle: u32,
    max_voices: usize,
    max_aux_sends: u32,
    distance_model: DistanceModel,
    buffers: HashMap<BufferHandle, BufferObject>,
    voices: HashMap<VoiceHandle, Voice>,
    effects: HashMap<EffectHandle, EffectParams>,
    slots: HashMap<AuxSlotHandle, Option<EffectParams>>,
    listener: Listener,
    stats: BackendStats,
    refuse_effect_params: bool,
}

impl SoftwareBackend {
    pub fn new(max_voices: usize, max_aux_sends: u32) -> Self {
        Self {
            next_handle: 1,
            max_voices,
            max_aux_sends,
            distance_model: DistanceModel::default(),
            buffers: HashMap::new(),
            voices: HashMap::new(),
            effects: HashMap::new(),
            slots: HashMap::new(),
            listener: Listener::default(),
            stats: BackendStats::default(),
            refuse_effect_params: false,
        }
    }

    /// Makes every following effect parameter write fail with
    /// [`BackendError::InvalidValue`], the way a driver rejects a block it
    /// cannot load.
    pub fn refuse_effect_params(&mut self, refuse: bool) {
        self.refuse_effect_params = refuse;
    }

    pub fn stats(&self) -> &BackendStats {
        &self.stats
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.distance_model
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn aux_slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Size in bytes of the data uploaded into `buffer`.
    pub fn buffer_size(&self, buffer: BufferHandle) -> Option<usize> {
        self.buffers.get(&buffer).map(|b| b.data.len())
    }

    /// Slot currently connected to `send` of `voice`.
    pub fn voice_send(&self, voice: VoiceHandle, send: u32) -> Option<AuxSlotHandle> {
        self.voices.get(&voice)?.sends.get(&send).copied()
    }

    pub fn voice_position(&self, voice: VoiceHandle) -> Option<Vec3> {
        self.voices.get(&voice).map(|v| v.position)
    }

    pub fn voice_velocity(&self, voice: VoiceHandle) -> Option<Vec3> {
        self.voices.get(&voice).map(|v| v.velocity)
    }

    pub fn voice_orientation(&self, voice: VoiceHandle) -> Option<Orientation> {
        self.voices.get(&voice).map(|v| v.orientation)
    }

    pub fn voice_is_relative(&self, voice: VoiceHandle) -> Option<bool> {
        self.voices.get(&voice).map(|v| v.relative)
    }

    /// Rolloff factor, reference distance and max distance of a voice.
    pub fn voice_distance_params(&self, voice: VoiceHandle) -> Option<(f32, f32, f32)> {
        self.voices
            .get(&voice)
            .map(|v| (v.rolloff_factor, v.reference_distance, v.max_distance))
    }

    /// Current parameter block of an effect object.
    pub fn effect_params(&self, effect: EffectHandle) -> Option<&EffectParams> {
        self.effects.get(&effect)
    }

    /// Parameter block loaded into a slot by the last attach.
    pub fn slot_params(&self, slot: AuxSlotHandle) -> Option<&EffectParams> {
        self.slots.get(&slot)?.as_ref()
    }

    pub fn listener_gain(&self) -> f32 {
        self.listener.gain
    }

    pub fn listener_position(&self) -> Vec3 {
        self.listener.position
    }

    pub fn listener_velocity(&self) -> Vec3 {
        self.listener.velocity
    }

    pub fn listener_orientation(&self) -> Orientation {
        self.listener.orientation
    }

    /// Mixes every playing voice into `out` (interleaved, `channels` wide,
    /// overwritten). Voices run off the end of their queue and stop unless
    /// they loop. Returns the number of voices that contributed.
    pub fn render(&mut self, out: &mut [f32], sample_rate: u32, channels: u16) -> usize {
        out.fill(0.0);
        if sample_rate == 0 || channels == 0 {
            return 0;
        }
        let channels = channels as usize;
        let frames = out.len() / channels;
        let listener_gain = self.listener.gain;
        let mut active = 0;

        for voice in self.voices.values_mut() {
            if voice.state != VoiceState::Playing {
                continue;
            }
            active += 1;
            let gain = voice.gain * listener_gain;

            for frame in 0..frames {
                // Skip past finished (or empty) buffers.
                let mut exhausted = false;
                loop {
                    let Some(handle) = voice.queue.get(voice.cursor_buffer) else {
                        if voice.looping && !voice.queue.is_empty() {
                            voice.rewind();
                            continue;
                        }
                        exhausted = true;
                        break;
                    };
                    let buffer_frames = self.buffers.get(handle).map(|b| b.frames()).unwrap_or(0);
                    if (voice.cursor_frame as usize) < buffer_frames {
                        break;
                    }
                    voice.cursor_frame -= buffer_frames as f64;
                    voice.cursor_buffer += 1;
                    if voice.cursor_buffer >= voice.queue.len()
                        && voice.queue.iter().all(|h| {
                            self.buffers.get(h).map(|b| b.frames()).unwrap_or(0) == 0
                        })
                    {
                        exhausted = true;
                        break;
                    }
                }
                if exhausted {
                    voice.state = VoiceState::Stopped;
                    voice.rewind();
                    break;
                }

                let Some(buffer) = self.buffers.get(&voice.queue[voice.cursor_buffer]) else {
                    break;
                };
                let (left, right) = buffer.frame(voice.cursor_frame as usize);
                let slot = &mut out[frame * channels..(frame + 1) * channels];
                if channels == 1 {
                    slot[0] += (left + right) * 0.5 * gain;
                } else {
                    slot[0] += left * gain;
                    slot[1] += right * gain;
                }
                voice.cursor_frame +=
                    buffer.sample_rate as f64 * voice.pitch as f64 / sample_rate as f64;
            }
        }

        active
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn voice(&self, voice: VoiceHandle) -> BackendResult<&Voice> {
        self.voices.get(&voice).ok_or(BackendError::InvalidName)
    }

    fn voice_mut(&mut self, voice: VoiceHandle) -> BackendResult<&mut Voice> {
        self.voices.get_mut(&voice).ok_or(BackendError::InvalidName)
    }

    fn first_sample_rate(&self, voice: &Voice) -> u32 {
        voice
            .queue
            .first()
            .and_then(|h| self.buffers.get(h))
            .map(|b| b.sample_rate)
            .unwrap_or(0)
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(256, 4)
    }
}

impl AudioBackend for SoftwareBackend {
    fn set_distance_model(&mut self, model: DistanceModel) -> BackendResult<()> {
        self.distance_model = model;
        Ok(())
    }

    fn create_buffer(&mut self) -> BackendResult<BufferHandle> {
        let handle = BufferHandle(self.allocate());
        self.buffers.insert(
            handle,
            BufferObject {
                format: None,
                data: Vec::new(),
                sample_rate: 0,
            },
        );
        self.stats.buffers_created += 1;
        Ok(handle)
    }

    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: PcmFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<()> {
        if sample_rate == 0 || data.len() % format.bytes_per_frame() != 0 {
            return Err(BackendError::InvalidValue);
        }
        let queued = self.voices.values().any(|v| v.queue.contains(&buffer));
        let object = self.buffers.get_mut(&buffer).ok_or(BackendError::InvalidName)?;
        if queued {
            return Err(BackendError::InvalidOperation);
        }
        object.format = Some(format);
        object.data = data.to_vec();
        object.sample_rate = sample_rate;
        self.stats.buffer_uploads += 1;
        Ok(())
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> BackendResult<()> {
        for buffer in buffers {
            if !self.buffers.contains_key(buffer) {
                return Err(BackendError::InvalidName);
            }
            if self.voices.values().any(|v| v.queue.contains(buffer)) {
                return Err(BackendError::InvalidOperation);
            }
        }
        for buffer in buffers {
            self.buffers.remove(buffer);
            self.stats.buffers_deleted += 1;
        }
        Ok(())
    }

    fn create_voice(&mut self) -> BackendResult<VoiceHandle> {
        if self.voices.len() >= self.max_voices {
            return Err(BackendError::OutOfMemory);
        }
        let handle = VoiceHandle(self.allocate());
        self.voices.insert(handle, Voice::default());
        self.stats.voices_created += 1;
        Ok(handle)
    }

    fn delete_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.voices.remove(&voice).ok_or(BackendError::InvalidName)?;
        self.stats.voices_deleted += 1;
        Ok(())
    }

    fn play_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        let v = self.voice_mut(voice)?;
        if v.state != VoiceState::Paused && !v.offset_armed {
            v.rewind();
        }
        v.offset_armed = false;
        v.state = VoiceState::Playing;
        self.stats.plays += 1;
        Ok(())
    }

    fn stop_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        let v = self.voice_mut(voice)?;
        if v.state != VoiceState::Initial {
            v.state = VoiceState::Stopped;
        }
        v.offset_armed = false;
        self.stats.stops += 1;
        Ok(())
    }

    fn pause_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        let v = self.voice_mut(voice)?;
        if v.state == VoiceState::Playing {
            v.state = VoiceState::Paused;
        }
        self.stats.pauses += 1;
        Ok(())
    }

    fn voice_state(&self, voice: VoiceHandle) -> BackendResult<VoiceState> {
        Ok(self.voice(voice)?.state)
    }

    fn queue_buffers(&mut self, voice: VoiceHandle, buffers: &[BufferHandle]) -> BackendResult<()> {
        if buffers.iter().any(|b| !self.buffers.contains_key(b)) {
            return Err(BackendError::InvalidName);
        }
        let v = self.voice_mut(voice)?;
        v.queue.extend_from_slice(buffers);
        Ok(())
    }

    fn unqueue_all_buffers(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        let v = self.voice_mut(voice)?;
        if matches!(v.state, VoiceState::Playing | VoiceState::Paused) {
            return Err(BackendError::InvalidOperation);
        }
        v.queue.clear();
        v.rewind();
        v.offset_armed = false;
        Ok(())
    }

    fn queued_buffer_count(&self, voice: VoiceHandle) -> BackendResult<usize> {
        Ok(self.voice(voice)?.queue.len())
    }

    fn set_voice_property(
        &mut self,
        voice: VoiceHandle,
        property: VoiceProperty,
    ) -> BackendResult<()> {
        if let VoiceProperty::PlaybackOffset(seconds) = property {
            let v = self.voice(voice)?;
            let rate = self.first_sample_rate(v);
            if seconds < 0.0 || rate == 0 {
                return Err(BackendError::InvalidValue);
            }
            let mut remaining = (seconds as f64 * rate as f64) as usize;
            let mut target = None;
            for (index, handle) in v.queue.iter().enumerate() {
                let frames = self.buffers.get(handle).map(|b| b.frames()).unwrap_or(0);
                if remaining < frames {
                    target = Some((index, remaining));
                    break;
                }
                remaining -= frames;
            }
            let (index, frame) = target.ok_or(BackendError::InvalidValue)?;
            let v = self.voice_mut(voice)?;
            v.cursor_buffer = index;
            v.cursor_frame = frame as f64;
            v.offset_armed = !matches!(v.state, VoiceState::Playing | VoiceState::Paused);
            return Ok(());
        }

        let v = self.voice_mut(voice)?;
        match property {
            VoiceProperty::Gain(gain) if gain >= 0.0 => v.gain = gain,
            VoiceProperty::Pitch(pitch) if pitch > 0.0 => v.pitch = pitch,
            VoiceProperty::Position(position) => v.position = position,
            VoiceProperty::Velocity(velocity) => v.velocity = velocity,
            VoiceProperty::Orientation(orientation) => v.orientation = orientation,
            VoiceProperty::Looping(looping) => v.looping = looping,
            VoiceProperty::Relative(relative) => v.relative = relative,
            VoiceProperty::RolloffFactor(factor) if factor >= 0.0 => v.rolloff_factor = factor,
            VoiceProperty::ReferenceDistance(d) if d >= 0.0 => v.reference_distance = d,
            VoiceProperty::MaxDistance(d) if d >= 0.0 => v.max_distance = d,
            _ => return Err(BackendError::InvalidValue),
        }
        Ok(())
    }

    fn voice_gain(&self, voice: VoiceHandle) -> BackendResult<f32> {
        Ok(self.voice(voice)?.gain)
    }

    fn voice_pitch(&self, voice: VoiceHandle) -> BackendResult<f32> {
        Ok(self.voice(voice)?.pitch)
    }

    fn voice_looping(&self, voice: VoiceHandle) -> BackendResult<bool> {
        Ok(self.voice(voice)?.looping)
    }

    fn voice_playback_offset(&self, voice: VoiceHandle) -> BackendResult<f32> {
        let v = self.voice(voice)?;
        let rate = self.first_sample_rate(v);
        if rate == 0 || (v.state == VoiceState::Initial && !v.offset_armed) {
            return Ok(0.0);
        }
        let before: usize = v
            .queue
            .iter()
            .take(v.cursor_buffer)
            .map(|h| self.buffers.get(h).map(|b| b.frames()).unwrap_or(0))
            .sum();
        Ok(((before as f64 + v.cursor_frame) / rate as f64) as f32)
    }

    fn create_effect(&mut self) -> BackendResult<EffectHandle> {
        let handle = EffectHandle(self.allocate());
        self.effects
            .insert(handle, EffectParams::default_for(EffectKind::Reverb));
        Ok(handle)
    }

    fn delete_effect(&mut self, effect: EffectHandle) -> BackendResult<()> {
        self.effects
            .remove(&effect)
            .map(|_| ())
            .ok_or(BackendError::InvalidName)
    }

    fn set_effect_kind(&mut self, effect: EffectHandle, kind: EffectKind) -> BackendResult<()> {
        let params = self.effects.get_mut(&effect).ok_or(BackendError::InvalidName)?;
        *params = EffectParams::default_for(kind);
        self.stats.effect_kind_changes += 1;
        Ok(())
    }

    fn set_effect_params(
        &mut self,
        effect: EffectHandle,
        params: &EffectParams,
    ) -> BackendResult<()> {
        let current = self.effects.get_mut(&effect).ok_or(BackendError::InvalidName)?;
        if self.refuse_effect_params {
            return Err(BackendError::InvalidValue);
        }
        if current.kind() != params.kind() {
            return Err(BackendError::InvalidEnum);
        }
        *current = params.clone();
        self.stats.effect_param_writes += 1;
        Ok(())
    }

    fn create_aux_slot(&mut self) -> BackendResult<AuxSlotHandle> {
        let handle = AuxSlotHandle(self.allocate());
        self.slots.insert(handle, None);
        Ok(handle)
    }

    fn delete_aux_slot(&mut self, slot: AuxSlotHandle) -> BackendResult<()> {
        if !self.slots.contains_key(&slot) {
            return Err(BackendError::InvalidName);
        }
        if self
            .voices
            .values()
            .any(|v| v.sends.values().any(|s| *s == slot))
        {
            return Err(BackendError::InvalidOperation);
        }
        self.slots.remove(&slot);
        Ok(())
    }

    fn attach_effect(&mut self, slot: AuxSlotHandle, effect: EffectHandle) -> BackendResult<()> {
        let params = self
            .effects
            .get(&effect)
            .cloned()
            .ok_or(BackendError::InvalidName)?;
        let loaded = self.slots.get_mut(&slot).ok_or(BackendError::InvalidName)?;
        *loaded = Some(params);
        self.stats.effect_attaches += 1;
        Ok(())
    }

    fn connect_aux_send(
        &mut self,
        voice: VoiceHandle,
        send: u32,
        slot: Option<AuxSlotHandle>,
    ) -> BackendResult<()> {
        if send >= self.max_aux_sends {
            return Err(BackendError::InvalidValue);
        }
        if slot.is_some_and(|slot| !self.slots.contains_key(&slot)) {
            return Err(BackendError::InvalidName);
        }
        let v = self.voice_mut(voice)?;
        match slot {
            Some(slot) => {
                v.sends.insert(send, slot);
                self.stats.aux_connects += 1;
            }
            None => {
                v.sends.remove(&send);
                self.stats.aux_disconnects += 1;
            }
        }
        Ok(())
    }

    fn set_listener_property(&mut self, property: ListenerProperty) -> BackendResult<()> {
        match property {
            ListenerProperty::Gain(gain) if gain >= 0.0 => self.listener.gain = gain,
            ListenerProperty::Gain(_) => return Err(BackendError::InvalidValue),
            ListenerProperty::Position(position) => self.listener.position = position,
            ListenerProperty::Velocity(velocity) => self.listener.velocity = velocity,
            ListenerProperty::Orientation(orientation) => self.listener.orientation = orientation,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono16(backend: &mut SoftwareBackend, samples: &[i16], rate: u32) -> BufferHandle {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let buffer = backend.create_buffer().unwrap();
        backend
            .buffer_data(buffer, PcmFormat::Mono16, &bytes, rate)
            .unwrap();
        buffer
    }

    #[test]
    fn queued_buffers_cannot_be_deleted() {
        let mut backend = SoftwareBackend::default();
        let buffer = mono16(&mut backend, &[0; 8], 8000);
        let voice = backend.create_voice().unwrap();
        backend.queue_buffers(voice, &[buffer]).unwrap();

        assert_eq!(
            backend.delete_buffers(&[buffer]),
            Err(BackendError::InvalidOperation)
        );
        backend.unqueue_all_buffers(voice).unwrap();
        assert!(backend.delete_buffers(&[buffer]).is_ok());
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn unqueue_requires_stopped_voice() {
        let mut backend = SoftwareBackend::default();
        let buffer = mono16(&mut backend, &[1000; 64], 8000);
        let voice = backend.create_voice().unwrap();
        backend.queue_buffers(voice, &[buffer]).unwrap();
        backend.play_voice(voice).unwrap();

        assert_eq!(
            backend.unqueue_all_buffers(voice),
            Err(BackendError::InvalidOperation)
        );
        backend.stop_voice(voice).unwrap();
        assert!(backend.unqueue_all_buffers(voice).is_ok());
    }

    #[test]
    fn connect_rejects_send_beyond_limit() {
        let mut backend = SoftwareBackend::new(4, 2);
        let voice = backend.create_voice().unwrap();
        let slot = backend.create_aux_slot().unwrap();

        assert!(backend.connect_aux_send(voice, 1, Some(slot)).is_ok());
        assert_eq!(
            backend.connect_aux_send(voice, 2, Some(slot)),
            Err(BackendError::InvalidValue)
        );
        assert_eq!(backend.voice_send(voice, 1), Some(slot));
        assert_eq!(backend.stats().aux_connects, 1);
    }

    #[test]
    fn connected_slot_cannot_be_deleted() {
        let mut backend = SoftwareBackend::default();
        let voice = backend.create_voice().unwrap();
        let slot = backend.create_aux_slot().unwrap();
        backend.connect_aux_send(voice, 0, Some(slot)).unwrap();

        assert_eq!(
            backend.delete_aux_slot(slot),
            Err(BackendError::InvalidOperation)
        );
        backend.connect_aux_send(voice, 0, None).unwrap();
        assert!(backend.delete_aux_slot(slot).is_ok());
    }

    #[test]
    fn effect_params_must_match_kind() {
        let mut backend = SoftwareBackend::default();
        let effect = backend.create_effect().unwrap();
        backend.set_effect_kind(effect, EffectKind::Echo).unwrap();

        let chorus = EffectParams::default_for(EffectKind::Chorus);
        assert_eq!(
            backend.set_effect_params(effect, &chorus),
            Err(BackendError::InvalidEnum)
        );
        let echo = EffectParams::default_for(EffectKind::Echo);
        assert!(backend.set_effect_params(effect, &echo).is_ok());
    }

    #[test]
    fn voice_limit_reports_out_of_memory() {
        let mut backend = SoftwareBackend::new(1, 4);
        backend.create_voice().unwrap();
        assert_eq!(backend.create_voice(), Err(BackendError::OutOfMemory));
    }

    #[test]
    fn render_mixes_mono_to_both_channels_and_stops_at_end() {
        let mut backend = SoftwareBackend::default();
        let buffer = mono16(&mut backend, &[16384; 4], 8000);
        let voice = backend.create_voice().unwrap();
        backend.queue_buffers(voice, &[buffer]).unwrap();
        backend.play_voice(voice).unwrap();

        let mut out = vec![0.0f32; 16];
        let active = backend.render(&mut out, 8000, 2);

        assert_eq!(active, 1);
        assert!((out[0] - 0.5).abs() < 1e-4);
        assert!((out[1] - 0.5).abs() < 1e-4);
        assert_eq!(out[8], 0.0);
        assert_eq!(backend.voice_state(voice).unwrap(), VoiceState::Stopped);
    }

    #[test]
    fn looping_voice_keeps_playing() {
        let mut backend = SoftwareBackend::default();
        let buffer = mono16(&mut backend, &[8192; 2], 8000);
        let voice = backend.create_voice().unwrap();
        backend.queue_buffers(voice, &[buffer]).unwrap();
        backend
            .set_voice_property(voice, VoiceProperty::Looping(true))
            .unwrap();
        backend.play_voice(voice).unwrap();

        let mut out = vec![0.0f32; 8];
        backend.render(&mut out, 8000, 1);

        assert!(out.iter().all(|s| (*s - 0.25).abs() < 1e-4));
        assert_eq!(backend.voice_state(voice).unwrap(), VoiceState::Playing);
    }

    #[test]
    fn playback_offset_spans_queued_buffers() {
        let mut backend = SoftwareBackend::default();
        let first = mono16(&mut backend, &[0; 100], 100);
        let second = mono16(&mut backend, &[0; 100], 100);
        let voice = backend.create_voice().unwrap();
        backend.queue_buffers(voice, &[first, second]).unwrap();

        backend
            .set_voice_property(voice, VoiceProperty::PlaybackOffset(1.5))
            .unwrap();
        assert!((backend.voice_playback_offset(voice).unwrap() - 1.5).abs() < 1e-4);
        assert_eq!(
            backend.set_voice_property(voice, VoiceProperty::PlaybackOffset(3.0)),
            Err(BackendError::InvalidValue)
        );
    }
}
