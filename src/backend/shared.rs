use super::{
    AudioBackend, AuxSlotHandle, BackendError, BackendResult, BufferHandle, DistanceModel,
    EffectHandle, ListenerProperty, PcmFormat, SoftwareBackend, VoiceHandle, VoiceProperty,
    VoiceState,
};
use crate::effects::{EffectKind, EffectParams};
use std::sync::{Arc, Mutex, MutexGuard};

/// A [`SoftwareBackend`] shared between the world and an output stream.
///
/// The world drives it through [`AudioBackend`]; the output callback calls
/// [`SharedBackend::try_render`], which never blocks.
#[derive(Debug, Clone)]
pub struct SharedBackend {
    inner: Arc<Mutex<SoftwareBackend>>,
}

impl SharedBackend {
    pub fn new(backend: SoftwareBackend) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
        }
    }

    /// Locks the backend for inspection.
    pub fn lock(&self) -> BackendResult<MutexGuard<'_, SoftwareBackend>> {
        self.inner
            .lock()
            .map_err(|_| BackendError::Device("software backend mutex poisoned".into()))
    }

    /// Renders into `out` if the backend is not busy, otherwise writes
    /// silence. Returns the number of frames produced.
    pub fn try_render(&self, out: &mut [f32], sample_rate: u32, channels: u16) -> usize {
        match self.inner.try_lock() {
            Ok(mut backend) => {
                backend.render(out, sample_rate, channels);
                out.len() / channels.max(1) as usize
            }
            Err(_) => {
                out.fill(0.0);
                0
            }
        }
    }
}

impl AudioBackend for SharedBackend {
    fn make_context_current(&mut self, current: bool) -> BackendResult<()> {
        self.lock()?.make_context_current(current)
    }

    fn set_distance_model(&mut self, model: DistanceModel) -> BackendResult<()> {
        self.lock()?.set_distance_model(model)
    }

    fn create_buffer(&mut self) -> BackendResult<BufferHandle> {
        self.lock()?.create_buffer()
    }

    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: PcmFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> BackendResult<()> {
        self.lock()?.buffer_data(buffer, format, data, sample_rate)
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> BackendResult<()> {
        self.lock()?.delete_buffers(buffers)
    }

    fn create_voice(&mut self) -> BackendResult<VoiceHandle> {
        self.lock()?.create_voice()
    }

    fn delete_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.lock()?.delete_voice(voice)
    }

    fn play_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.lock()?.play_voice(voice)
    }

    fn stop_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.lock()?.stop_voice(voice)
    }

    fn pause_voice(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.lock()?.pause_voice(voice)
    }

    fn voice_state(&self, voice: VoiceHandle) -> BackendResult<VoiceState> {
        self.lock()?.voice_state(voice)
    }

    fn queue_buffers(&mut self, voice: VoiceHandle, buffers: &[BufferHandle]) -> BackendResult<()> {
        self.lock()?.queue_buffers(voice, buffers)
    }

    fn unqueue_all_buffers(&mut self, voice: VoiceHandle) -> BackendResult<()> {
        self.lock()?.unqueue_all_buffers(voice)
    }

    fn queued_buffer_count(&self, voice: VoiceHandle) -> BackendResult<usize> {
        self.lock()?.queued_buffer_count(voice)
    }

    fn set_voice_property(
        &mut self,
        voice: VoiceHandle,
        property: VoiceProperty,
    ) -> BackendResult<()> {
        self.lock()?.set_voice_property(voice, property)
    }

    fn voice_gain(&self, voice: VoiceHandle) -> BackendResult<f32> {
        self.lock()?.voice_gain(voice)
    }

    fn voice_pitch(&self, voice: VoiceHandle) -> BackendResult<f32> {
        self.lock()?.voice_pitch(voice)
    }

    fn voice_looping(&self, voice: VoiceHandle) -> BackendResult<bool> {
        self.lock()?.voice_looping(voice)
    }

    fn voice_playback_offset(&self, voice: VoiceHandle) -> BackendResult<f32> {
        self.lock()?.voice_playback_offset(voice)
    }

    fn create_effect(&mut self) -> BackendResult<EffectHandle> {
        self.lock()?.create_effect()
    }

    fn delete_effect(&mut self, effect: EffectHandle) -> BackendResult<()> {
        self.lock()?.delete_effect(effect)
    }

    fn set_effect_kind(&mut self, effect: EffectHandle, kind: EffectKind) -> BackendResult<()> {
        self.lock()?.set_effect_kind(effect, kind)
    }

    fn set_effect_params(
        &mut self,
        effect: EffectHandle,
        params: &EffectParams,
    ) -> BackendResult<()> {
        self.lock()?.set_effect_params(effect, params)
    }

    fn create_aux_slot(&mut self) -> BackendResult<AuxSlotHandle> {
        self.lock()?.create_aux_slot()
    }

    fn delete_aux_slot(&mut self, slot: AuxSlotHandle) -> BackendResult<()> {
        self.lock()?.delete_aux_slot(slot)
    }

    fn attach_effect(&mut self, slot: AuxSlotHandle, effect: EffectHandle) -> BackendResult<()> {
        self.lock()?.attach_effect(slot, effect)
    }

    fn connect_aux_send(
        &mut self,
        voice: VoiceHandle,
        send: u32,
        slot: Option<AuxSlotHandle>,
    ) -> BackendResult<()> {
        self.lock()?.connect_aux_send(voice, send, slot)
    }

    fn set_listener_property(&mut self, property: ListenerProperty) -> BackendResult<()> {
        self.lock()?.set_listener_property(property)
    }
}
