use super::{SonanceWorld, logged};
use crate::audio_data::SoundInfo;
use crate::backend::VoiceHandle;
use crate::error::{Result, SonanceError};
use crate::events::SonanceEvent;
use crate::sound::SoundId;
use crate::source::{Source, SourceId};
use std::time::Duration;

impl SonanceWorld {
    /// Creates a source with its own hardware voice.
    ///
    /// # Errors
    ///
    /// Returns an error when `max_sources` sources already exist or the
    /// hardware refuses to allocate another voice.
    pub fn create_source(&mut self) -> Result<SourceId> {
        if self.sources.len() >= self.desc.max_sources {
            return Err(SonanceError::AudioDevice(format!(
                "source limit of {} reached",
                self.desc.max_sources
            )));
        }

        let voice = self
            .hardware
            .get_mut()
            .create_voice()
            .map_err(|e| SonanceError::backend("create_voice", e))?;
        let id = SourceId(self.allocate_id());
        self.sources.insert(id, Source::new(voice));
        log::debug!("Created {} on voice {:?}", id, voice);
        Ok(id)
    }

    /// Destroys a source: releases its sound, tells every bound effect the
    /// source is gone, disconnects the effect sends and frees the voice.
    /// A pending request is cancelled.
    pub fn destroy_source(&mut self, id: SourceId) -> bool {
        if !self.sources.contains_key(&id) {
            return false;
        }

        self.unbind_sound(id);
        let cancelled = self.sources.get_mut(&id).and_then(|s| s.cancel_request());

        let effects = self
            .sources
            .get(&id)
            .map(|s| s.bound_effects())
            .unwrap_or_default();
        for effect in effects {
            if let Some(eff) = self.effects.get_mut(&effect) {
                eff.hooks.source_removed(id);
            }
            self.disconnect_effect(effect, id);
        }

        if let Some(transport) = cancelled {
            self.events
                .push(SonanceEvent::RequestCancelled { source: id, transport });
        }
        if let Some(source) = self.sources.remove(&id) {
            logged("delete_voice", self.hardware.get_mut().delete_voice(source.voice));
        }
        log::debug!("Destroyed {}", id);
        true
    }

    /// Advances one source: pumps one streaming chunk of its sound and runs
    /// the update hook of each bound effect.
    pub fn update_source(&mut self, id: SourceId, dt: Duration) {
        let Some(sound) = self.sources.get(&id).map(|s| s.sound) else {
            return;
        };
        if let Some(sound) = sound {
            self.upload_chunk(sound);
        }
        self.notify_effects(id, |hooks, ctx| hooks.update(ctx, dt));
        self.poll_ready();
    }

    /// Pumps one streaming chunk of the source's sound. Returns false when
    /// nothing was uploaded.
    pub fn update_stream(&mut self, id: SourceId) -> bool {
        match self.source_sound(id) {
            Some(sound) => self.upload_chunk(sound),
            None => false,
        }
    }

    /// Hardware voice of a source, for inspecting it on the backend.
    pub fn source_voice(&self, id: SourceId) -> Option<VoiceHandle> {
        self.sources.get(&id).map(|s| s.voice)
    }

    pub fn has_source(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Every live source, in creation order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.sources.keys().copied().collect();
        ids.sort();
        ids
    }

    /// The sound bound to a source.
    pub fn source_sound(&self, id: SourceId) -> Option<SoundId> {
        self.sources.get(&id).and_then(|s| s.sound)
    }

    /// Info of the sound bound to a source.
    pub fn source_sound_info(&self, id: SourceId) -> Option<SoundInfo> {
        self.source_sound(id).and_then(|sound| self.sound_info(sound))
    }

    /// Number of hardware buffers queued on the source's voice.
    pub fn queued_buffer_count(&self, id: SourceId) -> usize {
        let Some(source) = self.sources.get(&id) else {
            return 0;
        };
        logged(
            "queued_buffer_count",
            self.hardware.get().queued_buffer_count(source.voice),
        )
        .unwrap_or(0)
    }
}
