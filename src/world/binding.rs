use super::{SonanceWorld, logged};
use crate::backend::VoiceProperty;
use crate::effects::EffectId;
use crate::sound::SoundId;
use crate::source::SourceId;

impl SonanceWorld {
    /// Binds a sound to a source, replacing any sound bound before.
    ///
    /// Buffers the sound already uploaded are queued on the source's voice;
    /// if it has none yet, the first chunk is uploaded. Bound effects are
    /// told the sound changed. Binding the sound already bound does nothing.
    ///
    /// Returns false if either id is unknown.
    pub fn bind_sound(&mut self, source: SourceId, sound: SoundId) -> bool {
        let Some(current) = self.sources.get(&source).map(|s| s.sound) else {
            return false;
        };
        if !self.sounds.contains_key(&sound) {
            return false;
        }
        if current == Some(sound) {
            return true;
        }
        if current.is_some() {
            self.unbind_sound(source);
        }

        let (Some(src), Some(snd)) = (self.sources.get_mut(&source), self.sounds.get_mut(&sound))
        else {
            return false;
        };
        src.sound = Some(sound);
        snd.sources.insert(source);

        let handles = snd.buffer.handles().to_vec();
        let voice = src.voice;
        if handles.is_empty() {
            self.upload_chunk(sound);
        } else {
            logged(
                "queue_buffers",
                self.hardware.get_mut().queue_buffers(voice, &handles),
            );
        }
        log::debug!("Bound {} to {}", sound, source);

        self.notify_effects(source, |hooks, ctx| hooks.sound_changed(ctx));
        true
    }

    /// Detaches the source's sound: stops the voice if it holds queued
    /// buffers, drains its queue and removes the link on both sides.
    pub fn unbind_sound(&mut self, source: SourceId) -> bool {
        let Self {
            sources,
            sounds,
            hardware,
            ..
        } = self;
        let Some(src) = sources.get_mut(&source) else {
            return false;
        };

        let backend = hardware.get_mut();
        let queued = logged("queued_buffer_count", backend.queued_buffer_count(src.voice))
            .unwrap_or(0);
        if queued != 0 {
            logged(
                "set_voice_property",
                backend.set_voice_property(src.voice, VoiceProperty::Looping(false)),
            );
            logged("stop_voice", backend.stop_voice(src.voice));
            logged("unqueue_all_buffers", backend.unqueue_all_buffers(src.voice));
        }

        let Some(sound) = src.sound.take() else {
            return false;
        };
        if let Some(snd) = sounds.get_mut(&sound) {
            snd.sources.remove(&source);
        }
        log::debug!("Unbound {} from {}", sound, source);
        true
    }

    /// Routes a source through an effect.
    ///
    /// The source's smallest free auxiliary send is connected to the
    /// effect's slot. Binding a pair that is already bound succeeds without
    /// touching the hardware. If every one of the `max_aux_sends` sends is
    /// taken, or the hardware refuses the connection, the send is returned to
    /// the free list and false is returned.
    pub fn bind_effect(&mut self, effect: EffectId, source: SourceId) -> bool {
        let Self {
            desc,
            sources,
            effects,
            hardware,
            ..
        } = self;
        let (Some(src), Some(eff)) = (sources.get_mut(&source), effects.get_mut(&effect)) else {
            return false;
        };
        if eff.sources.contains(&source) {
            return true;
        }

        let send = src.acquire_send();
        if send >= desc.max_aux_sends {
            src.release_send(send);
            log::warn!(
                "{} has no free auxiliary send for {} ({} in use)",
                source,
                effect,
                desc.max_aux_sends
            );
            return false;
        }
        let connected = logged(
            "connect_aux_send",
            hardware
                .get_mut()
                .connect_aux_send(src.voice, send, Some(eff.slot)),
        );
        if connected.is_none() {
            src.release_send(send);
            log::warn!("Could not route {} through {} on send {}", source, effect, send);
            return false;
        }

        src.effect_sends.insert(effect, send);
        eff.sources.insert(source);
        log::debug!("Bound {} to {} on send {}", effect, source, send);
        true
    }

    /// Disconnects a source from an effect and frees the auxiliary send.
    /// Does nothing if the pair is not bound.
    ///
    /// The effect is told through [`EffectHooks::source_unbound`]. A request
    /// pending on the source stops waiting for the effect, and runs at once
    /// if no other effect is left to acknowledge it.
    ///
    /// [`EffectHooks::source_unbound`]: crate::EffectHooks::source_unbound
    pub fn unbind_effect(&mut self, effect: EffectId, source: SourceId) -> bool {
        if !self.effect_has_bound(effect, source) {
            return false;
        }
        self.with_hooks(effect, source, |hooks, ctx| hooks.source_unbound(ctx));
        self.disconnect_effect(effect, source);

        let completed = self
            .sources
            .get_mut(&source)
            .and_then(|src| src.forget_effect(effect));
        if let Some(transport) = completed {
            log::debug!("{} no longer waits for {}", transport, effect);
            self.commit(source, transport);
        }
        self.poll_ready();
        true
    }

    /// Removes the binding on both sides and frees the send, without telling
    /// the effect.
    pub(super) fn disconnect_effect(&mut self, effect: EffectId, source: SourceId) -> bool {
        let Self {
            sources,
            effects,
            hardware,
            ..
        } = self;
        let Some(eff) = effects.get_mut(&effect) else {
            return false;
        };
        if !eff.sources.remove(&source) {
            return false;
        }

        if let Some(src) = sources.get_mut(&source) {
            if let Some(send) = src.effect_sends.remove(&effect) {
                logged(
                    "connect_aux_send",
                    hardware.get_mut().connect_aux_send(src.voice, send, None),
                );
                src.release_send(send);
            }
        }
        log::debug!("Unbound {} from {}", effect, source);
        true
    }

    /// Disconnects every source bound to an effect.
    pub fn unbind_all_sources(&mut self, effect: EffectId) {
        for source in self.effect_sources(effect) {
            self.unbind_effect(effect, source);
        }
    }

    /// Sources routed through an effect, in creation order.
    pub fn effect_sources(&self, effect: EffectId) -> Vec<SourceId> {
        self.effects
            .get(&effect)
            .map(|e| e.sources.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn effect_has_bound(&self, effect: EffectId, source: SourceId) -> bool {
        self.effects
            .get(&effect)
            .is_some_and(|e| e.sources.contains(&source))
    }

    pub fn effect_has_bound_source(&self, effect: EffectId) -> bool {
        self.effects.get(&effect).is_some_and(|e| !e.sources.is_empty())
    }

    /// Effects a source is routed through, with the auxiliary send each one
    /// occupies.
    pub fn source_effects(&self, source: SourceId) -> Vec<(EffectId, u32)> {
        self.sources
            .get(&source)
            .map(|s| s.effect_sends.iter().map(|(e, send)| (*e, *send)).collect())
            .unwrap_or_default()
    }

    /// Auxiliary send a source uses for an effect.
    pub fn source_effect_send(&self, source: SourceId, effect: EffectId) -> Option<u32> {
        self.sources.get(&source)?.effect_sends.get(&effect).copied()
    }
}
