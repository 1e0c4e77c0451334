use super::{SonanceWorld, logged};
use crate::backend::{VoiceProperty, VoiceState};
use crate::effects::{EffectContext, EffectHooks, EffectId, ReadySignal, Transport};
use crate::events::SonanceEvent;
use crate::source::SourceId;

impl SonanceWorld {
    /// Runs `f` with the hooks of `effect` and a context for `source`.
    ///
    /// The context borrows only the source's voice and gain, so hooks cannot
    /// reach the registry while they run.
    pub(super) fn with_hooks(
        &mut self,
        effect: EffectId,
        source: SourceId,
        f: impl FnOnce(&mut dyn EffectHooks, &mut EffectContext<'_>),
    ) {
        let Self {
            hardware,
            sources,
            effects,
            ..
        } = self;
        let (Some(src), Some(eff)) = (sources.get_mut(&source), effects.get_mut(&effect)) else {
            return;
        };
        let mut ctx = EffectContext::new(source, src.voice, &mut src.gain, hardware.get_mut());
        f(eff.hooks.as_mut(), &mut ctx);
    }

    /// Calls `f` for every effect bound to `source`, iterating a snapshot of
    /// the bindings.
    pub(super) fn notify_effects(
        &mut self,
        source: SourceId,
        mut f: impl FnMut(&mut dyn EffectHooks, &mut EffectContext<'_>),
    ) {
        let effects = self
            .sources
            .get(&source)
            .map(|s| s.bound_effects())
            .unwrap_or_default();
        for effect in effects {
            self.with_hooks(effect, source, &mut f);
        }
    }

    /// Asks the source to play.
    ///
    /// Without bound effects the voice starts at once. Otherwise every bound
    /// effect is handed a [`ReadySignal`] and the voice starts once all of
    /// them have fired. Returns false if the source is unknown or a request
    /// is already pending on it.
    pub fn play(&mut self, source: SourceId) -> bool {
        self.request(source, Transport::Play)
    }

    /// Asks the source to stop. Stopping also clears the loop flag.
    pub fn stop(&mut self, source: SourceId) -> bool {
        self.request(source, Transport::Stop)
    }

    pub fn pause(&mut self, source: SourceId) -> bool {
        self.request(source, Transport::Pause)
    }

    /// Asks a paused source to continue. The request completes normally on a
    /// source that is not paused, but the voice is left alone.
    pub fn resume(&mut self, source: SourceId) -> bool {
        self.request(source, Transport::Resume)
    }

    /// Stops the source right away, bypassing its effects.
    ///
    /// Bound effects are notified through [`EffectHooks::force_stop`]. A
    /// pending request is cancelled and signals fired for it later are
    /// ignored.
    pub fn force_stop(&mut self, source: SourceId) -> bool {
        if !self.sources.contains_key(&source) {
            return false;
        }
        self.notify_effects(source, |hooks, ctx| hooks.force_stop(ctx));

        let Some(src) = self.sources.get_mut(&source) else {
            return false;
        };
        if let Some(transport) = src.cancel_request() {
            log::debug!("Cancelled pending {} of {}", transport, source);
            self.events
                .push(SonanceEvent::RequestCancelled { source, transport });
        }

        let voice = src.voice;
        let backend = self.hardware.get_mut();
        logged(
            "set_voice_property",
            backend.set_voice_property(voice, VoiceProperty::Looping(false)),
        );
        logged("stop_voice", backend.stop_voice(voice)).is_some()
    }

    /// True while a transport request of the source waits for its effects.
    pub fn is_waiting(&self, source: SourceId) -> bool {
        self.sources.get(&source).is_some_and(|s| s.is_waiting())
    }

    /// The transport command a source is waiting to run.
    pub fn pending_transport(&self, source: SourceId) -> Option<Transport> {
        self.sources
            .get(&source)
            .and_then(|s| s.pending())
            .map(|p| p.transport)
    }

    /// Collects ready signals fired since the last poll and runs the
    /// transport commands whose effects are all ready.
    ///
    /// Returns the number of commands run.
    pub fn poll_ready(&mut self) -> usize {
        let mut committed = 0;
        while let Ok(message) = self.ready_receiver.try_recv() {
            let Some(src) = self.sources.get_mut(&message.source) else {
                continue;
            };
            if let Some(transport) = src.acknowledge(message.effect, message.generation) {
                self.commit(message.source, transport);
                committed += 1;
            }
        }
        committed
    }

    fn request(&mut self, source: SourceId, transport: Transport) -> bool {
        let Some(src) = self.sources.get_mut(&source) else {
            return false;
        };
        if let Some(pending) = src.pending() {
            log::warn!(
                "Ignoring {} of {}: {} still waits for {} of {} effects",
                transport,
                source,
                pending.transport,
                pending.waiting.len(),
                pending.expected
            );
            self.events
                .push(SonanceEvent::RequestIgnored { source, transport });
            return false;
        }

        let effects = src.bound_effects();
        if effects.is_empty() {
            self.commit(source, transport);
            return true;
        }

        let generation = src.begin_request(transport, &effects);
        log::debug!(
            "{} of {} waits for {} effects",
            transport,
            source,
            effects.len()
        );
        for effect in effects {
            let ready = ReadySignal::new(
                source,
                effect,
                transport,
                generation,
                self.ready_sender.clone(),
            );
            self.with_hooks(effect, source, move |hooks, ctx| match transport {
                Transport::Play => hooks.request_play(ctx, ready),
                Transport::Stop => hooks.request_stop(ctx, ready),
                Transport::Pause => hooks.request_pause(ctx, ready),
                Transport::Resume => hooks.request_resume(ctx, ready),
            });
        }
        self.poll_ready();
        true
    }

    pub(super) fn commit(&mut self, source: SourceId, transport: Transport) {
        let Some(voice) = self.sources.get(&source).map(|s| s.voice) else {
            return;
        };
        let backend = self.hardware.get_mut();
        let done = match transport {
            Transport::Play => logged("play_voice", backend.play_voice(voice)),
            Transport::Stop => {
                logged(
                    "set_voice_property",
                    backend.set_voice_property(voice, VoiceProperty::Looping(false)),
                );
                logged("stop_voice", backend.stop_voice(voice))
            }
            Transport::Pause => logged("pause_voice", backend.pause_voice(voice)),
            Transport::Resume => match logged("voice_state", backend.voice_state(voice)) {
                Some(VoiceState::Paused) => logged("play_voice", backend.play_voice(voice)),
                _ => {
                    log::debug!("{} is not paused; resume does nothing", source);
                    None
                }
            },
        };

        if done.is_some() {
            log::debug!("Committed {} of {}", transport, source);
            self.events
                .push(SonanceEvent::TransportCommitted { source, transport });
        }
    }
}
