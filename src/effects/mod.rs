//! Effects: built-in DSP parameter blocks and the hooks that let an effect
//! intercept transport requests of the sources it is bound to.
//!
//! When a source with bound effects is asked to play, stop, pause or resume,
//! each effect receives a [`ReadySignal`] through the matching `request_*`
//! hook. The hardware command runs once every signal has been fired. A hook
//! may fire its signal on the spot, keep it and fire it from a later
//! [`EffectHooks::update`], or hand it to another thread.

mod fade;
mod params;

pub use fade::FadeEffect;
pub use params::*;

use crate::backend::{AudioBackend, VoiceHandle, VoiceProperty, VoiceState};
use crate::source::{SourceGain, SourceId};
use crossbeam_channel::Sender;
use std::fmt;
use std::time::Duration;

/// Identifier of an effect owned by a [`SonanceWorld`](crate::SonanceWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub(crate) u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Transport command subject to the request protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Play,
    Stop,
    Pause,
    Resume,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transport::Play => "play",
            Transport::Stop => "stop",
            Transport::Pause => "pause",
            Transport::Resume => "resume",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadyMessage {
    pub source: SourceId,
    pub effect: EffectId,
    pub generation: u64,
}

/// One-shot acknowledgement that an effect is ready for a transport command.
///
/// Firing consumes the signal, so it can be fired at most once. It may be
/// fired from any thread; the world picks it up on its next
/// [`update`](crate::SonanceWorld::update) or
/// [`poll_ready`](crate::SonanceWorld::poll_ready).
pub struct ReadySignal {
    source: SourceId,
    effect: EffectId,
    transport: Transport,
    generation: u64,
    sender: Sender<ReadyMessage>,
    fired: bool,
}

impl ReadySignal {
    pub(crate) fn new(
        source: SourceId,
        effect: EffectId,
        transport: Transport,
        generation: u64,
        sender: Sender<ReadyMessage>,
    ) -> Self {
        Self {
            source,
            effect,
            transport,
            generation,
            sender,
            fired: false,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn fire(mut self) {
        self.fired = true;
        let message = ReadyMessage {
            source: self.source,
            effect: self.effect,
            generation: self.generation,
        };
        if self.sender.send(message).is_err() {
            log::debug!(
                "{} ready for {} of {} after the world was dropped",
                self.effect,
                self.transport,
                self.source
            );
        }
    }

    /// Discards the signal without acknowledging it. Meant for signals of
    /// requests that were cancelled by a forced stop or a removed source.
    pub fn dismiss(mut self) {
        self.fired = true;
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal")
            .field("source", &self.source)
            .field("effect", &self.effect)
            .field("transport", &self.transport)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for ReadySignal {
    fn drop(&mut self) {
        if !self.fired {
            log::warn!(
                "{} dropped its ready signal for {} of {}; the request stays pending",
                self.effect,
                self.transport,
                self.source
            );
        }
    }
}

/// View of a source handed to effect hooks.
///
/// Exposes the source's own playback controls only; other sources, sounds
/// and effects are out of reach while a hook runs.
pub struct EffectContext<'a> {
    source: SourceId,
    voice: VoiceHandle,
    gain: &'a mut SourceGain,
    backend: &'a mut dyn AudioBackend,
}

impl<'a> EffectContext<'a> {
    pub(crate) fn new(
        source: SourceId,
        voice: VoiceHandle,
        gain: &'a mut SourceGain,
        backend: &'a mut dyn AudioBackend,
    ) -> Self {
        Self {
            source,
            voice,
            gain,
            backend,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Volume of the source; the saved volume while muted.
    pub fn volume(&self) -> f32 {
        self.gain.volume(&*self.backend, self.voice)
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.gain.set_volume(&mut *self.backend, self.voice, volume);
    }

    pub fn is_muted(&self) -> bool {
        self.gain.is_muted()
    }

    pub fn state(&self) -> VoiceState {
        self.backend.voice_state(self.voice).unwrap_or_default()
    }

    pub fn is_looping(&self) -> bool {
        self.backend.voice_looping(self.voice).unwrap_or(false)
    }

    pub fn playback_position(&self) -> Duration {
        let seconds = self.backend.voice_playback_offset(self.voice).unwrap_or(0.0);
        Duration::from_secs_f32(seconds.max(0.0))
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        if let Err(e) = self
            .backend
            .set_voice_property(self.voice, VoiceProperty::Pitch(pitch))
        {
            log::warn!("Failed to set pitch of {} from effect: {}", self.source, e);
        }
    }
}

/// Behavior an effect adds on top of its DSP parameters.
///
/// Every method has a default. The `request_*` defaults fire the signal
/// immediately, which makes the transport command run without delay.
pub trait EffectHooks: Send {
    fn request_play(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        ready.fire();
    }

    fn request_stop(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        ready.fire();
    }

    fn request_pause(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        ready.fire();
    }

    fn request_resume(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        ready.fire();
    }

    /// Called once per source update with the elapsed time.
    fn update(&mut self, _ctx: &mut EffectContext<'_>, _dt: Duration) {}

    fn loop_changed(&mut self, _ctx: &mut EffectContext<'_>, _looping: bool) {}

    fn playback_position_changed(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn sound_changed(&mut self, _ctx: &mut EffectContext<'_>) {}

    /// The effect is being unbound from the source. A signal held for a
    /// pending request no longer counts toward it and may be fired or
    /// dismissed; the request carries on with the remaining effects.
    fn source_unbound(&mut self, _ctx: &mut EffectContext<'_>) {}

    /// The source was stopped bypassing the request protocol. Any signal held
    /// for it belongs to a cancelled request and may be dropped.
    fn force_stop(&mut self, _ctx: &mut EffectContext<'_>) {}

    /// The source is being destroyed; forget any state kept for it.
    fn source_removed(&mut self, _source: SourceId) {}
}

/// Hooks that never delay or observe anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl EffectHooks for NoHooks {}
