//! Per-source state: the hardware voice, bound sound and effects, auxiliary
//! send allocation and the pending transport request.

use crate::backend::{AudioBackend, VoiceHandle, VoiceProperty};
use crate::effects::{EffectId, Transport};
use crate::sound::SoundId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a source owned by a [`SonanceWorld`](crate::SonanceWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Volume with mute support. While muted the hardware gain stays at zero and
/// volume writes only update the saved volume.
#[derive(Debug, Default)]
pub(crate) struct SourceGain {
    muted: bool,
    saved_volume: f32,
}

impl SourceGain {
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self, backend: &dyn AudioBackend, voice: VoiceHandle) -> f32 {
        if self.muted {
            return self.saved_volume;
        }
        backend.voice_gain(voice).unwrap_or_else(|e| {
            log::warn!("Failed to query gain of voice {:?}: {}", voice, e);
            0.0
        })
    }

    pub fn set_volume(&mut self, backend: &mut dyn AudioBackend, voice: VoiceHandle, volume: f32) {
        if self.muted {
            self.saved_volume = volume;
            return;
        }
        if let Err(e) = backend.set_voice_property(voice, VoiceProperty::Gain(volume)) {
            log::warn!("Failed to set gain {} on voice {:?}: {}", volume, voice, e);
        }
    }

    pub fn mute(&mut self, backend: &mut dyn AudioBackend, voice: VoiceHandle) {
        if self.muted {
            return;
        }
        self.saved_volume = self.volume(backend, voice);
        self.set_volume(backend, voice, 0.0);
        self.muted = true;
    }

    pub fn unmute(&mut self, backend: &mut dyn AudioBackend, voice: VoiceHandle) {
        if !self.muted {
            return;
        }
        self.muted = false;
        self.set_volume(backend, voice, self.saved_volume);
    }
}

/// A transport command waiting for its bound effects to become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub transport: Transport,
    /// Effects bound when the request was issued
    pub expected: usize,
    /// Effects that have not acknowledged yet
    pub waiting: BTreeSet<EffectId>,
    pub generation: u64,
}

impl PendingRequest {
    pub fn ready(&self) -> usize {
        self.expected - self.waiting.len()
    }
}

#[derive(Debug)]
pub(crate) struct Source {
    pub voice: VoiceHandle,
    pub sound: Option<SoundId>,
    /// Auxiliary send assigned to each bound effect
    pub effect_sends: BTreeMap<EffectId, u32>,
    free_sends: BTreeSet<u32>,
    next_send: u32,
    pending: Option<PendingRequest>,
    generation: u64,
    pub gain: SourceGain,
}

impl Source {
    pub fn new(voice: VoiceHandle) -> Self {
        Self {
            voice,
            sound: None,
            effect_sends: BTreeMap::new(),
            free_sends: BTreeSet::new(),
            next_send: 0,
            pending: None,
            generation: 0,
            gain: SourceGain::default(),
        }
    }

    /// Smallest released send, or the next never-used one.
    pub fn acquire_send(&mut self) -> u32 {
        if let Some(send) = self.free_sends.pop_first() {
            return send;
        }
        let send = self.next_send;
        self.next_send += 1;
        send
    }

    pub fn release_send(&mut self, send: u32) {
        self.free_sends.insert(send);
    }

    pub fn bound_effects(&self) -> Vec<EffectId> {
        self.effect_sends.keys().copied().collect()
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a request that completes once every effect in `effects` has
    /// acknowledged it. Returns the generation its ready signals must carry.
    pub fn begin_request(&mut self, transport: Transport, effects: &[EffectId]) -> u64 {
        self.generation += 1;
        self.pending = Some(PendingRequest {
            transport,
            expected: effects.len(),
            waiting: effects.iter().copied().collect(),
            generation: self.generation,
        });
        self.generation
    }

    /// Drops the pending request; signals already handed out become stale.
    pub fn cancel_request(&mut self) -> Option<Transport> {
        self.generation += 1;
        self.pending.take().map(|request| request.transport)
    }

    /// Counts the ready signal of `effect`. Returns the transport to commit
    /// once no effect is left waiting.
    pub fn acknowledge(&mut self, effect: EffectId, generation: u64) -> Option<Transport> {
        let request = self.pending.as_mut()?;
        if request.generation != generation || !request.waiting.remove(&effect) {
            return None;
        }
        self.take_if_ready()
    }

    /// Stops waiting on an effect that is no longer bound. Returns the
    /// transport to commit if it was the last one waited on.
    pub fn forget_effect(&mut self, effect: EffectId) -> Option<Transport> {
        let request = self.pending.as_mut()?;
        if !request.waiting.remove(&effect) {
            return None;
        }
        self.take_if_ready()
    }

    fn take_if_ready(&mut self) -> Option<Transport> {
        if self.pending.as_ref()?.waiting.is_empty() {
            return self.pending.take().map(|request| request.transport);
        }
        None
    }
}
