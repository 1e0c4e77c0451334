//! The audio world: owner of every sound, source and effect, and of the
//! hardware context they live in.

mod binding;
mod effects;
mod hardware;
mod listener;
mod properties;
mod sounds;
mod sources;
mod transport;

use crate::backend::{AudioBackend, AuxSlotHandle, BackendResult, EffectHandle};
use crate::config::SonanceWorldDesc;
use crate::effects::{EffectHooks, EffectId, EffectParams, ReadyMessage};
use crate::error::{Result, SonanceError};
use crate::events::SonanceEvent;
use crate::math::Pose;
use crate::sound::{SoundBuffer, SoundId};
use crate::source::{Source, SourceId};
use crossbeam_channel::{Receiver, Sender, unbounded};
use hardware::HardwareContext;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Logs a failed hardware call and converts the result into an `Option`.
fn logged<T>(call: &str, result: BackendResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Hardware call `{}` failed: {}", call, e);
            None
        }
    }
}

struct Sound {
    buffer: SoundBuffer,
    /// Sources this sound is bound to, in creation order
    sources: BTreeSet<SourceId>,
}

struct Effect {
    handle: EffectHandle,
    slot: AuxSlotHandle,
    params: EffectParams,
    hooks: Box<dyn EffectHooks>,
    sources: BTreeSet<SourceId>,
}

/// Main object owning the audio hardware context and every audio object.
///
/// `SonanceWorld` is the central API of Sonance. Sounds, sources and effects
/// are created through it and addressed by the ids it returns; relations
/// between them (a source playing a sound, an effect processing a source)
/// are kept symmetric by the world, so destroying either side unlinks the
/// other.
///
/// # Threading
///
/// The hardware context is bound to the thread that created the world (see
/// [`make_current`](Self::make_current)). Every operation touching the
/// hardware asserts this and panics when called from another thread. Only
/// [`SoundFeeder`](crate::SoundFeeder) handles and
/// [`ReadySignal`](crate::effects::ReadySignal)s may be used elsewhere.
pub struct SonanceWorld {
    desc: SonanceWorldDesc,
    hardware: HardwareContext,
    sounds: HashMap<SoundId, Sound>,
    sources: HashMap<SourceId, Source>,
    effects: HashMap<EffectId, Effect>,
    next_id: u64,
    ready_sender: Sender<ReadyMessage>,
    ready_receiver: Receiver<ReadyMessage>,
    events: Vec<SonanceEvent>,
    listener: Pose,
}

impl SonanceWorld {
    /// Creates a world driving `backend` and binds it to the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is invalid or the backend's context
    /// cannot be made current.
    pub fn new(desc: SonanceWorldDesc, backend: impl AudioBackend + 'static) -> Result<Self> {
        desc.validate()?;

        let mut backend: Box<dyn AudioBackend> = Box::new(backend);
        backend
            .make_context_current(true)
            .map_err(|e| SonanceError::backend("make_context_current", e))?;
        logged(
            "set_distance_model",
            backend.set_distance_model(desc.distance_model),
        );

        let (ready_sender, ready_receiver) = unbounded();
        log::info!(
            "Audio world created (chunk size {} bytes, {} aux sends per source)",
            desc.stream_chunk_size,
            desc.max_aux_sends
        );

        Ok(Self {
            desc,
            hardware: HardwareContext::new(backend),
            sounds: HashMap::new(),
            sources: HashMap::new(),
            effects: HashMap::new(),
            next_id: 1,
            ready_sender,
            ready_receiver,
            events: Vec::new(),
            listener: Pose::default(),
        })
    }

    /// Binds the hardware context to the calling thread. Needed after the
    /// world was moved to another thread.
    pub fn make_current(&mut self) -> Result<()> {
        self.hardware.rebind();
        self.hardware
            .get_mut()
            .make_context_current(true)
            .map_err(|e| SonanceError::backend("make_context_current", e))
    }

    /// Returns the configuration the world was created with.
    pub fn desc(&self) -> &SonanceWorldDesc {
        &self.desc
    }

    /// Returns the output sample rate of the world.
    pub fn sample_rate(&self) -> u32 {
        self.desc.sample_rate
    }

    /// Advances every source by `dt`: pumps one streaming chunk for each
    /// source's sound, runs the update hook of each bound effect, then
    /// commits requests whose effects have all become ready.
    pub fn update(&mut self, dt: Duration) {
        let mut ids: Vec<SourceId> = self.sources.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.update_source(id, dt);
        }
        self.poll_ready();
    }

    /// Drains and returns the events collected since the last call.
    pub fn poll_events(&mut self) -> Vec<SonanceEvent> {
        std::mem::take(&mut self.events)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Drop for SonanceWorld {
    fn drop(&mut self) {
        if !self.hardware.is_current() {
            log::error!("Audio world dropped off its context thread; hardware objects leak");
            return;
        }

        let mut sources: Vec<SourceId> = self.sources.keys().copied().collect();
        sources.sort();
        for id in sources {
            self.destroy_source(id);
        }
        let mut effects: Vec<EffectId> = self.effects.keys().copied().collect();
        effects.sort();
        for id in effects {
            self.destroy_effect(id);
        }
        let mut sounds: Vec<SoundId> = self.sounds.keys().copied().collect();
        sounds.sort();
        for id in sounds {
            self.destroy_sound(id);
        }

        logged(
            "make_context_current",
            self.hardware.get_mut().make_context_current(false),
        );
        log::info!("Audio world destroyed");
    }
}
