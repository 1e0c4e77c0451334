#![allow(dead_code)]

use sonance::audio_data::SoundData;
use sonance::effects::{EffectContext, EffectHooks, ReadySignal};
use sonance::{SharedBackend, SoftwareBackend, SonanceWorld, SonanceWorldDesc, SourceId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A world over a software backend, plus a handle to inspect that backend.
pub fn world_with(desc: SonanceWorldDesc) -> anyhow::Result<(SonanceWorld, SharedBackend)> {
    init_logger();
    let backend = SharedBackend::new(SoftwareBackend::new(desc.max_sources, desc.max_aux_sends));
    let world = SonanceWorld::new(desc, backend.clone())?;
    Ok((world, backend))
}

pub fn world() -> anyhow::Result<(SonanceWorld, SharedBackend)> {
    world_with(SonanceWorldDesc::default())
}

/// Mono 16-bit ramp of `bytes / 2` samples.
pub fn mono16(bytes: usize, sample_rate: u32) -> SoundData {
    let samples: Vec<i16> = (0..bytes / 2).map(|i| (i % 2000) as i16).collect();
    SoundData::from_i16_samples(&samples, sample_rate, 1)
}

/// Hooks that keep every ready signal until the test fires it.
#[derive(Clone, Default)]
pub struct HeldSignals {
    pub signals: Arc<Mutex<Vec<ReadySignal>>>,
    pub forced_stops: Arc<AtomicUsize>,
    pub removed: Arc<Mutex<Vec<SourceId>>>,
    pub position_changes: Arc<AtomicUsize>,
    pub sound_changes: Arc<AtomicUsize>,
    pub loop_changes: Arc<Mutex<Vec<bool>>>,
}

impl HeldSignals {
    pub fn held(&self) -> usize {
        self.signals.lock().unwrap().len()
    }

    /// Fires the oldest held signal.
    pub fn fire_next(&self) {
        let signal = self.signals.lock().unwrap().remove(0);
        signal.fire();
    }

    pub fn forced_stops(&self) -> usize {
        self.forced_stops.load(Ordering::SeqCst)
    }

    fn hold(&self, ready: ReadySignal) {
        self.signals.lock().unwrap().push(ready);
    }
}

impl EffectHooks for HeldSignals {
    fn request_play(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.hold(ready);
    }

    fn request_stop(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.hold(ready);
    }

    fn request_pause(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.hold(ready);
    }

    fn request_resume(&mut self, _ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.hold(ready);
    }

    fn loop_changed(&mut self, _ctx: &mut EffectContext<'_>, looping: bool) {
        self.loop_changes.lock().unwrap().push(looping);
    }

    fn playback_position_changed(&mut self, _ctx: &mut EffectContext<'_>) {
        self.position_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn sound_changed(&mut self, _ctx: &mut EffectContext<'_>) {
        self.sound_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn force_stop(&mut self, _ctx: &mut EffectContext<'_>) {
        self.forced_stops.fetch_add(1, Ordering::SeqCst);
        for signal in self.signals.lock().unwrap().drain(..) {
            signal.dismiss();
        }
    }

    fn source_removed(&mut self, source: SourceId) {
        self.removed.lock().unwrap().push(source);
        for signal in self.signals.lock().unwrap().drain(..) {
            signal.dismiss();
        }
    }
}
