use super::{EffectContext, EffectHooks, ReadySignal};
use crate::source::SourceId;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug)]
struct Ramp {
    from: f32,
    to: f32,
    elapsed: Duration,
    length: Duration,
}

impl Ramp {
    fn advance(&mut self, dt: Duration) -> (f32, bool) {
        self.elapsed += dt;
        let t = (self.elapsed.as_secs_f32() / self.length.as_secs_f32()).min(1.0);
        (self.from + (self.to - self.from) * t, t >= 1.0)
    }
}

#[derive(Debug)]
struct SourceFade {
    /// Volume the source plays at when not fading
    nominal: f32,
    /// Last volume this effect wrote
    written: f32,
    ramp: Option<Ramp>,
    /// Held until a fade-out finishes
    ready: Option<ReadySignal>,
}

impl SourceFade {
    fn write(&mut self, ctx: &mut EffectContext<'_>, volume: f32) {
        ctx.set_volume(volume);
        self.written = volume;
    }
}

/// Fades sources in on play/resume and out on stop/pause.
///
/// Play and resume run at once with the volume ramping up from silence.
/// Stop and pause are held back until the volume has ramped down, so this
/// effect acknowledges them asynchronously from [`EffectHooks::update`].
#[derive(Debug)]
pub struct FadeEffect {
    fade_in: Duration,
    fade_out: Duration,
    fades: HashMap<SourceId, SourceFade>,
}

impl FadeEffect {
    pub fn new(fade_in: Duration, fade_out: Duration) -> Self {
        Self {
            fade_in,
            fade_out,
            fades: HashMap::new(),
        }
    }

    /// True while a fade is running on `source`.
    pub fn is_fading(&self, source: SourceId) -> bool {
        self.fades.get(&source).is_some_and(|f| f.ramp.is_some())
    }

    fn start_fade_in(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        let fade_in = self.fade_in;
        let current = ctx.volume();
        let fade = self.fades.entry(ctx.source()).or_insert_with(|| SourceFade {
            nominal: current,
            written: current,
            ramp: None,
            ready: None,
        });
        // The volume was changed by someone else since the last fade-out.
        if fade.ramp.is_none() && current != fade.written {
            fade.nominal = current;
        }

        if fade_in.is_zero() {
            let nominal = fade.nominal;
            fade.write(ctx, nominal);
            fade.ramp = None;
        } else {
            fade.write(ctx, 0.0);
            fade.ramp = Some(Ramp {
                from: 0.0,
                to: fade.nominal,
                elapsed: Duration::ZERO,
                length: fade_in,
            });
        }
        ready.fire();
    }

    fn start_fade_out(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        if self.fade_out.is_zero() {
            ready.fire();
            return;
        }

        let current = ctx.volume();
        let fade = self.fades.entry(ctx.source()).or_insert_with(|| SourceFade {
            nominal: current,
            written: current,
            ramp: None,
            ready: None,
        });
        // Not mid fade-in, so the current volume is what the user set.
        if fade.ramp.is_none() {
            fade.nominal = current;
        }
        fade.ramp = Some(Ramp {
            from: current,
            to: 0.0,
            elapsed: Duration::ZERO,
            length: self.fade_out,
        });
        fade.ready = Some(ready);
    }
}

impl Default for FadeEffect {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(250))
    }
}

impl EffectHooks for FadeEffect {
    fn request_play(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.start_fade_in(ctx, ready);
    }

    fn request_resume(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.start_fade_in(ctx, ready);
    }

    fn request_stop(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.start_fade_out(ctx, ready);
    }

    fn request_pause(&mut self, ctx: &mut EffectContext<'_>, ready: ReadySignal) {
        self.start_fade_out(ctx, ready);
    }

    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: Duration) {
        let source = ctx.source();
        let Some(fade) = self.fades.get_mut(&source) else {
            return;
        };
        let Some(ramp) = fade.ramp.as_mut() else {
            return;
        };

        let (volume, done) = ramp.advance(dt);
        fade.write(ctx, volume);
        if !done {
            return;
        }

        fade.ramp = None;
        match fade.ready.take() {
            // Faded out: stay silent and remember the volume for the next play.
            Some(ready) => ready.fire(),
            None => {
                self.fades.remove(&source);
            }
        }
    }

    fn force_stop(&mut self, ctx: &mut EffectContext<'_>) {
        if let Some(fade) = self.fades.remove(&ctx.source()) {
            if let Some(ready) = fade.ready {
                ready.dismiss();
            }
            ctx.set_volume(fade.nominal);
        }
    }

    fn source_unbound(&mut self, ctx: &mut EffectContext<'_>) {
        let Some(fade) = self.fades.remove(&ctx.source()) else {
            return;
        };
        ctx.set_volume(fade.nominal);
        if let Some(ready) = fade.ready {
            ready.fire();
        }
    }

    fn source_removed(&mut self, source: SourceId) {
        if let Some(ready) = self.fades.remove(&source).and_then(|f| f.ready) {
            ready.dismiss();
        }
    }
}
