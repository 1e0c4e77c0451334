mod common;

use common::{HeldSignals, mono16, world};
use sonance::effects::{EchoParams, EffectKind, EffectParams, ReverbParams};
use sonance::{AudioBackend, SharedBackend, SoftwareBackend, SonanceWorld, SonanceWorldDesc};
use std::sync::atomic::Ordering;

fn assert_symmetric(world: &SonanceWorld, sound: sonance::SoundId) {
    let bound = world.sound_sources(sound);
    for source in world.source_ids() {
        assert_eq!(
            world.source_sound(source) == Some(sound),
            bound.contains(&source),
            "{} disagrees with {}",
            source,
            sound
        );
    }
    for source in bound {
        assert!(world.has_source(source));
    }
}

#[test]
fn test_sound_binding_stays_symmetric() -> anyhow::Result<()> {
    let (mut world, _backend) = world()?;
    let sound = world.create_sound(mono16(8000, 22050), false)?;
    let sources = (0..4)
        .map(|_| world.create_source())
        .collect::<sonance::Result<Vec<_>>>()?;

    for &source in &sources {
        assert!(world.bind_sound(source, sound));
        assert_symmetric(&world, sound);
    }
    assert_eq!(world.sound_sources(sound), sources);

    assert!(world.unbind_sound(sources[1]));
    assert!(!world.unbind_sound(sources[1]));
    assert_symmetric(&world, sound);

    assert!(world.unbind_sound(sources[3]));
    assert!(world.bind_sound(sources[3], sound));
    assert_symmetric(&world, sound);

    assert!(world.destroy_source(sources[2]));
    assert_symmetric(&world, sound);
    assert_eq!(world.sound_sources(sound), vec![sources[0], sources[3]]);

    assert!(world.destroy_sound(sound));
    for &source in &sources[..2] {
        assert_eq!(world.source_sound(source), None);
    }
    assert_eq!(world.source_sound(sources[3]), None);
    Ok(())
}

#[test]
fn test_rebinding_replaces_previous_sound() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let first = world.create_sound(mono16(4000, 22050), false)?;
    let second = world.create_sound(mono16(4000, 22050), false)?;
    let source = world.create_source()?;
    let hooks = HeldSignals::default();
    let effect = world.create_effect(ReverbParams::default(), hooks.clone())?;
    world.bind_effect(effect, source);

    assert!(world.bind_sound(source, first));
    assert!(world.bind_sound(source, first));
    assert_eq!(hooks.sound_changes.load(Ordering::SeqCst), 1);

    assert!(world.bind_sound(source, second));
    assert_eq!(hooks.sound_changes.load(Ordering::SeqCst), 2);
    assert!(world.sound_sources(first).is_empty());
    assert_eq!(world.sound_sources(second), vec![source]);

    let voice = world.source_voice(source).unwrap();
    assert_eq!(backend.lock()?.queued_buffer_count(voice)?, 1);
    Ok(())
}

#[test]
fn test_effect_bind_is_idempotent() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let source = world.create_source()?;
    let effect = world.create_builtin_effect(ReverbParams::default())?;

    assert!(world.bind_effect(effect, source));
    assert!(world.bind_effect(effect, source));

    assert_eq!(backend.lock()?.stats().aux_connects, 1);
    assert_eq!(world.source_effects(source), vec![(effect, 0)]);
    assert_eq!(world.effect_sources(effect), vec![source]);
    Ok(())
}

#[test]
fn test_destroying_effect_clears_every_send() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let effect = world.create_builtin_effect(EchoParams::default())?;
    let sources = (0..3)
        .map(|_| world.create_source())
        .collect::<sonance::Result<Vec<_>>>()?;
    for &source in &sources {
        assert!(world.bind_effect(effect, source));
    }
    let slot = world.effect_slot(effect).unwrap();
    for &source in &sources {
        let voice = world.source_voice(source).unwrap();
        assert_eq!(backend.lock()?.voice_send(voice, 0), Some(slot));
    }

    assert!(world.destroy_effect(effect));

    let backend = backend.lock()?;
    for &source in &sources {
        assert!(world.source_effects(source).is_empty());
        let voice = world.source_voice(source).unwrap();
        assert_eq!(backend.voice_send(voice, 0), None);
    }
    assert_eq!(backend.stats().aux_disconnects, 3);
    assert_eq!(backend.effect_count(), 0);
    assert_eq!(backend.aux_slot_count(), 0);
    assert!(!world.has_effect(effect));
    Ok(())
}

#[test]
fn test_freed_send_is_reused() -> anyhow::Result<()> {
    let (mut world, _backend) = world()?;
    let source = world.create_source()?;
    let a = world.create_builtin_effect(ReverbParams::default())?;
    let b = world.create_builtin_effect(ReverbParams::default())?;
    let c = world.create_builtin_effect(ReverbParams::default())?;
    let d = world.create_builtin_effect(ReverbParams::default())?;

    world.bind_effect(a, source);
    world.bind_effect(b, source);
    assert_eq!(world.source_effect_send(source, a), Some(0));
    assert_eq!(world.source_effect_send(source, b), Some(1));

    assert!(world.unbind_effect(a, source));
    assert!(!world.unbind_effect(a, source));
    world.bind_effect(c, source);
    assert_eq!(world.source_effect_send(source, c), Some(0));

    world.bind_effect(d, source);
    assert_eq!(world.source_effect_send(source, d), Some(2));
    Ok(())
}

#[test]
fn test_send_limit_refuses_binding_before_hardware() -> anyhow::Result<()> {
    let (mut world, backend) = common::world_with(SonanceWorldDesc::default().max_aux_sends(1))?;
    let source = world.create_source()?;
    let a = world.create_builtin_effect(ReverbParams::default())?;
    let b = world.create_builtin_effect(ReverbParams::default())?;

    assert!(world.bind_effect(a, source));
    assert!(!world.bind_effect(b, source));
    assert!(!world.effect_has_bound_source(b));
    assert_eq!(backend.lock()?.stats().aux_connects, 1);

    world.unbind_effect(a, source);
    assert!(world.bind_effect(b, source));
    assert_eq!(world.source_effect_send(source, b), Some(0));
    Ok(())
}

#[test]
fn test_refused_connection_returns_send() -> anyhow::Result<()> {
    common::init_logger();
    let backend = SharedBackend::new(SoftwareBackend::new(16, 1));
    let mut world = SonanceWorld::new(SonanceWorldDesc::default(), backend.clone())?;
    let source = world.create_source()?;
    let a = world.create_builtin_effect(ReverbParams::default())?;
    let b = world.create_builtin_effect(ReverbParams::default())?;

    assert!(world.bind_effect(a, source));
    assert!(!world.bind_effect(b, source));
    assert!(!world.effect_has_bound_source(b));
    assert_eq!(backend.lock()?.stats().aux_connects, 1);

    world.unbind_effect(a, source);
    assert!(world.bind_effect(b, source));
    assert_eq!(world.source_effect_send(source, b), Some(0));
    Ok(())
}

#[test]
fn test_destroying_source_notifies_effects() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let hooks = HeldSignals::default();
    let effect = world.create_effect(ReverbParams::default(), hooks.clone())?;
    let source = world.create_source()?;
    world.bind_effect(effect, source);

    assert!(world.destroy_source(source));
    assert_eq!(*hooks.removed.lock().unwrap(), vec![source]);
    assert!(!world.effect_has_bound_source(effect));
    assert_eq!(backend.lock()?.voice_count(), 0);
    Ok(())
}

#[test]
fn test_changing_effect_kind_reinitializes_hardware_effect() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let effect = world.create_builtin_effect(ReverbParams::default())?;
    let kind_changes = backend.lock()?.stats().effect_kind_changes;

    let slot = world.effect_slot(effect).unwrap();

    let mut echo = EchoParams::default();
    echo.feedback.set(0.9);
    echo.damping.set(5.0);
    assert!(world.set_effect_param(effect, echo));
    assert_eq!(backend.lock()?.stats().effect_kind_changes, kind_changes + 1);

    // Not heard until applied.
    let loaded = backend.lock()?.slot_params(slot).cloned();
    assert_eq!(loaded.map(|p| p.kind()), Some(EffectKind::Reverb));

    let Some(EffectParams::Echo(stored)) = world.effect_params(effect) else {
        panic!("expected echo parameters");
    };
    assert_eq!(stored.damping.get(), 0.99);
    assert_eq!(stored.feedback.get(), 0.9);

    assert!(world.apply_effect(effect));
    let loaded = backend.lock()?.slot_params(slot).cloned();
    assert_eq!(loaded.map(|p| p.kind()), Some(EffectKind::Echo));
    Ok(())
}

#[test]
fn test_rejected_parameter_write_keeps_previous_block() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let mut reverb = ReverbParams::default();
    reverb.gain.set(0.5);
    let effect = world.create_builtin_effect(reverb)?;

    backend.lock()?.refuse_effect_params(true);
    let mut louder = ReverbParams::default();
    louder.gain.set(0.9);
    assert!(!world.set_effect_param(effect, louder.clone()));

    let Some(EffectParams::Reverb(stored)) = world.effect_params(effect) else {
        panic!("expected reverb parameters");
    };
    assert_eq!(stored.gain.get(), 0.5);

    backend.lock()?.refuse_effect_params(false);
    assert!(world.set_effect_param(effect, louder));
    assert!(matches!(
        world.effect_params(effect),
        Some(EffectParams::Reverb(p)) if p.gain.get() == 0.9
    ));
    Ok(())
}

#[test]
fn test_dropping_world_releases_hardware_in_order() -> anyhow::Result<()> {
    common::init_logger();
    let backend = sonance::SharedBackend::new(SoftwareBackend::default());
    {
        let mut world = SonanceWorld::new(SonanceWorldDesc::default(), backend.clone())?;
        let sound = world.create_sound(mono16(20000, 22050), true)?;
        let effect = world.create_builtin_effect(ReverbParams::default())?;
        for _ in 0..3 {
            let source = world.create_source()?;
            world.bind_sound(source, sound);
            world.bind_effect(effect, source);
            world.play(source);
        }
        world.update_stream(world.source_ids()[0]);
    }

    let backend = backend.lock()?;
    assert_eq!(backend.buffer_count(), 0);
    assert_eq!(backend.voice_count(), 0);
    assert_eq!(backend.effect_count(), 0);
    assert_eq!(backend.aux_slot_count(), 0);
    assert_eq!(backend.stats().buffers_deleted, backend.stats().buffers_created);
    Ok(())
}

#[test]
fn test_destroying_playing_sound_stops_sources() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let sound = world.create_sound(mono16(4000, 22050), false)?;
    let source = world.create_source()?;
    world.bind_sound(source, sound);
    world.set_looping(source, true);
    world.play(source);
    assert!(world.is_playing(source));

    assert!(world.destroy_sound(sound));
    assert!(world.is_stopped(source));
    assert!(!world.is_looping(source));
    assert_eq!(world.queued_buffer_count(source), 0);
    assert_eq!(backend.lock()?.buffer_count(), 0);
    Ok(())
}
