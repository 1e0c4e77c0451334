mod common;

use common::{HeldSignals, mono16, world, world_with};
use sonance::audio_data::{SoundData, SoundInfo};
use sonance::effects::ReverbParams;
use sonance::{AudioBackend, SonanceEvent, SonanceWorldDesc};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[test]
fn test_streamed_sound_uploads_in_ceil_chunks() -> anyhow::Result<()> {
    let (mut world, backend) = world_with(SonanceWorldDesc::default().stream_chunk_size(1000))?;
    let sound = world.create_sound(mono16(4410, 22050), true)?;
    assert_eq!(world.sound_buffer_count(sound), 0);

    for _ in 0..5 {
        assert!(world.upload_chunk(sound));
    }
    assert!(!world.upload_chunk(sound));

    assert_eq!(world.sound_buffer_count(sound), 5);
    assert_eq!(world.sound_storage_len(sound), 0);
    assert_eq!(world.sound_uploaded_bytes(sound), 4410);
    assert_eq!(backend.lock()?.stats().buffer_uploads, 5);
    Ok(())
}

#[test]
fn test_one_second_mono_sound_streams_in_three_chunks() -> anyhow::Result<()> {
    let (mut world, backend) = world_with(SonanceWorldDesc::default().stream_chunk_size(16384))?;
    let sound = world.create_sound(mono16(44100, 22050), true)?;
    assert_eq!(world.sound_chunk_size(sound), 16384);

    assert!(world.upload_chunk(sound));
    assert!(world.upload_chunk(sound));
    assert!(world.upload_chunk(sound));
    assert!(!world.upload_chunk(sound));

    let info = world.sound_info(sound).unwrap();
    assert_eq!(info.frames, 22050);
    assert_eq!(info.duration, Duration::from_secs(1));
    assert_eq!(world.sound_uploaded_bytes(sound), 44100);
    assert_eq!(world.sound_storage_len(sound), 0);
    assert_eq!(backend.lock()?.stats().buffer_uploads, 3);

    let finished: Vec<_> = world
        .poll_events()
        .into_iter()
        .filter(|e| matches!(e, SonanceEvent::StreamFinished { .. }))
        .collect();
    assert_eq!(finished, vec![SonanceEvent::StreamFinished { sound }]);
    Ok(())
}

#[test]
fn test_single_shot_sound_uploads_once() -> anyhow::Result<()> {
    let (mut world, _backend) = world_with(SonanceWorldDesc::default().stream_chunk_size(1000))?;
    let sound = world.create_sound(mono16(4410, 22050), false)?;
    let source = world.create_source()?;

    assert!(world.bind_sound(source, sound));
    assert_eq!(world.sound_buffer_count(sound), 1);
    assert!(!world.upload_chunk(sound));
    assert_eq!(world.queued_buffer_count(source), 1);
    Ok(())
}

#[test]
fn test_chunks_are_queued_on_every_bound_source() -> anyhow::Result<()> {
    let (mut world, _backend) = world_with(SonanceWorldDesc::default().stream_chunk_size(2000))?;
    let sound = world.create_sound(mono16(9000, 22050), true)?;
    let first = world.create_source()?;
    let second = world.create_source()?;

    world.bind_sound(first, sound);
    assert_eq!(world.sound_buffer_count(sound), 1);
    world.bind_sound(second, sound);
    assert_eq!(world.queued_buffer_count(second), 1);

    world.update(Duration::from_millis(10));
    assert_eq!(world.sound_buffer_count(sound), 3);
    assert_eq!(world.queued_buffer_count(first), 3);
    assert_eq!(world.queued_buffer_count(second), 3);

    while world.update_stream(first) {}
    assert_eq!(world.sound_buffer_count(sound), 5);
    assert_eq!(world.queued_buffer_count(second), 5);
    Ok(())
}

#[test]
fn test_live_sound_is_fed_from_another_thread() -> anyhow::Result<()> {
    let (mut world, backend) = world()?;
    let (sound, feeder) = world.create_live_sound(SoundInfo::new(22050, 16, 2).with_id("mic"))?;
    let source = world.create_source()?;
    assert!(world.bind_sound(source, sound));
    assert!(!world.update_stream(source));

    std::thread::spawn(move || {
        feeder.append_chunk(&[0u8; 4410]);
        feeder.append_chunk(&[]);
    })
    .join()
    .unwrap();

    let info = world.sound_info(sound).unwrap();
    assert_eq!(info.id, "mic");
    assert_eq!(info.frames, 4410 / 4);

    assert_eq!(world.sound_pending_bytes(sound), 4410);
    assert!(world.update_stream(source));
    assert_eq!(world.queued_buffer_count(source), 1);
    let voice = world.source_voice(source).unwrap();
    assert_eq!(backend.lock()?.queued_buffer_count(voice)?, 1);
    // The partial frame stays behind until more data completes it.
    assert_eq!(world.sound_uploaded_bytes(sound), 4408);
    assert!(!world.update_stream(source));

    assert!(world.append_chunk(sound, &[0u8; 2]));
    assert!(world.update_stream(source));
    assert_eq!(world.sound_uploaded_bytes(sound), 4412);
    Ok(())
}

#[test]
fn test_unsupported_layout_is_rejected() -> anyhow::Result<()> {
    let (mut world, _backend) = world()?;
    let data = SoundData::new(SoundInfo::new(22050, 24, 1), vec![0; 300]);
    assert!(world.create_sound(data, false).is_err());
    Ok(())
}

#[test]
fn test_seeking_uploads_one_second_ahead() -> anyhow::Result<()> {
    let (mut world, _backend) = world_with(SonanceWorldDesc::default().stream_chunk_size(16384))?;
    let sound = world.create_sound(mono16(132300, 22050), true)?;
    let source = world.create_source()?;
    let hooks = HeldSignals::default();
    let effect = world.create_effect(ReverbParams::default(), hooks.clone())?;
    world.bind_effect(effect, source);
    world.bind_sound(source, sound);
    assert_eq!(world.sound_uploaded_bytes(sound), 16384);

    assert!(world.set_playback_position(source, Duration::from_secs(1)));

    let uploaded = world.sound_uploaded_bytes(sound);
    assert!(uploaded >= world.sound_byte_size_for(sound, Duration::from_secs(2)));
    assert!(uploaded < 132300);
    let position = world.playback_position(source).as_secs_f32();
    assert!((position - 1.0).abs() < 1e-3, "position {}", position);
    assert_eq!(hooks.position_changes.load(Ordering::SeqCst), 1);
    assert_eq!(world.playback_duration(source), Duration::from_secs(3));
    Ok(())
}

#[test]
fn test_seeking_past_the_end_fails() -> anyhow::Result<()> {
    let (mut world, _backend) = world()?;
    let sound = world.create_sound(mono16(4410, 22050), false)?;
    let source = world.create_source()?;
    world.bind_sound(source, sound);

    assert!(!world.set_playback_position(source, Duration::from_secs(5)));
    assert!(!world.set_playback_position(source, Duration::MAX));
    assert_eq!(world.playback_position(source), Duration::ZERO);
    Ok(())
}
