use super::{Sound, SonanceWorld, logged};
use crate::audio_data::{SoundData, SoundInfo};
use crate::error::{Result, SonanceError};
use crate::events::SonanceEvent;
use crate::sound::{SoundBuffer, SoundFeeder, SoundId};
use crate::source::SourceId;
use std::collections::BTreeSet;
use std::time::Duration;

impl SonanceWorld {
    /// Takes ownership of decoded PCM and registers it as a sound.
    ///
    /// Nothing is uploaded yet. Streamed sounds are uploaded one
    /// `stream_chunk_size` window at a time as the sources playing them are
    /// updated; other sounds are uploaded whole on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SonanceError::AudioFormat`] for sample layouts the hardware
    /// cannot play (anything but 8/16-bit mono/stereo).
    pub fn create_sound(&mut self, data: SoundData, stream: bool) -> Result<SoundId> {
        let layout = (data.info.channels, data.info.bits_per_sample);
        let buffer = SoundBuffer::new(data, stream, self.desc.stream_chunk_size).ok_or_else(|| {
            SonanceError::AudioFormat(format!(
                "unsupported PCM layout: {} channel(s), {} bits per sample",
                layout.0, layout.1
            ))
        })?;

        let id = SoundId(self.allocate_id());
        log::debug!("Created {} ({})", id, buffer.info().id);
        self.sounds.insert(
            id,
            Sound {
                buffer,
                sources: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    /// Creates an empty streamed sound fed by a producer through the
    /// returned [`SoundFeeder`].
    pub fn create_live_sound(&mut self, info: SoundInfo) -> Result<(SoundId, SoundFeeder)> {
        let id = self.create_sound(SoundData::new(info, Vec::new()), true)?;
        let feeder = self
            .sound_feeder(id)
            .ok_or_else(|| SonanceError::Engine(format!("{} vanished after creation", id)))?;
        Ok((id, feeder))
    }

    /// Destroys a sound. Every source playing it is stopped and releases its
    /// queued buffers before the hardware buffers are deleted.
    pub fn destroy_sound(&mut self, id: SoundId) -> bool {
        let Some(sources) = self.sounds.get(&id).map(|s| s.sources.clone()) else {
            return false;
        };
        for source in sources {
            self.unbind_sound(source);
        }

        if let Some(mut sound) = self.sounds.remove(&id) {
            sound.buffer.release(self.hardware.get_mut());
        }
        log::debug!("Destroyed {}", id);
        true
    }

    /// Uploads the next chunk of a sound into a new hardware buffer and
    /// queues it on every source bound to the sound.
    ///
    /// Returns false when there is nothing left to upload or the upload
    /// failed.
    pub fn upload_chunk(&mut self, id: SoundId) -> bool {
        let Self {
            sounds,
            sources,
            hardware,
            events,
            ..
        } = self;
        let Some(sound) = sounds.get_mut(&id) else {
            return false;
        };

        let backend = hardware.get_mut();
        let Some(handle) = sound.buffer.upload_chunk(backend) else {
            return false;
        };

        let bound: Vec<SourceId> = sound.sources.iter().copied().collect();
        for source in bound {
            if let Some(src) = sources.get(&source) {
                logged("queue_buffers", backend.queue_buffers(src.voice, &[handle]));
            }
        }

        if sound.buffer.take_finished() && sound.buffer.is_streaming() {
            log::debug!(
                "{} fully uploaded in {} chunks",
                id,
                sound.buffer.handles().len()
            );
            events.push(SonanceEvent::StreamFinished { sound: id });
        }
        true
    }

    /// Uploads chunks until at least `byte_len` bytes of the sound are
    /// resident in hardware buffers, or nothing is left.
    pub fn upload_until(&mut self, id: SoundId, byte_len: usize) {
        while self
            .sounds
            .get(&id)
            .is_some_and(|s| s.buffer.uploaded_bytes() < byte_len)
        {
            if !self.upload_chunk(id) {
                break;
            }
        }
    }

    /// Appends PCM to a sound's pending storage. Same as
    /// [`SoundFeeder::append_chunk`] but from the context thread.
    pub fn append_chunk(&mut self, id: SoundId, data: &[u8]) -> bool {
        match self.sounds.get(&id) {
            Some(sound) => {
                sound.buffer.feeder().append_chunk(data);
                true
            }
            None => false,
        }
    }

    /// Returns a producer handle for appending PCM from other threads.
    pub fn sound_feeder(&self, id: SoundId) -> Option<SoundFeeder> {
        self.sounds.get(&id).map(|s| s.buffer.feeder())
    }

    pub fn sound_info(&self, id: SoundId) -> Option<SoundInfo> {
        self.sounds.get(&id).map(|s| s.buffer.info())
    }

    pub fn sound_is_streaming(&self, id: SoundId) -> bool {
        self.sounds.get(&id).is_some_and(|s| s.buffer.is_streaming())
    }

    /// Number of hardware buffers uploaded so far.
    pub fn sound_buffer_count(&self, id: SoundId) -> usize {
        self.sounds.get(&id).map_or(0, |s| s.buffer.handles().len())
    }

    /// Bytes uploaded to hardware buffers so far.
    pub fn sound_uploaded_bytes(&self, id: SoundId) -> usize {
        self.sounds.get(&id).map_or(0, |s| s.buffer.uploaded_bytes())
    }

    /// Bytes of PCM still held by the sound. Zero once everything stored has
    /// been uploaded.
    pub fn sound_storage_len(&self, id: SoundId) -> usize {
        self.sounds.get(&id).map_or(0, |s| s.buffer.storage_len())
    }

    /// Bytes stored but not uploaded yet.
    pub fn sound_pending_bytes(&self, id: SoundId) -> usize {
        self.sounds.get(&id).map_or(0, |s| s.buffer.pending_bytes())
    }

    /// Frame-aligned size of one streamed upload.
    pub fn sound_chunk_size(&self, id: SoundId) -> usize {
        self.sounds.get(&id).map_or(0, |s| s.buffer.chunk_size())
    }

    /// Byte size of `duration` worth of the sound's frames.
    pub fn sound_byte_size_for(&self, id: SoundId, duration: Duration) -> usize {
        self.sounds
            .get(&id)
            .map_or(0, |s| s.buffer.info().byte_size_for(duration))
    }

    /// Sources currently bound to the sound, in creation order.
    pub fn sound_sources(&self, id: SoundId) -> Vec<SourceId> {
        self.sounds
            .get(&id)
            .map(|s| s.sources.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_sound(&self, id: SoundId) -> bool {
        self.sounds.contains_key(&id)
    }
}
