//! Sound buffers: raw PCM owned until uploaded, and the hardware buffers it
//! was uploaded into.

use crate::audio_data::{SoundData, SoundInfo};
use crate::backend::{AudioBackend, BufferHandle, PcmFormat};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of a sound owned by a [`SonanceWorld`](crate::SonanceWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub(crate) u64);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sound#{}", self.0)
    }
}

/// PCM not yet uploaded plus the format info, shared with producers.
#[derive(Debug)]
struct PcmStore {
    data: Vec<u8>,
    info: SoundInfo,
    /// Every byte ever stored, uploaded or not
    total_bytes: usize,
}

fn lock(store: &Mutex<PcmStore>) -> MutexGuard<'_, PcmStore> {
    // The store holds plain bytes; a panicking producer cannot leave it torn.
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer handle for appending PCM to a sound from any thread.
///
/// Appended bytes must use the sound's format. Frame count and duration in
/// the sound's info grow with every append.
#[derive(Debug, Clone)]
pub struct SoundFeeder {
    store: Arc<Mutex<PcmStore>>,
}

impl SoundFeeder {
    /// Appends raw PCM. Empty input is ignored.
    pub fn append_chunk(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let mut store = lock(&self.store);
        store.data.extend_from_slice(data);
        store.total_bytes += data.len();
        let frames = store.total_bytes / store.info.bytes_per_frame().max(1);
        store.info.set_frames(frames as u64);
    }

    pub fn info(&self) -> SoundInfo {
        lock(&self.store).info.clone()
    }
}

#[derive(Debug)]
pub(crate) struct SoundBuffer {
    store: Arc<Mutex<PcmStore>>,
    format: PcmFormat,
    sample_rate: u32,
    handles: Vec<BufferHandle>,
    /// Bytes of the current storage already uploaded
    offset: usize,
    uploaded_bytes: usize,
    stream: bool,
    chunk_size: usize,
    finished: bool,
}

impl SoundBuffer {
    /// Takes ownership of `data` without uploading anything. Returns `None`
    /// for layouts the hardware cannot play.
    pub fn new(data: SoundData, stream: bool, chunk_size: usize) -> Option<Self> {
        let format = data.info.pcm_format()?;
        if data.info.sample_rate == 0 {
            return None;
        }
        let bytes_per_frame = format.bytes_per_frame();
        let chunk_size = (chunk_size / bytes_per_frame).max(1) * bytes_per_frame;
        let sample_rate = data.info.sample_rate;
        let total_bytes = data.data.len();
        let mut info = data.info;
        info.set_frames((total_bytes / bytes_per_frame) as u64);

        Some(Self {
            store: Arc::new(Mutex::new(PcmStore {
                data: data.data,
                info,
                total_bytes,
            })),
            format,
            sample_rate,
            handles: Vec::new(),
            offset: 0,
            uploaded_bytes: 0,
            stream,
            chunk_size,
            finished: false,
        })
    }

    pub fn feeder(&self) -> SoundFeeder {
        SoundFeeder {
            store: Arc::clone(&self.store),
        }
    }

    pub fn info(&self) -> SoundInfo {
        lock(&self.store).info.clone()
    }

    pub fn handles(&self) -> &[BufferHandle] {
        &self.handles
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Bytes currently held in storage (uploaded or not).
    pub fn storage_len(&self) -> usize {
        lock(&self.store).data.len()
    }

    pub fn pending_bytes(&self) -> usize {
        lock(&self.store).data.len() - self.offset
    }

    /// Marks the first upload that drained the storage. Returns true once.
    pub fn take_finished(&mut self) -> bool {
        std::mem::take(&mut self.finished)
    }

    /// Uploads the next window (or everything left for non-streamed sounds)
    /// into a new hardware buffer. Returns `None` when nothing is left or the
    /// upload failed.
    pub fn upload_chunk(&mut self, backend: &mut dyn AudioBackend) -> Option<BufferHandle> {
        let bytes_per_frame = self.format.bytes_per_frame();
        let mut store = lock(&self.store);

        let remaining = store.data.len() - self.offset;
        let size = if self.stream {
            remaining.min(self.chunk_size)
        } else {
            remaining
        };
        // Producers may have appended a partial frame; it waits for the rest.
        let size = size / bytes_per_frame * bytes_per_frame;
        if size == 0 {
            return None;
        }

        let handle = match backend.create_buffer() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Failed to create hardware buffer: {}", e);
                return None;
            }
        };
        let window = &store.data[self.offset..self.offset + size];
        if let Err(e) = backend.buffer_data(handle, self.format, window, self.sample_rate) {
            log::warn!("Failed to upload {} bytes of PCM: {}", size, e);
            if let Err(e) = backend.delete_buffers(&[handle]) {
                log::warn!("Failed to delete hardware buffer {:?}: {}", handle, e);
            }
            return None;
        }

        self.offset += size;
        self.uploaded_bytes += size;
        self.handles.push(handle);

        if self.offset >= store.data.len() {
            store.data = Vec::new();
            self.offset = 0;
            self.finished = true;
        }

        Some(handle)
    }

    /// Deletes every hardware buffer. All voices must have released them.
    pub fn release(&mut self, backend: &mut dyn AudioBackend) {
        if self.handles.is_empty() {
            return;
        }
        if let Err(e) = backend.delete_buffers(&self.handles) {
            log::error!("Failed to delete {} hardware buffers: {}", self.handles.len(), e);
        }
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;

    fn mono16(bytes: usize, rate: u32) -> SoundData {
        SoundData::new(SoundInfo::new(rate, 16, 1), vec![0; bytes])
    }

    #[test]
    fn streamed_upload_splits_into_chunks() {
        let mut backend = SoftwareBackend::default();
        let mut sound = SoundBuffer::new(mono16(44100, 22050), true, 16384).unwrap();

        let handles: Vec<BufferHandle> =
            std::iter::from_fn(|| sound.upload_chunk(&mut backend)).collect();
        let sizes: Vec<usize> = handles
            .iter()
            .map(|h| backend.buffer_size(*h).unwrap())
            .collect();

        assert_eq!(sizes, vec![16384, 16384, 11332]);
        assert_eq!(sound.storage_len(), 0);
        assert_eq!(sound.uploaded_bytes() / 2, 22050);
        assert!(sound.take_finished());
        assert!(!sound.take_finished());
    }

    #[test]
    fn non_streamed_upload_is_one_buffer() {
        let mut backend = SoftwareBackend::default();
        let mut sound = SoundBuffer::new(mono16(1000, 8000), false, 16).unwrap();

        assert!(sound.upload_chunk(&mut backend).is_some());
        assert!(sound.upload_chunk(&mut backend).is_none());
        assert_eq!(sound.handles().len(), 1);
    }

    #[test]
    fn chunk_size_rounds_down_to_whole_frames() {
        let data = SoundData::new(SoundInfo::new(8000, 16, 2), vec![0; 40]);
        let sound = SoundBuffer::new(data, true, 10).unwrap();
        assert_eq!(sound.chunk_size(), 8);

        let data = SoundData::new(SoundInfo::new(8000, 16, 2), vec![0; 40]);
        let sound = SoundBuffer::new(data, true, 1).unwrap();
        assert_eq!(sound.chunk_size(), 4);
    }

    #[test]
    fn empty_sound_uploads_nothing() {
        let mut backend = SoftwareBackend::default();
        let mut sound = SoundBuffer::new(mono16(0, 8000), true, 64).unwrap();
        assert!(sound.upload_chunk(&mut backend).is_none());
        assert_eq!(backend.stats().buffers_created, 0);
    }

    #[test]
    fn unsupported_layout_is_rejected() {
        let data = SoundData::new(SoundInfo::new(8000, 24, 1), vec![0; 12]);
        assert!(SoundBuffer::new(data, true, 64).is_none());
    }

    #[test]
    fn feeder_appends_from_another_thread() {
        let mut backend = SoftwareBackend::default();
        let mut sound = SoundBuffer::new(mono16(0, 8000), true, 64).unwrap();
        let feeder = sound.feeder();

        std::thread::spawn(move || {
            feeder.append_chunk(&[]);
            feeder.append_chunk(&[0; 100]);
        })
        .join()
        .unwrap();

        assert_eq!(sound.info().frames, 50);
        assert_eq!(sound.pending_bytes(), 100);
        assert!(sound.upload_chunk(&mut backend).is_some());
        assert!(sound.upload_chunk(&mut backend).is_some());
        assert!(sound.upload_chunk(&mut backend).is_none());
        assert_eq!(sound.uploaded_bytes(), 100);
    }

    #[test]
    fn partial_frames_wait_for_the_rest() {
        let mut backend = SoftwareBackend::default();
        let mut sound = SoundBuffer::new(mono16(0, 8000), true, 64).unwrap();
        let feeder = sound.feeder();

        feeder.append_chunk(&[0; 3]);
        assert!(sound.upload_chunk(&mut backend).is_some());
        assert!(sound.upload_chunk(&mut backend).is_none());
        assert_eq!(sound.pending_bytes(), 1);

        feeder.append_chunk(&[0; 1]);
        assert!(sound.upload_chunk(&mut backend).is_some());
        assert_eq!(sound.storage_len(), 0);
    }
}
