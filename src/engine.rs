use crate::backend::SharedBackend;
use crate::config::SonanceWorldDesc;
use crate::error::{Result, SonanceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Callback function type for filling audio samples
///
/// The callback receives:
/// - `buffer`: interleaved slice to fill with audio samples
/// - `sample_rate`: output sample rate
/// - `channels`: number of output channels
///
/// Returns the number of frames actually filled (frames = samples / channels)
pub type AudioFillCallback = dyn Fn(&mut [f32], u32, u16) -> usize + Send + Sync;

/// Real-time output stream on the default cpal device.
///
/// The engine pulls interleaved f32 blocks from a fill callback. Use
/// [`with_backend`](Self::with_backend) to play whatever a
/// [`SharedBackend`] has queued.
pub struct SonanceEngine {
    desc: SonanceWorldDesc,
    stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    frames_processed: Arc<AtomicUsize>,
    fill_callback: Option<Arc<AudioFillCallback>>,
}

impl SonanceEngine {
    pub fn new(desc: SonanceWorldDesc) -> Result<Self> {
        Ok(Self {
            desc,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            frames_processed: Arc::new(AtomicUsize::new(0)),
            fill_callback: None,
        })
    }

    /// Creates an engine that renders `backend` into the output stream.
    ///
    /// The audio thread never waits on the backend: a block is rendered as
    /// silence whenever the world holds the lock.
    pub fn with_backend(desc: SonanceWorldDesc, backend: SharedBackend) -> Result<Self> {
        let mut engine = Self::new(desc)?;
        engine.set_fill_callback(move |buffer: &mut [f32], sample_rate: u32, channels: u16| {
            backend.try_render(buffer, sample_rate, channels)
        });
        Ok(engine)
    }

    /// Set the callback function that will be called to fill audio buffers.
    /// It runs on the audio thread and must not block.
    pub fn set_fill_callback<F>(&mut self, callback: F)
    where
        F: Fn(&mut [f32], u32, u16) -> usize + Send + Sync + 'static,
    {
        self.fill_callback = Some(Arc::new(callback));
    }

    /// Opens the default output device and starts the stream.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let fill_callback = self
            .fill_callback
            .clone()
            .ok_or_else(|| SonanceError::Engine("No fill callback set".into()))?;

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            SonanceError::AudioDevice("No default output device available".into())
        })?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            SonanceError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;

        let shared = StreamShared {
            fill_callback,
            is_running: self.is_running.clone(),
            frames_processed: self.frames_processed.clone(),
            sample_rate: self.desc.sample_rate,
            channels: self.desc.channels,
        };
        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, shared)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, shared)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, shared)?,
            other => {
                return Err(SonanceError::AudioFormat(format!(
                    "Unsupported sample format {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| SonanceError::AudioDevice(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        self.is_running.store(true, Ordering::Relaxed);
        log::info!(
            "Output stream started ({} Hz, {} channels, {} frames per block)",
            self.desc.sample_rate,
            self.desc.channels,
            self.desc.block_size
        );
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            self.is_running.store(false, Ordering::Relaxed);
            drop(stream);
            log::info!("Output stream stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Number of frames rendered since the stream started.
    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn desc(&self) -> &SonanceWorldDesc {
        &self.desc
    }
}

impl Drop for SonanceEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

struct StreamShared {
    fill_callback: Arc<AudioFillCallback>,
    is_running: Arc<AtomicBool>,
    frames_processed: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: u16,
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: StreamShared,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !shared.is_running.load(Ordering::Relaxed) {
                    data.fill(T::from_sample(0.0f32));
                    return;
                }

                scratch.clear();
                scratch.resize(data.len(), 0.0);
                let frames =
                    (shared.fill_callback)(&mut scratch, shared.sample_rate, shared.channels);

                for (out, sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(*sample);
                }
                shared.frames_processed.fetch_add(frames, Ordering::Relaxed);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SonanceError::AudioDevice(format!("Failed to build stream: {}", e)))
}
