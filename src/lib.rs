//! Sonance: a positional audio object layer.
//!
//! A [`SonanceWorld`] owns sounds (decoded PCM uploaded into hardware
//! buffers, whole or streamed in chunks), sources (voices playing one sound
//! each) and effects (DSP parameter blocks routed to sources through
//! auxiliary sends). Transport commands on a source pass through the effects
//! bound to it, which may delay them until they are ready.
//!
//! ```no_run
//! use sonance::backend::SoftwareBackend;
//! use sonance::audio_data::{LoadOptions, load_sound_file};
//! use sonance::effects::FadeEffect;
//! use sonance::{SonanceWorld, SonanceWorldDesc};
//! use std::time::Duration;
//!
//! # fn main() -> sonance::Result<()> {
//! let mut world = SonanceWorld::new(SonanceWorldDesc::default(), SoftwareBackend::default())?;
//! let data = load_sound_file("music.ogg", &LoadOptions::default())?;
//! let sound = world.create_sound(data, true)?;
//! let source = world.create_source()?;
//! let fade = world.create_effect(sonance::effects::ReverbParams::default(), FadeEffect::default())?;
//!
//! world.bind_sound(source, sound);
//! world.bind_effect(fade, source);
//! world.play(source);
//! loop {
//!     world.update(Duration::from_millis(16));
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio_data;
pub mod backend;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod math;
pub mod sound;
pub mod source;
pub mod world;

pub use backend::{AudioBackend, SharedBackend, SoftwareBackend, VoiceState};
pub use config::SonanceWorldDesc;
pub use effects::{EffectHooks, EffectId, EffectParams, FadeEffect, ReadySignal, Transport};
pub use engine::{AudioFillCallback, SonanceEngine};
pub use error::{Result, SonanceError};
pub use events::SonanceEvent;
pub use sound::{SoundFeeder, SoundId};
pub use source::SourceId;
pub use world::SonanceWorld;
