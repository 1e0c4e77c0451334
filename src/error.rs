//! Error types for Sonance

use crate::backend::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SonanceError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio loading error: {0}")]
    AudioLoading(String),

    #[error("Hardware call `{call}` failed: {source}")]
    Backend {
        call: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SonanceError {
    pub(crate) fn backend(call: &'static str, source: BackendError) -> Self {
        Self::Backend { call, source }
    }
}

pub type Result<T> = std::result::Result<T, SonanceError>;
