use crate::backend::AudioBackend;
use std::thread::{self, ThreadId};

/// The audio backend bound to the thread that owns it.
///
/// Every access checks the calling thread; a mismatch is a programming error
/// and panics.
pub(crate) struct HardwareContext {
    backend: Box<dyn AudioBackend>,
    owner: ThreadId,
}

impl HardwareContext {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            owner: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Rebinds the context to the calling thread.
    pub fn rebind(&mut self) {
        self.owner = thread::current().id();
    }

    #[track_caller]
    pub fn get(&self) -> &dyn AudioBackend {
        self.check();
        &*self.backend
    }

    #[track_caller]
    pub fn get_mut(&mut self) -> &mut dyn AudioBackend {
        self.check();
        &mut *self.backend
    }

    #[track_caller]
    fn check(&self) {
        let current = thread::current().id();
        if current != self.owner {
            panic!(
                "audio context is bound to thread {:?} but was used from thread {:?}",
                self.owner, current
            );
        }
    }
}
