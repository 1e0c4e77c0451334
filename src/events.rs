//! Event types for Sonance

use crate::effects::Transport;
use crate::sound::SoundId;
use crate::source::SourceId;

/// Notifications collected by the world; drain them with
/// [`SonanceWorld::poll_events`](crate::SonanceWorld::poll_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SonanceEvent {
    /// The hardware command of a transport request ran.
    TransportCommitted {
        source: SourceId,
        transport: Transport,
    },
    /// A transport call arrived while another request was still pending.
    RequestIgnored {
        source: SourceId,
        transport: Transport,
    },
    /// A pending request was cancelled by a forced stop or by destroying
    /// its source.
    RequestCancelled {
        source: SourceId,
        transport: Transport,
    },
    /// Every byte stored in the sound has been uploaded.
    StreamFinished { sound: SoundId },
}

impl SonanceEvent {
    pub fn source_id(&self) -> Option<SourceId> {
        match self {
            SonanceEvent::TransportCommitted { source, .. }
            | SonanceEvent::RequestIgnored { source, .. }
            | SonanceEvent::RequestCancelled { source, .. } => Some(*source),
            SonanceEvent::StreamFinished { .. } => None,
        }
    }
}
