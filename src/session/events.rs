//! Change notifications for session observers.

use crate::detect::DocumentKind;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

/// A state change published by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// All fields returned to their defaults
    Reset,
    /// A file started processing
    Loading {
        /// Display name of the file
        file_name: String,
    },
    /// Processing finished and content is available
    Ready {
        /// Kind of the loaded document
        kind: DocumentKind,
        /// Number of pages
        total_pages: u32,
    },
    /// Processing failed; the message is also on the session
    Failed {
        /// Error message
        message: String,
    },
    /// The page cursor moved
    PageChanged {
        /// New 1-based page
        page: u32,
    },
}

/// Subscribed channels. Disconnected receivers are dropped on the next send.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<SessionEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn notify(&mut self, event: SessionEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.senders.len()
    }
}
