//! A session shared across threads.
//!
//! Decoding runs outside the lock, so a slow document does not block paging
//! or readers. When two loads overlap, the one started last wins and the
//! other's result is dropped without being installed.

use super::{decode_guarded, DocumentSession, SessionEvent, SessionSnapshot};
use crate::file::SourceFile;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to a [`DocumentSession`] behind a mutex.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<DocumentSession>>,
}

impl SharedSession {
    /// Wrap a session.
    pub fn new(session: DocumentSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load a file.
    ///
    /// Returns `false` if a later load or reset superseded this one, in
    /// which case its result was discarded.
    pub fn process_file(&self, file: &SourceFile) -> bool {
        let (ticket, converters, options) = {
            let mut session = self.lock();
            let ticket = session.begin(file);
            (ticket, session.converters().clone(), session.options().clone())
        };

        let outcome = decode_guarded(ticket.kind, file, &converters, &options);
        self.lock().commit(&ticket, outcome)
    }

    /// Load a file, decoding on tokio's blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn process_file_async(&self, file: SourceFile) -> bool {
        use crate::error::ProcessError;

        let (ticket, converters, options) = {
            let mut session = self.lock();
            let ticket = session.begin(&file);
            (ticket, session.converters().clone(), session.options().clone())
        };

        let kind = ticket.kind;
        let outcome = tokio::task::spawn_blocking(move || {
            decode_guarded(kind, &file, &converters, &options)
        })
        .await
        .unwrap_or_else(|e| Err(ProcessError::Outer(e.to_string())));

        self.lock().commit(&ticket, outcome)
    }

    /// See [`DocumentSession::go_to_page`].
    pub fn go_to_page(&self, target: u32) -> bool {
        self.lock().go_to_page(target)
    }

    /// See [`DocumentSession::reset`].
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// See [`DocumentSession::subscribe`].
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.lock().subscribe()
    }

    /// Copy the observable fields.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Run a closure against the session while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&DocumentSession) -> R) -> R {
        f(&*self.lock())
    }
}

impl From<DocumentSession> for SharedSession {
    fn from(session: DocumentSession) -> Self {
        Self::new(session)
    }
}
