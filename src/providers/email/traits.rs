//! Mail session trait definitions.
//!
//! This module defines the [`MailSession`] and [`MailboxLock`] traits, which
//! abstract over the IMAP connection used to harvest contacts. The aggregator
//! and orchestrator only ever talk to these traits, so they can be driven by
//! a real server connection or by an in-memory fake.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::Envelope;

/// Result type alias for mail session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// A lazy, finite stream of envelopes for the locked mailbox.
///
/// The stream cannot be restarted; fetch again to read the mailbox twice.
pub type EnvelopeStream<'a> = BoxStream<'a, Result<Envelope>>;

/// Errors that can occur during mail session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server rejected a command; carries the server's text verbatim.
    #[error("{0}")]
    Command(String),

    /// Malformed or unexpected server response.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Mailbox metadata returned by a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxStatus {
    /// Number of messages, if the server reported it.
    pub messages: Option<u32>,
}

/// Mailbox metadata returned when a locked mailbox is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxInfo {
    /// Number of messages currently in the mailbox.
    pub exists: u32,
}

/// An entry of the account's mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxName {
    /// Full mailbox path, including hierarchy delimiters.
    pub path: String,
}

impl MailboxName {
    /// Creates a listing entry.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// An authenticated mail session.
///
/// Implementations permit at most one [`MailboxLock`] at a time; acquiring a
/// second lock waits until the first one is dropped.
#[async_trait]
pub trait MailSession: Send + Sync {
    /// Queries mailbox status.
    ///
    /// Returns `Ok(None)` when the server reports that the mailbox does not exist.
    async fn status(&self, mailbox: &str) -> Result<Option<MailboxStatus>>;

    /// Acquires the exclusive lock on `mailbox`.
    ///
    /// The lock is released when the returned guard is dropped.
    async fn lock_mailbox(&self, mailbox: &str) -> Result<Box<dyn MailboxLock>>;

    /// Lists every mailbox of the account, in server order.
    async fn list(&self) -> Result<Vec<MailboxName>>;

    /// Ends the session.
    async fn logout(&self) -> Result<()>;
}

/// Exclusive access to one mailbox of a [`MailSession`].
///
/// Dropping the guard releases the lock. Implementations must release exactly
/// once, whether the holder finished normally, bailed out with an error, or
/// abandoned an [`EnvelopeStream`] half way.
#[async_trait]
pub trait MailboxLock: Send {
    /// Opens the mailbox and reports its size.
    async fn open(&mut self) -> Result<MailboxInfo>;

    /// Streams the envelopes of the messages in `range` (e.g. `1:*`).
    async fn fetch_envelopes<'a>(&'a mut self, range: &str) -> Result<EnvelopeStream<'a>>;
}
