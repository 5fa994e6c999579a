//! Mail session providers.
//!
//! This module contains the [`MailSession`] and [`MailboxLock`] traits and the
//! IMAP implementation behind them:
//!
//! - [`ImapSession`] - IMAP over implicit TLS via `async-imap`
//!
//! # Architecture
//!
//! The session abstraction keeps the harvesting services independent of the
//! wire protocol. A session exposes exactly what harvesting needs:
//!
//! - Mailbox status and listing
//! - An exclusive, scoped lock per mailbox
//! - A lazy envelope stream for the locked mailbox
//!
//! # Example
//!
//! ```ignore
//! use contact_harvest::providers::email::MailSession;
//!
//! async fn count_inbox(session: &dyn MailSession) -> u32 {
//!     let mut lock = session.lock_mailbox("INBOX").await.expect("lock INBOX");
//!     lock.open().await.map(|info| info.exists).unwrap_or(0)
//! }
//! ```

#[cfg(test)]
pub(crate) mod fake;
mod imap;
mod traits;

pub use imap::{
    decode_mailbox_name, Credentials, ImapConfig, ImapMailboxLock, ImapSession, DEFAULT_IMAP_PORT,
};
pub use traits::{
    EnvelopeStream, MailSession, MailboxInfo, MailboxLock, MailboxName, MailboxStatus, Result,
    SessionError,
};
