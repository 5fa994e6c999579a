//! Contact aggregation for a single mailbox.
//!
//! Scans every envelope of a mailbox and reduces the senders to one contact
//! per address:
//! - Senders without an address are skipped
//! - The last non-empty display name in delivery order wins
//! - A message without a name never erases a name seen earlier
//!
//! Failures never escape [`fetch_and_process_messages`]; they become a
//! [`MailboxResult`] carrying the error, so one bad mailbox cannot stop a run.

use std::collections::{HashMap, HashSet};

use futures::StreamExt;

use crate::domain::{Contact, Envelope, MailboxFailure, MailboxResult, Sender};
use crate::providers::email::{MailSession, SessionError};

/// Mailbox scanned when the caller does not name one.
pub const DEFAULT_MAILBOX: &str = "INBOX";

/// Sequence set covering every message of a mailbox.
pub const ALL_MESSAGES: &str = "1:*";

impl From<SessionError> for MailboxFailure {
    fn from(err: SessionError) -> Self {
        MailboxFailure::other(err.to_string())
    }
}

/// Working set of contacts keyed by address.
///
/// Contacts are only materialized as a set once the scan completes.
#[derive(Debug, Default)]
pub struct ContactAccumulator {
    contacts: HashMap<String, Contact>,
}

impl ContactAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sender.
    ///
    /// Returns `false` if the sender has no usable address and was skipped.
    pub fn observe(&mut self, sender: &Sender) -> bool {
        let Some(address) = sender.address() else {
            return false;
        };
        let name = sender.name();

        match self.contacts.get_mut(address) {
            Some(existing) => {
                if let Some(name) = name {
                    existing.name = Some(name.to_string());
                }
            }
            None => {
                self.contacts.insert(
                    address.to_string(),
                    Contact {
                        email: address.to_string(),
                        name: name.map(str::to_string),
                    },
                );
            }
        }
        true
    }

    /// Records every sender of an envelope, in header order.
    pub fn observe_envelope(&mut self, envelope: &Envelope) {
        for sender in &envelope.from {
            self.observe(sender);
        }
    }

    /// Number of distinct addresses seen so far.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether no address has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Finishes the scan.
    pub fn into_contacts(self) -> HashSet<Contact> {
        self.contacts.into_values().collect()
    }
}

/// Harvests the senders of [`DEFAULT_MAILBOX`].
pub async fn fetch_and_process_inbox<S>(session: &S) -> MailboxResult
where
    S: MailSession + ?Sized,
{
    fetch_and_process_messages(session, DEFAULT_MAILBOX).await
}

/// Harvests the senders of `mailbox`.
///
/// A mailbox the server does not know yields [`MailboxFailure::NotFound`]
/// without being locked; a mailbox without messages yields
/// [`MailboxFailure::Empty`] without being fetched. Any other failure is
/// reported with the underlying message. The mailbox lock is always released
/// before this function returns.
pub async fn fetch_and_process_messages<S>(session: &S, mailbox: &str) -> MailboxResult
where
    S: MailSession + ?Sized,
{
    tracing::debug!(mailbox, "scanning mailbox");

    let outcome = match session.status(mailbox).await {
        Ok(Some(status)) => {
            tracing::debug!(mailbox, messages = ?status.messages, "mailbox status");
            scan_mailbox(session, mailbox).await
        }
        Ok(None) => Err(MailboxFailure::NotFound),
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(contacts) => {
            tracing::info!(mailbox, contacts = contacts.len(), "mailbox scanned");
            MailboxResult::success(mailbox, contacts)
        }
        Err(failure) => {
            tracing::warn!(mailbox, error = %failure, "mailbox not processed");
            MailboxResult::failed(mailbox, failure)
        }
    }
}

async fn scan_mailbox<S>(
    session: &S,
    mailbox: &str,
) -> std::result::Result<HashSet<Contact>, MailboxFailure>
where
    S: MailSession + ?Sized,
{
    let mut lock = session.lock_mailbox(mailbox).await?;

    let info = lock.open().await?;
    if info.exists == 0 {
        return Err(MailboxFailure::Empty);
    }

    let mut accumulator = ContactAccumulator::new();
    let mut envelopes = lock.fetch_envelopes(ALL_MESSAGES).await?;
    while let Some(envelope) = envelopes.next().await {
        accumulator.observe_envelope(&envelope?);
    }

    Ok(accumulator.into_contacts())
}
