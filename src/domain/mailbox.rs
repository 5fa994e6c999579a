//! Per-mailbox processing outcome.

use std::collections::HashSet;

use super::Contact;

/// Message reported when a failure carries no text of its own.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Why a mailbox could not be fully processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailboxFailure {
    /// The status query reported no such mailbox.
    #[error("Mailbox not found")]
    NotFound,

    /// The mailbox holds no messages.
    #[error("Mailbox is empty")]
    Empty,

    /// Any other failure, carrying the underlying message.
    #[error("{0}")]
    Other(String),
}

impl MailboxFailure {
    /// Wraps an arbitrary failure message, substituting [`UNKNOWN_ERROR`] when it is empty.
    ///
    /// Whitespace-only text is kept as given.
    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Other(UNKNOWN_ERROR.to_string())
        } else {
            Self::Other(message)
        }
    }
}

/// Either the contacts found in a mailbox or the reason there are none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxOutcome {
    /// The scan completed.
    Contacts(HashSet<Contact>),
    /// The mailbox could not be fully processed.
    Failed(MailboxFailure),
}

/// The outcome of processing exactly one mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxResult {
    /// Mailbox path as reported by the server.
    pub mailbox: String,
    /// Contacts or failure.
    pub outcome: MailboxOutcome,
}

impl MailboxResult {
    /// Creates a successful result.
    pub fn success(mailbox: impl Into<String>, contacts: HashSet<Contact>) -> Self {
        Self {
            mailbox: mailbox.into(),
            outcome: MailboxOutcome::Contacts(contacts),
        }
    }

    /// Creates a failed result.
    pub fn failed(mailbox: impl Into<String>, failure: MailboxFailure) -> Self {
        Self {
            mailbox: mailbox.into(),
            outcome: MailboxOutcome::Failed(failure),
        }
    }

    /// Returns the contacts, or `None` if the mailbox failed.
    pub fn contacts(&self) -> Option<&HashSet<Contact>> {
        match &self.outcome {
            MailboxOutcome::Contacts(contacts) => Some(contacts),
            MailboxOutcome::Failed(_) => None,
        }
    }

    /// Number of contacts found; zero for a failed mailbox.
    pub fn contact_count(&self) -> usize {
        self.contacts().map_or(0, HashSet::len)
    }

    /// Returns the failure, if any.
    pub fn failure(&self) -> Option<&MailboxFailure> {
        match &self.outcome {
            MailboxOutcome::Contacts(_) => None,
            MailboxOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Returns the error message, present exactly when the mailbox failed.
    pub fn error(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }

    /// Whether this result should be handed to an exporter.
    pub fn is_exportable(&self) -> bool {
        self.contact_count() > 0
    }

    /// Consumes the result, yielding its contacts (empty on failure).
    pub fn into_contacts(self) -> HashSet<Contact> {
        match self.outcome {
            MailboxOutcome::Contacts(contacts) => contacts,
            MailboxOutcome::Failed(_) => HashSet::new(),
        }
    }
}
