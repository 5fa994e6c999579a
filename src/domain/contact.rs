//! Contact domain types.
//!
//! Represents senders extracted from the envelopes of a mailbox.

use serde::{Deserialize, Serialize};

/// A sender harvested from a mailbox.
///
/// The email address is the identity of a contact: a contact set produced by
/// the aggregator never holds two contacts with the same address. Addresses
/// are kept exactly as the server reported them, without case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// Email address (unique within a mailbox).
    pub email: String,
    /// Display name, if any message from this address carried one.
    pub name: Option<String>,
}

impl Contact {
    /// Creates a new contact with just an email address.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Creates a new contact with email and name.
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}
