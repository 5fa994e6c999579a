//! Envelope domain types.
//!
//! The subset of an IMAP `ENVELOPE` needed to harvest senders. Providers
//! translate their wire representation into these types.

/// One entry of a message's `From` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    /// Email address (`mailbox@host`), absent for group syntax or broken headers.
    pub address: Option<String>,
    /// Decoded display name.
    pub name: Option<String>,
}

impl Sender {
    /// Creates a sender with just an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            name: None,
        }
    }

    /// Creates a sender with address and display name.
    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            name: Some(name.into()),
        }
    }

    /// Returns the address if it is present and non-empty.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.is_empty())
    }

    /// Returns the display name if it is present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Envelope metadata of a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Senders listed in the `From` field, in header order.
    pub from: Vec<Sender>,
}

impl Envelope {
    /// Creates an envelope with the given senders.
    pub fn from_senders(from: impl IntoIterator<Item = Sender>) -> Self {
        Self {
            from: from.into_iter().collect(),
        }
    }
}
