//! Domain layer types for contact harvesting.
//!
//! This module contains the core domain types used throughout the crate:
//! contacts, the envelope data they are extracted from, and per-mailbox
//! results.

mod contact;
mod envelope;
mod mailbox;

pub use contact::Contact;
pub use envelope::{Envelope, Sender};
pub use mailbox::{MailboxFailure, MailboxOutcome, MailboxResult, UNKNOWN_ERROR};
