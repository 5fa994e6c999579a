//! Mail provider implementations.
//!
//! - [`email`] - Mail session traits and the IMAP implementation

pub mod email;
