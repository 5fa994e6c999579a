//! contact-harvest - Exports the senders of every IMAP mailbox as CSV contact lists
//!
//! This crate provides mailbox listing, per-mailbox contact aggregation, run
//! orchestration and CSV export over an IMAP session.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
