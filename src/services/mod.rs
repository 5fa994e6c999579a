//! Harvesting services.
//!
//! # Architecture
//!
//! ```text
//!   HarvestService (run orchestration)
//!      |-- mailbox_service::list_mailboxes
//!      |-- contact_service::fetch_and_process_messages   (one mailbox at a time)
//!      '-- ContactExport (CsvExporter)                    (after every scan)
//!          |
//!          v
//!   providers::email::MailSession
//! ```
//!
//! # Services Overview
//!
//! - [`list_mailboxes`]: Enumerates mailbox paths, empty on failure
//! - [`fetch_and_process_messages`]: Reduces a mailbox's senders to contacts
//! - [`HarvestService`]: Runs a full harvest and exports the results
//! - [`CsvExporter`]: Writes one CSV file per mailbox

pub mod contact_service;
pub mod export_service;
pub mod harvest_service;
pub mod mailbox_service;

pub use contact_service::{
    fetch_and_process_inbox, fetch_and_process_messages, ContactAccumulator, ALL_MESSAGES,
    DEFAULT_MAILBOX,
};
pub use export_service::{
    list_label, render_csv, sanitize_mailbox_name, ContactExport, CsvExporter, ExportError,
    DEFAULT_OUTPUT_DIR,
};
pub use harvest_service::{HarvestService, RunSummary};
pub use mailbox_service::list_mailboxes;
