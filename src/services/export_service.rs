//! Contact export.
//!
//! Writes one CSV file per mailbox. The file layout is:
//!
//! ```text
//! "email","name","attributes"
//! "test@example.com","Test User","{""list"":""INBOX""}"
//! ```
//!
//! Every field is quoted with embedded quotes doubled, rows are sorted by
//! email, and the file has no trailing newline. Mailbox names arrive as the
//! server lists them and are decoded to Unicode before naming the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Contact;
use crate::providers::email::decode_mailbox_name;

/// Default directory for exported files.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const CSV_HEADER: &str = r#""email","name","attributes""#;

/// Characters replaced with `-` when a mailbox name becomes a file name.
const UNSAFE_FILE_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Errors that can occur while exporting contacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Destination for a mailbox's contacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactExport: Send + Sync {
    /// Persists `contacts` harvested from `mailbox`, returning where they went.
    async fn export(&self, mailbox: &str, contacts: &HashSet<Contact>) -> Result<PathBuf>;
}

/// Exports contacts as CSV files into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    /// Creates an exporter writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory (and parents) if missing.
    pub async fn ensure_output_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ExportError::Io {
                path: self.output_dir.clone(),
                source,
            })
    }

    /// Returns the file a mailbox is exported to.
    pub fn path_for(&self, mailbox: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", list_label(mailbox)))
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

#[async_trait]
impl ContactExport for CsvExporter {
    async fn export(&self, mailbox: &str, contacts: &HashSet<Contact>) -> Result<PathBuf> {
        self.ensure_output_dir().await?;

        let path = self.path_for(mailbox);
        let csv = render_csv(contacts, &list_label(mailbox));

        tokio::fs::write(&path, csv)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(mailbox, path = %path.display(), "wrote contacts");
        Ok(path)
    }
}

/// File stem and `list` attribute for a mailbox as listed by the server.
pub fn list_label(mailbox: &str) -> String {
    sanitize_mailbox_name(&decode_mailbox_name(mailbox))
}

/// Replaces characters that are unsafe in file names with `-`.
pub fn sanitize_mailbox_name(mailbox: &str) -> String {
    mailbox.replace(UNSAFE_FILE_CHARS, "-")
}

/// Renders contacts as CSV, tagging every row with `list` in the attributes column.
pub fn render_csv(contacts: &HashSet<Contact>, list: &str) -> String {
    let attributes = serde_json::json!({ "list": list }).to_string();

    let mut sorted: Vec<&Contact> = contacts.iter().collect();
    sorted.sort_by(|a, b| a.email.cmp(&b.email));

    let mut lines = Vec::with_capacity(sorted.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for contact in sorted {
        lines.push(format!(
            "{},{},{}",
            quote(&contact.email),
            quote(contact.name.as_deref().unwrap_or("")),
            quote(&attributes)
        ));
    }
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
