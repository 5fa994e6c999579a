//! Run orchestration.
//!
//! The [`HarvestService`] drives one full harvest over a session: it lists
//! every mailbox, scans them one at a time in listing order, and only after
//! all scans finish hands each mailbox with contacts to the exporter.

use serde::Serialize;

use crate::domain::MailboxResult;
use crate::providers::email::{decode_mailbox_name, MailSession};
use crate::services::contact_service::fetch_and_process_messages;
use crate::services::export_service::ContactExport;
use crate::services::mailbox_service::list_mailboxes;

/// Totals for one harvest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Mailboxes scanned.
    pub mailboxes: usize,
    /// Mailboxes written by the exporter.
    pub exported: usize,
    /// Mailboxes that produced an error.
    pub failed: usize,
    /// Mailboxes scanned successfully without any contact.
    pub empty: usize,
    /// Contacts across all successful mailboxes.
    pub contacts: usize,
}

impl RunSummary {
    /// Tallies scan results, counting every exportable mailbox as exported.
    pub fn from_results(results: &[MailboxResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.mailboxes += 1;
            match result.contacts() {
                None => summary.failed += 1,
                Some(contacts) if contacts.is_empty() => summary.empty += 1,
                Some(contacts) => {
                    summary.exported += 1;
                    summary.contacts += contacts.len();
                }
            }
            summary
        })
    }
}

/// Harvests every mailbox of a session into an exporter.
pub struct HarvestService<E> {
    exporter: E,
}

impl<E: ContactExport> HarvestService<E> {
    /// Creates a new harvest service writing through `exporter`.
    pub fn new(exporter: E) -> Self {
        Self { exporter }
    }

    /// Runs one harvest and returns the per-mailbox results in listing order.
    ///
    /// Neither a failed mailbox nor a failed export stops the run.
    pub async fn run<S>(&self, session: &S) -> Vec<MailboxResult>
    where
        S: MailSession + ?Sized,
    {
        let mailboxes = list_mailboxes(session).await;
        tracing::info!(count = mailboxes.len(), "harvesting mailboxes");

        let mut results = Vec::with_capacity(mailboxes.len());
        for mailbox in &mailboxes {
            results.push(fetch_and_process_messages(session, mailbox).await);
        }

        let mut summary = RunSummary::from_results(&results);
        for result in &results {
            if !self.export_result(result).await {
                summary.exported -= 1;
            }
        }

        tracing::info!(
            mailboxes = summary.mailboxes,
            exported = summary.exported,
            failed = summary.failed,
            empty = summary.empty,
            contacts = summary.contacts,
            "harvest finished"
        );
        results
    }

    /// Exports one result. Returns `false` only if an export was attempted and failed.
    async fn export_result(&self, result: &MailboxResult) -> bool {
        let mailbox = decode_mailbox_name(&result.mailbox);

        if let Some(error) = result.error() {
            tracing::error!("Error processing {}: {}", mailbox, error);
            return true;
        }

        let Some(contacts) = result.contacts().filter(|c| !c.is_empty()) else {
            tracing::info!("No contacts found in {}", mailbox);
            return true;
        };

        match self.exporter.export(&result.mailbox, contacts).await {
            Ok(path) => {
                tracing::info!(
                    path = %path.display(),
                    "Created CSV for {} with {} contacts",
                    mailbox,
                    contacts.len()
                );
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error writing CSV for {}", mailbox);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use mockall::predicate::eq;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{Contact, MailboxFailure};
    use crate::providers::email::fake::{FakeMailbox, FakeSession};
    use crate::services::export_service::{ExportError, MockContactExport};

    fn io_error() -> ExportError {
        ExportError::Io {
            path: PathBuf::from("output/INBOX.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    #[tokio::test]
    async fn no_mailboxes_exports_nothing() {
        let mut exporter = MockContactExport::new();
        exporter.expect_export().never();

        let results = HarvestService::new(exporter).run(&FakeSession::new()).await;

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_exports_nothing() {
        let session = FakeSession::new()
            .with_mailbox("INBOX", FakeMailbox::with_senders([("a@example.com", None)]))
            .with_list_error("connection reset");
        let mut exporter = MockContactExport::new();
        exporter.expect_export().never();

        let results = HarvestService::new(exporter).run(&session).await;

        assert!(results.is_empty());
        assert_eq!(session.calls().status(), 0);
    }

    #[tokio::test]
    async fn exports_mailboxes_with_contacts_in_listing_order() {
        let session = FakeSession::new()
            .with_mailbox(
                "INBOX",
                FakeMailbox::with_senders([("test@example.com", Some("Test User"))]),
            )
            .with_mailbox(
                "Sent",
                FakeMailbox::with_senders([
                    ("one@example.com", None),
                    ("two@example.com", Some("Two")),
                ]),
            );

        let mut seq = Sequence::new();
        let mut exporter = MockContactExport::new();
        exporter
            .expect_export()
            .with(
                eq("INBOX"),
                eq(HashSet::from([Contact::with_name(
                    "test@example.com",
                    "Test User",
                )])),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(PathBuf::from("output/INBOX.csv")));
        exporter
            .expect_export()
            .withf(|mailbox, contacts| mailbox == "Sent" && contacts.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(PathBuf::from("output/Sent.csv")));

        let results = HarvestService::new(exporter).run(&session).await;

        let names: Vec<&str> = results.iter().map(|r| r.mailbox.as_str()).collect();
        assert_eq!(names, vec!["INBOX", "Sent"]);
        assert_eq!(results[0].contact_count(), 1);
        assert_eq!(results[1].contact_count(), 2);
    }

    #[tokio::test]
    async fn failed_and_empty_mailboxes_are_not_exported() {
        let session = FakeSession::new()
            .with_mailbox("Drafts", FakeMailbox::empty())
            .with_mailbox("Junk", FakeMailbox::status_error("STATUS failed"))
            .with_mailbox("Archive", FakeMailbox::missing())
            .with_mailbox(
                "Newsletters",
                FakeMailbox::with_senders([("news@example.com", Some("News"))]),
            );

        let mut exporter = MockContactExport::new();
        exporter
            .expect_export()
            .withf(|mailbox, _| mailbox == "Newsletters")
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("output/Newsletters.csv")));

        let results = HarvestService::new(exporter).run(&session).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].failure(), Some(&MailboxFailure::Empty));
        assert_eq!(results[1].error().as_deref(), Some("STATUS failed"));
        assert_eq!(results[2].failure(), Some(&MailboxFailure::NotFound));
        assert!(results[3].is_exportable());
    }

    #[tokio::test]
    async fn zero_contact_success_is_not_exported() {
        let mailbox = FakeMailbox::with_envelopes([crate::domain::Envelope::default()]);
        let session = FakeSession::new().with_mailbox("INBOX", mailbox);

        let mut exporter = MockContactExport::new();
        exporter.expect_export().never();

        let results = HarvestService::new(exporter).run(&session).await;

        assert_eq!(results.len(), 1);
        assert!(results[0].error().is_none());
        assert_eq!(results[0].contact_count(), 0);
    }

    #[tokio::test]
    async fn export_failure_does_not_stop_remaining_exports() {
        let session = FakeSession::new()
            .with_mailbox("INBOX", FakeMailbox::with_senders([("a@example.com", None)]))
            .with_mailbox("Sent", FakeMailbox::with_senders([("b@example.com", None)]));

        let mut exporter = MockContactExport::new();
        exporter
            .expect_export()
            .withf(|mailbox, _| mailbox == "INBOX")
            .times(1)
            .returning(|_, _| Err(io_error()));
        exporter
            .expect_export()
            .withf(|mailbox, _| mailbox == "Sent")
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("output/Sent.csv")));

        let results = HarvestService::new(exporter).run(&session).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(MailboxResult::is_exportable));
    }

    #[tokio::test]
    async fn every_mailbox_lock_is_released() {
        let session = FakeSession::new()
            .with_mailbox("INBOX", FakeMailbox::with_senders([("a@example.com", None)]))
            .with_mailbox(
                "Broken",
                FakeMailbox::with_senders([("b@example.com", None)]).then_stream_error("BYE"),
            )
            .with_mailbox("Drafts", FakeMailbox::empty());
        let calls = session.calls();

        let mut exporter = MockContactExport::new();
        exporter
            .expect_export()
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("output/INBOX.csv")));

        HarvestService::new(exporter).run(&session).await;

        assert_eq!(calls.locks(), 3);
        assert_eq!(calls.releases(), 3);
    }

    #[test]
    fn summary_counts_results() {
        let results = vec![
            MailboxResult::success(
                "INBOX",
                HashSet::from([Contact::new("a@example.com"), Contact::new("b@example.com")]),
            ),
            MailboxResult::success("Sent", HashSet::from([Contact::new("c@example.com")])),
            MailboxResult::success("Notes", HashSet::new()),
            MailboxResult::failed("Drafts", MailboxFailure::Empty),
            MailboxResult::failed("Junk", MailboxFailure::other("timeout")),
        ];

        assert_eq!(
            RunSummary::from_results(&results),
            RunSummary {
                mailboxes: 5,
                exported: 2,
                failed: 2,
                empty: 1,
                contacts: 3,
            }
        );
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(RunSummary::from_results(&[]), RunSummary::default());
    }
}
