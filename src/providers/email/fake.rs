//! In-memory [`MailSession`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use super::{
    EnvelopeStream, MailSession, MailboxInfo, MailboxLock, MailboxName, MailboxStatus, Result,
    SessionError,
};
use crate::domain::{Envelope, Sender};

/// Scripted behavior of one mailbox.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMailbox {
    /// STATUS reports the mailbox as missing.
    pub missing: bool,
    pub status_error: Option<String>,
    pub lock_error: Option<String>,
    pub open_error: Option<String>,
    pub fetch_error: Option<String>,
    /// Overrides the message count reported by `open`.
    pub exists: Option<u32>,
    /// Stream items in delivery order; `Err` items fail the stream.
    pub items: Vec<std::result::Result<Envelope, String>>,
}

impl FakeMailbox {
    pub fn with_envelopes(envelopes: impl IntoIterator<Item = Envelope>) -> Self {
        Self {
            items: envelopes.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    /// One single-sender message per `(address, name)` pair.
    pub fn with_senders<'a>(
        senders: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Self {
        Self::with_envelopes(senders.into_iter().map(|(address, name)| {
            Envelope::from_senders([Sender {
                address: Some(address.to_string()),
                name: name.map(str::to_string),
            }])
        }))
    }

    pub fn empty() -> Self {
        Self {
            exists: Some(0),
            ..Self::default()
        }
    }

    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    pub fn status_error(message: &str) -> Self {
        Self {
            status_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn then_stream_error(mut self, message: &str) -> Self {
        self.items.push(Err(message.to_string()));
        self
    }
}

/// Counts of calls made against a [`FakeSession`].
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    status: AtomicUsize,
    locks: AtomicUsize,
    releases: AtomicUsize,
    opens: AtomicUsize,
    fetches: AtomicUsize,
    fetch_ranges: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn status(&self) -> usize {
        self.status.load(Ordering::SeqCst)
    }

    pub fn locks(&self) -> usize {
        self.locks.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fetch_ranges(&self) -> Vec<String> {
        self.fetch_ranges.lock().unwrap().clone()
    }
}

/// A session whose mailboxes are scripted up front.
pub(crate) struct FakeSession {
    mailboxes: HashMap<String, FakeMailbox>,
    listing: std::result::Result<Vec<String>, String>,
    calls: Arc<CallLog>,
    held: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            mailboxes: HashMap::new(),
            listing: Ok(Vec::new()),
            calls: Arc::new(CallLog::default()),
            held: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adds a mailbox, listed after the ones added before it.
    pub fn with_mailbox(mut self, name: &str, mailbox: FakeMailbox) -> Self {
        self.mailboxes.insert(name.to_string(), mailbox);
        if let Ok(listing) = &mut self.listing {
            listing.push(name.to_string());
        }
        self
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.listing = Err(message.to_string());
        self
    }

    pub fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl MailSession for FakeSession {
    async fn status(&self, mailbox: &str) -> Result<Option<MailboxStatus>> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);

        match self.mailboxes.get(mailbox) {
            None => Ok(None),
            Some(fake) if fake.missing => Ok(None),
            Some(fake) => match &fake.status_error {
                Some(message) => Err(SessionError::Command(message.clone())),
                None => Ok(Some(MailboxStatus {
                    messages: Some(fake.items.len() as u32),
                })),
            },
        }
    }

    async fn lock_mailbox(&self, mailbox: &str) -> Result<Box<dyn MailboxLock>> {
        self.calls.locks.fetch_add(1, Ordering::SeqCst);

        let fake = self.mailboxes.get(mailbox).cloned().unwrap_or_default();
        if let Some(message) = &fake.lock_error {
            return Err(SessionError::Command(message.clone()));
        }

        assert!(
            !self.held.swap(true, Ordering::SeqCst),
            "mailbox lock already held"
        );

        Ok(Box::new(FakeLock {
            fake,
            calls: Arc::clone(&self.calls),
            held: Arc::clone(&self.held),
        }))
    }

    async fn list(&self) -> Result<Vec<MailboxName>> {
        match &self.listing {
            Ok(names) => Ok(names.iter().map(MailboxName::new).collect()),
            Err(message) => Err(SessionError::Connection(message.clone())),
        }
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }
}

struct FakeLock {
    fake: FakeMailbox,
    calls: Arc<CallLog>,
    held: Arc<AtomicBool>,
}

#[async_trait]
impl MailboxLock for FakeLock {
    async fn open(&mut self) -> Result<MailboxInfo> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fake.open_error {
            return Err(SessionError::Command(message.clone()));
        }
        Ok(MailboxInfo {
            exists: self
                .fake
                .exists
                .unwrap_or(self.fake.items.len() as u32),
        })
    }

    async fn fetch_envelopes<'a>(&'a mut self, range: &str) -> Result<EnvelopeStream<'a>> {
        self.calls.fetches.fetch_add(1, Ordering::SeqCst);
        self.calls
            .fetch_ranges
            .lock()
            .unwrap()
            .push(range.to_string());

        if let Some(message) = &self.fake.fetch_error {
            return Err(SessionError::Command(message.clone()));
        }

        let items = self
            .fake
            .items
            .iter()
            .cloned()
            .map(|item| item.map_err(SessionError::Command));
        Ok(futures::stream::iter(items).boxed())
    }
}

impl Drop for FakeLock {
    fn drop(&mut self) {
        self.calls.releases.fetch_add(1, Ordering::SeqCst);
        self.held.store(false, Ordering::SeqCst);
    }
}
