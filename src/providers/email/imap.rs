//! IMAP session implementation.
//!
//! This module provides a [`MailSession`] implementation on top of a real IMAP
//! server connection.
//!
//! # Protocol Details
//!
//! - Uses IMAP4rev1 (RFC 3501) via `async-imap`
//! - Implicit TLS (typically port 993) via `tokio-rustls` and the
//!   `webpki-roots` trust store
//! - Mailboxes are opened with `EXAMINE`, so harvesting never changes flags
//!
//! # Locking
//!
//! The underlying session is shared behind a `tokio` mutex. A mailbox lock is
//! an owned guard on that mutex, so only one mailbox can be scanned at a time
//! and the lock is released when the guard is dropped.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_imap::imap_proto;
use async_imap::types::{Fetch, Mailbox};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::{
    EnvelopeStream, MailSession, MailboxInfo, MailboxLock, MailboxName, MailboxStatus, Result,
    SessionError,
};
use crate::domain::{Envelope, Sender};

/// Default port for IMAP over implicit TLS.
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// IMAP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (typically 993 for TLS).
    pub port: u16,
}

impl ImapConfig {
    /// Creates a configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Login credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Username (usually email address).
    pub username: String,
    /// Password or app-specific password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Type alias for the IMAP session with TLS (using tokio-util compat layer).
type ImapClientSession = async_imap::Session<Compat<TlsStream<TcpStream>>>;

impl From<async_imap::error::Error> for SessionError {
    fn from(err: async_imap::error::Error) -> Self {
        use async_imap::error::Error;

        match err {
            Error::No(text) | Error::Bad(text) => SessionError::Command(text),
            Error::Io(e) => SessionError::Connection(e.to_string()),
            Error::ConnectionLost => SessionError::Connection("connection lost".to_string()),
            other => SessionError::Protocol(other.to_string()),
        }
    }
}

/// An authenticated IMAP session.
///
/// # Example
///
/// ```ignore
/// use contact_harvest::providers::email::{
///     Credentials, ImapConfig, ImapSession, MailSession, DEFAULT_IMAP_PORT,
/// };
///
/// let config = ImapConfig::new("imap.example.com", DEFAULT_IMAP_PORT);
/// let session = ImapSession::connect(&config, &Credentials::new("me", "secret")).await?;
///
/// for mailbox in session.list().await? {
///     println!("{}", mailbox.path);
/// }
/// session.logout().await?;
/// ```
pub struct ImapSession {
    /// Server the session is connected to.
    host: String,
    /// Shared session; a mailbox lock holds the owned guard.
    inner: Arc<Mutex<ImapClientSession>>,
}

impl ImapSession {
    /// Connects over TLS and logs in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connection`] if the TCP connection or TLS
    /// handshake fails, and [`SessionError::Authentication`] if the server
    /// rejects the credentials.
    pub async fn connect(config: &ImapConfig, credentials: &Credentials) -> Result<Self> {
        let tls_stream = connect_tls(config).await?;

        let client = async_imap::Client::new(tls_stream);

        let session = client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| SessionError::Authentication(format!("IMAP login failed: {}", e.0)))?;

        tracing::info!(
            host = %config.host,
            user = %credentials.username,
            "IMAP session authenticated"
        );

        Ok(Self {
            host: config.host.clone(),
            inner: Arc::new(Mutex::new(session)),
        })
    }
}

/// Establishes TLS connection to the IMAP server with futures compat wrapper.
async fn connect_tls(config: &ImapConfig) -> Result<Compat<TlsStream<TcpStream>>> {
    let tcp_stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .map_err(|e| SessionError::Connection(format!("TCP connect failed: {}", e)))?;

    let tls_config = ClientConfig::builder()
        .with_root_certificates(tokio_rustls::rustls::RootCertStore::from_iter(
            webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
        ))
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(tls_config));
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| SessionError::Connection(format!("invalid server name: {}", e)))?;

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| SessionError::Connection(format!("TLS handshake failed: {}", e)))?;

    // async-imap speaks the futures I/O traits
    Ok(tls_stream.compat())
}

#[async_trait]
impl MailSession for ImapSession {
    async fn status(&self, mailbox: &str) -> Result<Option<MailboxStatus>> {
        let mut session = self.inner.lock().await;
        let response = session.status(mailbox, "(MESSAGES)").await;
        status_from_response(mailbox, response)
    }

    async fn lock_mailbox(&self, mailbox: &str) -> Result<Box<dyn MailboxLock>> {
        let session = Arc::clone(&self.inner).lock_owned().await;
        tracing::debug!(mailbox, "acquired mailbox lock");

        Ok(Box::new(ImapMailboxLock {
            mailbox: mailbox.to_string(),
            session,
        }))
    }

    async fn list(&self) -> Result<Vec<MailboxName>> {
        let mut session = self.inner.lock().await;

        let names = session.list(Some(""), Some("*")).await?;
        let mailboxes = names
            .map_ok(|name| MailboxName::new(name.name()))
            .try_collect::<Vec<_>>()
            .await?;

        Ok(mailboxes)
    }

    async fn logout(&self) -> Result<()> {
        let mut session = self.inner.lock().await;
        session.logout().await?;
        tracing::debug!(host = %self.host, "logged out");
        Ok(())
    }
}

/// Exclusive hold on the session, scoped to one mailbox.
pub struct ImapMailboxLock {
    mailbox: String,
    session: OwnedMutexGuard<ImapClientSession>,
}

#[async_trait]
impl MailboxLock for ImapMailboxLock {
    async fn open(&mut self) -> Result<MailboxInfo> {
        let mailbox = self.session.examine(&self.mailbox).await?;
        Ok(MailboxInfo {
            exists: mailbox.exists,
        })
    }

    async fn fetch_envelopes<'a>(&'a mut self, range: &str) -> Result<EnvelopeStream<'a>> {
        let fetches = self.session.fetch(range.to_string(), "ENVELOPE").await?;

        Ok(fetches
            .map(|item| {
                item.map(|fetch| envelope_from_fetch(&fetch))
                    .map_err(SessionError::from)
            })
            .boxed())
    }
}

impl Drop for ImapMailboxLock {
    fn drop(&mut self) {
        tracing::debug!(mailbox = %self.mailbox, "released mailbox lock");
    }
}

/// Interprets a STATUS response. A `NO` means the server has no such mailbox.
fn status_from_response(
    mailbox: &str,
    response: async_imap::error::Result<Mailbox>,
) -> Result<Option<MailboxStatus>> {
    match response {
        Ok(status) => Ok(Some(MailboxStatus {
            messages: Some(status.exists),
        })),
        Err(async_imap::error::Error::No(reason)) => {
            tracing::debug!(mailbox, %reason, "STATUS rejected");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Decodes a mailbox name from IMAP's modified UTF-7 into Unicode.
///
/// Commands must keep using the name as listed; this form is for people and
/// file names. Names that are not valid modified UTF-7 are returned unchanged.
pub fn decode_mailbox_name(raw: &str) -> String {
    match imap_utf7::ImapUtf7Str::new(raw) {
        Ok(name) => name.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Converts a fetch result to an [`Envelope`].
///
/// Messages the server returned without envelope data have no senders.
fn envelope_from_fetch(fetch: &Fetch) -> Envelope {
    let from = fetch
        .envelope()
        .and_then(|envelope| envelope.from.as_ref())
        .map(|addrs| addrs.iter().map(sender_from_address).collect())
        .unwrap_or_default();

    Envelope { from }
}

fn sender_from_address(addr: &imap_proto::Address<'_>) -> Sender {
    Sender {
        address: build_email_from_parts(addr.mailbox.as_ref(), addr.host.as_ref()),
        name: addr.name.as_ref().map(|name| decode_header_text(name)),
    }
}

/// Builds an email address string from IMAP mailbox and host parts.
fn build_email_from_parts(
    mailbox: Option<&Cow<'_, [u8]>>,
    host: Option<&Cow<'_, [u8]>>,
) -> Option<String> {
    match (mailbox, host) {
        (Some(m), Some(h)) => Some(format!(
            "{}@{}",
            String::from_utf8_lossy(m),
            String::from_utf8_lossy(h)
        )),
        (Some(m), None) => Some(String::from_utf8_lossy(m).to_string()),
        _ => None,
    }
}

/// Decodes RFC 2047 encoded words in a display name.
fn decode_header_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let fake_header = format!("X: {}", text);
    match mailparse::parse_header(fake_header.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => text.into_owned(),
    }
}
