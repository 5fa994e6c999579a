//! Mailbox enumeration.

use crate::providers::email::MailSession;

/// Lists the paths of every mailbox on the account, in server order.
///
/// A failed listing is logged and reported as an empty list, so callers
/// cannot tell "no mailboxes" apart from "listing failed" by the return value.
pub async fn list_mailboxes<S>(session: &S) -> Vec<String>
where
    S: MailSession + ?Sized,
{
    match session.list().await {
        Ok(names) => {
            let mailboxes: Vec<String> = names.into_iter().map(|name| name.path).collect();
            tracing::debug!(count = mailboxes.len(), "listed mailboxes");
            mailboxes
        }
        Err(e) => {
            tracing::error!(error = %e, "Error listing mailboxes");
            Vec::new()
        }
    }
}
