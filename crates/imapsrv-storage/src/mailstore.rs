//! Mailstore trait

use async_trait::async_trait;
use imapsrv_common::types::{Mailbox, MailboxId, MailboxPath};
use imapsrv_common::Result;

/// Storage provider queried by IMAP sessions.
///
/// Implementations are shared read-only between all sessions. Every method
/// may fail; the session treats any failure as fatal for the connection.
#[async_trait]
pub trait Mailstore: Send + Sync {
    /// Look up a mailbox by its full path
    async fn get_mailbox(&self, path: &MailboxPath) -> Result<Option<Mailbox>>;

    /// Immediate children of the given path, in store order
    async fn get_mailboxes(&self, path: &MailboxPath) -> Result<Vec<Mailbox>>;

    /// Sequence number of the first unseen message
    async fn first_unseen(&self, id: MailboxId) -> Result<u32>;

    /// Number of messages in the mailbox
    async fn total_messages(&self, id: MailboxId) -> Result<u32>;

    /// Number of messages with the \Recent flag
    async fn recent_messages(&self, id: MailboxId) -> Result<u32>;

    /// Predicted next UID
    async fn next_uid(&self, id: MailboxId) -> Result<u32>;
}
