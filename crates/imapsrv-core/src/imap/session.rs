//! IMAP Session management
//!
//! Manages the state of an IMAP connection including authentication
//! and selected mailbox state.

use super::pattern::ListQuery;
use super::response::Response;
use chrono::{DateTime, Utc};
use imapsrv_common::types::{Mailbox, MailboxFlags, MailboxPath};
use imapsrv_common::{Error, Result};
use imapsrv_storage::Mailstore;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// IMAP session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not authenticated
    NotAuthenticated,
    /// Authenticated but no mailbox selected
    Authenticated,
    /// Mailbox selected
    Selected,
}

/// IMAP Session
pub struct ImapSession {
    /// Session ID
    pub id: String,
    /// Current state
    state: SessionState,
    /// Currently selected mailbox
    mailbox: Option<Mailbox>,
    /// Shared mailstore
    mailstore: Arc<dyn Mailstore>,
    /// Session start time
    pub started_at: DateTime<Utc>,
    /// Last activity time
    pub last_activity: DateTime<Utc>,
}

impl std::fmt::Debug for ImapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("mailbox", &self.mailbox)
            .field("started_at", &self.started_at)
            .field("last_activity", &self.last_activity)
            .finish()
    }
}

impl ImapSession {
    /// Create a new session
    pub fn new(mailstore: Arc<dyn Mailstore>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::NotAuthenticated,
            mailbox: None,
            mailstore,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selected_mailbox(&self) -> Option<&Mailbox> {
        self.mailbox.as_ref()
    }

    /// Check if session is authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::Selected
        )
    }

    /// Check if a mailbox is selected
    pub fn is_selected(&self) -> bool {
        matches!(self.state, SessionState::Selected)
    }

    /// Set authenticated state
    pub fn authenticate(&mut self) {
        self.state = SessionState::Authenticated;
        self.update_activity();
    }

    /// Drop back to the initial state
    pub fn logout(&mut self) {
        self.state = SessionState::NotAuthenticated;
        self.mailbox = None;
    }

    /// Select a mailbox - returns true if the mailbox exists and can be
    /// selected.
    ///
    /// A failed lookup leaves no mailbox selected. \Noselect mailboxes are
    /// treated as absent.
    pub async fn select_mailbox(&mut self, name: &str) -> Result<bool> {
        let path = MailboxPath::parse(name);
        let mailbox = self
            .mailstore
            .get_mailbox(&path)
            .await?
            .filter(|mbox| !mbox.flags.contains(MailboxFlags::NOSELECT));
        self.update_activity();

        match mailbox {
            Some(mailbox) => {
                debug!(session = %self.id, mailbox = %mailbox.path, "Mailbox selected");
                self.mailbox = Some(mailbox);
                self.state = SessionState::Selected;
                Ok(true)
            }
            None => {
                self.mailbox = None;
                self.state = SessionState::Authenticated;
                Ok(false)
            }
        }
    }

    /// Add the selected mailbox's status lines to a response
    pub async fn add_mailbox_info(&self, res: &mut Response) -> Result<()> {
        let mailbox = match &self.mailbox {
            Some(mailbox) => mailbox,
            None => return Err(Error::Internal("no mailbox selected".to_string())),
        };
        let mailstore = &self.mailstore;

        let first_unseen = mailstore.first_unseen(mailbox.id).await?;
        let total_messages = mailstore.total_messages(mailbox.id).await?;
        let recent_messages = mailstore.recent_messages(mailbox.id).await?;
        let next_uid = mailstore.next_uid(mailbox.id).await?;

        res.push_untagged(format!("{} EXISTS", total_messages));
        res.push_untagged(format!("{} RECENT", recent_messages));
        res.push_untagged(format!(
            "OK [UNSEEN {}] Message {} is first unseen",
            first_unseen, first_unseen
        ));
        res.push_untagged(format!("OK [UIDVALIDITY {}] UIDs valid", mailbox.id));
        res.push_untagged(format!("OK [UIDNEXT {}] Predicted next UID", next_uid));
        Ok(())
    }

    /// List mailboxes matching a non-empty pattern
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<Mailbox>> {
        self.update_activity();
        let query = ListQuery::new(reference, pattern)?;
        query.resolve(self.mailstore.as_ref()).await
    }

    /// Update last activity timestamp
    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }
}
