//! Mailstore test double that records every query and can inject failures

use async_trait::async_trait;
use imapsrv_common::types::{Mailbox, MailboxId, MailboxPath};
use imapsrv_common::{Error, Result};
use imapsrv_storage::{MailboxCounters, Mailstore, MemoryMailstore};
use std::sync::Mutex;

pub struct RecordingMailstore {
    inner: MemoryMailstore,
    queries: Mutex<Vec<String>>,
    fail_on: Option<String>,
    fail_counters: bool,
}

impl RecordingMailstore {
    pub fn new(inner: MemoryMailstore) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
            fail_on: None,
            fail_counters: false,
        }
    }

    /// INBOX, Work/{Projects/Alpha, Reports}, Archive/2023
    pub fn sample() -> Self {
        let mut store = MemoryMailstore::new();
        store
            .add_mailbox(
                "INBOX",
                MailboxCounters {
                    first_unseen: 2,
                    total: 3,
                    recent: 1,
                    next_uid: 4,
                },
            )
            .unwrap();
        for path in [
            "Work",
            "Work/Projects",
            "Work/Projects/Alpha",
            "Work/Reports",
            "Archive",
            "Archive/2023",
        ] {
            store.add_mailbox(path, MailboxCounters::default()).unwrap();
        }
        Self::new(store)
    }

    /// Fail any lookup or listing at this path
    pub fn fail_on(mut self, path: &str) -> Self {
        self.fail_on = Some(path.to_string());
        self
    }

    /// Fail every counter query
    pub fn fail_counters(mut self) -> Self {
        self.fail_counters = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, query: String) {
        self.queries.lock().unwrap().push(query);
    }

    fn check_path(&self, path: &MailboxPath) -> Result<()> {
        match &self.fail_on {
            Some(fail) if *fail == path.to_string() => {
                Err(Error::Storage(format!("backend unavailable at {}", path)))
            }
            _ => Ok(()),
        }
    }

    fn check_counters(&self) -> Result<()> {
        if self.fail_counters {
            return Err(Error::Storage("counter query failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Mailstore for RecordingMailstore {
    async fn get_mailbox(&self, path: &MailboxPath) -> Result<Option<Mailbox>> {
        self.record(format!("mailbox:{}", path));
        self.check_path(path)?;
        self.inner.get_mailbox(path).await
    }

    async fn get_mailboxes(&self, path: &MailboxPath) -> Result<Vec<Mailbox>> {
        self.record(format!("children:{}", path));
        self.check_path(path)?;
        self.inner.get_mailboxes(path).await
    }

    async fn first_unseen(&self, id: MailboxId) -> Result<u32> {
        self.record(format!("first_unseen:{}", id));
        self.check_counters()?;
        self.inner.first_unseen(id).await
    }

    async fn total_messages(&self, id: MailboxId) -> Result<u32> {
        self.record(format!("total_messages:{}", id));
        self.check_counters()?;
        self.inner.total_messages(id).await
    }

    async fn recent_messages(&self, id: MailboxId) -> Result<u32> {
        self.record(format!("recent_messages:{}", id));
        self.check_counters()?;
        self.inner.recent_messages(id).await
    }

    async fn next_uid(&self, id: MailboxId) -> Result<u32> {
        self.record(format!("next_uid:{}", id));
        self.check_counters()?;
        self.inner.next_uid(id).await
    }
}
