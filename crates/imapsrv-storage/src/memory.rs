//! In-memory mailstore
//!
//! Holds a fixed mailbox tree built at startup, either programmatically or
//! from a TOML description:
//!
//! ```toml
//! [[mailbox]]
//! path = "INBOX"
//! total = 3
//! recent = 1
//! first_unseen = 2
//! next_uid = 4
//!
//! [[mailbox]]
//! path = "Work/Projects"
//! flags = ["\\Marked"]
//! ```

use crate::mailstore::Mailstore;
use async_trait::async_trait;
use imapsrv_common::types::{Mailbox, MailboxFlags, MailboxId, MailboxPath, MAILBOX_FLAGS};
use imapsrv_common::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Message counters reported by SELECT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MailboxCounters {
    #[serde(default)]
    pub first_unseen: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub recent: u32,
    #[serde(default = "default_next_uid")]
    pub next_uid: u32,
}

fn default_next_uid() -> u32 {
    1
}

impl Default for MailboxCounters {
    fn default() -> Self {
        Self {
            first_unseen: 0,
            total: 0,
            recent: 0,
            next_uid: default_next_uid(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    id: MailboxId,
    path: MailboxPath,
    flags: MailboxFlags,
    counters: MailboxCounters,
}

#[derive(Debug, Deserialize)]
struct MailboxFile {
    #[serde(default)]
    mailbox: Vec<MailboxSpec>,
}

#[derive(Debug, Deserialize)]
struct MailboxSpec {
    path: String,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(flatten)]
    counters: MailboxCounters,
}

/// Mailstore backed by an in-memory mailbox tree
#[derive(Debug, Default)]
pub struct MemoryMailstore {
    entries: Vec<Entry>,
}

impl MemoryMailstore {
    /// Create an empty mailstore
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mailbox tree from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read mailbox file: {}", e)))?;

        let store = Self::from_toml(&content)?;
        info!(path = %path.display(), mailboxes = store.entries.len(), "Loaded mailbox tree");
        Ok(store)
    }

    /// Build a mailbox tree from a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: MailboxFile = toml::from_str(content)
            .map_err(|e| Error::Storage(format!("Failed to parse mailbox file: {}", e)))?;

        let mut store = Self::new();
        for spec in file.mailbox {
            let mut flags = MailboxFlags::NONE;
            for token in &spec.flags {
                flags.insert(parse_flag(token)?);
            }
            store.add_mailbox_with_flags(&spec.path, flags, spec.counters)?;
        }
        Ok(store)
    }

    /// Add a mailbox, creating any missing ancestors as \Noselect
    pub fn add_mailbox(&mut self, path: &str, counters: MailboxCounters) -> Result<MailboxId> {
        self.add_mailbox_with_flags(path, MailboxFlags::NONE, counters)
    }

    /// Add a mailbox with explicit attribute flags.
    ///
    /// A path made only of delimiters names the root, which is not a mailbox.
    pub fn add_mailbox_with_flags(
        &mut self,
        path: &str,
        flags: MailboxFlags,
        counters: MailboxCounters,
    ) -> Result<MailboxId> {
        let path = MailboxPath::parse(path);
        if path.is_root() {
            return Err(Error::Storage("empty mailbox path".to_string()));
        }

        let mut ancestor = MailboxPath::root();
        if let Some((_, parents)) = path.segments().split_last() {
            for segment in parents {
                ancestor.push(segment.clone());
                if self.find(&ancestor).is_none() {
                    self.insert(ancestor.clone(), MailboxFlags::NOSELECT, MailboxCounters::default());
                }
            }
        }

        // A placeholder parent becomes a real mailbox
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.flags = flags;
            entry.counters = counters;
            return Ok(entry.id);
        }

        Ok(self.insert(path, flags, counters))
    }

    fn insert(&mut self, path: MailboxPath, flags: MailboxFlags, counters: MailboxCounters) -> MailboxId {
        let id = self.entries.len() as MailboxId + 1;
        debug!(id, path = %path, "Adding mailbox");
        self.entries.push(Entry {
            id,
            path,
            flags,
            counters,
        });
        id
    }

    fn find(&self, path: &MailboxPath) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.path == path)
    }

    fn counters(&self, id: MailboxId) -> Result<&MailboxCounters> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| &e.counters)
            .ok_or_else(|| Error::NotFound(format!("mailbox {}", id)))
    }

    fn has_children(&self, path: &MailboxPath) -> bool {
        self.entries
            .iter()
            .any(|e| e.path.parent().as_ref() == Some(path))
    }

    fn to_mailbox(&self, entry: &Entry) -> Mailbox {
        let mut flags = entry.flags;
        if self.has_children(&entry.path) {
            flags.insert(MailboxFlags::HAS_CHILDREN);
        } else {
            flags.insert(MailboxFlags::HAS_NO_CHILDREN);
        }
        Mailbox::new(entry.id, &entry.path, flags)
    }
}

fn parse_flag(token: &str) -> Result<MailboxFlags> {
    MAILBOX_FLAGS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(token))
        .map(|(flag, _)| *flag)
        .ok_or_else(|| Error::Storage(format!("Unknown mailbox flag: {}", token)))
}

#[async_trait]
impl Mailstore for MemoryMailstore {
    async fn get_mailbox(&self, path: &MailboxPath) -> Result<Option<Mailbox>> {
        Ok(self.find(path).map(|e| self.to_mailbox(e)))
    }

    async fn get_mailboxes(&self, path: &MailboxPath) -> Result<Vec<Mailbox>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.path.parent().as_ref() == Some(path))
            .map(|e| self.to_mailbox(e))
            .collect())
    }

    async fn first_unseen(&self, id: MailboxId) -> Result<u32> {
        Ok(self.counters(id)?.first_unseen)
    }

    async fn total_messages(&self, id: MailboxId) -> Result<u32> {
        Ok(self.counters(id)?.total)
    }

    async fn recent_messages(&self, id: MailboxId) -> Result<u32> {
        Ok(self.counters(id)?.recent)
    }

    async fn next_uid(&self, id: MailboxId) -> Result<u32> {
        Ok(self.counters(id)?.next_uid)
    }
}
