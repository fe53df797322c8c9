//! Common types for imapsrv

use serde::{Deserialize, Serialize};

/// Mailbox identifier, also reported to clients as the UIDVALIDITY value
pub type MailboxId = u32;

/// Character separating hierarchy levels in a mailbox path
pub const PATH_DELIMITER: char = '/';

/// Mailbox attribute bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailboxFlags(u8);

impl MailboxFlags {
    pub const NONE: MailboxFlags = MailboxFlags(0);
    pub const NOINFERIORS: MailboxFlags = MailboxFlags(1 << 0);
    pub const NOSELECT: MailboxFlags = MailboxFlags(1 << 1);
    pub const MARKED: MailboxFlags = MailboxFlags(1 << 2);
    pub const UNMARKED: MailboxFlags = MailboxFlags(1 << 3);
    pub const HAS_CHILDREN: MailboxFlags = MailboxFlags(1 << 4);
    pub const HAS_NO_CHILDREN: MailboxFlags = MailboxFlags(1 << 5);

    /// Check whether every bit of `other` is set
    pub fn contains(&self, other: MailboxFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: MailboxFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: MailboxFlags) {
        self.0 &= !other.0;
    }

    /// Wire tokens for the set flags, comma-joined in vocabulary order
    pub fn join(&self) -> String {
        MAILBOX_FLAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, token)| *token)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::ops::BitOr for MailboxFlags {
    type Output = MailboxFlags;

    fn bitor(self, rhs: MailboxFlags) -> MailboxFlags {
        MailboxFlags(self.0 | rhs.0)
    }
}

/// Flag vocabulary: mailbox flag bit to LIST attribute token
pub const MAILBOX_FLAGS: &[(MailboxFlags, &str)] = &[
    (MailboxFlags::NOINFERIORS, "\\Noinferiors"),
    (MailboxFlags::NOSELECT, "\\Noselect"),
    (MailboxFlags::MARKED, "\\Marked"),
    (MailboxFlags::UNMARKED, "\\Unmarked"),
    (MailboxFlags::HAS_CHILDREN, "\\HasChildren"),
    (MailboxFlags::HAS_NO_CHILDREN, "\\HasNoChildren"),
];

/// A mailbox as reported by a mailstore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Stable identifier
    pub id: MailboxId,
    /// Leaf name
    pub name: String,
    /// Fully qualified path
    pub path: String,
    /// Attribute flags
    pub flags: MailboxFlags,
}

impl Mailbox {
    /// Create a mailbox from its full path, deriving the leaf name
    pub fn new(id: MailboxId, path: &MailboxPath, flags: MailboxFlags) -> Self {
        Self {
            id,
            name: path.leaf().unwrap_or_default().to_string(),
            path: path.to_string(),
            flags,
        }
    }
}

/// Hierarchical mailbox path held as a list of segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MailboxPath(Vec<String>);

impl MailboxPath {
    /// The root of the namespace
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Split a delimited path into segments. Empty segments are dropped, so
    /// leading, trailing or doubled delimiters never produce empty levels.
    pub fn parse(s: &str) -> Self {
        Self(
            s.split(PATH_DELIMITER)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path of the enclosing level, `None` at the root
    pub fn parent(&self) -> Option<MailboxPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// A new path one level below this one
    pub fn child(&self, segment: impl Into<String>) -> MailboxPath {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl std::fmt::Display for MailboxPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(&PATH_DELIMITER.to_string()))
    }
}
