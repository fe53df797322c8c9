//! LIST pattern resolution
//!
//! Resolves a reference name and a mailbox pattern into the mailboxes they
//! match. `*` matches any run of characters including the hierarchy
//! delimiter and makes the listing recursive; `%` matches within a single
//! level only. Wildcards are only significant at the end of the final
//! pattern segment; everything before them is matched literally.

use imapsrv_common::types::{Mailbox, MailboxPath, PATH_DELIMITER};
use imapsrv_common::{Error, Result};
use imapsrv_storage::Mailstore;
use regex::Regex;
use tracing::debug;

const WILDCARD_ANY: char = '*';
const WILDCARD_LEVEL: char = '%';

/// Ensure a reference name ends with the hierarchy delimiter
pub fn add_trailing_delimiter(s: &str) -> String {
    if s.ends_with(PATH_DELIMITER) {
        s.to_string()
    } else {
        format!("{}{}", s, PATH_DELIMITER)
    }
}

/// Strip one leading and one trailing delimiter from a pattern
pub fn remove_delimiters(s: &str) -> &str {
    let s = s.strip_prefix(PATH_DELIMITER).unwrap_or(s);
    s.strip_suffix(PATH_DELIMITER).unwrap_or(s)
}

/// A LIST request reduced to a search location and a leaf filter
#[derive(Debug)]
pub struct ListQuery {
    search_path: MailboxPath,
    filter: Option<Regex>,
    recursive: bool,
}

impl ListQuery {
    /// Build a query from a reference name and a non-empty pattern
    pub fn new(reference: &str, pattern: &str) -> Result<Self> {
        let reference = add_trailing_delimiter(reference);
        let pattern = remove_delimiters(pattern);

        let mut search_path = MailboxPath::parse(&reference);
        let mut segments: Vec<&str> = pattern.split(PATH_DELIMITER).collect();
        let leaf = segments.pop().unwrap_or_default();
        for segment in segments.into_iter().filter(|s| !s.is_empty()) {
            search_path.push(segment);
        }

        let recursive = leaf.ends_with(WILDCARD_ANY);

        let filter = match leaf.strip_suffix(&[WILDCARD_ANY, WILDCARD_LEVEL][..]) {
            Some(prefix) => {
                let expr = format!("^{}.*$", regex::escape(prefix));
                let re = Regex::new(&expr)
                    .map_err(|e| Error::Internal(format!("invalid pattern {}: {}", expr, e)))?;
                Some(re)
            }
            None => {
                if !leaf.is_empty() {
                    search_path.push(leaf);
                }
                None
            }
        };

        Ok(Self {
            search_path,
            filter,
            recursive,
        })
    }

    /// Path whose children are listed, or the exact mailbox looked up
    pub fn search_path(&self) -> &MailboxPath {
        &self.search_path
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Whether the pattern names a single mailbox rather than a level
    pub fn is_exact(&self) -> bool {
        self.filter.is_none()
    }

    fn matches(&self, name: &str) -> bool {
        self.filter.as_ref().map_or(true, |re| re.is_match(name))
    }

    /// Run the query against a mailstore.
    ///
    /// Results are in pre-order: every mailbox precedes its descendants and
    /// siblings keep the order the mailstore returned them in. The first
    /// storage error aborts the whole traversal.
    pub async fn resolve(&self, mailstore: &dyn Mailstore) -> Result<Vec<Mailbox>> {
        if self.is_exact() {
            debug!(path = %self.search_path, "Looking up mailbox");
            return Ok(mailstore
                .get_mailbox(&self.search_path)
                .await?
                .into_iter()
                .collect());
        }

        debug!(path = %self.search_path, recursive = self.recursive, "Listing mailboxes");
        let children = mailstore.get_mailboxes(&self.search_path).await?;

        let mut pending: Vec<(MailboxPath, Mailbox)> = children
            .into_iter()
            .filter(|mbox| self.matches(&mbox.name))
            .map(|mbox| (self.search_path.child(mbox.name.clone()), mbox))
            .rev()
            .collect();

        let mut found = Vec::new();
        while let Some((path, mbox)) = pending.pop() {
            if self.recursive {
                debug!(path = %path, "Listing mailboxes");
                let children = mailstore.get_mailboxes(&path).await?;
                pending.extend(
                    children
                        .into_iter()
                        .map(|child| (path.child(child.name.clone()), child))
                        .rev(),
                );
            }
            found.push(mbox);
        }

        Ok(found)
    }
}
