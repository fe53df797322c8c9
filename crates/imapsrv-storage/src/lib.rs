//! imapsrv Storage - Mailstore abstraction
//!
//! This crate defines the storage seam the IMAP core queries for mailbox
//! lookup, hierarchy traversal and message counters, together with an
//! in-memory implementation.

pub mod mailstore;
pub mod memory;

pub use mailstore::Mailstore;
pub use memory::{MailboxCounters, MemoryMailstore};
