//! imapsrv Core - IMAP4rev1 protocol core
//!
//! This crate provides the per-connection session state machine, command
//! dispatch, LIST pattern resolution and a thin TCP front end.

pub mod imap;

pub use imap::{ImapServer, ImapSession, Response, TaggedCommand};
