//! IMAP4rev1 Server Module
//!
//! Implements the protocol core of an IMAP4rev1 server: session state,
//! command dispatch and mailbox pattern resolution.
//!
//! Supported commands:
//! - CAPABILITY, NOOP, LOGOUT
//! - LOGIN
//! - SELECT, LIST

pub mod command;
pub mod parser;
pub mod pattern;
pub mod response;
pub mod server;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{ImapCommand, TaggedCommand};
pub use response::{Response, ResponseStatus};
pub use server::ImapServer;
pub use session::{ImapSession, SessionState};
