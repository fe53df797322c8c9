//! IMAP Command definitions
//!
//! Defines the IMAP commands supported by this server and executes them
//! against a session.

use super::response::Response;
use super::session::{ImapSession, SessionState};
use imapsrv_common::types::PATH_DELIMITER;
use tracing::{info, warn};

/// IMAP command tag (client-provided identifier)
pub type Tag = String;

/// The only user id LOGIN accepts until a real authenticator exists
pub const STUB_USER: &str = "test";

/// IMAP Command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapCommand {
    // Any state commands
    Capability,
    Noop,
    Logout,

    // Not authenticated state
    Login {
        user_id: String,
        password: String,
    },

    // Authenticated state
    Select {
        mailbox: String,
    },
    List {
        reference: String,
        pattern: String,
    },

    // Unknown command
    Unknown {
        command: String,
    },
}

impl ImapCommand {
    /// Command name as it appears in completion messages
    pub fn name(&self) -> &str {
        match self {
            ImapCommand::Capability => "CAPABILITY",
            ImapCommand::Noop => "NOOP",
            ImapCommand::Logout => "LOGOUT",
            ImapCommand::Login { .. } => "LOGIN",
            ImapCommand::Select { .. } => "SELECT",
            ImapCommand::List { .. } => "LIST",
            ImapCommand::Unknown { command } => command,
        }
    }
}

/// Parsed IMAP command with tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCommand {
    pub tag: Tag,
    pub command: ImapCommand,
}

impl TaggedCommand {
    pub fn new(tag: impl Into<Tag>, command: ImapCommand) -> Self {
        Self {
            tag: tag.into(),
            command,
        }
    }

    /// Execute the command and return the response to send
    pub async fn execute(self, sess: &mut ImapSession) -> Response {
        let tag = self.tag.as_str();

        match self.command {
            ImapCommand::Noop => {
                sess.update_activity();
                Response::ok(tag, "NOOP Completed")
            }
            // The server runs behind TLS termination, so STARTTLS is never
            // offered and LOGIN is never disabled
            ImapCommand::Capability => {
                Response::ok(tag, "CAPABILITY completed").extra("CAPABILITY IMAP4rev1")
            }
            ImapCommand::Login { user_id, password } => login(tag, &user_id, &password, sess),
            ImapCommand::Logout => {
                sess.logout();
                info!(session = %sess.id, "Logged out");
                Response::ok(tag, "LOGOUT completed")
                    .extra("BYE IMAP4rev1 Server logging out")
                    .should_close()
            }
            ImapCommand::Select { mailbox } => select(tag, &mailbox, sess).await,
            ImapCommand::List { reference, pattern } => {
                list(tag, &reference, &pattern, sess).await
            }
            ImapCommand::Unknown { command } => {
                let message = format!("{} unknown command", command);
                warn!(session = %sess.id, "{}", message);
                Response::bad(tag, message)
            }
        }
    }
}

/// Handle LOGIN command
fn login(tag: &str, user_id: &str, _password: &str, sess: &mut ImapSession) -> Response {
    if sess.state() != SessionState::NotAuthenticated {
        let message = "LOGIN already logged in";
        warn!(session = %sess.id, "{}", message);
        return Response::bad(tag, message);
    }

    if user_id == STUB_USER {
        sess.authenticate();
        info!(session = %sess.id, user = %user_id, "Logged in");
        return Response::ok(tag, "LOGIN completed");
    }

    Response::no(tag, "LOGIN failure")
}

/// Handle SELECT command
async fn select(tag: &str, mailbox: &str, sess: &mut ImapSession) -> Response {
    if !sess.is_authenticated() {
        return must_authenticate(sess, tag, "SELECT");
    }

    match sess.select_mailbox(mailbox).await {
        Ok(true) => {}
        Ok(false) => return Response::no(tag, "SELECT No such mailbox"),
        Err(e) => return internal_error(sess, tag, "SELECT", &e),
    }

    let mut res = Response::ok(tag, "SELECT completed");
    if let Err(e) = sess.add_mailbox_info(&mut res).await {
        return internal_error(sess, tag, "SELECT", &e);
    }
    res
}

/// Handle LIST command
async fn list(tag: &str, reference: &str, pattern: &str, sess: &mut ImapSession) -> Response {
    if !sess.is_authenticated() {
        return must_authenticate(sess, tag, "LIST");
    }

    // An empty pattern asks for the delimiter and the root of the reference
    if pattern.is_empty() {
        return Response::ok(tag, "LIST completed")
            .extra(Response::list_line("", PATH_DELIMITER, reference));
    }

    let mailboxes = match sess.list(reference, pattern).await {
        Ok(mailboxes) => mailboxes,
        Err(e) => return internal_error(sess, tag, "LIST", &e),
    };

    if mailboxes.is_empty() {
        return Response::no(tag, "LIST no results");
    }

    mailboxes.iter().fold(Response::ok(tag, "LIST completed"), |res, mbox| {
        res.extra(Response::list_line(&mbox.flags.join(), PATH_DELIMITER, &mbox.path))
    })
}

/// Storage failures leave the session in an unknown state, so the
/// connection is closed
fn internal_error(
    sess: &ImapSession,
    tag: &str,
    command: &str,
    err: &imapsrv_common::Error,
) -> Response {
    let message = format!("{} {}", command, err);
    warn!(session = %sess.id, code = err.code(), "{}", message);
    Response::no(tag, message).should_close()
}

fn must_authenticate(sess: &ImapSession, tag: &str, command: &str) -> Response {
    let message = format!("{} not authenticated", command);
    warn!(session = %sess.id, "{}", message);
    Response::bad(tag, message)
}
