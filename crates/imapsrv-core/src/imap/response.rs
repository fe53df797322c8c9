//! IMAP Response generation
//!
//! Builds a command's untagged data lines and its single tagged completion
//! line, plus whether the connection should close once they are sent.

/// IMAP response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    No,
    Bad,
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseStatus::Ok => write!(f, "OK"),
            ResponseStatus::No => write!(f, "NO"),
            ResponseStatus::Bad => write!(f, "BAD"),
        }
    }
}

/// Marker used in place of a tag for untagged lines
pub const UNTAGGED: &str = "*";

/// A complete response to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    tag: String,
    status: ResponseStatus,
    message: String,
    untagged: Vec<String>,
    close: bool,
}

impl Response {
    fn new(tag: &str, status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            tag: tag.to_string(),
            status,
            message: message.into(),
            untagged: Vec::new(),
            close: false,
        }
    }

    /// Tagged OK response
    pub fn ok(tag: &str, message: impl Into<String>) -> Self {
        Self::new(tag, ResponseStatus::Ok, message)
    }

    /// Tagged NO response
    pub fn no(tag: &str, message: impl Into<String>) -> Self {
        Self::new(tag, ResponseStatus::No, message)
    }

    /// Tagged BAD response
    pub fn bad(tag: &str, message: impl Into<String>) -> Self {
        Self::new(tag, ResponseStatus::Bad, message)
    }

    /// Append an untagged line, builder style
    pub fn extra(mut self, line: impl Into<String>) -> Self {
        self.push_untagged(line);
        self
    }

    /// Append an untagged line
    pub fn push_untagged(&mut self, line: impl Into<String>) {
        self.untagged.push(line.into());
    }

    /// Close the connection once this response is sent
    pub fn should_close(mut self) -> Self {
        self.close = true;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn untagged(&self) -> &[String] {
        &self.untagged
    }

    pub fn closes(&self) -> bool {
        self.close
    }

    /// Render every line, untagged first, each terminated by CRLF
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for line in &self.untagged {
            out.push_str(&format!("{} {}\r\n", UNTAGGED, line));
        }
        out.push_str(&format!("{} {} {}\r\n", self.tag, self.status, self.message));
        out
    }

    /// Server greeting
    pub fn greeting() -> String {
        format!("{} OK IMAP4rev1 Service Ready\r\n", UNTAGGED)
    }

    /// Untagged BYE line sent outside of any command
    pub fn bye(message: &str) -> String {
        format!("{} BYE {}\r\n", UNTAGGED, message)
    }

    /// LIST data line
    pub fn list_line(flags: &str, delimiter: char, path: &str) -> String {
        format!("LIST ({}) \"{}\" {}", flags, delimiter, path)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}
