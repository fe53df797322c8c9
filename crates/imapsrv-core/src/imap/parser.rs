//! IMAP Command Parser
//!
//! Parses IMAP4 commands from client input.

use super::command::{ImapCommand, TaggedCommand};

/// IMAP command parser
pub struct ImapParser;

impl ImapParser {
    /// Parse an IMAP command line
    pub fn parse(line: &str) -> Option<TaggedCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        // Split into tag and command
        let (tag, rest) = match line.split_once(' ') {
            Some((tag, rest)) => (tag, rest.trim()),
            None => return None,
        };
        if rest.is_empty() {
            return None;
        }

        let command = Self::parse_command(rest);
        Some(TaggedCommand::new(tag, command))
    }

    /// Parse the command portion; malformed arguments to a known command
    /// come back as `Unknown` carrying the raw text
    fn parse_command(input: &str) -> ImapCommand {
        let (name, args) = input.split_once(' ').unwrap_or((input, ""));
        let cmd_name = name.to_uppercase();

        let parsed = match cmd_name.as_str() {
            // Any state
            "CAPABILITY" => Some(ImapCommand::Capability),
            "NOOP" => Some(ImapCommand::Noop),
            "LOGOUT" => Some(ImapCommand::Logout),

            // Not authenticated
            "LOGIN" => Self::parse_login(args),

            // Authenticated state
            "SELECT" => Self::parse_select(args),
            "LIST" => Self::parse_list(args),

            _ => Some(ImapCommand::Unknown { command: cmd_name }),
        };

        parsed.unwrap_or_else(|| ImapCommand::Unknown {
            command: input.to_string(),
        })
    }

    /// Parse LOGIN command arguments
    fn parse_login(args: &str) -> Option<ImapCommand> {
        let (user_id, rest) = Self::parse_astring(args)?;
        let (password, _) = Self::parse_astring(rest)?;
        Some(ImapCommand::Login { user_id, password })
    }

    /// Parse SELECT command arguments
    fn parse_select(args: &str) -> Option<ImapCommand> {
        let (mailbox, _) = Self::parse_astring(args)?;
        Some(ImapCommand::Select { mailbox })
    }

    /// Parse LIST command
    fn parse_list(args: &str) -> Option<ImapCommand> {
        let (reference, rest) = Self::parse_astring(args)?;
        let (pattern, _) = Self::parse_astring(rest)?;
        Some(ImapCommand::List { reference, pattern })
    }

    /// Parse an astring (atom or quoted string)
    /// Returns the parsed string and remaining input
    fn parse_astring(s: &str) -> Option<(String, &str)> {
        let s = s.trim_start();
        if s.is_empty() {
            return None;
        }

        if let Some(quoted) = s.strip_prefix('"') {
            let mut result = String::new();
            let mut escaped = false;

            for (pos, c) in quoted.char_indices() {
                if escaped {
                    result.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    return Some((result, &quoted[pos + 1..]));
                } else {
                    result.push(c);
                }
            }

            // Unterminated quoted string
            None
        } else {
            // Atom (space-delimited)
            let end = s.find(' ').unwrap_or(s.len());
            Some((s[..end].to_string(), &s[end..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn command(line: &str) -> ImapCommand {
        ImapParser::parse(line).unwrap().command
    }

    #[test]
    fn test_parse_capability() {
        let cmd = ImapParser::parse("A001 CAPABILITY").unwrap();
        assert_eq!(cmd.tag, "A001");
        assert_eq!(cmd.command, ImapCommand::Capability);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(command("a noop\r\n"), ImapCommand::Noop);
        assert_eq!(command("a LogOut"), ImapCommand::Logout);
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            command("A002 LOGIN user password"),
            ImapCommand::Login {
                user_id: "user".to_string(),
                password: "password".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_login_quoted() {
        assert_eq!(
            command(r#"A002 LOGIN "user@example.com" "pass \"word\"""#),
            ImapCommand::Login {
                user_id: "user@example.com".to_string(),
                password: "pass \"word\"".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            command("A003 SELECT INBOX"),
            ImapCommand::Select {
                mailbox: "INBOX".to_string()
            }
        );
        assert_eq!(
            command(r#"A003 SELECT "Work/Big Projects""#),
            ImapCommand::Select {
                mailbox: "Work/Big Projects".to_string()
            }
        );
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            command(r#"A007 LIST "" "*""#),
            ImapCommand::List {
                reference: String::new(),
                pattern: "*".to_string(),
            }
        );
        assert_eq!(
            command("A008 LIST Work %"),
            ImapCommand::List {
                reference: "Work".to_string(),
                pattern: "%".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            command("A009 FETCH 1:* FLAGS"),
            ImapCommand::Unknown {
                command: "FETCH".to_string()
            }
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert_eq!(
            command("A010 LOGIN onlyuser"),
            ImapCommand::Unknown {
                command: "LOGIN onlyuser".to_string()
            }
        );
        assert_eq!(
            command(r#"A011 SELECT "unterminated"#),
            ImapCommand::Unknown {
                command: r#"SELECT "unterminated"#.to_string()
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ImapParser::parse("").is_none());
        assert!(ImapParser::parse("   \r\n").is_none());
        assert!(ImapParser::parse("A001").is_none());
    }
}
