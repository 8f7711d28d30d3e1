//! Chat command parsing.
//!
//! A message is a command when it starts with the configured prefix
//! followed by a known command name. Everything after the name is the
//! argument text.

use dex_core::resolve::parse_mention;
use dex_core::types::{EntryId, UserId};

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Search { query: String },
    Entry { query: String },
    Random,
    /// Suggest an entry for someone to write.
    Request { text: String },
    /// Show your personal entry, or (editors) set it to the best match.
    SelfEntry { query: Option<String> },
    Featured,
    Ping,
    Source,
    NewEntry { title: String },

    // Admin-only
    Link { user: UserId, query: String },
    Unlist { entry_id: EntryId },
    Delete { entry_id: EntryId },
    ChangeFeatured { target: FeaturedTarget },
    UserInfo { user: UserId },
    ViewSelfEntry { user: UserId },
    RawEntry { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeaturedTarget {
    Entry(EntryId),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: {prefix}{usage}")]
    Usage { prefix: String, usage: &'static str },

    #[error("Invalid member")]
    InvalidUser,
}

impl Command {
    /// Parse `text` as a command.
    ///
    /// Returns `Ok(None)` for ordinary chat (no prefix, or an unknown
    /// command name) and an error when a known command is missing an
    /// argument.
    pub fn parse(prefix: &str, text: &str) -> Result<Option<Command>, CommandError> {
        let Some(body) = text.trim_start().strip_prefix(prefix) else {
            return Ok(None);
        };
        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };

        let usage = |usage: &'static str| CommandError::Usage {
            prefix: prefix.to_string(),
            usage,
        };
        let required = |usage_text: &'static str| -> Result<String, CommandError> {
            if rest.is_empty() {
                Err(usage(usage_text))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "help" => Command::Help,
            "search" => Command::Search {
                query: required("search <query>")?,
            },
            "entry" => Command::Entry {
                query: required("entry <name>")?,
            },
            "random" => Command::Random,
            "request" => Command::Request {
                text: required("request <entry>")?,
            },
            "selfentry" => Command::SelfEntry {
                query: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "featured" => Command::Featured,
            "ping" | "pong" | "pung" => Command::Ping,
            "source" | "code" => Command::Source,
            "newentry" => Command::NewEntry {
                title: required("newentry <name>")?,
            },
            "link" => {
                let (member, query) = rest
                    .split_once(char::is_whitespace)
                    .map(|(member, query)| (member, query.trim()))
                    .filter(|(_, query)| !query.is_empty())
                    .ok_or_else(|| usage("link <user mention> <entry>"))?;
                Command::Link {
                    user: parse_user(member)?,
                    query: query.to_string(),
                }
            }
            "unlist" => Command::Unlist {
                entry_id: required("unlist <entry id>")?,
            },
            "delete" => Command::Delete {
                entry_id: required("delete <entry id>")?,
            },
            "changefeatured" => {
                let target = required("changefeatured <entry id | disabled>")?;
                Command::ChangeFeatured {
                    target: if target.eq_ignore_ascii_case("disabled") {
                        FeaturedTarget::Disabled
                    } else {
                        FeaturedTarget::Entry(target)
                    },
                }
            }
            "userinfo" => Command::UserInfo {
                user: parse_user(&required("userinfo <user mention>")?)?,
            },
            "view_selfentry" => Command::ViewSelfEntry {
                user: parse_user(&required("view_selfentry <user mention>")?)?,
            },
            "raw_entry" => Command::RawEntry {
                query: required("raw_entry <name>")?,
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Commands only admins may run. Others get no reply at all.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::Link { .. }
                | Command::Unlist { .. }
                | Command::Delete { .. }
                | Command::ChangeFeatured { .. }
                | Command::UserInfo { .. }
                | Command::ViewSelfEntry { .. }
                | Command::RawEntry { .. }
        )
    }
}

impl CommandError {
    /// Whether the failed command was an admin-only one. Non-admins get no
    /// reply for those, not even a usage hint.
    pub fn requires_admin(&self) -> bool {
        match self {
            // Only admin commands take a user argument.
            CommandError::InvalidUser => true,
            CommandError::Usage { usage, .. } => {
                let name = usage.split_whitespace().next().unwrap_or_default();
                ADMIN_COMMANDS.contains(&name)
            }
        }
    }
}

const ADMIN_COMMANDS: &[&str] = &[
    "link",
    "unlist",
    "delete",
    "changefeatured",
    "userinfo",
    "view_selfentry",
    "raw_entry",
];

/// A user given as a mention (`<@1>`, `<@!1>`) or a bare numeric id.
fn parse_user(arg: &str) -> Result<UserId, CommandError> {
    match parse_mention(arg) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => arg.parse().map_err(|_| CommandError::InvalidUser),
        Err(_) => Err(CommandError::InvalidUser),
    }
}
