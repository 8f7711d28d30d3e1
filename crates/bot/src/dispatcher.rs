//! Runs parsed commands against the entry store and replies.

use std::sync::Arc;
use std::time::Instant;

use dex_core::error::CoreError;
use dex_core::resolve::ResolveOptions;
use dex_core::roles::RoleConfig;
use dex_core::types::UserId;
use dex_store::{EntryStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::command::{Command, CommandError, FeaturedTarget};
use crate::config::BotConfig;
use crate::embed::{entry_embed, entry_url, new_entry_url, raw_entry_embed, Embed, COLOR_ADMIN};
use crate::picker::{await_pick, PickFilter, PickOutcome, KEYCAPS};
use crate::reactions::ReactionHub;
use crate::transport::{ChatTransport, IncomingMessage, Reply, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type DispatchResult<T = ()> = Result<T, DispatchError>;

/// Answers chat commands. Cheap to share behind an `Arc`; each message is
/// handled independently.
pub struct Dispatcher {
    store: Arc<EntryStore>,
    roles: Arc<RoleConfig>,
    transport: Arc<dyn ChatTransport>,
    reactions: ReactionHub,
    config: BotConfig,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        store: Arc<EntryStore>,
        roles: Arc<RoleConfig>,
        transport: Arc<dyn ChatTransport>,
        reactions: ReactionHub,
        config: BotConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            roles,
            transport,
            reactions,
            config,
            cancel,
        }
    }

    /// Handle one incoming message. Non-commands are ignored.
    ///
    /// Validation failures (e.g. a malformed mention query) are answered in
    /// chat; storage and transport failures are returned.
    pub async fn handle(&self, message: &IncomingMessage) -> DispatchResult {
        let command = match Command::parse(&self.config.prefix, &message.content) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(err) if err.requires_admin() && !self.roles.is_admin(message.author) => {
                return Ok(());
            }
            Err(CommandError::Usage { prefix, usage }) => {
                self.reply(message, format!("Invalid command usage. Try `{prefix}{usage}`"))
                    .await?;
                return Ok(());
            }
            Err(CommandError::InvalidUser) => {
                self.reply(message, "Invalid member").await?;
                return Ok(());
            }
        };

        if command.is_admin_only() && !self.roles.is_admin(message.author) {
            tracing::debug!(user_id = message.author, ?command, "Ignoring admin command");
            return Ok(());
        }

        tracing::debug!(user_id = message.author, ?command, "Running command");
        match self.run(message, command).await {
            Err(DispatchError::Store(StoreError::Core(CoreError::Validation(msg)))) => {
                self.reply(message, msg).await?;
                Ok(())
            }
            other => other,
        }
    }

    async fn run(&self, message: &IncomingMessage, command: Command) -> DispatchResult {
        let author = message.author;
        match command {
            Command::Help => {
                self.blacklist_delay(author).await;
                self.reply(message, self.help(author)).await
            }
            Command::Search { query } => self.search(message, &query).await,
            Command::Entry { query } => {
                self.blacklist_delay(author).await;
                self.show_entry(message, &query).await
            }
            Command::Random => match self.store.sample().await? {
                Some(entry) => self.reply(message, entry_embed(&entry, &self.config.base_url)).await,
                None => self.reply(message, "There are no entries yet").await,
            },
            Command::Request { text } => {
                let embed = Embed::new()
                    .title("Entry Suggestion")
                    .description(&text)
                    .footer(format!("Requested by {}", message.author_name));
                self.transport.send_to_log_channel(embed.into()).await?;
                self.reply(message, "Suggestion sent.").await
            }
            Command::SelfEntry { query: None } => self.show_own_entry(message).await,
            Command::SelfEntry { query: Some(query) } => {
                if !self.roles.is_editor(author) {
                    return self.reply(message, "Only editors can set personal entries").await;
                }
                match self.store.resolve_one(&query).await? {
                    Some(entry) => {
                        self.store.set_owner(author, &entry.id).await?;
                        self.reply(message, format!("Set your personal entry to `{}`", entry.title))
                            .await
                    }
                    None => self.reply(message, "Invalid entry").await,
                }
            }
            Command::Featured => match self.store.featured_entry().await? {
                Some(entry) => self.reply(message, entry_embed(&entry, &self.config.base_url)).await,
                None => self.reply(message, "No Featured Article Set.").await,
            },
            Command::Ping => {
                if !(self.roles.is_admin(author) || self.roles.is_dev(author)) {
                    return Ok(());
                }
                let started = Instant::now();
                dex_db::health_check(self.store.pool())
                    .await
                    .map_err(StoreError::from)?;
                let elapsed = started.elapsed().as_millis();
                let embed = Embed::new()
                    .title("Ping!")
                    .description(format!("Store ping is: `{elapsed}ms`"));
                self.reply(message, embed).await
            }
            Command::Source => {
                let embed = Embed::new()
                    .title("Source code")
                    .description("My source code on github")
                    .field("github", &self.config.source_url, false);
                self.reply(message, embed).await
            }
            Command::NewEntry { title } => {
                let embed = if self.roles.is_editor(author) {
                    let mut embed = Embed::new().title(format!("Write {title}")).description(
                        format!(
                            "[Click here to write it!]({})",
                            new_entry_url(&self.config.base_url, &title)
                        ),
                    );
                    if self.store.resolve_one(&title).await?.is_some() {
                        embed = embed.footer(
                            "Alert: There may be an entry with the same/similar name or topic.",
                        );
                    }
                    embed
                } else {
                    Embed::new().title("This command is editor only")
                };
                self.reply(message, embed).await
            }
            Command::Link { user, query } => match self.store.resolve_one(&query).await? {
                Some(entry) => {
                    self.store.set_owner(user, &entry.id).await?;
                    let embed = Embed::new().description(format!(
                        "Set <@{user}> personal entry to `{}`",
                        entry.title
                    ));
                    self.reply(message, embed).await
                }
                None => self.reply(message, "Invalid entry").await,
            },
            Command::Unlist { entry_id } => {
                let Some(entry) = self.store.get_by_id(&entry_id).await? else {
                    return Ok(());
                };
                let unlisted = self.store.toggle_unlisted(&entry.id, author).await?;
                let embed = Embed::new()
                    .title("toggle unlist")
                    .description("toggling entry being listed/unlisted")
                    .color(COLOR_ADMIN)
                    .field("entry name", &entry.title, true)
                    .field("entry id", &entry.id, true)
                    .field("entry link", entry_url(&self.config.base_url, &entry.title), true)
                    .field("unlisted", unlisted.to_string(), false);
                self.reply(message, embed).await
            }
            Command::Delete { entry_id } => {
                let Some(entry) = self.store.get_by_id(&entry_id).await? else {
                    return self.reply(message, "Invalid entry id").await;
                };
                if !entry.unlisted {
                    return self
                        .reply(message, "You cannot delete non-unlisted entries")
                        .await;
                }
                self.store.delete(&entry.id, author).await?;
                self.reply(message, "Entry deleted").await
            }
            Command::ChangeFeatured { target } => match target {
                FeaturedTarget::Disabled => {
                    self.store.clear_featured().await?;
                    self.reply(message, "Featured articles disabled").await
                }
                FeaturedTarget::Entry(id) => match self.store.set_featured(&id).await {
                    Ok(()) => self.reply(message, "Featured Article changed").await,
                    Err(StoreError::Core(CoreError::NotFound { .. })) => {
                        self.reply(message, "Entry ID is not valid").await
                    }
                    Err(err) => Err(err.into()),
                },
            },
            Command::UserInfo { user } => {
                let selfentry = match self.store.personal_entry(user).await? {
                    Some(entry) => entry.title,
                    None => "None".to_string(),
                };
                let embed = Embed::new()
                    .title("user info")
                    .description(format!("info on <@{user}>"))
                    .color(COLOR_ADMIN)
                    .field("editor", self.roles.is_editor(user).to_string(), true)
                    .field("admin", self.roles.is_admin(user).to_string(), true)
                    .field("selfentry", format!("`{selfentry}`"), false);
                self.reply(message, embed).await
            }
            Command::ViewSelfEntry { user } => match self.store.personal_entry(user).await? {
                Some(entry) => self.reply(message, entry_embed(&entry, &self.config.base_url)).await,
                None => self.reply(message, "no selfentry exists for this person").await,
            },
            Command::RawEntry { query } => match self.store.resolve_one(&query).await? {
                Some(entry) => self.reply(message, raw_entry_embed(&entry)).await,
                None => {
                    self.reply(message, Embed::new().title("This entry doesn't exist"))
                        .await
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Commands with more than one step
    // -----------------------------------------------------------------------

    async fn search(&self, message: &IncomingMessage, query: &str) -> DispatchResult {
        let options = ResolveOptions {
            limit: KEYCAPS.len() as i64,
            ..ResolveOptions::default()
        };
        let found = self.store.resolve(query, options).await?;

        let description = if found.is_empty() {
            "No results".to_string()
        } else {
            found
                .iter()
                .enumerate()
                .map(|(i, entry)| format!("{}) {}", i + 1, entry.title))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let embed = Embed::new()
            .title(format!("Results for {query}"))
            .description(description);

        // Subscribe before the reactions exist so an early click counts.
        let receiver = self.reactions.subscribe();
        let results = self.transport.send(message.channel, embed.into()).await?;
        if found.is_empty() {
            return Ok(());
        }

        let options = found.len().min(KEYCAPS.len());
        for keycap in &KEYCAPS[..options] {
            self.transport.react(message.channel, results, keycap).await?;
        }

        let filter = PickFilter {
            message: results,
            user: message.author,
            options,
        };
        match await_pick(receiver, filter, self.config.picker_timeout, &self.cancel).await {
            PickOutcome::Picked(index) => {
                let entry = &found[index];
                self.reply(message, entry_embed(entry, &self.config.base_url)).await
            }
            outcome => {
                tracing::debug!(?outcome, message = results, "Search picker closed");
                Ok(())
            }
        }
    }

    async fn show_entry(&self, message: &IncomingMessage, query: &str) -> DispatchResult {
        if let Some(entry) = self.store.resolve_one(query).await? {
            return self.reply(message, entry_embed(&entry, &self.config.base_url)).await;
        }

        let mut embed = Embed::new().title("This entry doesn't exist");
        if self.roles.is_editor(message.author) {
            embed = embed.description(format!(
                "[Click here to write it!]({})",
                new_entry_url(&self.config.base_url, query)
            ));
        }
        self.reply(message, embed).await
    }

    async fn show_own_entry(&self, message: &IncomingMessage) -> DispatchResult {
        match self.store.personal_entry(message.author).await? {
            Some(entry) => self.reply(message, entry_embed(&entry, &self.config.base_url)).await,
            None if self.roles.is_editor(message.author) => {
                self.reply(message, "You haven't set a personal entry yet").await
            }
            None => {
                self.reply(
                    message,
                    "You don't have a personal entry set yet. An admin needs to set one for you",
                )
                .await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn help(&self, user: UserId) -> Embed {
        let mut commands = vec![
            ("search <query>", "Finds entries that match the query"),
            ("entry <name>", "Shows the matching entry"),
            ("random", "Gets a random entry"),
            ("request <entry>", "Lets noneditors request an entry"),
            ("source", "Links my source on github"),
            ("ping", "Gets current bot ping"),
            ("selfentry", "Gets your own entry if you have one."),
            ("featured", "Get featured article"),
        ];
        if self.roles.is_editor(user) {
            commands.push(("selfentry <name>", "Links you to your entry (editor only)"));
            commands.push(("newentry <name>", "Sends link to write new entry (editor only)"));
        }
        if self.roles.is_admin(user) {
            commands.extend([
                ("link <user mention> <entry>", "Manually link non-editors to entries (admin only)"),
                ("view_selfentry <user mention>", "View a user's selfentry (admin only)"),
                ("userinfo <user mention>", "Get info on the mentioned user (admin only)"),
                ("raw_entry <name>", "Show an entry's raw data (admin only)"),
                ("unlist <entry id>", "Toggles unlisting of entry (admin only)"),
                ("delete <entry id>", "Delete an unlisted entry (admin only)"),
                (
                    "changefeatured <entry id>",
                    "Change the featured entry (admin only). Use `disabled` to turn it off",
                ),
            ]);
        }

        let prefix = &self.config.prefix;
        let lines: Vec<String> = commands
            .iter()
            .map(|(usage, about)| format!("{prefix}**{usage}** - {about}"))
            .collect();
        Embed::new().title("Commands").description(lines.join("\n"))
    }

    async fn blacklist_delay(&self, user: UserId) {
        if self.roles.is_blacklisted(user) {
            tokio::time::sleep(self.config.blacklist_delay).await;
        }
    }

    async fn reply(&self, message: &IncomingMessage, reply: impl Into<Reply>) -> DispatchResult {
        self.transport.send(message.channel, reply.into()).await?;
        Ok(())
    }
}
