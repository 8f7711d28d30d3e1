//! Static role membership lists.
//!
//! Roles are not stored in the database: each role is a fixed list of
//! external user ids supplied through the environment at startup.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::UserId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_APPROVAL: &str = "approval";
pub const ROLE_BLACKLISTED: &str = "blacklisted";
pub const ROLE_DEV: &str = "dev";
pub const ROLE_REPORTER: &str = "reporter";

/// Role lists loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleConfig {
    pub admins: Vec<UserId>,
    pub editors: Vec<UserId>,
    /// Editors whose new entries start out unlisted.
    pub approval: Vec<UserId>,
    pub blacklisted: Vec<UserId>,
    pub devs: Vec<UserId>,
    pub reporters: Vec<UserId>,
}

impl RoleConfig {
    /// Load role lists from comma-separated environment variables.
    ///
    /// | Env Var           | Default |
    /// |-------------------|---------|
    /// | `ADMIN_IDS`       | empty   |
    /// | `EDITOR_IDS`      | empty   |
    /// | `APPROVAL_IDS`    | empty   |
    /// | `BLACKLISTED_IDS` | empty   |
    /// | `DEV_IDS`         | empty   |
    /// | `REPORTER_IDS`    | empty   |
    ///
    /// # Panics
    ///
    /// Panics if any list contains a non-numeric id.
    pub fn from_env() -> Self {
        let load = |var: &str| -> Vec<UserId> {
            let raw = std::env::var(var).unwrap_or_default();
            parse_id_list(&raw).unwrap_or_else(|e| panic!("{var} is invalid: {e}"))
        };

        Self {
            admins: load("ADMIN_IDS"),
            editors: load("EDITOR_IDS"),
            approval: load("APPROVAL_IDS"),
            blacklisted: load("BLACKLISTED_IDS"),
            devs: load("DEV_IDS"),
            reporters: load("REPORTER_IDS"),
        }
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    /// Admins always edit; blacklisted users never do.
    pub fn is_editor(&self, user: UserId) -> bool {
        if self.is_blacklisted(user) {
            return false;
        }
        self.is_admin(user) || self.editors.contains(&user)
    }

    pub fn needs_approval(&self, user: UserId) -> bool {
        self.approval.contains(&user)
    }

    pub fn is_blacklisted(&self, user: UserId) -> bool {
        self.blacklisted.contains(&user)
    }

    pub fn is_dev(&self, user: UserId) -> bool {
        self.devs.contains(&user)
    }

    pub fn is_reporter(&self, user: UserId) -> bool {
        self.reporters.contains(&user)
    }

    /// Role names held by `user`, for display.
    pub fn roles_of(&self, user: UserId) -> Vec<&'static str> {
        let mut roles = Vec::new();
        if self.is_admin(user) {
            roles.push(ROLE_ADMIN);
        }
        if self.is_editor(user) {
            roles.push(ROLE_EDITOR);
        }
        if self.needs_approval(user) {
            roles.push(ROLE_APPROVAL);
        }
        if self.is_blacklisted(user) {
            roles.push(ROLE_BLACKLISTED);
        }
        if self.is_dev(user) {
            roles.push(ROLE_DEV);
        }
        if self.is_reporter(user) {
            roles.push(ROLE_REPORTER);
        }
        roles
    }
}

/// Parse a comma-separated list of user ids. Blank items are skipped.
pub fn parse_id_list(raw: &str) -> Result<Vec<UserId>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<UserId>()
                .map_err(|_| CoreError::Validation(format!("'{s}' is not a user id")))
        })
        .collect()
}
