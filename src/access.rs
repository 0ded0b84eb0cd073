//! Sender allow-list.

use std::collections::HashSet;

/// Telegram usernames permitted to use the bot. Empty permits everyone.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    usernames: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            usernames: usernames
                .into_iter()
                .map(|u| normalize(u.as_ref()))
                .filter(|u| !u.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.usernames.is_empty()
    }

    /// Whether a sender with this username may use the bot.
    pub fn permits(&self, username: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        username.is_some_and(|u| self.usernames.contains(&normalize(u)))
    }
}

/// Usernames compare without a leading `@`; Telegram treats them case-insensitively.
fn normalize(username: &str) -> String {
    username.trim().trim_start_matches('@').to_lowercase()
}
