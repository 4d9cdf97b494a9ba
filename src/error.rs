/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/error.rs
 * Responsibility: Typed error taxonomy and the error-to-user-message boundary
 */

use thiserror::Error;

pub type Result<T, E = BotError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("problem {0} not found")]
    ProblemNotFound(i64),

    #[error("no forum channel configured for this guild")]
    ForumChannelNotConfigured,

    #[error("configured forum channel is missing or not a forum channel")]
    ForumChannelInvalid,

    #[error("catalog API error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Platform(#[from] serenity::Error),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Upstream(err.to_string())
    }
}

impl BotError {
    /// Text shown to the Discord user when a command fails. Command handlers
    /// never let an error propagate past this translation.
    pub fn user_message(&self) -> String {
        match self {
            BotError::ProblemNotFound(id) => format!("Problem with ID {id} not found."),
            BotError::ForumChannelNotConfigured => {
                "The bot doesn't know which forum channel the problem should be created in! \
                 Ask an administrator to use /set_forum_channel first."
                    .to_string()
            }
            BotError::ForumChannelInvalid => {
                "Something went wrong! The configured forum channel is missing or is not a \
                 valid forum channel. Contact the developer for help."
                    .to_string()
            }
            BotError::Upstream(msg) => {
                format!("An error occurred while talking to the LeetCode API: {msg}")
            }
            BotError::Database(_) | BotError::Platform(_) => {
                "An error occurred while handling the command.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_the_missing_problem() {
        let msg = BotError::ProblemNotFound(42).user_message();
        assert_eq!(msg, "Problem with ID 42 not found.");
    }

    #[test]
    fn test_user_message_for_unconfigured_channel_mentions_the_setup_command() {
        let msg = BotError::ForumChannelNotConfigured.user_message();
        assert!(msg.contains("/set_forum_channel"));
    }
}
