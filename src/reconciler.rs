/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/reconciler.rs
 * Responsibility: Ensure exactly one live discussion thread per (guild, problem),
 *                 healing records whose platform-side thread has vanished
 */

use crate::error::{BotError, Result};
use crate::registry::{GuildForumChannel, ThreadRegistry};
use crate::store::{ProblemBundle, difficulty_label};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Forum tags every configured channel must offer.
pub const CANONICAL_TAGS: [&str; 4] = ["LeetCode", "Easy", "Medium", "Hard"];

const BOT_TAG: &str = "LeetCode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOutcome {
    Create,
    Reopen,
}

#[derive(Debug, Clone)]
pub struct ForumTagInfo {
    pub id: u64,
    pub name: String,
}

/// Chat-platform operations the reconciler needs. The serenity-backed
/// implementation lives in the discord module; tests use a fake.
#[async_trait]
pub trait ForumHost: Send + Sync {
    /// Available tags of the channel if it resolves to a live forum channel,
    /// None when it is missing or of another type.
    async fn resolve_forum(&self, channel_id: i64) -> Result<Option<Vec<ForumTagInfo>>>;

    /// Whether a previously recorded thread still exists on the platform.
    async fn thread_is_live(&self, thread_id: i64) -> bool;

    /// Create the named tags on the forum channel, returning the channel's
    /// full tag list afterwards.
    async fn create_tags(&self, channel_id: i64, names: &[String]) -> Result<Vec<ForumTagInfo>>;

    /// Open a thread with a starter message rendered from the bundle and
    /// return its id.
    async fn create_thread(
        &self,
        channel_id: i64,
        title: &str,
        body: &str,
        bundle: &ProblemBundle,
        applied_tag_ids: &[u64],
    ) -> Result<i64>;
}

// One lock per (guild, problem) so near-simultaneous reconciles serialize
// instead of racing to create duplicate threads.
static IN_FLIGHT: Lazy<Mutex<HashMap<(i64, i64), Arc<tokio::sync::Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn key_lock(guild_id: i64, problem_db_id: i64) -> Arc<tokio::sync::Mutex<()>> {
    let mut map = IN_FLIGHT.lock().unwrap();
    map.entry((guild_id, problem_db_id))
        .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
        .clone()
}

pub fn thread_title(bundle: &ProblemBundle) -> String {
    format!("{}. {}", bundle.problem.problem_id, bundle.problem.title)
}

pub fn thread_body(bundle: &ProblemBundle) -> String {
    let mut body = format!("{}\n", bundle.problem.url);
    if bundle.problem.premium {
        body.push_str("This problem is premium only, so there is no description available.");
    }
    body
}

/// Canonical tags the channel doesn't offer yet, in no particular order.
pub fn missing_canonical_tags(available: &[ForumTagInfo]) -> Vec<String> {
    CANONICAL_TAGS
        .iter()
        .filter(|wanted| !available.iter().any(|t| t.name == **wanted))
        .map(|s| s.to_string())
        .collect()
}

/// Tag names applied to a new problem thread: the bot tag plus the
/// human-readable difficulty.
pub fn applied_tag_names(bundle: &ProblemBundle) -> [&'static str; 2] {
    [BOT_TAG, difficulty_label(bundle.problem.difficulty)]
}

pub struct ThreadManager {
    registry: Arc<ThreadRegistry>,
}

impl ThreadManager {
    pub fn new(registry: Arc<ThreadRegistry>) -> Self {
        Self { registry }
    }

    /// Reopen the existing discussion thread for the problem in the guild's
    /// forum channel, or create one if none exists (or the recorded one has
    /// vanished platform-side).
    pub async fn reconcile(
        &self,
        host: &dyn ForumHost,
        guild_id: i64,
        bundle: &ProblemBundle,
    ) -> Result<(i64, ThreadOutcome)> {
        let config = self
            .registry
            .forum_channel(guild_id)
            .await?
            .ok_or(BotError::ForumChannelNotConfigured)?;
        debug!(guild_id, channel_id = config.channel_id, "forum channel fetched");

        let available = host
            .resolve_forum(config.channel_id)
            .await?
            .ok_or(BotError::ForumChannelInvalid)?;

        let lock = key_lock(guild_id, bundle.problem.id);
        let _guard = lock.lock().await;

        if let Some(record) = self
            .registry
            .thread_for_problem(guild_id, bundle.problem.id)
            .await?
        {
            if host.thread_is_live(record.thread_id).await {
                debug!(
                    guild_id,
                    thread_id = record.thread_id,
                    "reopening existing thread"
                );
                return Ok((record.thread_id, ThreadOutcome::Reopen));
            }
            warn!(
                guild_id,
                thread_id = record.thread_id,
                "recorded thread no longer exists on the platform, recreating"
            );
            self.registry.delete_thread(record.thread_id).await?;
        }

        let thread_id = self
            .create_thread(host, guild_id, &config, available, bundle)
            .await?;
        Ok((thread_id, ThreadOutcome::Create))
    }

    async fn create_thread(
        &self,
        host: &dyn ForumHost,
        guild_id: i64,
        config: &GuildForumChannel,
        available: Vec<ForumTagInfo>,
        bundle: &ProblemBundle,
    ) -> Result<i64> {
        let missing = missing_canonical_tags(&available);
        let available = if missing.is_empty() {
            available
        } else {
            debug!(channel_id = config.channel_id, ?missing, "creating forum tags");
            host.create_tags(config.channel_id, &missing).await?
        };

        let wanted = applied_tag_names(bundle);
        let applied: Vec<u64> = available
            .iter()
            .filter(|t| wanted.contains(&t.name.as_str()))
            .map(|t| t.id)
            .collect();

        let title = thread_title(bundle);
        let body = thread_body(bundle);
        let thread_id = host
            .create_thread(config.channel_id, &title, &body, bundle, &applied)
            .await?;

        self.registry
            .record_thread(guild_id, bundle.problem.id, thread_id)
            .await?;
        info!(
            guild_id,
            channel_id = config.channel_id,
            thread_id,
            problem = bundle.problem.problem_id,
            "created problem thread"
        );
        Ok(thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Problem, TopicTag};

    fn bundle(problem_id: i64, title: &str, difficulty: i64, premium: bool) -> ProblemBundle {
        ProblemBundle {
            problem: Problem {
                id: 7,
                problem_id,
                title: title.to_string(),
                url: "https://leetcode.com/problems/two-sum/".to_string(),
                difficulty,
                description: None,
                premium,
            },
            tags: vec![TopicTag {
                id: 1,
                tag_name: "Array".to_string(),
            }],
        }
    }

    #[test]
    fn test_thread_title_uses_external_id() {
        assert_eq!(thread_title(&bundle(1, "Two Sum", 1, false)), "1. Two Sum");
    }

    #[test]
    fn test_thread_body_appends_premium_disclaimer() {
        let free = thread_body(&bundle(1, "Two Sum", 1, false));
        assert_eq!(free, "https://leetcode.com/problems/two-sum/\n");

        let premium = thread_body(&bundle(1, "Two Sum", 1, true));
        assert!(premium.contains("premium only"));
    }

    #[test]
    fn test_missing_canonical_tags_is_a_set_difference() {
        let available = vec![
            ForumTagInfo {
                id: 1,
                name: "LeetCode".to_string(),
            },
            ForumTagInfo {
                id: 2,
                name: "Hard".to_string(),
            },
            ForumTagInfo {
                id: 3,
                name: "Off Topic".to_string(),
            },
        ];
        let mut missing = missing_canonical_tags(&available);
        missing.sort();
        assert_eq!(missing, vec!["Easy".to_string(), "Medium".to_string()]);

        let all = vec![
            ForumTagInfo { id: 1, name: "LeetCode".to_string() },
            ForumTagInfo { id: 2, name: "Easy".to_string() },
            ForumTagInfo { id: 3, name: "Medium".to_string() },
            ForumTagInfo { id: 4, name: "Hard".to_string() },
        ];
        assert!(missing_canonical_tags(&all).is_empty());
    }

    #[test]
    fn test_applied_tags_are_bot_tag_plus_difficulty() {
        assert_eq!(
            applied_tag_names(&bundle(1, "Two Sum", 1, false)),
            ["LeetCode", "Easy"]
        );
        assert_eq!(
            applied_tag_names(&bundle(2, "Regex Matching", 3, false)),
            ["LeetCode", "Hard"]
        );
        // Out-of-range ordinals degrade to "Unknown" rather than panicking.
        assert_eq!(
            applied_tag_names(&bundle(3, "Mystery", 0, false)),
            ["LeetCode", "Unknown"]
        );
    }
}
