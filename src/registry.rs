/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/registry.rs
 * Responsibility: Per-guild forum channel config and problem-thread records,
 *                 with read-through in-memory caches over SQLite
 */

use crate::error::{BotError, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GuildForumChannel {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProblemThread {
    pub id: i64,
    pub thread_id: i64,
    pub problem_db_id: i64,
    pub forum_channel_db_id: i64,
}

/// Owns the guild_forum_channels and problem_threads tables. Mutations write
/// to storage and then update the caches in the same logical step; reads
/// check the caches first. The caches are warmed once at startup.
pub struct ThreadRegistry {
    pool: SqlitePool,
    channels: RwLock<HashMap<i64, GuildForumChannel>>,
    threads: RwLock<HashMap<i64, ProblemThread>>,
}

impl ThreadRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            channels: RwLock::new(HashMap::new()),
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Bulk load both tables into the in-memory maps.
    pub async fn init_cache(&self) -> Result<()> {
        let threads = sqlx::query_as::<_, ProblemThread>(
            "SELECT id, thread_id, problem_db_id, forum_channel_db_id FROM problem_threads",
        )
        .fetch_all(&self.pool)
        .await?;
        info!("loaded {} problem threads from the database", threads.len());
        {
            let mut map = self.threads.write().await;
            map.clear();
            for thread in threads {
                map.insert(thread.thread_id, thread);
            }
        }

        let channels = sqlx::query_as::<_, GuildForumChannel>(
            "SELECT id, guild_id, channel_id FROM guild_forum_channels",
        )
        .fetch_all(&self.pool)
        .await?;
        info!("loaded {} forum channels from the database", channels.len());
        {
            let mut map = self.channels.write().await;
            map.clear();
            for channel in channels {
                map.insert(channel.guild_id, channel);
            }
        }
        Ok(())
    }

    pub async fn forum_channel(&self, guild_id: i64) -> Result<Option<GuildForumChannel>> {
        if let Some(found) = self.channels.read().await.get(&guild_id) {
            return Ok(Some(found.clone()));
        }
        let found = sqlx::query_as::<_, GuildForumChannel>(
            "SELECT id, guild_id, channel_id FROM guild_forum_channels WHERE guild_id = ?",
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    /// One row per guild: created if absent, overwritten if present.
    pub async fn set_forum_channel(
        &self,
        guild_id: i64,
        channel_id: i64,
    ) -> Result<GuildForumChannel> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM guild_forum_channels WHERE guild_id = ?")
                .bind(guild_id)
                .fetch_optional(&self.pool)
                .await?;
        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE guild_forum_channels SET channel_id = ? WHERE id = ?")
                    .bind(channel_id)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                id
            }
            None => {
                sqlx::query(
                    "INSERT INTO guild_forum_channels (guild_id, channel_id) VALUES (?, ?)",
                )
                .bind(guild_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?
                .last_insert_rowid()
            }
        };
        let config = GuildForumChannel {
            id,
            guild_id,
            channel_id,
        };
        self.channels.write().await.insert(guild_id, config.clone());
        info!(guild_id, channel_id, "forum channel configured");
        Ok(config)
    }

    /// Thread record for a (guild, problem) pair, if any.
    pub async fn thread_for_problem(
        &self,
        guild_id: i64,
        problem_db_id: i64,
    ) -> Result<Option<ProblemThread>> {
        let Some(config) = self.forum_channel(guild_id).await? else {
            return Ok(None);
        };

        {
            let map = self.threads.read().await;
            if let Some(found) = map
                .values()
                .find(|t| t.problem_db_id == problem_db_id && t.forum_channel_db_id == config.id)
            {
                return Ok(Some(found.clone()));
            }
        }

        let found = sqlx::query_as::<_, ProblemThread>(
            "SELECT id, thread_id, problem_db_id, forum_channel_db_id FROM problem_threads
             WHERE problem_db_id = ? AND forum_channel_db_id = ?",
        )
        .bind(problem_db_id)
        .bind(config.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn record_thread(
        &self,
        guild_id: i64,
        problem_db_id: i64,
        thread_id: i64,
    ) -> Result<ProblemThread> {
        let config = self
            .forum_channel(guild_id)
            .await?
            .ok_or(BotError::ForumChannelNotConfigured)?;
        let id = sqlx::query(
            "INSERT INTO problem_threads (thread_id, problem_db_id, forum_channel_db_id)
             VALUES (?, ?, ?)",
        )
        .bind(thread_id)
        .bind(problem_db_id)
        .bind(config.id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let record = ProblemThread {
            id,
            thread_id,
            problem_db_id,
            forum_channel_db_id: config.id,
        };
        self.threads.write().await.insert(thread_id, record.clone());
        debug!(guild_id, problem_db_id, thread_id, "thread recorded");
        Ok(record)
    }

    /// Remove a stale thread record so the reconciler can recreate it.
    pub async fn delete_thread(&self, thread_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM problem_threads WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;
        self.threads.write().await.remove(&thread_id);
        debug!(thread_id, "thread record deleted");
        Ok(())
    }

    pub async fn thread_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problem_threads")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::{Difficulty, NewProblem, ProblemStore};

    async fn seeded_registry() -> (ThreadRegistry, i64) {
        let pool = db::memory_pool().await;
        let store = ProblemStore::new(pool.clone());
        let problem = store
            .upsert(
                &NewProblem {
                    problem_id: 1,
                    title: "Two Sum".to_string(),
                    url: "https://leetcode.com/problems/two-sum/".to_string(),
                    difficulty: Difficulty::Easy,
                    description: None,
                    premium: false,
                },
                &[],
            )
            .await
            .unwrap();
        (ThreadRegistry::new(pool), problem.id)
    }

    #[tokio::test]
    async fn test_set_forum_channel_upserts_one_row_per_guild() {
        let (registry, _) = seeded_registry().await;

        registry.set_forum_channel(42, 100).await.unwrap();
        registry.set_forum_channel(42, 200).await.unwrap();

        let config = registry.forum_channel(42).await.unwrap().unwrap();
        assert_eq!(config.channel_id, 200);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guild_forum_channels")
            .fetch_one(&registry.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_record_and_delete_thread_keep_cache_coherent() {
        let (registry, problem_db_id) = seeded_registry().await;
        registry.set_forum_channel(42, 100).await.unwrap();

        registry
            .record_thread(42, problem_db_id, 9000)
            .await
            .unwrap();
        let found = registry
            .thread_for_problem(42, problem_db_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.thread_id, 9000);

        registry.delete_thread(9000).await.unwrap();
        assert!(
            registry
                .thread_for_problem(42, problem_db_id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(registry.thread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_survives_restart_via_init_cache() {
        let (registry, problem_db_id) = seeded_registry().await;
        registry.set_forum_channel(42, 100).await.unwrap();
        registry
            .record_thread(42, problem_db_id, 9000)
            .await
            .unwrap();

        // A fresh registry over the same pool sees nothing until warmed.
        let reloaded = ThreadRegistry::new(registry.pool.clone());
        reloaded.init_cache().await.unwrap();
        let found = reloaded
            .thread_for_problem(42, problem_db_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.thread_id, 9000);
    }
}
