/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/store.rs
 * Responsibility: Persistent problem/tag records keyed by the external problem id
 */

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

/// Problem difficulty, stored as an ordinal in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn ordinal(self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Parse the catalog API's difficulty string ("Easy", "MEDIUM", ...).
    pub fn from_api(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Human readable difficulty for a stored ordinal, "Unknown" for anything
/// outside the known range.
pub fn difficulty_label(ordinal: i64) -> &'static str {
    Difficulty::from_ordinal(ordinal).map_or("Unknown", Difficulty::label)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Problem {
    pub id: i64,
    /// Stable external id, unique across refreshes.
    pub problem_id: i64,
    pub title: String,
    pub url: String,
    pub difficulty: i64,
    pub description: Option<String>,
    pub premium: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicTag {
    pub id: i64,
    pub tag_name: String,
}

/// A problem together with its topic tags, the unit returned by every fetch.
#[derive(Debug, Clone)]
pub struct ProblemBundle {
    pub problem: Problem,
    pub tags: Vec<TopicTag>,
}

/// Fields accepted by an upsert; everything but `problem_id` is mutable.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub problem_id: i64,
    pub title: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub description: Option<String>,
    pub premium: bool,
}

#[derive(Debug, Clone)]
pub struct ProblemStore {
    pool: SqlitePool,
}

const PROBLEM_COLUMNS: &str = "id, problem_id, title, url, difficulty, description, premium";

impl ProblemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, external_id: i64) -> Result<Option<ProblemBundle>> {
        let problem = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems WHERE problem_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        match problem {
            Some(problem) => {
                let tags = self.tags_for(problem.id).await?;
                Ok(Some(ProblemBundle { problem, tags }))
            }
            None => Ok(None),
        }
    }

    /// Insert-or-update keyed on the external problem id. Re-upserting the
    /// same id updates the mutable fields and replaces the tag set without
    /// creating duplicate rows.
    pub async fn upsert(&self, incoming: &NewProblem, tag_names: &[String]) -> Result<Problem> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM problems WHERE problem_id = ?")
                .bind(incoming.problem_id)
                .fetch_optional(&mut *tx)
                .await?;

        let db_id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE problems
                     SET title = ?, url = ?, difficulty = ?, description = ?, premium = ?
                     WHERE id = ?",
                )
                .bind(&incoming.title)
                .bind(&incoming.url)
                .bind(incoming.difficulty.ordinal())
                .bind(&incoming.description)
                .bind(incoming.premium)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO problems (problem_id, title, url, difficulty, description, premium)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(incoming.problem_id)
                .bind(&incoming.title)
                .bind(&incoming.url)
                .bind(incoming.difficulty.ordinal())
                .bind(&incoming.description)
                .bind(incoming.premium)
                .execute(&mut *tx)
                .await?;
                result.last_insert_rowid()
            }
        };

        sqlx::query("DELETE FROM problem_tags WHERE problem_id = ?")
            .bind(db_id)
            .execute(&mut *tx)
            .await?;

        for name in tag_names {
            let tag_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM topic_tags WHERE tag_name = ?")
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await?;
            let tag_id = match tag_id {
                Some(id) => id,
                None => {
                    sqlx::query("INSERT INTO topic_tags (tag_name) VALUES (?)")
                        .bind(name)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid()
                }
            };
            sqlx::query("INSERT INTO problem_tags (problem_id, tag_id) VALUES (?, ?)")
                .bind(db_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        let problem = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?"
        ))
        .bind(db_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(problem_id = incoming.problem_id, "upserted problem");
        Ok(problem)
    }

    /// Random problem matching the filters, or None when nothing matches.
    pub async fn random(
        &self,
        difficulty: Option<Difficulty>,
        include_premium: bool,
    ) -> Result<Option<ProblemBundle>> {
        let problem = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems
             WHERE (?1 IS NULL OR difficulty = ?1) AND (premium = 0 OR ?2)
             ORDER BY RANDOM() LIMIT 1"
        ))
        .bind(difficulty.map(Difficulty::ordinal))
        .bind(include_premium)
        .fetch_optional(&self.pool)
        .await?;

        match problem {
            Some(problem) => {
                let tags = self.tags_for(problem.id).await?;
                Ok(Some(ProblemBundle { problem, tags }))
            }
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn tags_for(&self, problem_db_id: i64) -> Result<Vec<TopicTag>> {
        let tags = sqlx::query_as::<_, TopicTag>(
            "SELECT t.id, t.tag_name FROM topic_tags t
             JOIN problem_tags pt ON pt.tag_id = t.id
             WHERE pt.problem_id = ?
             ORDER BY t.tag_name",
        )
        .bind(problem_db_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn two_sum() -> NewProblem {
        NewProblem {
            problem_id: 1,
            title: "Two Sum".to_string(),
            url: "https://leetcode.com/problems/two-sum/".to_string(),
            difficulty: Difficulty::Easy,
            description: Some("Given an array of integers...".to_string()),
            premium: false,
        }
    }

    #[test]
    fn test_difficulty_conversions() {
        assert_eq!(Difficulty::from_ordinal(1), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_ordinal(9), None);
        assert_eq!(Difficulty::from_api("MEDIUM"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_api("insane"), None);
        assert_eq!(difficulty_label(3), "Hard");
        assert_eq!(difficulty_label(0), "Unknown");
    }

    #[tokio::test]
    async fn test_upsert_same_external_id_twice_keeps_one_row() {
        let store = ProblemStore::new(db::memory_pool().await);

        store
            .upsert(&two_sum(), &["Array".to_string(), "Hash Table".to_string()])
            .await
            .unwrap();

        let mut second = two_sum();
        second.title = "Two Sum (updated)".to_string();
        second.difficulty = Difficulty::Medium;
        second.premium = true;
        store
            .upsert(&second, &["Array".to_string()])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let bundle = store.get(1).await.unwrap().unwrap();
        assert_eq!(bundle.problem.title, "Two Sum (updated)");
        assert_eq!(bundle.problem.difficulty, Difficulty::Medium.ordinal());
        assert!(bundle.problem.premium);
        let names: Vec<_> = bundle.tags.iter().map(|t| t.tag_name.as_str()).collect();
        assert_eq!(names, vec!["Array"]);
    }

    #[tokio::test]
    async fn test_tags_are_shared_across_problems() {
        let store = ProblemStore::new(db::memory_pool().await);

        store
            .upsert(&two_sum(), &["Array".to_string()])
            .await
            .unwrap();
        let mut other = two_sum();
        other.problem_id = 15;
        other.title = "3Sum".to_string();
        store
            .upsert(&other, &["Array".to_string(), "Two Pointers".to_string()])
            .await
            .unwrap();

        let tag_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topic_tags")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(tag_count, 2);
    }

    #[tokio::test]
    async fn test_random_respects_difficulty_and_premium_filters() {
        let store = ProblemStore::new(db::memory_pool().await);

        let mut premium_hard = two_sum();
        premium_hard.problem_id = 2;
        premium_hard.difficulty = Difficulty::Hard;
        premium_hard.premium = true;
        store.upsert(&premium_hard, &[]).await.unwrap();

        // Premium problems are excluded unless asked for.
        assert!(store.random(None, false).await.unwrap().is_none());
        let picked = store
            .random(Some(Difficulty::Hard), true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.problem.problem_id, 2);

        // No match on a difficulty with no problems is absent, not an error.
        assert!(
            store
                .random(Some(Difficulty::Medium), true)
                .await
                .unwrap()
                .is_none()
        );
    }
}
