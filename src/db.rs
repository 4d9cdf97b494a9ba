/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/db.rs
 * Responsibility: SQLite pool construction and schema initialization
 */

use crate::error::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the schema if it does not exist yet. Safe to run on every startup.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS problems (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            problem_id INTEGER NOT NULL UNIQUE,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            description TEXT,
            premium BOOLEAN NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS topic_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag_name TEXT NOT NULL UNIQUE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS problem_tags (
            problem_id INTEGER NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES topic_tags(id) ON DELETE CASCADE,
            PRIMARY KEY (problem_id, tag_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS guild_forum_channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id INTEGER NOT NULL UNIQUE,
            channel_id INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS problem_threads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id INTEGER NOT NULL UNIQUE,
            problem_db_id INTEGER NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
            forum_channel_db_id INTEGER NOT NULL REFERENCES guild_forum_channels(id) ON DELETE CASCADE,
            UNIQUE (problem_db_id, forum_channel_db_id)
        )",
    )
    .execute(pool)
    .await?;

    info!("database schema ready");
    Ok(())
}

#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    // A single connection keeps the in-memory database alive for the
    // whole test instead of handing every acquire a fresh empty one.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}
