/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/discord.rs
 * Responsibility: Serenity event handler and the Discord-backed forum operations
 */

use serenity::async_trait;
use serenity::builder::{CreateForumPost, CreateMessage};
use serenity::model::application::{Command, Interaction};
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, ForumTagId};
use serenity::prelude::*;

use crate::AppState;
use crate::commands;
use crate::embeds;
use crate::error::{BotError, Result};
use crate::reconciler::{ForumHost, ForumTagInfo};
use crate::refresh;
use crate::store::ProblemBundle;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct Handler {
    pub state: Arc<AppState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected", ready.user.name);

        match Command::set_global_commands(&ctx.http, commands::create_commands()).await {
            Ok(registered) => info!("registered {} slash commands", registered.len()),
            Err(err) => error!("failed to register slash commands: {err}"),
        }

        if self.state.config.debug {
            info!("debug mode, weekly cache refresh disabled");
        } else if let Err(err) = refresh::start_weekly_refresh(self.state.clone()).await {
            error!("failed to start the weekly cache refresh: {err}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            debug!(
                user = command.user.id.get(),
                "received slash command: {}", command.data.name
            );
            commands::dispatch(&ctx, &command, &self.state).await;
        }
    }
}

/// Forum operations backed by the Discord HTTP API.
pub struct DiscordForumHost {
    http: Arc<serenity::http::Http>,
}

impl DiscordForumHost {
    pub fn new(http: Arc<serenity::http::Http>) -> Self {
        Self { http }
    }

    async fn forum_channel(&self, channel_id: i64) -> Option<serenity::model::channel::GuildChannel> {
        let channel = match self.http.get_channel(ChannelId::new(channel_id as u64)).await {
            Ok(channel) => channel,
            Err(err) => {
                debug!(channel_id, "channel lookup failed: {err}");
                return None;
            }
        };
        match channel {
            Channel::Guild(guild_channel) if guild_channel.kind == ChannelType::Forum => {
                Some(guild_channel)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ForumHost for DiscordForumHost {
    async fn resolve_forum(&self, channel_id: i64) -> Result<Option<Vec<ForumTagInfo>>> {
        Ok(self.forum_channel(channel_id).await.map(|channel| {
            channel
                .available_tags
                .iter()
                .map(|tag| ForumTagInfo {
                    id: tag.id.get(),
                    name: tag.name.clone(),
                })
                .collect()
        }))
    }

    async fn thread_is_live(&self, thread_id: i64) -> bool {
        match self.http.get_channel(ChannelId::new(thread_id as u64)).await {
            Ok(Channel::Guild(channel)) => matches!(
                channel.kind,
                ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
            ),
            _ => false,
        }
    }

    async fn create_tags(&self, channel_id: i64, names: &[String]) -> Result<Vec<ForumTagInfo>> {
        let channel = self
            .forum_channel(channel_id)
            .await
            .ok_or(BotError::ForumChannelInvalid)?;

        // Discord replaces the whole tag list on edit, so send the existing
        // tags (ids intact) together with the new names.
        let mut tags: Vec<serde_json::Value> = channel
            .available_tags
            .iter()
            .map(|tag| {
                json!({
                    "id": tag.id.get().to_string(),
                    "name": tag.name,
                    "moderated": tag.moderated,
                })
            })
            .collect();
        for name in names {
            tags.push(json!({ "name": name, "moderated": false }));
        }
        let map = json!({ "available_tags": tags });

        let updated = self
            .http
            .edit_channel(
                ChannelId::new(channel_id as u64),
                &map,
                Some("Ensuring LeetCode forum tags"),
            )
            .await?;
        Ok(updated
            .available_tags
            .iter()
            .map(|tag| ForumTagInfo {
                id: tag.id.get(),
                name: tag.name.clone(),
            })
            .collect())
    }

    async fn create_thread(
        &self,
        channel_id: i64,
        title: &str,
        body: &str,
        bundle: &ProblemBundle,
        applied_tag_ids: &[u64],
    ) -> Result<i64> {
        let message = CreateMessage::new()
            .content(body.to_string())
            .embed(embeds::problem_embed(bundle));
        let tag_ids: Vec<ForumTagId> = applied_tag_ids
            .iter()
            .map(|id| ForumTagId::new(*id))
            .collect();
        let post = CreateForumPost::new(title.to_string(), message).set_applied_tags(tag_ids);

        let thread = ChannelId::new(channel_id as u64)
            .create_forum_post(&self.http, post)
            .await?;
        Ok(thread.id.get() as i64)
    }
}
