/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/commands.rs
 * Responsibility: Slash command definitions, dispatch and error-to-message translation
 */

use crate::AppState;
use crate::discord::DiscordForumHost;
use crate::embeds;
use crate::error::{BotError, Result};
use crate::reconciler::ThreadOutcome;
use crate::store::{Difficulty, ProblemBundle};
use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
};
use serenity::client::Context;
use serenity::model::application::{CommandDataOptionValue, CommandInteraction, CommandOptionType};
use serenity::model::channel::ChannelType;
use serenity::model::permissions::Permissions;
use std::sync::Arc;
use tracing::{error, info, warn};

/// All slash commands, registered globally on ready.
pub fn create_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("daily")
            .description("Get today's LeetCode problem")
            .dm_permission(false),
        CreateCommand::new("problem")
            .description("Get a LeetCode problem by its problem ID")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "id",
                    "The ID of the LeetCode problem",
                )
                .required(true),
            ),
        CreateCommand::new("random")
            .description("Returns a random LeetCode problem")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "difficulty",
                    "The problem difficulty",
                )
                .required(false)
                .add_string_choice("Easy", "Easy")
                .add_string_choice("Medium", "Medium")
                .add_string_choice("Hard", "Hard"),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Boolean,
                    "premium",
                    "Whether to include premium problems, default is False",
                )
                .required(false),
            ),
        CreateCommand::new("desc")
            .description("Get a LeetCode problem description by its problem ID")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "id",
                    "The ID of the LeetCode problem",
                )
                .required(true),
            ),
        CreateCommand::new("refresh")
            .description("<Admin> Refresh the LeetCode problems cache")
            .dm_permission(false)
            .default_member_permissions(Permissions::ADMINISTRATOR),
        CreateCommand::new("check_api")
            .description("Check LeetCode API status"),
        CreateCommand::new("set_forum_channel")
            .description("<Admin> Set the forum channel that hosts problem threads")
            .dm_permission(false)
            .default_member_permissions(Permissions::ADMINISTRATOR)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "channel",
                    "The forum channel to host problem threads",
                )
                .channel_types(vec![ChannelType::Forum])
                .required(true),
            ),
        CreateCommand::new("statistics")
            .description("Get LeetCode user statistics")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "username",
                    "The LeetCode username",
                )
                .required(true),
            ),
    ]
}

pub async fn dispatch(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) {
    let name = command.data.name.clone();
    let result = match name.as_str() {
        "daily" => daily(ctx, command, state).await,
        "problem" => problem(ctx, command, state).await,
        "random" => random(ctx, command, state).await,
        "desc" => desc(ctx, command, state).await,
        "refresh" => refresh(ctx, command, state).await,
        "check_api" => check_api(ctx, command, state).await,
        "set_forum_channel" => set_forum_channel(ctx, command, state).await,
        "statistics" => statistics(ctx, command, state).await,
        other => {
            warn!("unknown command received: {other}");
            respond_plain(ctx, command, "Unknown command.").await
        }
    };

    if let Err(err) = result {
        error!("command /{name} failed: {err}");
        let followup = CreateInteractionResponseFollowup::new().content(err.user_message());
        if command.create_followup(&ctx.http, followup).await.is_err() {
            // The failure may have happened before the deferral went out.
            let _ = respond_plain(ctx, command, &err.user_message()).await;
        }
    }
}

async fn daily(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    command.defer(&ctx.http).await?;
    info!(guild_id, "fetching today's problem");
    let bundle = state.problems.daily().await?;
    respond_with_thread(ctx, command, state, guild_id, &bundle, true).await
}

async fn problem(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    let id = int_option(command, "id").unwrap_or_default();
    command.defer(&ctx.http).await?;
    info!(guild_id, id, "fetching problem by id");
    match state.problems.by_id(id).await? {
        Some(bundle) => respond_with_thread(ctx, command, state, guild_id, &bundle, false).await,
        None => followup_plain(ctx, command, &BotError::ProblemNotFound(id).user_message()).await,
    }
}

async fn random(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    let difficulty = str_option(command, "difficulty").and_then(|v| Difficulty::from_api(&v));
    let premium = bool_option(command, "premium").unwrap_or(false);
    command.defer(&ctx.http).await?;
    info!(guild_id, ?difficulty, premium, "fetching random problem");
    match state.problems.random(difficulty, premium).await? {
        Some(bundle) => respond_with_thread(ctx, command, state, guild_id, &bundle, false).await,
        None => followup_plain(ctx, command, "No problem matched the requested filters.").await,
    }
}

async fn desc(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    let id = int_option(command, "id").unwrap_or_default();
    command.defer(&ctx.http).await?;
    info!(guild_id, id, "fetching problem description");
    match state.problems.by_id(id).await? {
        Some(bundle) => {
            let followup =
                CreateInteractionResponseFollowup::new().embed(embeds::problem_embed(&bundle));
            command.create_followup(&ctx.http, followup).await?;
            Ok(())
        }
        None => followup_plain(ctx, command, &BotError::ProblemNotFound(id).user_message()).await,
    }
}

async fn refresh(ctx: &Context, command: &CommandInteraction, state: &Arc<AppState>) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    if !is_admin(command) {
        return respond_no_permission(ctx, command).await;
    }
    command.defer(&ctx.http).await?;
    info!(guild_id, "refreshing problems cache on request");
    let stored = state.problems.refresh_all().await?;
    followup_plain(
        ctx,
        command,
        &format!("LeetCode problems cache refreshed ({stored} problems)."),
    )
    .await
}

async fn check_api(
    ctx: &Context,
    command: &CommandInteraction,
    state: &Arc<AppState>,
) -> Result<()> {
    command.defer(&ctx.http).await?;
    let status = state.catalog.health_check().await?;
    followup_plain(ctx, command, &status).await
}

async fn set_forum_channel(
    ctx: &Context,
    command: &CommandInteraction,
    state: &Arc<AppState>,
) -> Result<()> {
    let Some(guild_id) = guild_id(command) else {
        return respond_plain(ctx, command, GUILD_ONLY).await;
    };
    if !is_admin(command) {
        return respond_no_permission(ctx, command).await;
    }
    let Some(channel_id) = channel_option(command, "channel") else {
        return respond_plain(ctx, command, "No channel provided.").await;
    };
    command.defer(&ctx.http).await?;
    state.registry.set_forum_channel(guild_id, channel_id).await?;
    followup_plain(
        ctx,
        command,
        &format!("Thread channel set to <#{channel_id}> for this server."),
    )
    .await
}

async fn statistics(
    ctx: &Context,
    command: &CommandInteraction,
    state: &Arc<AppState>,
) -> Result<()> {
    let Some(username) = str_option(command, "username") else {
        return respond_plain(ctx, command, "No username provided.").await;
    };
    command.defer(&ctx.http).await?;
    match state.catalog.user_info(&username).await {
        Ok(info) => {
            let followup = CreateInteractionResponseFollowup::new()
                .embed(embeds::user_info_embed(&username, &info));
            command.create_followup(&ctx.http, followup).await?;
            Ok(())
        }
        Err(err) => {
            error!("fetching statistics for {username} failed: {err}");
            followup_plain(
                ctx,
                command,
                "Something went wrong when fetching user statistics.",
            )
            .await
        }
    }
}

/// Attach (or reopen) the discussion thread for a fetched problem and tell
/// the user where it lives.
async fn respond_with_thread(
    ctx: &Context,
    command: &CommandInteraction,
    state: &Arc<AppState>,
    guild_id: i64,
    bundle: &ProblemBundle,
    is_daily: bool,
) -> Result<()> {
    let host = DiscordForumHost::new(ctx.http.clone());
    let (thread_id, outcome) = state.threads.reconcile(&host, guild_id, bundle).await?;
    let subject = if is_daily {
        "today's problem".to_string()
    } else {
        format!("problem {}", bundle.problem.problem_id)
    };
    let content = match outcome {
        ThreadOutcome::Create => {
            format!("Created a new discussion thread for {subject}: <#{thread_id}>")
        }
        ThreadOutcome::Reopen => {
            format!("A discussion thread for {subject} already exists: <#{thread_id}>")
        }
    };
    followup_plain(ctx, command, &content).await
}

const GUILD_ONLY: &str = "This command can only be used in a server.";

fn guild_id(command: &CommandInteraction) -> Option<i64> {
    command.guild_id.map(|id| id.get() as i64)
}

fn is_admin(command: &CommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator())
}

fn option_value<'a>(
    command: &'a CommandInteraction,
    name: &str,
) -> Option<&'a CommandDataOptionValue> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .map(|option| &option.value)
}

fn int_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    match option_value(command, name)? {
        CommandDataOptionValue::Integer(value) => Some(*value),
        _ => None,
    }
}

fn str_option(command: &CommandInteraction, name: &str) -> Option<String> {
    match option_value(command, name)? {
        CommandDataOptionValue::String(value) => Some(value.clone()),
        _ => None,
    }
}

fn bool_option(command: &CommandInteraction, name: &str) -> Option<bool> {
    match option_value(command, name)? {
        CommandDataOptionValue::Boolean(value) => Some(*value),
        _ => None,
    }
}

fn channel_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    match option_value(command, name)? {
        CommandDataOptionValue::Channel(id) => Some(id.get() as i64),
        _ => None,
    }
}

async fn respond_plain(ctx: &Context, command: &CommandInteraction, text: &str) -> Result<()> {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text.to_string())
            .ephemeral(true),
    );
    command.create_response(&ctx.http, response).await?;
    Ok(())
}

async fn respond_no_permission(ctx: &Context, command: &CommandInteraction) -> Result<()> {
    respond_plain(
        ctx,
        command,
        "You do not have the required permissions to use this command.",
    )
    .await
}

async fn followup_plain(ctx: &Context, command: &CommandInteraction, text: &str) -> Result<()> {
    let followup = CreateInteractionResponseFollowup::new().content(text.to_string());
    command.create_followup(&ctx.http, followup).await?;
    Ok(())
}
