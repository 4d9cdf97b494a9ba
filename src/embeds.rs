/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/embeds.rs
 * Responsibility: Rendering problems and user statistics as Discord embeds
 */

use crate::api::UserInfo;
use crate::store::{Difficulty, ProblemBundle, difficulty_label};
use chrono::Utc;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use serenity::model::colour::Colour;

pub const THEME_COLOR: Colour = Colour(0x00B8A3);
const DEFAULT_FOOTER: &str = "LeetBot · practice together";

/// Longest description preview shown in an embed.
pub const PREVIEW_LEN: usize = 1024;

/// Base embed with the theme color, the standard footer and a Discord
/// timestamp line prepended to the description.
pub fn themed_embed(title: &str, description: &str) -> CreateEmbed {
    let stamped = format!("<t:{}:F>\n{}", Utc::now().timestamp(), description);
    CreateEmbed::new()
        .title(title.to_string())
        .description(stamped)
        .colour(THEME_COLOR)
        .footer(CreateEmbedFooter::new(DEFAULT_FOOTER))
}

pub fn difficulty_colour(ordinal: i64) -> Colour {
    match Difficulty::from_ordinal(ordinal) {
        Some(Difficulty::Easy) => Colour(0x43B581),
        Some(Difficulty::Medium) => Colour(0xFAA61A),
        Some(Difficulty::Hard) => Colour(0xF04747),
        None => Colour(0x3498DB),
    }
}

/// Truncated plain-text preview of a problem description.
pub fn preview(description: Option<&str>) -> String {
    let Some(text) = description.filter(|t| !t.is_empty()) else {
        return "No description available.".to_string();
    };
    if text.chars().count() <= PREVIEW_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{cut}...")
}

pub fn problem_embed(bundle: &ProblemBundle) -> CreateEmbed {
    let title = format!("{}. {}", bundle.problem.problem_id, bundle.problem.title);
    let tags = if bundle.tags.is_empty() {
        "None".to_string()
    } else {
        bundle
            .tags
            .iter()
            .map(|t| t.tag_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    themed_embed(&title, &preview(bundle.problem.description.as_deref()))
        .url(bundle.problem.url.clone())
        .field("Difficulty", difficulty_label(bundle.problem.difficulty), true)
        .field("Tags", tags, true)
        .colour(difficulty_colour(bundle.problem.difficulty))
}

pub fn user_info_embed(username: &str, info: &UserInfo) -> CreateEmbed {
    let about = info.profile.about_me.as_deref().unwrap_or_default();
    let mut embed = themed_embed(
        &format!("LeetCode User: {username}"),
        &format!("User's About me: {about}"),
    )
    .url(format!("https://leetcode.com/u/{username}/"));

    if let Some(total) = info
        .submit_stats
        .ac_submission_num
        .iter()
        .find(|s| s.difficulty.eq_ignore_ascii_case("all"))
    {
        embed = embed.field(
            "AC Submissions",
            format!(
                "Difficulty: All\nSolved: {}\nTotal submitted and AC: {}",
                total.count, total.submissions
            ),
            false,
        );
    }

    let links: Vec<&str> = [
        info.github_url.as_deref(),
        info.twitter_url.as_deref(),
        info.linkedin_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        embed = embed.field("Other Links", links.join("\n"), false);
    }

    if let Some(avatar) = &info.profile.user_avatar {
        embed = embed.thumbnail(avatar.clone());
    }
    if let Some(country) = &info.profile.country_name {
        embed = embed.field("Country", country.clone(), true);
    }
    if let Some(company) = &info.profile.company {
        let value = match &info.profile.job_title {
            Some(job_title) => format!("{company}\nJob Title: {job_title}"),
            None => company.clone(),
        };
        embed = embed.field("Company", value, false);
    }
    if let Some(school) = &info.profile.school {
        embed = embed.field("School", school.clone(), true);
    }
    if !info.profile.websites.is_empty() {
        embed = embed.field("Websites", info.profile.websites.join("\n"), false);
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_handles_missing_and_long_descriptions() {
        assert_eq!(preview(None), "No description available.");
        assert_eq!(preview(Some("")), "No description available.");
        assert_eq!(preview(Some("short")), "short");

        let long = "x".repeat(PREVIEW_LEN + 10);
        let cut = preview(Some(&long));
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_LEN + 3);
    }

    #[test]
    fn test_difficulty_colour_grades_by_ordinal() {
        assert_eq!(difficulty_colour(1), Colour(0x43B581));
        assert_eq!(difficulty_colour(2), Colour(0xFAA61A));
        assert_eq!(difficulty_colour(3), Colour(0xF04747));
        // Unknown ordinals fall back to the default blue.
        assert_eq!(difficulty_colour(42), Colour(0x3498DB));
    }
}
