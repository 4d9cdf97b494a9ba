use crate::error::{BotError, Result};
use crate::store::{Difficulty, NewProblem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

static POOLED_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("leetbot/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create pooled reqwest client")
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// One problem as returned by the catalog service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProblem {
    pub question_frontend_id: i64,
    pub question_title: String,
    pub question_link: String,
    pub difficulty: String,
    #[serde(default)]
    pub is_paid_only: bool,
    /// HTML body of the problem statement; absent for premium problems.
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub topic_tags: Vec<CatalogTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    #[serde(default)]
    pub total_questions: i64,
    #[serde(default)]
    pub problems: Vec<CatalogProblem>,
}

/// LeetCode user statistics, shaped after the profile embed fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    pub profile: UserProfile,
    pub submit_stats: SubmitStats,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub websites: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStats {
    #[serde(default)]
    pub ac_submission_num: Vec<SubmissionCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionCount {
    pub difficulty: String,
    pub count: i64,
    pub submissions: i64,
}

/// Client for the remote problem catalog. No retry or backoff: upstream
/// failures are surfaced to the caller with the response body attached.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn daily(&self) -> Result<CatalogProblem> {
        self.get_json("daily", &[]).await
    }

    /// Fetch a problem by its external id; None when the catalog doesn't know it.
    pub async fn by_id(&self, external_id: i64) -> Result<Option<CatalogProblem>> {
        let url = format!("{}/problem/{}", self.base_url, external_id);
        let response = POOLED_CLIENT.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Upstream(format!("catalog returned {status}: {body}")));
        }
        Ok(Some(response.json().await?))
    }

    pub async fn random(
        &self,
        difficulty: Option<Difficulty>,
        include_premium: bool,
    ) -> Result<Option<CatalogProblem>> {
        let mut query: Vec<(&str, String)> =
            vec![("premium", include_premium.to_string())];
        if let Some(difficulty) = difficulty {
            query.push(("difficulty", difficulty.label().to_string()));
        }
        let url = format!("{}/random", self.base_url);
        let response = POOLED_CLIENT.get(&url).query(&query).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Upstream(format!("catalog returned {status}: {body}")));
        }
        Ok(Some(response.json().await?))
    }

    /// The whole catalog, used by the weekly refresh.
    pub async fn all_problems(&self) -> Result<Vec<CatalogProblem>> {
        let page: CatalogPage = self.get_json("problems", &[("limit", "0".to_string())]).await?;
        debug!(
            total = page.total_questions,
            fetched = page.problems.len(),
            "fetched problem catalog"
        );
        Ok(page.problems)
    }

    pub async fn user_info(&self, username: &str) -> Result<UserInfo> {
        self.get_json(&format!("userProfile/{username}"), &[]).await
    }

    /// Plain-text status line from the catalog, surfaced verbatim to the user.
    pub async fn health_check(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);
        let response = POOLED_CLIENT.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(BotError::Upstream(format!("catalog returned {status}: {body}")));
        }
        if body.trim().is_empty() {
            Ok(format!("LeetCode API is up ({status})"))
        } else {
            Ok(body)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = POOLED_CLIENT.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Upstream(format!("catalog returned {status}: {body}")));
        }
        Ok(response.json().await?)
    }
}

impl CatalogProblem {
    /// Convert a catalog entry into storable fields plus its tag names.
    /// Fails on a difficulty string outside Easy/Medium/Hard.
    pub fn into_record(self) -> Result<(NewProblem, Vec<String>)> {
        let difficulty = Difficulty::from_api(&self.difficulty).ok_or_else(|| {
            BotError::Upstream(format!(
                "catalog returned unknown difficulty {:?} for problem {}",
                self.difficulty, self.question_frontend_id
            ))
        })?;
        let tags = self.topic_tags.into_iter().map(|t| t.name).collect();
        let record = NewProblem {
            problem_id: self.question_frontend_id,
            title: self.question_title,
            url: self.question_link,
            difficulty,
            description: self.question.as_deref().map(strip_html),
            premium: self.is_paid_only,
        };
        Ok((record, tags))
    }
}

/// Reduce the catalog's HTML problem statement to plain text.
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_tags_and_entities() {
        let html = "<p>Given an array <code>nums</code>,&nbsp;return indices such that \
                    <code>nums[i] + nums[j] == target</code>.</p>";
        let text = strip_html(html);
        assert_eq!(
            text,
            "Given an array nums, return indices such that nums[i] + nums[j] == target."
        );
    }

    #[test]
    fn test_into_record_maps_fields_and_rejects_unknown_difficulty() {
        let problem = CatalogProblem {
            question_frontend_id: 1,
            question_title: "Two Sum".to_string(),
            question_link: "https://leetcode.com/problems/two-sum/".to_string(),
            difficulty: "Easy".to_string(),
            is_paid_only: false,
            question: Some("<p>Find two numbers.</p>".to_string()),
            topic_tags: vec![CatalogTag {
                name: "Array".to_string(),
            }],
        };
        let (record, tags) = problem.clone().into_record().unwrap();
        assert_eq!(record.problem_id, 1);
        assert_eq!(record.difficulty, Difficulty::Easy);
        assert_eq!(record.description.as_deref(), Some("Find two numbers."));
        assert_eq!(tags, vec!["Array".to_string()]);

        let mut bad = problem;
        bad.difficulty = "Legendary".to_string();
        assert!(bad.into_record().is_err());
    }
}
