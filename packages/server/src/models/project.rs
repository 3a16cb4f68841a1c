use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{HackdayConfig, ProjectStatus, config::SCORE_RANGE};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_name, validate_text, validate_url};
use crate::error::AppError;
use crate::store::{JudgeScore, Project, Vote};

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub team_id: i32,
    #[schema(example = "Smart Meeting Summarizer")]
    pub title: String,
    pub description: String,
    pub repo_url: Option<String>,
    pub video_url: Option<String>,
    pub demo_url: Option<String>,
    pub status: ProjectStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            team_id: p.team_id,
            title: p.title,
            description: p.description,
            repo_url: p.repo_url,
            video_url: p.video_url,
            demo_url: p.demo_url,
            status: p.status,
            submitted_at: p.submitted_at,
            updated_at: p.updated_at,
        }
    }
}

/// Draft edit. Send `null` for a link to clear it.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "https://github.com/acme/summarizer")]
    pub repo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub demo_url: Option<Option<String>>,
}

fn clean_link(field: &str, link: Option<Option<String>>) -> Result<Option<Option<String>>, AppError> {
    match link {
        Some(Some(url)) if url.trim().is_empty() => Ok(Some(None)),
        Some(Some(url)) => {
            validate_url(field, &url)?;
            Ok(Some(Some(url.trim().to_string())))
        }
        other => Ok(other),
    }
}

/// Validated draft edit.
#[derive(Debug, Default)]
pub struct ProjectEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<Option<String>>,
    pub video_url: Option<Option<String>>,
    pub demo_url: Option<Option<String>>,
}

pub fn validate_update_project(payload: UpdateProjectRequest) -> Result<ProjectEdit, AppError> {
    let title = payload
        .title
        .map(|t| validate_name("Title", &t, 128))
        .transpose()?;
    if let Some(description) = &payload.description {
        validate_text("Description", description)?;
    }
    Ok(ProjectEdit {
        title,
        description: payload.description,
        repo_url: clean_link("repo_url", payload.repo_url)?,
        video_url: clean_link("video_url", payload.video_url)?,
        demo_url: clean_link("demo_url", payload.demo_url)?,
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VoteResponse {
    pub user_id: i32,
    pub project_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Vote> for VoteResponse {
    fn from(v: Vote) -> Self {
        Self {
            user_id: v.user_id,
            project_id: v.project_id,
            created_at: v.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MyVotesResponse {
    pub votes: Vec<VoteResponse>,
    #[schema(example = 5)]
    pub max_votes: u32,
    #[schema(example = 3)]
    pub remaining: u32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ScoreRequest {
    /// One entry per configured criterion, each 1-10.
    #[schema(example = json!({"innovation": 8, "execution": 7, "impact": 9, "presentation": 6}))]
    pub scores: BTreeMap<String, i32>,
    pub comments: Option<String>,
}

/// Every configured criterion present, no unknown ones, each within range.
pub fn validate_score_request(payload: &ScoreRequest, rules: &HackdayConfig) -> Result<(), AppError> {
    for criterion in &rules.score_criteria {
        if !payload.scores.contains_key(criterion) {
            return Err(AppError::Validation(format!(
                "Missing score for '{criterion}'"
            )));
        }
    }
    for (criterion, value) in &payload.scores {
        if !rules.score_criteria.iter().any(|c| c == criterion) {
            return Err(AppError::Validation(format!(
                "Unknown criterion '{criterion}'"
            )));
        }
        if !SCORE_RANGE.contains(value) {
            return Err(AppError::Validation(format!(
                "Score for '{criterion}' must be between {} and {}",
                SCORE_RANGE.start(),
                SCORE_RANGE.end()
            )));
        }
    }
    if let Some(comments) = &payload.comments {
        validate_text("Comments", comments)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreResponse {
    pub judge_id: i32,
    pub project_id: i32,
    pub scores: BTreeMap<String, i32>,
    /// Sum over all criteria.
    pub total: i32,
    pub comments: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<JudgeScore> for ScoreResponse {
    fn from(s: JudgeScore) -> Self {
        Self {
            total: s.total(),
            judge_id: s.judge_id,
            project_id: s.project_id,
            scores: s.scores,
            comments: s.comments,
            updated_at: s.updated_at,
        }
    }
}
