use std::collections::BTreeMap;

use common::Phase;
use serde::Serialize;

/// One ranked project.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ResultEntry {
    /// 1-based position.
    pub rank: usize,
    pub project_id: i32,
    pub team_id: i32,
    pub team_name: String,
    pub title: String,
    pub vote_count: u64,
    pub judge_count: u64,
    /// Mean of the judges' criterion totals, `null` when unscored.
    pub average_score: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResultsResponse {
    pub phase: Phase,
    /// Ranked by average judge total, then votes, then project id.
    pub entries: Vec<ResultEntry>,
    /// Submitted project with the most votes, ties broken by lower id.
    pub peoples_choice: Option<ResultEntry>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnalyticsResponse {
    pub phase: Phase,
    pub total_users: u64,
    /// User count keyed by role.
    pub users_by_role: BTreeMap<String, u64>,
    /// Opted-in users not on a team.
    pub free_agents: u64,
    pub regular_teams: u64,
    pub observer_teams: u64,
    /// Mean member count over regular teams.
    pub average_team_size: f64,
    /// Project count keyed by status.
    pub projects_by_status: BTreeMap<String, u64>,
    pub total_votes: u64,
    pub total_scores: u64,
}
