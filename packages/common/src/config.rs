use serde::Deserialize;

/// Rules of a HackDay instance.
#[derive(Debug, Deserialize, Clone)]
pub struct HackdayConfig {
    /// Display name of the event seeded on first start. Default: "HackDay".
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// Maximum votes a single user may cast. Default: 5.
    #[serde(default = "default_max_votes_per_user")]
    pub max_votes_per_user: u32,
    /// Capacity given to a new team when the captain does not choose one. Default: 5.
    #[serde(default = "default_team_size")]
    pub default_team_size: u32,
    /// Upper bound a captain may set for capacity. Default: 6.
    #[serde(default = "default_max_team_size")]
    pub max_team_size: u32,
    /// Lifetime of a pending invite or join request. Default: 72.
    #[serde(default = "default_invite_ttl_hours")]
    pub invite_ttl_hours: i64,
    /// Name of the catch-all team for free agents. Default: "Observers".
    #[serde(default = "default_observers_team_name")]
    pub observers_team_name: String,
    /// Criteria every judge score must cover, each scored 1-10.
    #[serde(default = "default_score_criteria")]
    pub score_criteria: Vec<String>,
}

/// Lowest and highest value a judge may give a single criterion.
pub const SCORE_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Smallest capacity a regular team may have.
pub const MIN_TEAM_SIZE: u32 = 2;

fn default_event_name() -> String {
    "HackDay".into()
}
fn default_max_votes_per_user() -> u32 {
    5
}
fn default_team_size() -> u32 {
    5
}
fn default_max_team_size() -> u32 {
    6
}
fn default_invite_ttl_hours() -> i64 {
    72
}
fn default_observers_team_name() -> String {
    "Observers".into()
}
fn default_score_criteria() -> Vec<String> {
    ["innovation", "execution", "impact", "presentation"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for HackdayConfig {
    fn default() -> Self {
        Self {
            event_name: default_event_name(),
            max_votes_per_user: default_max_votes_per_user(),
            default_team_size: default_team_size(),
            max_team_size: default_max_team_size(),
            invite_ttl_hours: default_invite_ttl_hours(),
            observers_team_name: default_observers_team_name(),
            score_criteria: default_score_criteria(),
        }
    }
}

impl HackdayConfig {
    /// Whether `size` is an acceptable capacity for a regular team.
    pub fn team_size_allowed(&self, size: u32) -> bool {
        (MIN_TEAM_SIZE..=self.max_team_size).contains(&size)
    }
}
