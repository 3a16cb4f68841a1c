use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{InviteStatus, Phase, ProjectStatus, Role, TeamKind};
use tokio::sync::RwLock;

use super::*;

/// In-process store used in demo mode and tests.
///
/// All state sits behind one lock; every mutation holds the write guard
/// for its whole duration.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    event: Option<Event>,
    teams: BTreeMap<i32, Team>,
    projects: BTreeMap<i32, Project>,
    invites: BTreeMap<i32, Invite>,
    votes: Vec<Vote>,
    /// Keyed by (judge_id, project_id).
    scores: BTreeMap<(i32, i32), JudgeScore>,
    last_id: LastIds,
}

#[derive(Default)]
struct LastIds {
    user: i32,
    team: i32,
    project: i32,
    invite: i32,
}

fn bump(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn team_of(&self, user_id: i32) -> Option<&Team> {
        self.teams.values().find(|t| t.is_member(user_id))
    }

    fn team_mut(&mut self, team_id: i32) -> Result<&mut Team, StoreError> {
        self.teams
            .get_mut(&team_id)
            .ok_or(StoreError::NotFound("Team"))
    }

    fn user_mut(&mut self, user_id: i32) -> Result<&mut User, StoreError> {
        self.users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))
    }

    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        let lower = name.to_lowercase();
        self.teams
            .values()
            .any(|t| Some(t.id) != except && t.name.to_lowercase() == lower)
    }

    fn cancel_pending_for_user(&mut self, user_id: i32, at: DateTime<Utc>) {
        for invite in self.invites.values_mut() {
            if invite.user_id == user_id && invite.status.is_pending() {
                invite.status = InviteStatus::Cancelled;
                invite.resolved_at = Some(at);
            }
        }
    }

    fn move_phase(&mut self, from: Phase, to: Phase) -> Result<Event, StoreError> {
        let event = self.event.as_mut().ok_or(StoreError::NotFound("Event"))?;
        if event.phase != from {
            return Err(StoreError::Conflict(format!(
                "Event is in phase '{}', not '{from}'",
                event.phase
            )));
        }
        event.phase = to;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    fn observers_id(&self) -> Option<i32> {
        self.teams
            .values()
            .find(|t| t.kind == TeamKind::Observers)
            .map(|t| t.id)
    }

    /// A regular team holding the Observers name blocks its creation.
    fn ensure_observers_name(&self, team_name: &str) -> Result<(), StoreError> {
        if self.observers_id().is_none() && self.name_taken(team_name, None) {
            return Err(StoreError::Conflict(format!(
                "Team name '{team_name}' is taken by a regular team"
            )));
        }
        Ok(())
    }

    fn assign_observers(
        &mut self,
        team_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ObserverAssignment, StoreError> {
        self.ensure_observers_name(team_name)?;
        let waiting: Vec<i32> = self
            .users
            .values()
            .filter(|u| u.is_free_agent && self.team_of(u.id).is_none())
            .map(|u| u.id)
            .collect();

        let team_id = match self.observers_id() {
            Some(id) => id,
            None => {
                let team = Team {
                    id: bump(&mut self.last_id.team),
                    name: team_name.to_string(),
                    description: "Free agents following along".into(),
                    looking_for: Vec::new(),
                    max_members: 0,
                    captain_id: None,
                    kind: TeamKind::Observers,
                    members: Vec::new(),
                    created_at: now,
                };
                let project = Project {
                    id: bump(&mut self.last_id.project),
                    team_id: team.id,
                    title: String::new(),
                    description: String::new(),
                    repo_url: None,
                    video_url: None,
                    demo_url: None,
                    status: ProjectStatus::NotStarted,
                    submitted_at: None,
                    updated_at: now,
                };
                self.projects.insert(project.id, project);
                let id = team.id;
                self.teams.insert(id, team);
                id
            }
        };

        for &user_id in &waiting {
            self.user_mut(user_id)?.is_free_agent = false;
            self.cancel_pending_for_user(user_id, now);
        }

        let team = self.team_mut(team_id)?;
        team.members.extend(waiting.iter().map(|&user_id| TeamMember {
            user_id,
            joined_at: now,
        }));
        team.max_members = team.max_members.max(team.members.len() as u32);

        Ok(ObserverAssignment {
            team: team.clone(),
            assigned: waiting,
        })
    }

    fn delete_team(&mut self, team_id: i32) {
        self.teams.remove(&team_id);
        let project_ids: Vec<i32> = self
            .projects
            .values()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.id)
            .collect();
        for project_id in &project_ids {
            self.projects.remove(project_id);
        }
        self.votes.retain(|v| !project_ids.contains(&v.project_id));
        self.scores
            .retain(|(_, project_id), _| !project_ids.contains(project_id));
        self.invites.retain(|_, i| i.team_id != team_id);
    }
}

#[async_trait]
impl HackdayStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("Username is already taken".into()));
        }
        let user = User {
            id: bump(&mut state.last_id.user),
            username: new.username,
            display_name: new.display_name,
            password_hash: new.password_hash,
            role: new.role,
            skills: new.skills,
            is_free_agent: false,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }
        if let Some(skills) = update.skills {
            user.skills = skills;
        }
        Ok(user.clone())
    }

    async fn set_free_agent(&self, id: i32, free_agent: bool) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        if free_agent && state.team_of(id).is_some() {
            return Err(StoreError::Conflict(
                "Users on a team cannot opt in as free agents".into(),
            ));
        }
        let user = state.user_mut(id)?;
        user.is_free_agent = free_agent;
        Ok(user.clone())
    }

    async fn set_role(&self, id: i32, role: Role) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.role = role;
        Ok(user.clone())
    }

    async fn get_event(&self) -> Result<Option<Event>, StoreError> {
        Ok(self.state.read().await.event.clone())
    }

    async fn init_event(&self, name: &str) -> Result<Event, StoreError> {
        let mut state = self.state.write().await;
        let event = state.event.get_or_insert_with(|| Event {
            id: 1,
            name: name.to_string(),
            phase: Phase::Registration,
            starts_at: None,
            ends_at: None,
            motd: String::new(),
            updated_at: Utc::now(),
        });
        Ok(event.clone())
    }

    async fn transition_phase(&self, from: Phase, to: Phase) -> Result<Event, StoreError> {
        self.state.write().await.move_phase(from, to)
    }

    async fn transition_phase_with_observers(
        &self,
        from: Phase,
        to: Phase,
        team_name: &str,
    ) -> Result<(Event, ObserverAssignment), StoreError> {
        let mut state = self.state.write().await;
        // Check the assignment can go ahead before the phase moves.
        state.ensure_observers_name(team_name)?;
        let event = state.move_phase(from, to)?;
        let assignment = state.assign_observers(team_name, Utc::now())?;
        Ok((event, assignment))
    }

    async fn update_event(&self, update: EventUpdate) -> Result<Event, StoreError> {
        let mut state = self.state.write().await;
        let event = state.event.as_mut().ok_or(StoreError::NotFound("Event"))?;
        if let Some(name) = update.name {
            event.name = name;
        }
        if let Some(motd) = update.motd {
            event.motd = motd;
        }
        if let Some(starts_at) = update.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = update.ends_at {
            event.ends_at = ends_at;
        }
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn create_team(&self, new: NewTeam) -> Result<Team, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&new.captain_id) {
            return Err(StoreError::NotFound("User"));
        }
        if state.team_of(new.captain_id).is_some() {
            return Err(StoreError::Conflict("You are already on a team".into()));
        }
        if state.name_taken(&new.name, None) {
            return Err(StoreError::Conflict(format!(
                "Team name '{}' is already taken",
                new.name
            )));
        }

        let now = Utc::now();
        let team = Team {
            id: bump(&mut state.last_id.team),
            name: new.name,
            description: new.description,
            looking_for: new.looking_for,
            max_members: new.max_members,
            captain_id: Some(new.captain_id),
            kind: TeamKind::Regular,
            members: vec![TeamMember {
                user_id: new.captain_id,
                joined_at: now,
            }],
            created_at: now,
        };
        let project = Project {
            id: bump(&mut state.last_id.project),
            team_id: team.id,
            title: String::new(),
            description: String::new(),
            repo_url: None,
            video_url: None,
            demo_url: None,
            status: ProjectStatus::NotStarted,
            submitted_at: None,
            updated_at: now,
        };
        state.projects.insert(project.id, project);
        state.teams.insert(team.id, team.clone());
        state.user_mut(new.captain_id)?.is_free_agent = false;
        state.cancel_pending_for_user(new.captain_id, now);
        Ok(team)
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        Ok(self.state.read().await.teams.values().cloned().collect())
    }

    async fn find_team(&self, id: i32) -> Result<Option<Team>, StoreError> {
        Ok(self.state.read().await.teams.get(&id).cloned())
    }

    async fn find_team_of_user(&self, user_id: i32) -> Result<Option<Team>, StoreError> {
        Ok(self.state.read().await.team_of(user_id).cloned())
    }

    async fn update_team(&self, id: i32, update: TeamUpdate) -> Result<Team, StoreError> {
        let mut state = self.state.write().await;
        if let Some(ref name) = update.name
            && state.name_taken(name, Some(id))
        {
            return Err(StoreError::Conflict(format!(
                "Team name '{name}' is already taken"
            )));
        }
        let team = state.team_mut(id)?;
        if let Some(max_members) = update.max_members {
            if (max_members as usize) < team.members.len() {
                return Err(StoreError::Conflict(format!(
                    "Team already has {} members",
                    team.members.len()
                )));
            }
            team.max_members = max_members;
        }
        if let Some(name) = update.name {
            team.name = name;
        }
        if let Some(description) = update.description {
            team.description = description;
        }
        if let Some(looking_for) = update.looking_for {
            team.looking_for = looking_for;
        }
        Ok(team.clone())
    }

    async fn remove_member(&self, team_id: i32, user_id: i32) -> Result<Option<Team>, StoreError> {
        let mut state = self.state.write().await;
        let team = state.team_mut(team_id)?;
        if !team.is_member(user_id) {
            return Err(StoreError::NotFound("Team member"));
        }
        if team.is_captain(user_id) && team.members.len() > 1 {
            return Err(StoreError::Conflict(
                "Transfer the captaincy before the captain leaves".into(),
            ));
        }
        team.members.retain(|m| m.user_id != user_id);
        if team.members.is_empty() {
            state.delete_team(team_id);
            return Ok(None);
        }
        Ok(Some(team.clone()))
    }

    async fn set_captain(&self, team_id: i32, user_id: i32) -> Result<Team, StoreError> {
        let mut state = self.state.write().await;
        let team = state.team_mut(team_id)?;
        if !team.is_member(user_id) {
            return Err(StoreError::NotFound("Team member"));
        }
        team.captain_id = Some(user_id);
        Ok(team.clone())
    }

    async fn assign_observers(&self, team_name: &str) -> Result<ObserverAssignment, StoreError> {
        self.state.write().await.assign_observers(team_name, Utc::now())
    }

    async fn create_invite(&self, new: NewInvite) -> Result<Invite, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let duplicate = state.invites.values().any(|i| {
            i.team_id == new.team_id
                && i.user_id == new.user_id
                && i.kind == new.kind
                && i.effective_status(now).is_pending()
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "A pending request already exists".into(),
            ));
        }
        let invite = Invite {
            id: bump(&mut state.last_id.invite),
            team_id: new.team_id,
            user_id: new.user_id,
            kind: new.kind,
            status: InviteStatus::Pending,
            message: new.message,
            created_by: new.created_by,
            expires_at: new.expires_at,
            created_at: now,
            resolved_at: None,
        };
        state.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn find_invite(&self, id: i32) -> Result<Option<Invite>, StoreError> {
        Ok(self.state.read().await.invites.get(&id).cloned())
    }

    async fn list_invites_for_user(&self, user_id: i32) -> Result<Vec<Invite>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .invites
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_invites_for_team(&self, team_id: i32) -> Result<Vec<Invite>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .invites
            .values()
            .filter(|i| i.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn resolve_invite(
        &self,
        id: i32,
        status: InviteStatus,
        at: DateTime<Utc>,
    ) -> Result<Invite, StoreError> {
        let mut state = self.state.write().await;
        let invite = state
            .invites
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Invite"))?;
        if !invite.status.is_pending() {
            return Err(StoreError::Conflict(format!(
                "Invite is already {}",
                invite.status.as_str()
            )));
        }
        invite.status = status;
        invite.resolved_at = Some(at);
        Ok(invite.clone())
    }

    async fn accept_invite(&self, id: i32, at: DateTime<Utc>) -> Result<(Invite, Team), StoreError> {
        let mut state = self.state.write().await;
        let invite = state
            .invites
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Invite"))?;
        if !invite.status.is_pending() {
            return Err(StoreError::Conflict(format!(
                "Invite is already {}",
                invite.status.as_str()
            )));
        }
        if state.team_of(invite.user_id).is_some() {
            return Err(StoreError::Conflict("User is already on a team".into()));
        }

        let team = state.team_mut(invite.team_id)?;
        if team.is_full() {
            return Err(StoreError::TeamFull {
                capacity: team.max_members,
            });
        }
        team.members.push(TeamMember {
            user_id: invite.user_id,
            joined_at: at,
        });
        let team = team.clone();

        state.user_mut(invite.user_id)?.is_free_agent = false;
        state.cancel_pending_for_user(invite.user_id, at);
        let stored = state
            .invites
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Invite"))?;
        stored.status = InviteStatus::Accepted;
        stored.resolved_at = Some(at);

        Ok((stored.clone(), team))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.state.read().await.projects.values().cloned().collect())
    }

    async fn find_project(&self, id: i32) -> Result<Option<Project>, StoreError> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn find_project_by_team(&self, team_id: i32) -> Result<Option<Project>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|p| p.team_id == team_id)
            .cloned())
    }

    async fn save_project(&self, project: Project) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .projects
            .get_mut(&project.id)
            .ok_or(StoreError::NotFound("Project"))?;
        *stored = Project {
            team_id: stored.team_id,
            ..project
        };
        Ok(stored.clone())
    }

    async fn cast_vote(
        &self,
        user_id: i32,
        project_id: i32,
        max_votes: u32,
    ) -> Result<Vote, StoreError> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound("Project"));
        }
        let mine = state.votes.iter().filter(|v| v.user_id == user_id);
        let mut count = 0u32;
        for vote in mine {
            if vote.project_id == project_id {
                return Err(StoreError::Conflict(
                    "You already voted for this project".into(),
                ));
            }
            count += 1;
        }
        if count >= max_votes {
            return Err(StoreError::VoteLimit { limit: max_votes });
        }
        let vote = Vote {
            user_id,
            project_id,
            created_at: Utc::now(),
        };
        state.votes.push(vote.clone());
        Ok(vote)
    }

    async fn retract_vote(&self, user_id: i32, project_id: i32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.votes.len();
        state
            .votes
            .retain(|v| !(v.user_id == user_id && v.project_id == project_id));
        Ok(state.votes.len() < before)
    }

    async fn list_votes(&self) -> Result<Vec<Vote>, StoreError> {
        Ok(self.state.read().await.votes.clone())
    }

    async fn list_votes_by_user(&self, user_id: i32) -> Result<Vec<Vote>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_score(&self, score: JudgeScore) -> Result<JudgeScore, StoreError> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&score.project_id) {
            return Err(StoreError::NotFound("Project"));
        }
        state
            .scores
            .insert((score.judge_id, score.project_id), score.clone());
        Ok(score)
    }

    async fn list_scores(&self) -> Result<Vec<JudgeScore>, StoreError> {
        Ok(self.state.read().await.scores.values().cloned().collect())
    }

    async fn list_scores_for_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<JudgeScore>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }
}
