use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{InviteStatus, Phase, ProjectStatus, Role, TeamKind};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;

use super::{
    Event, EventUpdate, HackdayStore, Invite, JudgeScore, NewInvite, NewTeam, NewUser,
    ObserverAssignment, ProfileUpdate, Project, StoreError, Team, TeamMember, TeamUpdate, User,
    Vote,
};
use crate::entity::{event, judge_score, project, team, team_invite, team_member, user, vote};

/// PostgreSQL-backed store.
///
/// Compound mutations run in a transaction that locks the team (or voter,
/// or event) row first; unique indexes on `team_member.user_id`,
/// `vote(user_id, project_id)` and `judge_score(judge_id, project_id)` back
/// the invariants up.
#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Map a unique-constraint failure to `Conflict(message)`.
fn conflict_on_unique(message: &str) -> impl FnOnce(DbErr) -> StoreError + '_ {
    move |err| {
        if is_unique_violation(&err) {
            tracing::debug!("Unique constraint caught on write: {err}");
            StoreError::Conflict(message.to_string())
        } else {
            StoreError::Database(err)
        }
    }
}

/// Stored capacity as a count. Negative values read as zero.
fn capacity(max_members: i32) -> u32 {
    u32::try_from(max_members).unwrap_or(0)
}

fn strings_from_json(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            display_name: m.display_name,
            password_hash: m.password,
            role: m.role,
            skills: strings_from_json(m.skills),
            is_free_agent: m.is_free_agent,
            created_at: m.created_at,
        }
    }
}

impl From<event::Model> for Event {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            phase: m.phase,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            motd: m.motd,
            updated_at: m.updated_at,
        }
    }
}

impl From<project::Model> for Project {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            team_id: m.team_id,
            title: m.title,
            description: m.description,
            repo_url: m.repo_url,
            video_url: m.video_url,
            demo_url: m.demo_url,
            status: m.status,
            submitted_at: m.submitted_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<team_invite::Model> for Invite {
    fn from(m: team_invite::Model) -> Self {
        Self {
            id: m.id,
            team_id: m.team_id,
            user_id: m.user_id,
            kind: m.kind,
            status: m.status,
            message: m.message,
            created_by: m.created_by,
            expires_at: m.expires_at,
            created_at: m.created_at,
            resolved_at: m.resolved_at,
        }
    }
}

impl From<vote::Model> for Vote {
    fn from(m: vote::Model) -> Self {
        Self {
            user_id: m.user_id,
            project_id: m.project_id,
            created_at: m.created_at,
        }
    }
}

impl From<judge_score::Model> for JudgeScore {
    fn from(m: judge_score::Model) -> Self {
        Self {
            judge_id: m.judge_id,
            project_id: m.project_id,
            scores: serde_json::from_value::<BTreeMap<String, i32>>(m.scores).unwrap_or_default(),
            comments: m.comments,
            updated_at: m.updated_at,
        }
    }
}

fn team_from(model: team::Model, members: Vec<team_member::Model>) -> Team {
    Team {
        id: model.id,
        name: model.name,
        description: model.description,
        looking_for: strings_from_json(model.looking_for),
        max_members: capacity(model.max_members),
        captain_id: model.captain_id,
        kind: model.kind,
        members: members
            .into_iter()
            .map(|m| TeamMember {
                user_id: m.user_id,
                joined_at: m.joined_at,
            })
            .collect(),
        created_at: model.created_at,
    }
}

async fn load_team<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Team>, StoreError> {
    let Some(model) = team::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let members = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(id))
        .order_by_asc(team_member::Column::JoinedAt)
        .order_by_asc(team_member::Column::UserId)
        .all(db)
        .await?;
    Ok(Some(team_from(model, members)))
}

async fn require_team<C: ConnectionTrait>(db: &C, id: i32) -> Result<Team, StoreError> {
    load_team(db, id).await?.ok_or(StoreError::NotFound("Team"))
}

async fn lock_team(txn: &DatabaseTransaction, id: i32) -> Result<team::Model, StoreError> {
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(StoreError::NotFound("Team"))
}

async fn member_count<C: ConnectionTrait>(db: &C, team_id: i32) -> Result<u64, StoreError> {
    Ok(team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .count(db)
        .await?)
}

/// Case-insensitive name check. Team counts are small enough to compare in memory.
async fn name_taken<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except: Option<i32>,
) -> Result<bool, StoreError> {
    let lower = name.to_lowercase();
    let teams = team::Entity::find().all(db).await?;
    Ok(teams
        .iter()
        .any(|t| Some(t.id) != except && t.name.to_lowercase() == lower))
}

async fn insert_empty_project<C: ConnectionTrait>(
    db: &C,
    team_id: i32,
    now: DateTime<Utc>,
) -> Result<project::Model, StoreError> {
    let model = project::ActiveModel {
        team_id: Set(team_id),
        title: Set(String::new()),
        description: Set(String::new()),
        repo_url: Set(None),
        video_url: Set(None),
        demo_url: Set(None),
        status: Set(ProjectStatus::NotStarted),
        submitted_at: Set(None),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

async fn cancel_pending_for_users<C: ConnectionTrait>(
    db: &C,
    user_ids: Vec<i32>,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    team_invite::Entity::update_many()
        .set(team_invite::ActiveModel {
            status: Set(InviteStatus::Cancelled),
            resolved_at: Set(Some(at)),
            ..Default::default()
        })
        .filter(team_invite::Column::UserId.is_in(user_ids))
        .filter(team_invite::Column::Status.eq(InviteStatus::Pending))
        .exec(db)
        .await?;
    Ok(())
}

async fn clear_free_agents<C: ConnectionTrait>(db: &C, user_ids: Vec<i32>) -> Result<(), StoreError> {
    user::Entity::update_many()
        .set(user::ActiveModel {
            is_free_agent: Set(false),
            ..Default::default()
        })
        .filter(user::Column::Id.is_in(user_ids))
        .exec(db)
        .await?;
    Ok(())
}

/// Delete a team and everything hanging off it.
async fn delete_team(txn: &DatabaseTransaction, team_id: i32) -> Result<(), StoreError> {
    let project_ids: Vec<i32> = project::Entity::find()
        .filter(project::Column::TeamId.eq(team_id))
        .select_only()
        .column(project::Column::Id)
        .into_tuple()
        .all(txn)
        .await?;

    vote::Entity::delete_many()
        .filter(vote::Column::ProjectId.is_in(project_ids.clone()))
        .exec(txn)
        .await?;
    judge_score::Entity::delete_many()
        .filter(judge_score::Column::ProjectId.is_in(project_ids))
        .exec(txn)
        .await?;
    project::Entity::delete_many()
        .filter(project::Column::TeamId.eq(team_id))
        .exec(txn)
        .await?;
    team_invite::Entity::delete_many()
        .filter(team_invite::Column::TeamId.eq(team_id))
        .exec(txn)
        .await?;
    team::Entity::delete_by_id(team_id).exec(txn).await?;
    Ok(())
}

async fn first_event<C: ConnectionTrait>(db: &C) -> Result<Option<event::Model>, StoreError> {
    Ok(event::Entity::find()
        .order_by_asc(event::Column::Id)
        .one(db)
        .await?)
}

/// Compare-and-set on the event phase under a row lock.
async fn move_phase(txn: &DatabaseTransaction, from: Phase, to: Phase) -> Result<Event, StoreError> {
    let existing = event::Entity::find()
        .order_by_asc(event::Column::Id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(StoreError::NotFound("Event"))?;
    if existing.phase != from {
        return Err(StoreError::Conflict(format!(
            "Event is in phase '{}', not '{from}'",
            existing.phase
        )));
    }
    let mut active: event::ActiveModel = existing.into();
    active.phase = Set(to);
    active.updated_at = Set(Utc::now());
    Ok(active.update(txn).await?.into())
}

async fn assign_observers_in(
    txn: &DatabaseTransaction,
    team_name: &str,
    now: DateTime<Utc>,
) -> Result<ObserverAssignment, StoreError> {
    let existing = team::Entity::find()
        .filter(team::Column::Kind.eq(TeamKind::Observers))
        .lock(LockType::Update)
        .one(txn)
        .await?;
    let observers = match existing {
        Some(team) => team,
        None => {
            if name_taken(txn, team_name, None).await? {
                return Err(StoreError::Conflict(format!(
                    "Team name '{team_name}' is taken by a regular team"
                )));
            }
            let created = team::ActiveModel {
                name: Set(team_name.to_string()),
                description: Set("Free agents following along".into()),
                looking_for: Set(serde_json::json!([])),
                max_members: Set(0),
                captain_id: Set(None),
                kind: Set(TeamKind::Observers),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(conflict_on_unique("Observers team name is already taken"))?;
            insert_empty_project(txn, created.id, now).await?;
            created
        }
    };

    let on_teams: Vec<i32> = team_member::Entity::find()
        .select_only()
        .column(team_member::Column::UserId)
        .into_tuple()
        .all(txn)
        .await?;
    let waiting: Vec<i32> = user::Entity::find()
        .filter(user::Column::IsFreeAgent.eq(true))
        .filter(user::Column::Id.is_not_in(on_teams))
        .order_by_asc(user::Column::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    if !waiting.is_empty() {
        let members = waiting.iter().map(|&user_id| team_member::ActiveModel {
            user_id: Set(user_id),
            team_id: Set(observers.id),
            joined_at: Set(now),
        });
        team_member::Entity::insert_many(members)
            .exec(txn)
            .await
            .map_err(conflict_on_unique("A free agent joined a team concurrently"))?;
        clear_free_agents(txn, waiting.clone()).await?;
        cancel_pending_for_users(txn, waiting.clone(), now).await?;
    }

    let count = member_count(txn, observers.id).await? as i32;
    let team_id = observers.id;
    if count > observers.max_members {
        let mut active: team::ActiveModel = observers.into();
        active.max_members = Set(count);
        active.update(txn).await?;
    }

    Ok(ObserverAssignment {
        team: require_team(txn, team_id).await?,
        assigned: waiting,
    })
}

#[async_trait]
impl HackdayStore for DbStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let model = user::ActiveModel {
            username: Set(new.username),
            display_name: Set(new.display_name),
            password: Set(new.password_hash),
            role: Set(new.role),
            skills: Set(serde_json::json!(new.skills)),
            is_free_agent: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let user = model
            .insert(&self.db)
            .await
            .map_err(conflict_on_unique("Username is already taken"))?;
        Ok(user.into())
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, StoreError> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        let mut active: user::ActiveModel = existing.into();
        if let Some(display_name) = update.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(skills) = update.skills {
            active.skills = Set(serde_json::json!(skills));
        }
        Ok(active.update(&self.db).await?.into())
    }

    async fn set_free_agent(&self, id: i32, free_agent: bool) -> Result<User, StoreError> {
        let txn = self.db.begin().await?;
        let existing = user::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        if free_agent
            && team_member::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .is_some()
        {
            return Err(StoreError::Conflict(
                "Users on a team cannot opt in as free agents".into(),
            ));
        }
        let mut active: user::ActiveModel = existing.into();
        active.is_free_agent = Set(free_agent);
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    async fn set_role(&self, id: i32, role: Role) -> Result<User, StoreError> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        Ok(active.update(&self.db).await?.into())
    }

    async fn get_event(&self) -> Result<Option<Event>, StoreError> {
        Ok(first_event(&self.db).await?.map(Event::from))
    }

    async fn init_event(&self, name: &str) -> Result<Event, StoreError> {
        if let Some(existing) = first_event(&self.db).await? {
            return Ok(existing.into());
        }
        let model = event::ActiveModel {
            name: Set(name.to_string()),
            phase: Set(Phase::Registration),
            starts_at: Set(None),
            ends_at: Set(None),
            motd: Set(String::new()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?.into())
    }

    async fn transition_phase(&self, from: Phase, to: Phase) -> Result<Event, StoreError> {
        let txn = self.db.begin().await?;
        let event = move_phase(&txn, from, to).await?;
        txn.commit().await?;
        Ok(event)
    }

    async fn transition_phase_with_observers(
        &self,
        from: Phase,
        to: Phase,
        team_name: &str,
    ) -> Result<(Event, ObserverAssignment), StoreError> {
        let txn = self.db.begin().await?;
        let event = move_phase(&txn, from, to).await?;
        let assignment = assign_observers_in(&txn, team_name, Utc::now()).await?;
        txn.commit().await?;
        Ok((event, assignment))
    }

    async fn update_event(&self, update: EventUpdate) -> Result<Event, StoreError> {
        let existing = first_event(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Event"))?;
        let mut active: event::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(motd) = update.motd {
            active.motd = Set(motd);
        }
        if let Some(starts_at) = update.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = update.ends_at {
            active.ends_at = Set(ends_at);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?.into())
    }

    async fn create_team(&self, new: NewTeam) -> Result<Team, StoreError> {
        let txn = self.db.begin().await?;
        let captain = user::Entity::find_by_id(new.captain_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        if team_member::Entity::find_by_id(captain.id)
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(StoreError::Conflict("You are already on a team".into()));
        }
        if name_taken(&txn, &new.name, None).await? {
            return Err(StoreError::Conflict(format!(
                "Team name '{}' is already taken",
                new.name
            )));
        }

        let now = Utc::now();
        let created = team::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            looking_for: Set(serde_json::json!(new.looking_for)),
            max_members: Set(new.max_members as i32),
            captain_id: Set(Some(captain.id)),
            kind: Set(TeamKind::Regular),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(conflict_on_unique("Team name is already taken"))?;

        team_member::ActiveModel {
            user_id: Set(captain.id),
            team_id: Set(created.id),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(conflict_on_unique("You are already on a team"))?;

        insert_empty_project(&txn, created.id, now).await?;
        clear_free_agents(&txn, vec![captain.id]).await?;
        cancel_pending_for_users(&txn, vec![captain.id], now).await?;

        let team = require_team(&txn, created.id).await?;
        txn.commit().await?;
        Ok(team)
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let teams = team::Entity::find()
            .order_by_asc(team::Column::Id)
            .all(&self.db)
            .await?;
        let members = team_member::Entity::find()
            .order_by_asc(team_member::Column::JoinedAt)
            .order_by_asc(team_member::Column::UserId)
            .all(&self.db)
            .await?;

        let mut by_team: HashMap<i32, Vec<team_member::Model>> = HashMap::new();
        for member in members {
            by_team.entry(member.team_id).or_default().push(member);
        }

        Ok(teams
            .into_iter()
            .map(|t| {
                let members = by_team.remove(&t.id).unwrap_or_default();
                team_from(t, members)
            })
            .collect())
    }

    async fn find_team(&self, id: i32) -> Result<Option<Team>, StoreError> {
        load_team(&self.db, id).await
    }

    async fn find_team_of_user(&self, user_id: i32) -> Result<Option<Team>, StoreError> {
        match team_member::Entity::find_by_id(user_id).one(&self.db).await? {
            Some(membership) => load_team(&self.db, membership.team_id).await,
            None => Ok(None),
        }
    }

    async fn update_team(&self, id: i32, update: TeamUpdate) -> Result<Team, StoreError> {
        let txn = self.db.begin().await?;
        let existing = lock_team(&txn, id).await?;

        if let Some(max_members) = update.max_members {
            let count = member_count(&txn, id).await?;
            if u64::from(max_members) < count {
                return Err(StoreError::Conflict(format!(
                    "Team already has {count} members"
                )));
            }
        }
        if let Some(ref name) = update.name {
            if name_taken(&txn, name, Some(id)).await? {
                return Err(StoreError::Conflict(format!(
                    "Team name '{name}' is already taken"
                )));
            }
        }

        let mut active: team::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(looking_for) = update.looking_for {
            active.looking_for = Set(serde_json::json!(looking_for));
        }
        if let Some(max_members) = update.max_members {
            active.max_members = Set(max_members as i32);
        }
        active
            .update(&txn)
            .await
            .map_err(conflict_on_unique("Team name is already taken"))?;

        let team = require_team(&txn, id).await?;
        txn.commit().await?;
        Ok(team)
    }

    async fn remove_member(&self, team_id: i32, user_id: i32) -> Result<Option<Team>, StoreError> {
        let txn = self.db.begin().await?;
        let locked = lock_team(&txn, team_id).await?;
        if locked.captain_id == Some(user_id) && member_count(&txn, team_id).await? > 1 {
            return Err(StoreError::Conflict(
                "Transfer the captaincy before the captain leaves".into(),
            ));
        }

        let removed = team_member::Entity::delete_many()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound("Team member"));
        }

        if member_count(&txn, team_id).await? == 0 {
            delete_team(&txn, team_id).await?;
            txn.commit().await?;
            return Ok(None);
        }

        let team = require_team(&txn, team_id).await?;
        txn.commit().await?;
        Ok(Some(team))
    }

    async fn set_captain(&self, team_id: i32, user_id: i32) -> Result<Team, StoreError> {
        let txn = self.db.begin().await?;
        let existing = lock_team(&txn, team_id).await?;
        let is_member = team_member::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .is_some_and(|m| m.team_id == team_id);
        if !is_member {
            return Err(StoreError::NotFound("Team member"));
        }
        let mut active: team::ActiveModel = existing.into();
        active.captain_id = Set(Some(user_id));
        active.update(&txn).await?;

        let team = require_team(&txn, team_id).await?;
        txn.commit().await?;
        Ok(team)
    }

    async fn assign_observers(&self, team_name: &str) -> Result<ObserverAssignment, StoreError> {
        let txn = self.db.begin().await?;
        let assignment = assign_observers_in(&txn, team_name, Utc::now()).await?;
        txn.commit().await?;
        Ok(assignment)
    }

    async fn create_invite(&self, new: NewInvite) -> Result<Invite, StoreError> {
        let txn = self.db.begin().await?;
        lock_team(&txn, new.team_id).await?;
        let now = Utc::now();

        let duplicate = team_invite::Entity::find()
            .filter(team_invite::Column::TeamId.eq(new.team_id))
            .filter(team_invite::Column::UserId.eq(new.user_id))
            .filter(team_invite::Column::Kind.eq(new.kind))
            .filter(team_invite::Column::Status.eq(InviteStatus::Pending))
            .filter(
                Condition::any()
                    .add(team_invite::Column::ExpiresAt.is_null())
                    .add(team_invite::Column::ExpiresAt.gt(now)),
            )
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(StoreError::Conflict(
                "A pending request already exists".into(),
            ));
        }

        let created = team_invite::ActiveModel {
            team_id: Set(new.team_id),
            user_id: Set(new.user_id),
            kind: Set(new.kind),
            status: Set(InviteStatus::Pending),
            message: Set(new.message),
            created_by: Set(new.created_by),
            expires_at: Set(new.expires_at),
            created_at: Set(now),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(created.into())
    }

    async fn find_invite(&self, id: i32) -> Result<Option<Invite>, StoreError> {
        Ok(team_invite::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Invite::from))
    }

    async fn list_invites_for_user(&self, user_id: i32) -> Result<Vec<Invite>, StoreError> {
        let invites = team_invite::Entity::find()
            .filter(team_invite::Column::UserId.eq(user_id))
            .order_by_asc(team_invite::Column::Id)
            .all(&self.db)
            .await?;
        Ok(invites.into_iter().map(Invite::from).collect())
    }

    async fn list_invites_for_team(&self, team_id: i32) -> Result<Vec<Invite>, StoreError> {
        let invites = team_invite::Entity::find()
            .filter(team_invite::Column::TeamId.eq(team_id))
            .order_by_asc(team_invite::Column::Id)
            .all(&self.db)
            .await?;
        Ok(invites.into_iter().map(Invite::from).collect())
    }

    async fn resolve_invite(
        &self,
        id: i32,
        status: InviteStatus,
        at: DateTime<Utc>,
    ) -> Result<Invite, StoreError> {
        let txn = self.db.begin().await?;
        let existing = team_invite::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Invite"))?;
        if !existing.status.is_pending() {
            return Err(StoreError::Conflict(format!(
                "Invite is already {}",
                existing.status.as_str()
            )));
        }
        let mut active: team_invite::ActiveModel = existing.into();
        active.status = Set(status);
        active.resolved_at = Set(Some(at));
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    async fn accept_invite(&self, id: i32, at: DateTime<Utc>) -> Result<(Invite, Team), StoreError> {
        let txn = self.db.begin().await?;
        let existing = team_invite::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Invite"))?;
        if !existing.status.is_pending() {
            return Err(StoreError::Conflict(format!(
                "Invite is already {}",
                existing.status.as_str()
            )));
        }

        let team = lock_team(&txn, existing.team_id).await?;
        let limit = capacity(team.max_members);
        if team.kind == TeamKind::Regular
            && member_count(&txn, team.id).await? >= u64::from(limit)
        {
            return Err(StoreError::TeamFull { capacity: limit });
        }

        team_member::ActiveModel {
            user_id: Set(existing.user_id),
            team_id: Set(team.id),
            joined_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(conflict_on_unique("User is already on a team"))?;

        clear_free_agents(&txn, vec![existing.user_id]).await?;
        cancel_pending_for_users(&txn, vec![existing.user_id], at).await?;

        let mut active: team_invite::ActiveModel = existing.into();
        active.status = Set(InviteStatus::Accepted);
        active.resolved_at = Set(Some(at));
        let accepted = active.update(&txn).await?;

        let joined = require_team(&txn, team.id).await?;
        txn.commit().await?;
        Ok((accepted.into(), joined))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let projects = project::Entity::find()
            .order_by_asc(project::Column::Id)
            .all(&self.db)
            .await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    async fn find_project(&self, id: i32) -> Result<Option<Project>, StoreError> {
        Ok(project::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Project::from))
    }

    async fn find_project_by_team(&self, team_id: i32) -> Result<Option<Project>, StoreError> {
        Ok(project::Entity::find()
            .filter(project::Column::TeamId.eq(team_id))
            .one(&self.db)
            .await?
            .map(Project::from))
    }

    async fn save_project(&self, project: Project) -> Result<Project, StoreError> {
        let existing = project::Entity::find_by_id(project.id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Project"))?;
        let mut active: project::ActiveModel = existing.into();
        active.title = Set(project.title);
        active.description = Set(project.description);
        active.repo_url = Set(project.repo_url);
        active.video_url = Set(project.video_url);
        active.demo_url = Set(project.demo_url);
        active.status = Set(project.status);
        active.submitted_at = Set(project.submitted_at);
        active.updated_at = Set(project.updated_at);
        Ok(active.update(&self.db).await?.into())
    }

    async fn cast_vote(
        &self,
        user_id: i32,
        project_id: i32,
        max_votes: u32,
    ) -> Result<Vote, StoreError> {
        let txn = self.db.begin().await?;
        // Serialises concurrent votes by the same user.
        user::Entity::find_by_id(user_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        if project::Entity::find_by_id(project_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound("Project"));
        }

        let mine = vote::Entity::find()
            .filter(vote::Column::UserId.eq(user_id))
            .all(&txn)
            .await?;
        if mine.iter().any(|v| v.project_id == project_id) {
            return Err(StoreError::Conflict(
                "You already voted for this project".into(),
            ));
        }
        if mine.len() as u32 >= max_votes {
            return Err(StoreError::VoteLimit { limit: max_votes });
        }

        let created = vote::ActiveModel {
            user_id: Set(user_id),
            project_id: Set(project_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(conflict_on_unique("You already voted for this project"))?;
        txn.commit().await?;
        Ok(created.into())
    }

    async fn retract_vote(&self, user_id: i32, project_id: i32) -> Result<bool, StoreError> {
        let res = vote::Entity::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::ProjectId.eq(project_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_votes(&self) -> Result<Vec<Vote>, StoreError> {
        let votes = vote::Entity::find()
            .order_by_asc(vote::Column::Id)
            .all(&self.db)
            .await?;
        Ok(votes.into_iter().map(Vote::from).collect())
    }

    async fn list_votes_by_user(&self, user_id: i32) -> Result<Vec<Vote>, StoreError> {
        let votes = vote::Entity::find()
            .filter(vote::Column::UserId.eq(user_id))
            .order_by_asc(vote::Column::Id)
            .all(&self.db)
            .await?;
        Ok(votes.into_iter().map(Vote::from).collect())
    }

    async fn upsert_score(&self, score: JudgeScore) -> Result<JudgeScore, StoreError> {
        if project::Entity::find_by_id(score.project_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound("Project"));
        }

        let model = judge_score::ActiveModel {
            judge_id: Set(score.judge_id),
            project_id: Set(score.project_id),
            scores: Set(serde_json::json!(score.scores)),
            comments: Set(score.comments.clone()),
            updated_at: Set(score.updated_at),
            ..Default::default()
        };
        judge_score::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([judge_score::Column::JudgeId, judge_score::Column::ProjectId])
                    .update_columns([
                        judge_score::Column::Scores,
                        judge_score::Column::Comments,
                        judge_score::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(score)
    }

    async fn list_scores(&self) -> Result<Vec<JudgeScore>, StoreError> {
        let scores = judge_score::Entity::find()
            .order_by_asc(judge_score::Column::Id)
            .all(&self.db)
            .await?;
        Ok(scores.into_iter().map(JudgeScore::from).collect())
    }

    async fn list_scores_for_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<JudgeScore>, StoreError> {
        let scores = judge_score::Entity::find()
            .filter(judge_score::Column::ProjectId.eq(project_id))
            .order_by_asc(judge_score::Column::JudgeId)
            .all(&self.db)
            .await?;
        Ok(scores.into_iter().map(JudgeScore::from).collect())
    }
}
