use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::config::AppConfig;
use crate::entity::{team_invite, vote};
use crate::store::{HackdayStore, NewUser, StoreError};
use crate::utils::hash;
use common::Role;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to hash bootstrap admin password: {0}")]
    Hash(String),
}

/// Create the event singleton and the configured bootstrap admin if missing.
pub async fn seed_defaults(store: &dyn HackdayStore, config: &AppConfig) -> Result<(), SeedError> {
    let event = store.init_event(&config.hackday.event_name).await?;
    info!(phase = %event.phase, "Event '{}' ready", event.name);

    let Some(admin) = &config.auth.bootstrap_admin else {
        return Ok(());
    };
    if store.find_user_by_username(&admin.username).await?.is_some() {
        return Ok(());
    }

    let password_hash =
        hash::hash_password(&admin.password).map_err(|e| SeedError::Hash(e.to_string()))?;
    let user = store
        .create_user(NewUser {
            username: admin.username.clone(),
            display_name: admin.username.clone(),
            password_hash,
            role: Role::Admin,
            skills: Vec::new(),
        })
        .await?;
    info!(user_id = user.id, "Seeded bootstrap admin '{}'", user.username);

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Pending-invite lookups:
    // SELECT ... FROM team_invite WHERE user_id = ? AND status = 'pending'
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_team_invite_user_status")
        .table(team_invite::Entity)
        .col(team_invite::Column::UserId)
        .col(team_invite::Column::Status)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_team_invite_user_status exists"),
        Err(e) => tracing::warn!("Failed to create index idx_team_invite_user_status: {}", e),
    }

    // Vote tallies per project
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_vote_project")
        .table(vote::Entity)
        .col(vote::Column::ProjectId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_vote_project exists"),
        Err(e) => tracing::warn!("Failed to create index idx_vote_project: {}", e),
    }

    Ok(())
}
