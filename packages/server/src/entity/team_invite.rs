use common::{InviteKind, InviteStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Captain-to-user invites and user-to-team join requests.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_invite")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub team_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: HasOne<super::team::Entity>,

    /// Invited user, or the user asking to join.
    pub user_id: i32,
    pub kind: InviteKind,
    pub status: InviteStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub created_by: i32,
    pub expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
