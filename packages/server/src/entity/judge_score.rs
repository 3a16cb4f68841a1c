use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "judge_score")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "judge_project")]
    pub judge_id: i32,
    #[sea_orm(unique_key = "judge_project")]
    pub project_id: i32,

    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    /// JSON object of criterion name to score.
    #[sea_orm(column_type = "JsonBinary")]
    pub scores: serde_json::Value,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
