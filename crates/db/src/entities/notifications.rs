//! `SeaORM` Entity for notifications table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub recipient: String,
    pub template: String,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub actor: Option<String>,
    pub error: String,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::notification_templates::Entity",
        from = "Column::Template",
        to = "super::notification_templates::Column::Id"
    )]
    NotificationTemplates,
}

impl Related<super::notification_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
