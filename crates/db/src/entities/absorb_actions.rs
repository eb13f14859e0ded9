//! `SeaORM` Entity for absorb_actions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "absorb_actions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub collection_name: String,
    pub target_id: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub absorbed_records: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub updated_references: Json,
    pub uid: String,
    pub created: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
