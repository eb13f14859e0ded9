//! `SeaORM` Entity for po_approval_thresholds table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "po_approval_thresholds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tier: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub ceiling: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
