//! `SeaORM` Entity for expense_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub effective_date: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub breakfast: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub lunch: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub dinner: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub lodging: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub mileage: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
