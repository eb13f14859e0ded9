//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub uid: String,
    pub date: Date,
    pub division: String,
    pub description: String,
    pub payment_type: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub distance: Option<Decimal>,
    pub purchase_order: Option<String>,
    pub job: Option<String>,
    pub submitted: bool,
    pub approver: Option<String>,
    pub approved: Option<DateTimeWithTimeZone>,
    pub rejector: Option<String>,
    pub rejected: Option<DateTimeWithTimeZone>,
    pub rejection_reason: String,
    pub committer: Option<String>,
    pub committed: Option<DateTimeWithTimeZone>,
    pub committed_week_ending: Option<Date>,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::PurchaseOrder",
        to = "super::purchase_orders::Column::Id"
    )]
    PurchaseOrders,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
