//! `SeaORM` Entity for purchase_orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub po_number: String,
    pub uid: String,
    pub date: Date,
    pub end_date: Option<Date>,
    pub frequency: Option<String>,
    pub division: String,
    pub kind: String,
    pub job: Option<String>,
    pub branch: String,
    pub vendor: String,
    pub category: String,
    pub description: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub po_type: String,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub approval_total: Decimal,
    pub approver: Option<String>,
    pub approved: Option<DateTimeWithTimeZone>,
    pub second_approver: Option<String>,
    pub second_approval: Option<DateTimeWithTimeZone>,
    pub priority_second_approver: Option<String>,
    pub rejector: Option<String>,
    pub rejected: Option<DateTimeWithTimeZone>,
    pub rejection_reason: String,
    pub canceller: Option<String>,
    pub cancelled: Option<DateTimeWithTimeZone>,
    pub closer: Option<String>,
    pub closed: Option<DateTimeWithTimeZone>,
    pub closed_by_system: bool,
    pub parent_po: Option<String>,
    pub attachment: String,
    pub attachment_hash: String,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Uid",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
