//! Seeds the template of the lapsed-holdover reminder.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(SEED_TEMPLATE_SQL)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DELETE FROM notification_templates WHERE id = 'tplposecondreq0';")
            .await?;
        Ok(())
    }
}

const SEED_TEMPLATE_SQL: &str = r"
INSERT INTO notification_templates (id, code, subject, text_email) VALUES
    ('tplposecondreq0', 'po_second_approval_required',
     'Purchase orders are waiting for a second approval',
     'One or more purchase orders you can approve have waited on a second approval past the priority approver''s holdover. Please review them.')
ON CONFLICT (code) DO NOTHING;
";
