//! Reference data migration.
//!
//! Seeds the claim catalog, the expenditure kinds and the notification
//! templates the lifecycle handlers emit. Ids are fixed so fixtures and
//! tests can refer to them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(SEED_CLAIMS_SQL).await?;
        db.execute_unprepared(SEED_EXPENDITURE_KINDS_SQL).await?;
        db.execute_unprepared(SEED_TEMPLATES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DELETE_REFERENCE_DATA_SQL).await?;
        Ok(())
    }
}

const SEED_CLAIMS_SQL: &str = r"
INSERT INTO claims (id, name, description) VALUES
    ('clmpoapprover00', 'po_approver', 'First-tier purchase order approver'),
    ('clmpoapprovert2', 'po_approver_tier2', 'Second-tier approver above the first threshold'),
    ('clmpoapprovert3', 'po_approver_tier3', 'Second-tier approver above the second threshold'),
    ('clmpayablesadmn', 'payables_admin', 'Cancel, close and convert purchase orders'),
    ('clmcommit000000', 'commit', 'Commit approved records'),
    ('clmabsorb000000', 'absorb', 'Merge duplicate clients and contacts'),
    ('clmadmin0000000', 'admin', 'Administrative operations'),
    ('clmreport000000', 'report', 'Reporting access'),
    ('clmjob000000000', 'job', 'Job management'),
    ('clmratesheetrev', 'rate_sheet_revise', 'Revise rate sheets')
ON CONFLICT (name) DO NOTHING;
";

const SEED_EXPENDITURE_KINDS_SQL: &str = r"
INSERT INTO expenditure_kinds (id, name, description, allow_job) VALUES
    ('kndcapital00000', 'capital', 'Capital purchases', FALSE),
    ('kndexpense00000', 'expense', 'Operating expenses', FALSE),
    ('kndproject00000', 'project', 'Project spend billed to a job', TRUE),
    ('kndsponsorship0', 'sponsorship', 'Sponsorships', FALSE),
    ('kndstaffsocial0', 'staff_and_social', 'Staff and social events', FALSE),
    ('kndmediaevent00', 'media_and_event', 'Media and events', FALSE),
    ('kndcomputer0000', 'computer', 'Computer hardware and software', FALSE)
ON CONFLICT (name) DO NOTHING;
";

const SEED_TEMPLATES_SQL: &str = r"
INSERT INTO notification_templates (id, code, subject, text_email) VALUES
    ('tplposecondprio', 'po_priority_second_approval_required',
     'Purchase order {PONumber} needs your second approval',
     '{POApproverName} approved purchase order {POId} raised by {POCreatorName}. It now needs your second approval.'),
    ('tplpoactive0000', 'po_active',
     'Purchase order {PONumber} is active',
     'Your purchase order {PONumber} was approved by {POApproverName} and is now active.'),
    ('tplporejected00', 'po_rejected',
     'Purchase order rejected',
     'Your purchase order {POId} was rejected by {POApproverName}: {RejectionReason}'),
    ('tpltsrejected00', 'timesheet_rejected',
     'Timesheet rejected',
     'Your timesheet was rejected: {RejectionReason}'),
    ('tplexprejected0', 'expense_rejected',
     'Expense rejected',
     'Your expense was rejected: {RejectionReason}')
ON CONFLICT (code) DO NOTHING;
";

const DELETE_REFERENCE_DATA_SQL: &str = r"
DELETE FROM notification_templates WHERE id IN (
    'tplposecondprio', 'tplpoactive0000', 'tplporejected00', 'tpltsrejected00', 'tplexprejected0'
);
DELETE FROM expenditure_kinds WHERE id IN (
    'kndcapital00000', 'kndexpense00000', 'kndproject00000', 'kndsponsorship0',
    'kndstaffsocial0', 'kndmediaevent00', 'kndcomputer0000'
);
DELETE FROM claims WHERE id IN (
    'clmpoapprover00', 'clmpoapprovert2', 'clmpoapprovert3', 'clmpayablesadmn', 'clmcommit000000',
    'clmabsorb000000', 'clmadmin0000000', 'clmreport000000', 'clmjob000000000', 'clmratesheetrev'
);
";
