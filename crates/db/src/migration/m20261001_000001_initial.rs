//! Initial database migration.
//!
//! Creates the identity, claim, purchase order, expense, notification,
//! client and machine secret tables together with their indexes and the
//! `updated` trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: IDENTITY AND CLAIMS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(CLAIMS_SQL).await?;

        // ============================================================
        // PART 2: REFERENCE DATA
        // ============================================================
        db.execute_unprepared(DIVISIONS_SQL).await?;
        db.execute_unprepared(APPROVAL_THRESHOLDS_SQL).await?;
        db.execute_unprepared(APP_CONFIG_SQL).await?;

        // ============================================================
        // PART 3: CLIENTS AND JOBS
        // ============================================================
        db.execute_unprepared(CLIENTS_SQL).await?;

        // ============================================================
        // PART 4: PURCHASE ORDERS AND EXPENSES
        // ============================================================
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

        // ============================================================
        // PART 5: NOTIFICATIONS
        // ============================================================
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;

        // ============================================================
        // PART 6: MACHINE SECRETS AND ABSORB AUDIT
        // ============================================================
        db.execute_unprepared(MACHINE_SECRETS_SQL).await?;
        db.execute_unprepared(ABSORB_ACTIONS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
CREATE TABLE users (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    email TEXT NOT NULL UNIQUE,
    given_name TEXT NOT NULL,
    surname TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CLAIMS_SQL: &str = r"
CREATE TABLE claims (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

-- payload is the scoping property bag (max_amount, divisions, ...)
CREATE TABLE user_claims (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    uid TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    cid TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
    payload JSONB,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (uid, cid)
);

CREATE INDEX idx_user_claims_cid ON user_claims(cid);
";

const DIVISIONS_SQL: &str = r"
CREATE TABLE divisions (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE expenditure_kinds (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    allow_job BOOLEAN NOT NULL DEFAULT FALSE
);
";

const APPROVAL_THRESHOLDS_SQL: &str = r"
CREATE TABLE po_approval_thresholds (
    tier INTEGER PRIMARY KEY CHECK (tier >= 1),
    ceiling NUMERIC(14, 2) NOT NULL CHECK (ceiling > 0)
);
";

const APP_CONFIG_SQL: &str = r"
CREATE TABLE app_config (
    key TEXT PRIMARY KEY,
    value JSONB NOT NULL DEFAULT '{}'::jsonb,
    description TEXT NOT NULL DEFAULT '',
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CLIENTS_SQL: &str = r"
CREATE TABLE clients (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    name TEXT NOT NULL,
    business_development_lead TEXT REFERENCES users(id),
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE client_contacts (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    client TEXT NOT NULL REFERENCES clients(id),
    given_name TEXT NOT NULL,
    surname TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_client_contacts_client ON client_contacts(client);

CREATE TABLE jobs (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    number TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    client TEXT NOT NULL REFERENCES clients(id),
    contact TEXT REFERENCES client_contacts(id),
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_jobs_client ON jobs(client);
CREATE INDEX idx_jobs_contact ON jobs(contact);

CREATE TABLE client_notes (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    client TEXT NOT NULL REFERENCES clients(id),
    job TEXT REFERENCES jobs(id),
    uid TEXT NOT NULL REFERENCES users(id),
    note TEXT NOT NULL,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_client_notes_client ON client_notes(client);
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    po_number TEXT NOT NULL DEFAULT '',
    uid TEXT NOT NULL REFERENCES users(id),
    date DATE NOT NULL,
    end_date DATE,
    frequency TEXT CHECK (frequency IN ('Weekly', 'Biweekly', 'Monthly')),
    division TEXT NOT NULL REFERENCES divisions(id),
    kind TEXT NOT NULL DEFAULT 'capital' REFERENCES expenditure_kinds(name),
    job TEXT REFERENCES jobs(id),
    branch TEXT NOT NULL DEFAULT '',
    vendor TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'One-Time'
        CHECK (type IN ('One-Time', 'Cumulative', 'Recurring')),
    status TEXT NOT NULL DEFAULT 'Unapproved'
        CHECK (status IN ('Unapproved', 'Active', 'Closed', 'Cancelled')),
    total NUMERIC(14, 2) NOT NULL CHECK (total >= 0),
    approval_total NUMERIC(14, 2) NOT NULL CHECK (approval_total >= 0),
    approver TEXT REFERENCES users(id),
    approved TIMESTAMPTZ,
    second_approver TEXT REFERENCES users(id),
    second_approval TIMESTAMPTZ,
    priority_second_approver TEXT REFERENCES users(id),
    rejector TEXT REFERENCES users(id),
    rejected TIMESTAMPTZ,
    rejection_reason TEXT NOT NULL DEFAULT '',
    canceller TEXT REFERENCES users(id),
    cancelled TIMESTAMPTZ,
    closer TEXT REFERENCES users(id),
    closed TIMESTAMPTZ,
    closed_by_system BOOLEAN NOT NULL DEFAULT FALSE,
    parent_po TEXT REFERENCES purchase_orders(id),
    attachment TEXT NOT NULL DEFAULT '',
    attachment_hash TEXT NOT NULL DEFAULT '',
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_po_number_shape CHECK (
        po_number = '' OR po_number ~ '^[0-9]{4}-[0-9]{4}(-[0-9]{2})?$'
    ),
    CONSTRAINT chk_unapproved_has_no_number CHECK (
        status <> 'Unapproved' OR po_number = ''
    ),
    CONSTRAINT chk_active_is_numbered CHECK (
        status <> 'Active' OR (po_number <> '' AND approved IS NOT NULL)
    ),
    CONSTRAINT chk_rejection_reason CHECK (
        rejected IS NULL OR (status = 'Unapproved' AND length(btrim(rejection_reason)) >= 5)
    ),
    CONSTRAINT chk_recurring_schedule CHECK (
        type <> 'Recurring' OR (end_date IS NOT NULL AND frequency IS NOT NULL)
    ),
    CONSTRAINT chk_approval_total CHECK (
        (type = 'Recurring' AND approval_total >= total)
        OR (type <> 'Recurring' AND approval_total = total)
    )
);

CREATE UNIQUE INDEX idx_purchase_orders_po_number
    ON purchase_orders(po_number) WHERE po_number <> '';
CREATE INDEX idx_purchase_orders_parent ON purchase_orders(parent_po);
CREATE INDEX idx_purchase_orders_status ON purchase_orders(status);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    uid TEXT NOT NULL REFERENCES users(id),
    date DATE NOT NULL,
    division TEXT NOT NULL REFERENCES divisions(id),
    description TEXT NOT NULL DEFAULT '',
    payment_type TEXT NOT NULL DEFAULT 'OnAccount',
    total NUMERIC(14, 2) NOT NULL DEFAULT 0,
    distance NUMERIC(10, 2),
    purchase_order TEXT REFERENCES purchase_orders(id),
    job TEXT REFERENCES jobs(id),
    submitted BOOLEAN NOT NULL DEFAULT FALSE,
    approver TEXT REFERENCES users(id),
    approved TIMESTAMPTZ,
    rejector TEXT REFERENCES users(id),
    rejected TIMESTAMPTZ,
    rejection_reason TEXT NOT NULL DEFAULT '',
    committer TEXT REFERENCES users(id),
    committed TIMESTAMPTZ,
    committed_week_ending DATE,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_expenses_purchase_order ON expenses(purchase_order);
CREATE INDEX idx_expenses_uid_date ON expenses(uid, date);

-- mileage holds band lower bounds (km) mapped to per-km rates
CREATE TABLE expense_rates (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    effective_date DATE NOT NULL UNIQUE,
    breakfast NUMERIC(14, 2) NOT NULL DEFAULT 0,
    lunch NUMERIC(14, 2) NOT NULL DEFAULT 0,
    dinner NUMERIC(14, 2) NOT NULL DEFAULT 0,
    lodging NUMERIC(14, 2) NOT NULL DEFAULT 0,
    mileage JSONB NOT NULL
);

CREATE TABLE mileage_reset_dates (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    date DATE NOT NULL UNIQUE
);
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notification_templates (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    code TEXT NOT NULL UNIQUE,
    subject TEXT NOT NULL,
    text_email TEXT NOT NULL
);

CREATE TABLE notifications (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    recipient TEXT NOT NULL REFERENCES users(id),
    template TEXT NOT NULL REFERENCES notification_templates(id),
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'inflight', 'sent', 'failed')),
    data JSONB NOT NULL DEFAULT '{}'::jsonb,
    actor TEXT REFERENCES users(id),
    error TEXT NOT NULL DEFAULT '',
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_notifications_pending ON notifications(created) WHERE status = 'pending';
";

const MACHINE_SECRETS_SQL: &str = r"
CREATE TABLE machine_secrets (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    sha256_hash TEXT NOT NULL,
    salt TEXT NOT NULL,
    role TEXT NOT NULL,
    expiry TIMESTAMPTZ NOT NULL,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_machine_secrets_role ON machine_secrets(role, expiry);
";

const ABSORB_ACTIONS_SQL: &str = r"
CREATE TABLE absorb_actions (
    id TEXT PRIMARY KEY CHECK (id ~ '^[a-z0-9]{15}$'),
    collection_name TEXT NOT NULL UNIQUE,
    target_id TEXT NOT NULL,
    absorbed_records JSONB NOT NULL,
    updated_references JSONB NOT NULL,
    uid TEXT NOT NULL REFERENCES users(id),
    created TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_purchase_orders_updated
    BEFORE UPDATE ON purchase_orders
    FOR EACH ROW EXECUTE FUNCTION touch_updated();

CREATE TRIGGER trg_expenses_updated
    BEFORE UPDATE ON expenses
    FOR EACH ROW EXECUTE FUNCTION touch_updated();

CREATE TRIGGER trg_notifications_updated
    BEFORE UPDATE ON notifications
    FOR EACH ROW EXECUTE FUNCTION touch_updated();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS absorb_actions CASCADE;
DROP TABLE IF EXISTS machine_secrets CASCADE;
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS notification_templates CASCADE;
DROP TABLE IF EXISTS mileage_reset_dates CASCADE;
DROP TABLE IF EXISTS expense_rates CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS client_notes CASCADE;
DROP TABLE IF EXISTS jobs CASCADE;
DROP TABLE IF EXISTS client_contacts CASCADE;
DROP TABLE IF EXISTS clients CASCADE;
DROP TABLE IF EXISTS app_config CASCADE;
DROP TABLE IF EXISTS po_approval_thresholds CASCADE;
DROP TABLE IF EXISTS expenditure_kinds CASCADE;
DROP TABLE IF EXISTS divisions CASCADE;
DROP TABLE IF EXISTS user_claims CASCADE;
DROP TABLE IF EXISTS claims CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS touch_updated() CASCADE;
";
