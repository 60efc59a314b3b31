//! Ledger schema: entities, chart of accounts, journal entries and lines,
//! consolidation groups, and the audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ENTITIES & CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(LEDGER_ENTITIES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL ENTRIES & LINES
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 4: CONSOLIDATION
        // ============================================================
        db.execute_unprepared(CONSOLIDATION_SQL).await?;

        // ============================================================
        // PART 5: AUDIT LOG
        // ============================================================
        db.execute_unprepared(AUDIT_EVENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
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

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

CREATE TYPE entry_status AS ENUM (
    'draft',
    'pending_approval',
    'approved',
    'rejected',
    'posted',
    'voided'
);

CREATE TYPE entry_side AS ENUM ('debit', 'credit');
";

const LEDGER_ENTITIES_SQL: &str = r"
CREATE TABLE ledger_entities (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_ledger_entities_client ON ledger_entities(client_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    entity_id UUID NOT NULL REFERENCES ledger_entities(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    subtype VARCHAR(50),
    parent_id UUID REFERENCES accounts(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    subledger VARCHAR(20) CHECK (subledger IN ('receivable', 'payable')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_entity_code UNIQUE (entity_id, code)
);

CREATE INDEX idx_accounts_type ON accounts(entity_id, account_type);
CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    entity_id UUID NOT NULL REFERENCES ledger_entities(id) ON DELETE CASCADE,
    entry_date DATE NOT NULL,
    reference_number VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    status entry_status NOT NULL DEFAULT 'draft',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    voided_by UUID,
    voided_at TIMESTAMPTZ,
    void_reason TEXT,
    reversal_of UUID REFERENCES journal_entries(id),
    reversed_by UUID REFERENCES journal_entries(id) ON DELETE SET NULL,
    resubmitted_from UUID REFERENCES journal_entries(id) ON DELETE SET NULL,
    CONSTRAINT uq_journal_entries_entity_reference UNIQUE (entity_id, reference_number)
);

CREATE UNIQUE INDEX uq_journal_entries_reversal_of ON journal_entries(reversal_of)
    WHERE reversal_of IS NOT NULL;
CREATE INDEX idx_journal_entries_entity_date ON journal_entries(entity_id, entry_date);
CREATE INDEX idx_journal_entries_entity_status ON journal_entries(entity_id, status);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    side entry_side NOT NULL,
    amount NUMERIC(20, 6) NOT NULL,
    description VARCHAR(500),
    dimensions JSONB NOT NULL DEFAULT '[]',
    position INTEGER NOT NULL,
    CONSTRAINT chk_journal_lines_amount_positive CHECK (amount > 0),
    CONSTRAINT uq_journal_lines_position UNIQUE (entry_id, position)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const CONSOLIDATION_SQL: &str = r"
CREATE TABLE consolidation_groups (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    currency CHAR(3) NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_consolidation_period CHECK (period_start <= period_end)
);

CREATE INDEX idx_consolidation_groups_client ON consolidation_groups(client_id);

CREATE TABLE consolidation_group_members (
    group_id UUID NOT NULL REFERENCES consolidation_groups(id) ON DELETE CASCADE,
    entity_id UUID NOT NULL REFERENCES ledger_entities(id) ON DELETE CASCADE,
    added_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (group_id, entity_id)
);
";

const AUDIT_EVENTS_SQL: &str = r"
CREATE TABLE audit_events (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    entity_id UUID,
    actor_id UUID NOT NULL,
    action VARCHAR(50) NOT NULL,
    target_id UUID,
    detail JSONB NOT NULL DEFAULT '{}',
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_events_client_time ON audit_events(client_id, occurred_at);
CREATE INDEX idx_audit_events_target ON audit_events(target_id) WHERE target_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_line_change_after_draft
-- Lines may only change while their entry is a draft
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_line_change_after_draft()
RETURNS TRIGGER AS $$
DECLARE
    parent_status entry_status;
BEGIN
    SELECT status INTO parent_status
    FROM journal_entries
    WHERE id = COALESCE(NEW.entry_id, OLD.entry_id);

    -- Cascade deletes run after the parent row is gone.
    IF parent_status IS NOT NULL AND parent_status <> 'draft' THEN
        RAISE EXCEPTION 'Lines of a % entry cannot change', parent_status;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_line_change
BEFORE INSERT OR UPDATE OR DELETE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_line_change_after_draft();

-- ============================================================
-- FUNCTION: check_entry_balance
-- Ensures debit = credit, within 0.001, when an entry leaves draft
-- ============================================================
CREATE OR REPLACE FUNCTION check_entry_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(20, 6);
    total_credit NUMERIC(20, 6);
BEGIN
    SELECT
        COALESCE(SUM(amount) FILTER (WHERE side = 'debit'), 0),
        COALESCE(SUM(amount) FILTER (WHERE side = 'credit'), 0)
    INTO total_debit, total_credit
    FROM journal_lines
    WHERE entry_id = NEW.id;

    IF ABS(total_debit - total_credit) > 0.001 THEN
        RAISE EXCEPTION 'Entry is not balanced. Debit: %, Credit: %',
            total_debit, total_credit;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_check_entry_balance
BEFORE UPDATE ON journal_entries
FOR EACH ROW
WHEN (OLD.status = 'draft' AND NEW.status <> 'draft')
EXECUTE FUNCTION check_entry_balance();

-- ============================================================
-- FUNCTION: prevent_posted_modification
-- Posted entries only move to voided or gain a reversal link
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status = 'posted' AND NEW.status NOT IN ('posted', 'voided') THEN
        RAISE EXCEPTION 'Cannot modify posted entry. Create a reversing entry instead.';
    END IF;

    IF OLD.status IN ('posted', 'voided') AND (
        NEW.entry_date <> OLD.entry_date
        OR NEW.reference_number <> OLD.reference_number
        OR NEW.description <> OLD.description
    ) THEN
        RAISE EXCEPTION 'Cannot modify % entry.', OLD.status;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_posted_mod
BEFORE UPDATE ON journal_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_posted_mod ON journal_entries;
DROP TRIGGER IF EXISTS trg_check_entry_balance ON journal_entries;
DROP TRIGGER IF EXISTS trg_prevent_line_change ON journal_lines;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_posted_modification();
DROP FUNCTION IF EXISTS check_entry_balance();
DROP FUNCTION IF EXISTS prevent_line_change_after_draft();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS audit_events CASCADE;
DROP TABLE IF EXISTS consolidation_group_members CASCADE;
DROP TABLE IF EXISTS consolidation_groups CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS ledger_entities CASCADE;

-- Drop enums
DROP TYPE IF EXISTS entry_side;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS account_type;
";
