//! Database schema migrations for the export store.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )?;

    let current_version = schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> SqliteResult<i32> {
    Ok(conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: one table per exported entity kind.
///
/// Timestamps are RFC 3339 UTC text. `tasks` and `events` keep the
/// polymorphic parent as an (`entity_type`, `entity_id`) pair, both NULL
/// when the parent was not part of the export.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL,
            email TEXT NOT NULL,
            lang  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pipelines (
            id             INTEGER PRIMARY KEY,
            name           TEXT NOT NULL,
            sort           INTEGER NOT NULL,
            is_main        INTEGER NOT NULL,
            is_unsorted_on INTEGER NOT NULL,
            is_archive     INTEGER NOT NULL,
            account_id     INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS statuses (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            sort        INTEGER NOT NULL,
            is_editable INTEGER NOT NULL,
            pipeline_id INTEGER NOT NULL,
            color       TEXT NOT NULL,
            type        INTEGER NOT NULL,
            account_id  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS companies (
            id                  INTEGER PRIMARY KEY,
            name                TEXT NOT NULL,
            responsible_user_id INTEGER NOT NULL,
            group_id            INTEGER NOT NULL,
            created_by          INTEGER NOT NULL,
            updated_by          INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            account_id          INTEGER NOT NULL,
            closest_task_at     TEXT,
            is_deleted          INTEGER NOT NULL,
            tag_id              INTEGER,
            tag_name            TEXT,
            phone               TEXT,
            broker              TEXT
        );

        CREATE TABLE IF NOT EXISTS contacts (
            id                  INTEGER PRIMARY KEY,
            name                TEXT NOT NULL,
            first_name          TEXT,
            last_name           TEXT,
            responsible_user_id INTEGER NOT NULL,
            group_id            INTEGER NOT NULL,
            created_by          INTEGER NOT NULL,
            updated_by          INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            closest_task_at     TEXT,
            is_deleted          INTEGER NOT NULL,
            is_unsorted         INTEGER NOT NULL,
            account_id          INTEGER NOT NULL,
            phone               TEXT,
            email               TEXT,
            position            TEXT,
            company_name        TEXT,
            company_id          INTEGER,
            tag_id              INTEGER,
            tag_name            TEXT,
            apartment           TEXT,
            was_in_bali         TEXT,
            geography           TEXT,
            language            TEXT
        );

        CREATE TABLE IF NOT EXISTS loss_reasons (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            sort       INTEGER,
            created_at TEXT,
            updated_at TEXT,
            account_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS leads (
            id                     INTEGER PRIMARY KEY,
            name                   TEXT NOT NULL,
            price                  INTEGER NOT NULL,
            responsible_user_id    INTEGER NOT NULL,
            group_id               INTEGER NOT NULL,
            status_id              INTEGER NOT NULL,
            pipeline_id            INTEGER NOT NULL,
            loss_reason_id         INTEGER,
            created_by             INTEGER NOT NULL,
            updated_by             INTEGER NOT NULL,
            created_at             TEXT NOT NULL,
            updated_at             TEXT NOT NULL,
            closed_at              TEXT,
            closest_task_at        TEXT,
            is_deleted             INTEGER NOT NULL,
            score                  REAL,
            account_id             INTEGER NOT NULL,
            labor_cost             REAL,
            source                 TEXT,
            payment_type           TEXT,
            readiness_to_buy       TEXT,
            object_type            TEXT,
            purchase_purpose       TEXT,
            meeting_format         TEXT,
            meeting_scheduled_at   TEXT,
            zoom_link              TEXT,
            deposit_date           TEXT,
            meeting_conducted_date TEXT,
            deal_date              TEXT,
            payment_method         TEXT,
            down_payment_percent   REAL,
            apartment_number       TEXT,
            apartment_cost         REAL,
            apartment_status       TEXT,
            comment                TEXT,
            referrer               TEXT,
            tag_name               TEXT,
            tag_id                 INTEGER,
            company_id             INTEGER,
            contact_id             INTEGER
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id                  INTEGER PRIMARY KEY,
            created_by          INTEGER NOT NULL,
            updated_by          INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            responsible_user_id INTEGER NOT NULL,
            group_id            INTEGER NOT NULL,
            entity_id           INTEGER,
            entity_type         TEXT,
            duration            INTEGER NOT NULL,
            is_completed        INTEGER NOT NULL,
            task_type_id        INTEGER NOT NULL,
            text                TEXT NOT NULL,
            result              TEXT,
            complete_till       TEXT NOT NULL,
            account_id          INTEGER NOT NULL,
            CHECK ((entity_id IS NULL) = (entity_type IS NULL))
        );

        CREATE TABLE IF NOT EXISTS events (
            id                      TEXT PRIMARY KEY,
            type                    TEXT NOT NULL,
            entity_id               INTEGER,
            entity_type             TEXT,
            created_by              INTEGER NOT NULL,
            created_at              TEXT NOT NULL,
            account_id              INTEGER NOT NULL,
            value_after_field_id    INTEGER,
            value_after_field_type  INTEGER,
            value_after_enum_id     INTEGER,
            value_after_text        TEXT,
            value_before_field_id   INTEGER,
            value_before_field_type INTEGER,
            value_before_enum_id    INTEGER,
            value_before_text       TEXT,
            CHECK ((entity_id IS NULL) = (entity_type IS NULL))
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: lookup indexes for the parent columns.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_statuses_pipeline ON statuses(pipeline_id);
         CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status_id);
         CREATE INDEX IF NOT EXISTS idx_tasks_entity ON tasks(entity_type, entity_id);
         CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
