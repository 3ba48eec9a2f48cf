//! Idempotent DDL for the result tables, executed at startup.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

/// Column limits shared by the DDL and the in-memory store.
pub mod limits {
    pub const BRANCH: usize = 100;
    pub const REVISION: usize = 256;
    pub const PLATFORM: usize = 100;
    pub const TYP: usize = 32;
    pub const RUN_INFO: usize = 255;
    pub const TEST_NAME: usize = 255;
    pub const TEST_VARIANT: usize = 64;
    pub const INFO_TEXT: usize = 255;
}

/// SQL migration for the result tables.
///
/// `dt` is server-assigned on insert and refreshed by a trigger on update.
pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS test_run (
    id          BIGSERIAL PRIMARY KEY,
    branch      VARCHAR(100),
    revision    VARCHAR(256),
    platform    VARCHAR(100) NOT NULL,
    dt          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    bbnum       INTEGER NOT NULL,
    typ         VARCHAR(32) NOT NULL,
    info        VARCHAR(255)
);

CREATE INDEX IF NOT EXISTS idx_test_run_branch ON test_run (branch, revision);
CREATE INDEX IF NOT EXISTS idx_test_run_dt ON test_run (dt);
CREATE INDEX IF NOT EXISTS idx_test_run_platform ON test_run (platform, bbnum);

CREATE OR REPLACE FUNCTION test_run_touch_dt() RETURNS TRIGGER AS $$
BEGIN
    NEW.dt = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE OR REPLACE TRIGGER trg_test_run_touch_dt
    BEFORE UPDATE ON test_run
    FOR EACH ROW EXECUTE FUNCTION test_run_touch_dt();

CREATE TABLE IF NOT EXISTS test_failure (
    test_run_id     BIGINT NOT NULL REFERENCES test_run(id),
    test_name       VARCHAR(255) NOT NULL,
    test_variant    VARCHAR(64) NOT NULL DEFAULT 'N/A',
    info_text       VARCHAR(255),
    failure_text    TEXT,
    PRIMARY KEY (test_run_id, test_name, test_variant)
);
"#;

/// Create the result tables if they do not exist yet.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("results migration failed: {e}"))?;
    Ok(())
}
