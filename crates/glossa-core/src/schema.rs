use crate::error::Result;

/// Version string recorded in the `meta` table when a database is first
/// initialised, so readers can detect a database created by an older schema.
pub const SCHEMA_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// DDL
// ---------------------------------------------------------------------------

/// Full DDL for every table and index in the glossa SQLite schema.
///
/// All tables use `CREATE TABLE IF NOT EXISTS` so that `run_migrations` is
/// idempotent and safe to call on an already-initialised database.
pub const CREATE_TABLES: &str = "
-- -------------------------------------------------------------------------
-- languages
-- -------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS languages (
    id                  TEXT    NOT NULL PRIMARY KEY,
    name                TEXT    NOT NULL UNIQUE,
    word_characters     TEXT    NOT NULL,
    split_exceptions    TEXT    NOT NULL DEFAULT '[]',
    space_delimited     INTEGER NOT NULL DEFAULT 1,
    show_pronunciation  INTEGER NOT NULL DEFAULT 1
);

-- -------------------------------------------------------------------------
-- terms
-- -------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS terms (
    id              TEXT    NOT NULL PRIMARY KEY,
    language_id     TEXT    NOT NULL REFERENCES languages(id) ON DELETE CASCADE,
    text            TEXT    NOT NULL,
    text_lc         TEXT    NOT NULL,
    token_count     INTEGER NOT NULL DEFAULT 1,
    status          INTEGER NOT NULL DEFAULT 1,
    translation     TEXT,
    pronunciation   TEXT,
    image           TEXT,
    flash_message   TEXT,
    created_at      TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_terms_language_id
    ON terms (language_id);

CREATE INDEX IF NOT EXISTS idx_terms_text_lc
    ON terms (text_lc);

-- One row per (language, lowercase text): the dedup contract.
CREATE UNIQUE INDEX IF NOT EXISTS uq_terms_language_text_lc
    ON terms (language_id, text_lc);

-- -------------------------------------------------------------------------
-- term_tags
-- -------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS term_tags (
    id       TEXT NOT NULL PRIMARY KEY,
    term_id  TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    tag      TEXT NOT NULL,
    UNIQUE (term_id, tag)
);

CREATE INDEX IF NOT EXISTS idx_term_tags_term_id
    ON term_tags (term_id);

-- -------------------------------------------------------------------------
-- term_parents
-- -------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS term_parents (
    term_id    TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    parent_id  TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    PRIMARY KEY (term_id, parent_id)
);

CREATE INDEX IF NOT EXISTS idx_term_parents_parent_id
    ON term_parents (parent_id);

-- -------------------------------------------------------------------------
-- meta
-- -------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS meta (
    key    TEXT NOT NULL PRIMARY KEY,
    value  TEXT NOT NULL
);
";

// ---------------------------------------------------------------------------
// Migration runner
// ---------------------------------------------------------------------------

/// Initialise (or upgrade) the database schema.
///
/// This function is **idempotent**: it is safe to call on a database that
/// has already been initialised.
pub fn run_migrations(conn: &rusqlite::Connection) -> Result<()> {
    // WAL mode gives better read/write concurrency for the single-writer,
    // multiple-reader pattern used by the connection pool.
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    // SQLite does not enforce foreign keys by default; every connection must
    // opt in.
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute_batch(CREATE_TABLES)?;

    // Record the version of the schema that created this database; an
    // existing record is left untouched so older databases stay detectable.
    conn.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![SCHEMA_VERSION],
    )?;

    Ok(())
}

/// The schema version recorded when the database was first initialised.
pub fn schema_version(conn: &rusqlite::Connection) -> Result<String> {
    let version = conn.query_row(
        "SELECT value FROM meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
