//! SQL schema for the Curio SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    slug        TEXT NOT NULL UNIQUE,
    prefix      TEXT
);

CREATE TABLE IF NOT EXISTS candidates (
    candidate_id     TEXT PRIMARY KEY,
    image_ref        TEXT NOT NULL,
    category         TEXT NOT NULL,   -- free-text hint, resolved on approval
    notes            TEXT,
    analysis_json    TEXT NOT NULL,
    image_json       TEXT NOT NULL,
    quote_json       TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending'
                     CHECK (status IN ('pending', 'approved', 'rejected')),
    catalog_entry_id TEXT,
    reviewer         TEXT,
    reviewed_at      TEXT,
    review_notes     TEXT,
    annotation       TEXT,
    created_at       TEXT NOT NULL
);

-- Every (year, sequence) pair ever committed. Rows are never deleted, so a
-- sequence freed by deleting its entry is still unavailable.
CREATE TABLE IF NOT EXISTS sequence_claims (
    year       INTEGER NOT NULL,
    sequence   INTEGER NOT NULL,
    identifier TEXT NOT NULL UNIQUE,
    claimed_at TEXT NOT NULL,
    PRIMARY KEY (year, sequence)
);

CREATE TABLE IF NOT EXISTS entries (
    entry_id     TEXT PRIMARY KEY,
    identifier   TEXT NOT NULL UNIQUE,
    candidate_id TEXT NOT NULL UNIQUE REFERENCES candidates(candidate_id),
    title        TEXT NOT NULL,
    slug         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL,
    price        REAL NOT NULL CHECK (price > 0),
    category_id  TEXT NOT NULL REFERENCES categories(category_id),
    condition    TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'active',
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS candidates_status_idx  ON candidates(status);
CREATE INDEX IF NOT EXISTS candidates_created_idx ON candidates(created_at);
CREATE INDEX IF NOT EXISTS entries_category_idx   ON entries(category_id);

PRAGMA user_version = 1;
";
