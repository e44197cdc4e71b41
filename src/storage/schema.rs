//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Spindex database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Every page ever referenced; indexed_at is NULL for link-only placeholders
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT,
    last_modified TEXT,
    size INTEGER,
    body_length INTEGER NOT NULL DEFAULT 0,
    title_length INTEGER NOT NULL DEFAULT 0,
    indexed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_indexed ON pages(indexed_at);

-- Vocabulary of stems
CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stem TEXT NOT NULL UNIQUE
);

-- Positional postings, positions stored comma separated
CREATE TABLE IF NOT EXISTS body_postings (
    term_id INTEGER NOT NULL REFERENCES terms(id),
    page_id INTEGER NOT NULL REFERENCES pages(id),
    frequency INTEGER NOT NULL,
    positions TEXT NOT NULL,
    PRIMARY KEY (term_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_body_postings_page ON body_postings(page_id);

CREATE TABLE IF NOT EXISTS title_postings (
    term_id INTEGER NOT NULL REFERENCES terms(id),
    page_id INTEGER NOT NULL REFERENCES pages(id),
    frequency INTEGER NOT NULL,
    positions TEXT NOT NULL,
    PRIMARY KEY (term_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_title_postings_page ON title_postings(page_id);

-- Document frequency caches
CREATE TABLE IF NOT EXISTS body_df (
    term_id INTEGER PRIMARY KEY REFERENCES terms(id),
    df INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS title_df (
    term_id INTEGER PRIMARY KEY REFERENCES terms(id),
    df INTEGER NOT NULL
);

-- Max term frequency caches
CREATE TABLE IF NOT EXISTS body_maxtf (
    page_id INTEGER PRIMARY KEY REFERENCES pages(id),
    maxtf INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS title_maxtf (
    page_id INTEGER PRIMARY KEY REFERENCES pages(id),
    maxtf INTEGER NOT NULL
);

-- Parent/child link graph
CREATE TABLE IF NOT EXISTS links (
    parent_id INTEGER NOT NULL REFERENCES pages(id),
    child_id INTEGER NOT NULL REFERENCES pages(id),
    PRIMARY KEY (parent_id, child_id)
);

CREATE INDEX IF NOT EXISTS idx_links_child ON links(child_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
