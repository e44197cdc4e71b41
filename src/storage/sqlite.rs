//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the IndexStore trait.

use crate::config::RecrawlPolicy;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{IndexStore, StorageError, StorageResult};
use crate::storage::{
    decode_positions, encode_positions, Field, IndexCounts, Keyword, PageMeta, PageRecord,
    Posting, RunRecord, RunStatus, TermFrequencies,
};
use crate::text::Token;
use crate::SpindexError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const CHILD_LINK_LIMIT: usize = 10;

const PAGE_COLUMNS: &str =
    "id, url, title, last_modified, size, body_length, title_length, indexed_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SpindexError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SpindexError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SpindexError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn row_to_page(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        last_modified: row.get(3)?,
        size: row.get::<_, Option<i64>>(4)?.map(|s| s.max(0) as u64),
        body_length: row.get(5)?,
        title_length: row.get(6)?,
        indexed_at: row.get(7)?,
    })
}

/// Returns the id of the page row for `url`, inserting a placeholder if needed
fn page_id_for(conn: &Connection, url: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO pages (url) VALUES (?1)", params![url])?;
    conn.query_row("SELECT id FROM pages WHERE url = ?1", params![url], |row| {
        row.get(0)
    })
}

fn term_id_for(conn: &Connection, stem: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO terms (stem) VALUES (?1)", params![stem])?;
    conn.query_row("SELECT id FROM terms WHERE stem = ?1", params![stem], |row| {
        row.get(0)
    })
}

fn find_posting(
    conn: &Connection,
    term_id: i64,
    page_id: i64,
    field: Field,
) -> rusqlite::Result<Option<Posting>> {
    let sql = format!(
        "SELECT frequency, positions FROM {} WHERE term_id = ?1 AND page_id = ?2",
        field.postings_table()
    );
    conn.query_row(&sql, params![term_id, page_id], |row| {
        Ok(Posting {
            frequency: row.get(0)?,
            positions: decode_positions(&row.get::<_, String>(1)?),
        })
    })
    .optional()
}

/// Drops a page's postings for one field, keeping the DF cache consistent
fn clear_field(conn: &Connection, page_id: i64, field: Field) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "UPDATE {df} SET df = df - 1
             WHERE term_id IN (SELECT term_id FROM {postings} WHERE page_id = ?1)",
            df = field.df_table(),
            postings = field.postings_table()
        ),
        params![page_id],
    )?;
    conn.execute(
        &format!("DELETE FROM {} WHERE df <= 0", field.df_table()),
        [],
    )?;
    conn.execute(
        &format!("DELETE FROM {} WHERE page_id = ?1", field.postings_table()),
        params![page_id],
    )?;
    Ok(())
}

fn count(conn: &Connection, sql: &str) -> StorageResult<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

impl IndexStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                row_to_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                row_to_run,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Index Writes =====

    fn add_field_entry(
        &mut self,
        page: &PageMeta,
        field: Field,
        tokens: &[Token],
        policy: RecrawlPolicy,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let page_id = page_id_for(&tx, &page.url)?;
        tx.execute(
            &format!(
                "UPDATE pages SET title = ?1, last_modified = ?2, size = ?3, {} = ?4, indexed_at = ?5
                 WHERE id = ?6",
                field.length_column()
            ),
            params![
                page.title,
                page.last_modified,
                page.size as i64,
                tokens.len() as i64,
                Utc::now().to_rfc3339(),
                page_id
            ],
        )?;

        if policy == RecrawlPolicy::Replace {
            clear_field(&tx, page_id, field)?;
        }

        let mut grouped: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for (stem, position) in tokens {
            grouped.entry(stem.as_str()).or_default().push(*position);
        }

        let mut max_tf = 0u32;
        for (stem, positions) in grouped {
            let term_id = term_id_for(&tx, stem)?;

            let merged = match find_posting(&tx, term_id, page_id, field)? {
                Some(mut existing) => {
                    existing.positions.extend(positions);
                    tx.execute(
                        &format!(
                            "UPDATE {} SET frequency = ?1, positions = ?2
                             WHERE term_id = ?3 AND page_id = ?4",
                            field.postings_table()
                        ),
                        params![
                            existing.positions.len() as i64,
                            encode_positions(&existing.positions),
                            term_id,
                            page_id
                        ],
                    )?;
                    existing.positions
                }
                None => {
                    tx.execute(
                        &format!(
                            "INSERT INTO {} (term_id, page_id, frequency, positions)
                             VALUES (?1, ?2, ?3, ?4)",
                            field.postings_table()
                        ),
                        params![
                            term_id,
                            page_id,
                            positions.len() as i64,
                            encode_positions(&positions)
                        ],
                    )?;
                    // First appearance of this term in this (page, field)
                    tx.execute(
                        &format!(
                            "INSERT INTO {} (term_id, df) VALUES (?1, 1)
                             ON CONFLICT(term_id) DO UPDATE SET df = df + 1",
                            field.df_table()
                        ),
                        params![term_id],
                    )?;
                    positions
                }
            };

            max_tf = max_tf.max(merged.len() as u32);
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (page_id, maxtf) VALUES (?1, ?2)
                 ON CONFLICT(page_id) DO UPDATE SET maxtf = excluded.maxtf",
                field.maxtf_table()
            ),
            params![page_id, max_tf],
        )?;

        tx.commit()?;
        Ok(page_id)
    }

    fn add_link(&mut self, parent_url: &str, child_url: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        let parent_id = page_id_for(&tx, parent_url)?;
        let child_id = page_id_for(&tx, child_url)?;
        tx.execute(
            "INSERT OR IGNORE INTO links (parent_id, child_id) VALUES (?1, ?2)",
            params![parent_id, child_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ===== Page Lookups =====

    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>> {
        let sql = format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS);
        let page = self
            .conn
            .query_row(&sql, params![page_id], row_to_page)
            .optional()?;
        Ok(page)
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let sql = format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS);
        let page = self
            .conn
            .query_row(&sql, params![url], row_to_page)
            .optional()?;
        Ok(page)
    }

    fn indexed_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT {} FROM pages WHERE indexed_at IS NOT NULL ORDER BY id",
            PAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map([], row_to_page)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn count_indexed_pages(&self) -> StorageResult<u64> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM pages WHERE indexed_at IS NOT NULL",
        )
    }

    // ===== Postings and Caches =====

    fn pages_with_term(&self, term: &str, field: Field) -> StorageResult<Vec<i64>> {
        let sql = format!(
            "SELECT p.page_id FROM {} p JOIN terms t ON t.id = p.term_id
             WHERE t.stem = ?1 ORDER BY p.page_id",
            field.postings_table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![term], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn posting(&self, term: &str, page_id: i64, field: Field) -> StorageResult<Posting> {
        let sql = format!(
            "SELECT p.frequency, p.positions FROM {} p JOIN terms t ON t.id = p.term_id
             WHERE t.stem = ?1 AND p.page_id = ?2",
            field.postings_table()
        );
        let posting = self
            .conn
            .query_row(&sql, params![term, page_id], |row| {
                Ok(Posting {
                    frequency: row.get(0)?,
                    positions: decode_positions(&row.get::<_, String>(1)?),
                })
            })
            .optional()?;
        Ok(posting.unwrap_or_default())
    }

    fn document_frequency(&self, term: &str, field: Field) -> StorageResult<u32> {
        let sql = format!(
            "SELECT d.df FROM {} d JOIN terms t ON t.id = d.term_id WHERE t.stem = ?1",
            field.df_table()
        );
        let df: Option<i64> = self
            .conn
            .query_row(&sql, params![term], |row| row.get(0))
            .optional()?;
        Ok(df.unwrap_or(0).max(0) as u32)
    }

    fn max_term_frequency(&self, page_id: i64, field: Field) -> StorageResult<u32> {
        let sql = format!(
            "SELECT maxtf FROM {} WHERE page_id = ?1",
            field.maxtf_table()
        );
        let max_tf: Option<u32> = self
            .conn
            .query_row(&sql, params![page_id], |row| row.get(0))
            .optional()?;
        Ok(max_tf.unwrap_or(0))
    }

    fn page_terms(&self, page_id: i64) -> StorageResult<Vec<TermFrequencies>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.stem, SUM(x.body), SUM(x.title) FROM (
                 SELECT term_id, frequency AS body, 0 AS title
                 FROM body_postings WHERE page_id = ?1
                 UNION ALL
                 SELECT term_id, 0 AS body, frequency AS title
                 FROM title_postings WHERE page_id = ?1
             ) x
             JOIN terms t ON t.id = x.term_id
             GROUP BY t.stem
             ORDER BY t.stem",
        )?;
        let terms = stmt
            .query_map(params![page_id], |row| {
                Ok(TermFrequencies {
                    term: row.get(0)?,
                    body: row.get(1)?,
                    title: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }

    // ===== Link Graph =====

    fn parent_urls(&self, page_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.url FROM links l JOIN pages p ON p.id = l.parent_id
             WHERE l.child_id = ?1 ORDER BY l.rowid",
        )?;
        let urls = stmt
            .query_map(params![page_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn child_urls(&self, page_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.url FROM links l JOIN pages p ON p.id = l.child_id
             WHERE l.parent_id = ?1 ORDER BY l.rowid LIMIT ?2",
        )?;
        let urls = stmt
            .query_map(params![page_id, CHILD_LINK_LIMIT as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    // ===== Reporting =====

    fn top_keywords(
        &self,
        page_id: i64,
        limit: usize,
        stopwords: &HashSet<String>,
    ) -> StorageResult<Vec<Keyword>> {
        let mut keywords: Vec<Keyword> = self
            .page_terms(page_id)?
            .into_iter()
            .filter(|t| !stopwords.contains(&t.term))
            .map(|t| Keyword {
                frequency: t.body + t.title,
                term: t.term,
            })
            .collect();

        keywords.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.term.cmp(&b.term))
        });
        keywords.truncate(limit);
        Ok(keywords)
    }

    fn counts(&self) -> StorageResult<IndexCounts> {
        Ok(IndexCounts {
            total_pages: count(&self.conn, "SELECT COUNT(*) FROM pages")?,
            indexed_pages: self.count_indexed_pages()?,
            terms: count(&self.conn, "SELECT COUNT(*) FROM terms")?,
            body_postings: count(&self.conn, "SELECT COUNT(*) FROM body_postings")?,
            title_postings: count(&self.conn, "SELECT COUNT(*) FROM title_postings")?,
            links: count(&self.conn, "SELECT COUNT(*) FROM links")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Normalizer;

    fn meta(url: &str, title: &str) -> PageMeta {
        PageMeta {
            url: url.to_string(),
            title: title.to_string(),
            last_modified: "Mon, 01 Jan 2024 00:00:00 GMT".to_string(),
            size: 1024,
        }
    }

    fn tokens(text: &str) -> Vec<Token> {
        Normalizer::without_stopwords().normalize(text)
    }

    fn distinct_pages(storage: &SqliteStorage, term: &str, field: Field) -> u32 {
        storage.pages_with_term(term, field).unwrap().len() as u32
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_and_finish_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        assert!(run_id > 0);

        storage.finish_run(run_id, RunStatus::Interrupted).unwrap();
        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Interrupted);
        assert!(run.finished_at.is_some());
        assert_eq!(run.config_hash, "test_hash");
    }

    #[test]
    fn test_latest_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());

        storage.create_run("a").unwrap();
        let second = storage.create_run("b").unwrap();
        storage.complete_run(second).unwrap();

        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.status, RunStatus::Completed);
    }

    #[test]
    fn test_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(99),
            Err(StorageError::RunNotFound(99))
        ));
        assert!(storage.finish_run(99, RunStatus::Completed).is_err());
    }

    #[test]
    fn test_frequency_matches_positions() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page_id = storage
            .add_field_entry(
                &meta("https://example.com/", "Home"),
                Field::Body,
                &tokens("search engine search index search"),
                RecrawlPolicy::Accumulate,
            )
            .unwrap();

        let posting = storage.posting("search", page_id, Field::Body).unwrap();
        assert_eq!(posting.frequency, 3);
        assert_eq!(posting.positions, vec![0, 2, 4]);
        assert_eq!(posting.frequency as usize, posting.positions.len());
    }

    #[test]
    fn test_page_row_updated() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page_id = storage
            .add_field_entry(
                &meta("https://example.com/", "Home Page"),
                Field::Title,
                &tokens("Home Page"),
                RecrawlPolicy::Accumulate,
            )
            .unwrap();

        let page = storage.get_page(page_id).unwrap().unwrap();
        assert_eq!(page.title.as_deref(), Some("Home Page"));
        assert_eq!(page.size, Some(1024));
        assert_eq!(page.title_length, 2);
        assert_eq!(page.body_length, 0);
        assert!(page.is_indexed());
        assert_eq!(storage.count_indexed_pages().unwrap(), 1);
    }

    #[test]
    fn test_document_frequency_counts_distinct_pages_under_reindex() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = meta("https://example.com/a", "A");
        let b = meta("https://example.com/b", "B");

        storage
            .add_field_entry(&a, Field::Body, &tokens("rust crawler"), RecrawlPolicy::Accumulate)
            .unwrap();
        storage
            .add_field_entry(&b, Field::Body, &tokens("rust index"), RecrawlPolicy::Accumulate)
            .unwrap();
        // Re-indexing page A must not bump the DF of "rust" again
        storage
            .add_field_entry(&a, Field::Body, &tokens("rust crawler"), RecrawlPolicy::Accumulate)
            .unwrap();

        for term in ["rust", "crawler", "index"] {
            assert_eq!(
                storage.document_frequency(term, Field::Body).unwrap(),
                distinct_pages(&storage, term, Field::Body),
                "df of {}",
                term
            );
        }
        assert_eq!(storage.document_frequency("rust", Field::Body).unwrap(), 2);
        assert_eq!(storage.document_frequency("rust", Field::Title).unwrap(), 0);
    }

    #[test]
    fn test_accumulate_appends_positions() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page = meta("https://example.com/", "Home");
        let id = storage
            .add_field_entry(&page, Field::Body, &tokens("alpha beta"), RecrawlPolicy::Accumulate)
            .unwrap();
        storage
            .add_field_entry(&page, Field::Body, &tokens("alpha"), RecrawlPolicy::Accumulate)
            .unwrap();

        let posting = storage.posting("alpha", id, Field::Body).unwrap();
        assert_eq!(posting.frequency, 2);
        assert_eq!(posting.positions, vec![0, 0]);
        assert_eq!(storage.max_term_frequency(id, Field::Body).unwrap(), 2);
    }

    #[test]
    fn test_max_tf_overwritten_per_pass() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page = meta("https://example.com/", "Home");
        let id = storage
            .add_field_entry(
                &page,
                Field::Body,
                &tokens("alpha alpha alpha beta"),
                RecrawlPolicy::Replace,
            )
            .unwrap();
        assert_eq!(storage.max_term_frequency(id, Field::Body).unwrap(), 3);

        storage
            .add_field_entry(&page, Field::Body, &tokens("gamma beta"), RecrawlPolicy::Replace)
            .unwrap();
        assert_eq!(storage.max_term_frequency(id, Field::Body).unwrap(), 1);

        storage
            .add_field_entry(&page, Field::Body, &[], RecrawlPolicy::Replace)
            .unwrap();
        assert_eq!(storage.max_term_frequency(id, Field::Body).unwrap(), 0);
    }

    #[test]
    fn test_replace_policy_keeps_df_consistent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = meta("https://example.com/a", "A");
        let b = meta("https://example.com/b", "B");

        storage
            .add_field_entry(&a, Field::Body, &tokens("old rust"), RecrawlPolicy::Replace)
            .unwrap();
        storage
            .add_field_entry(&b, Field::Body, &tokens("rust"), RecrawlPolicy::Replace)
            .unwrap();
        let a_id = storage
            .add_field_entry(&a, Field::Body, &tokens("new rust"), RecrawlPolicy::Replace)
            .unwrap();

        assert_eq!(storage.document_frequency("old", Field::Body).unwrap(), 0);
        assert_eq!(storage.document_frequency("new", Field::Body).unwrap(), 1);
        assert_eq!(storage.document_frequency("rust", Field::Body).unwrap(), 2);

        let posting = storage.posting("rust", a_id, Field::Body).unwrap();
        assert_eq!(posting.positions, vec![1]);
    }

    #[test]
    fn test_link_idempotent_with_placeholders() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .add_link("https://example.com/", "https://example.com/a")
            .unwrap();
        storage
            .add_link("https://example.com/", "https://example.com/a")
            .unwrap();

        let counts = storage.counts().unwrap();
        assert_eq!(counts.links, 1);
        assert_eq!(counts.total_pages, 2);
        assert_eq!(counts.indexed_pages, 0);

        let child = storage
            .get_page_by_url("https://example.com/a")
            .unwrap()
            .unwrap();
        assert!(!child.is_indexed());
        assert_eq!(
            storage.parent_urls(child.id).unwrap(),
            vec!["https://example.com/".to_string()]
        );
    }

    #[test]
    fn test_child_urls_capped() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        for i in 0..15 {
            storage
                .add_link("https://example.com/", &format!("https://example.com/{}", i))
                .unwrap();
        }
        let parent = storage
            .get_page_by_url("https://example.com/")
            .unwrap()
            .unwrap();

        let children = storage.child_urls(parent.id).unwrap();
        assert_eq!(children.len(), 10);
        assert_eq!(children[0], "https://example.com/0");
    }

    #[test]
    fn test_top_keywords_combined_frequency() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page = meta("https://example.com/", "Rust Search");
        storage
            .add_field_entry(&page, Field::Title, &tokens("rust search"), RecrawlPolicy::Accumulate)
            .unwrap();
        let id = storage
            .add_field_entry(
                &page,
                Field::Body,
                &tokens("search search index crawler rust zebra yak"),
                RecrawlPolicy::Accumulate,
            )
            .unwrap();

        let stopwords: HashSet<String> = ["yak".to_string()].into_iter().collect();
        let keywords = storage.top_keywords(id, 5, &stopwords).unwrap();
        let rendered: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();

        assert_eq!(
            rendered,
            vec!["search(3)", "rust(2)", "crawler(1)", "index(1)", "zebra(1)"]
        );
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.pages_with_term("missing", Field::Body).unwrap().is_empty());
        assert_eq!(storage.posting("missing", 7, Field::Title).unwrap(), Posting::default());
        assert_eq!(storage.document_frequency("missing", Field::Body).unwrap(), 0);
        assert_eq!(storage.max_term_frequency(7, Field::Body).unwrap(), 0);
        assert!(storage.get_page(7).unwrap().is_none());
        assert!(storage.get_page_by_url("https://nowhere/").unwrap().is_none());
        assert!(storage.parent_urls(7).unwrap().is_empty());
        assert!(storage.child_urls(7).unwrap().is_empty());
        assert!(storage.page_terms(7).unwrap().is_empty());
        assert_eq!(storage.count_indexed_pages().unwrap(), 0);
    }

    #[test]
    fn test_page_terms_merges_fields() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page = meta("https://example.com/", "Rust");
        storage
            .add_field_entry(&page, Field::Title, &tokens("rust"), RecrawlPolicy::Accumulate)
            .unwrap();
        let id = storage
            .add_field_entry(&page, Field::Body, &tokens("rust rust crate"), RecrawlPolicy::Accumulate)
            .unwrap();

        let terms = storage.page_terms(id).unwrap();
        assert_eq!(
            terms,
            vec![
                TermFrequencies {
                    term: "crate".to_string(),
                    body: 1,
                    title: 0
                },
                TermFrequencies {
                    term: "rust".to_string(),
                    body: 2,
                    title: 1
                },
            ]
        );
    }
}
