use chrono::SecondsFormat;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use crate::error::{GlossaError, Result};
use crate::language::Language;
use crate::schema::run_migrations;
use crate::term::{Term, TermStatus};

// ---------------------------------------------------------------------------
// Pool type alias
// ---------------------------------------------------------------------------

pub type DbPool = Pool<SqliteConnectionManager>;

// ---------------------------------------------------------------------------
// Pool constructors
// ---------------------------------------------------------------------------

/// Open a connection pool backed by a file-based SQLite database.
pub fn create_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(16)
        .build(manager)
        .map_err(|e| GlossaError::Internal(e.to_string()))?;

    let conn = pool.get().map_err(|e| GlossaError::Internal(e.to_string()))?;
    run_migrations(&conn)?;

    Ok(pool)
}

/// Open a connection pool backed by an in-memory SQLite database.
///
/// The pool is capped at one connection: each in-memory connection would
/// otherwise open its own private database.
pub fn create_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| GlossaError::Internal(e.to_string()))?;

    let conn = pool.get().map_err(|e| GlossaError::Internal(e.to_string()))?;
    run_migrations(&conn)?;

    Ok(pool)
}

// ---------------------------------------------------------------------------
// TermFilter
// ---------------------------------------------------------------------------

/// Filters for term listings and exports.
///
/// The default filter lists every term except ignored ones.
#[derive(Debug, Clone, Default)]
pub struct TermFilter {
    pub language_id: Option<Uuid>,
    pub status_min: Option<TermStatus>,
    pub status_max: Option<TermStatus>,
    /// Only terms that are the parent of at least one other term.
    pub parents_only: bool,
    pub include_ignored: bool,
    /// Minimum age in days since the term was created.
    pub age_min_days: Option<i64>,
    pub age_max_days: Option<i64>,
    /// Case-insensitive substring match on the term text.
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// TermStore trait
// ---------------------------------------------------------------------------

/// Persistence interface for languages and terms.
///
/// `save_term` persists a term's tags and parent links along with the term
/// row; parent terms themselves must already be persisted. Loaded terms
/// carry their parents one level deep (the parents' own tags and parents
/// are left empty).
pub trait TermStore: Send + Sync {
    fn insert_language(&self, language: &Language) -> Result<()>;
    fn get_language(&self, id: &Uuid) -> Result<Language>;
    fn list_languages(&self) -> Result<Vec<Language>>;

    /// Insert or update a term by id.
    fn save_term(&self, term: &Term) -> Result<()>;
    fn get_term(&self, id: &Uuid) -> Result<Term>;
    fn delete_term(&self, id: &Uuid) -> Result<()>;

    /// Find the persisted term matching `spec`'s (language, text_lc) pair.
    fn find_by_spec(&self, spec: &Term) -> Result<Option<Term>>;

    /// Substring search on `text_lc` within one language, exact match
    /// first. Empty search text returns no rows.
    fn find_matches(&self, language_id: &Uuid, text: &str) -> Result<Vec<Term>>;

    fn list_terms(&self, filter: &TermFilter) -> Result<Vec<Term>>;
}

// ---------------------------------------------------------------------------
// SqliteTermStore
// ---------------------------------------------------------------------------

pub struct SqliteTermStore {
    pool: DbPool,
}

impl SqliteTermStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| GlossaError::Internal(e.to_string()))
    }
}

const TERM_COLUMNS: &str = "id, language_id, text, text_lc, token_count, status, \
                            translation, pronunciation, image, flash_message, created_at";

// ---------------------------------------------------------------------------
// Helper: row -> Term (without tags / parents)
// ---------------------------------------------------------------------------

fn row_to_term(row: &rusqlite::Row<'_>) -> rusqlite::Result<Term> {
    let id_str: String = row.get(0)?;
    let language_id_str: String = row.get(1)?;
    let text: String = row.get(2)?;
    let text_lc: String = row.get(3)?;
    let token_count: i64 = row.get(4)?;
    let status: i64 = row.get(5)?;
    let translation: Option<String> = row.get(6)?;
    let pronunciation: Option<String> = row.get(7)?;
    let image: Option<String> = row.get(8)?;
    let flash_message: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let language_id = Uuid::parse_str(&language_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Term {
        id,
        language_id,
        text,
        text_lc,
        token_count: token_count as usize,
        status: TermStatus::from(status),
        translation,
        pronunciation,
        image,
        flash_message,
        tags: Vec::new(),
        parents: Vec::new(),
        created_at,
    })
}

// ---------------------------------------------------------------------------
// Helper: populate tags + parents onto a flat term list
// ---------------------------------------------------------------------------

fn populate_tags_and_parents(conn: &rusqlite::Connection, terms: &mut Vec<Term>) -> Result<()> {
    for term in terms.iter_mut() {
        let mut stmt = conn.prepare_cached(
            "SELECT tag FROM term_tags WHERE term_id = ?1 ORDER BY tag ASC",
        )?;
        let tags: Vec<String> = stmt
            .query_map(params![term.id.to_string()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        term.tags = tags;

        let mut stmt = conn.prepare_cached(
            "SELECT t.id, t.language_id, t.text, t.text_lc, t.token_count, t.status,
                    t.translation, t.pronunciation, t.image, t.flash_message, t.created_at
               FROM terms t
               JOIN term_parents tp ON tp.parent_id = t.id
              WHERE tp.term_id = ?1
              ORDER BY t.text_lc ASC",
        )?;
        let parents: Vec<Term> = stmt
            .query_map(params![term.id.to_string()], row_to_term)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        term.parents = parents;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helper: language row parts -> Language
// ---------------------------------------------------------------------------

fn language_from_parts(
    id_str: String,
    name: String,
    word_characters: String,
    exceptions_json: String,
    space_delimited: i64,
    show_pronunciation: i64,
) -> Result<Language> {
    let id = Uuid::parse_str(&id_str).map_err(|e| GlossaError::InvalidInput(e.to_string()))?;
    let split_exceptions: Vec<String> = serde_json::from_str(&exceptions_json)?;
    Language::from_parts(
        id,
        name,
        word_characters,
        split_exceptions,
        space_delimited != 0,
        show_pronunciation != 0,
    )
}

// ---------------------------------------------------------------------------
// TermStore implementation
// ---------------------------------------------------------------------------

impl TermStore for SqliteTermStore {
    fn insert_language(&self, language: &Language) -> Result<()> {
        let conn = self.conn()?;
        let exceptions_json = serde_json::to_string(language.split_exceptions())?;

        conn.execute(
            "INSERT INTO languages
                (id, name, word_characters, split_exceptions, space_delimited, show_pronunciation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                language.id.to_string(),
                language.name,
                language.word_characters(),
                exceptions_json,
                language.space_delimited as i64,
                language.show_pronunciation as i64,
            ],
        )?;
        Ok(())
    }

    fn get_language(&self, id: &Uuid) -> Result<Language> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT id, name, word_characters, split_exceptions, space_delimited, show_pronunciation
               FROM languages
              WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        );

        match result {
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(GlossaError::NotFound(format!("language {id}")))
            }
            Err(e) => Err(GlossaError::Database(e)),
            Ok((id_str, name, wc, exc, sd, sp)) => language_from_parts(id_str, name, wc, exc, sd, sp),
        }
    }

    fn list_languages(&self) -> Result<Vec<Language>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, word_characters, split_exceptions, space_delimited, show_pronunciation
               FROM languages
              ORDER BY name ASC",
        )?;
        let rows: Vec<(String, String, String, String, i64, i64)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut languages = Vec::with_capacity(rows.len());
        for (id_str, name, wc, exc, sd, sp) in rows {
            languages.push(language_from_parts(id_str, name, wc, exc, sd, sp)?);
        }
        Ok(languages)
    }

    fn save_term(&self, term: &Term) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO terms
                (id, language_id, text, text_lc, token_count, status,
                 translation, pronunciation, image, flash_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                 language_id   = excluded.language_id,
                 text          = excluded.text,
                 text_lc       = excluded.text_lc,
                 token_count   = excluded.token_count,
                 status        = excluded.status,
                 translation   = excluded.translation,
                 pronunciation = excluded.pronunciation,
                 image         = excluded.image,
                 flash_message = excluded.flash_message",
            params![
                term.id.to_string(),
                term.language_id.to_string(),
                term.text,
                term.text_lc,
                term.token_count as i64,
                term.status.as_i64(),
                term.translation,
                term.pronunciation,
                term.image,
                term.flash_message,
                term.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ],
        )?;

        tx.execute(
            "DELETE FROM term_tags WHERE term_id = ?1",
            params![term.id.to_string()],
        )?;
        for tag in &term.tags {
            tx.execute(
                "INSERT OR IGNORE INTO term_tags (id, term_id, tag) VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), term.id.to_string(), tag],
            )?;
        }

        tx.execute(
            "DELETE FROM term_parents WHERE term_id = ?1",
            params![term.id.to_string()],
        )?;
        for parent in &term.parents {
            tx.execute(
                "INSERT OR IGNORE INTO term_parents (term_id, parent_id) VALUES (?1, ?2)",
                params![term.id.to_string(), parent.id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_term(&self, id: &Uuid) -> Result<Term> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {TERM_COLUMNS} FROM terms WHERE id = ?1"),
            params![id.to_string()],
            row_to_term,
        );

        let term = match result {
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(GlossaError::NotFound(format!("term {id}")));
            }
            Err(e) => return Err(GlossaError::Database(e)),
            Ok(t) => t,
        };

        let mut terms = vec![term];
        populate_tags_and_parents(&conn, &mut terms)?;
        Ok(terms.remove(0))
    }

    fn delete_term(&self, id: &Uuid) -> Result<()> {
        let conn = self.conn()?;

        let affected = conn.execute("DELETE FROM terms WHERE id = ?1", params![id.to_string()])?;

        if affected == 0 {
            return Err(GlossaError::NotFound(format!("term {id}")));
        }
        Ok(())
    }

    fn find_by_spec(&self, spec: &Term) -> Result<Option<Term>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {TERM_COLUMNS} FROM terms WHERE language_id = ?1 AND text_lc = ?2"),
            params![spec.language_id.to_string(), spec.text_lc],
            row_to_term,
        );

        match result {
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(GlossaError::Database(e)),
            Ok(term) => {
                let mut terms = vec![term];
                populate_tags_and_parents(&conn, &mut terms)?;
                Ok(Some(terms.remove(0)))
            }
        }
    }

    fn find_matches(&self, language_id: &Uuid, text: &str) -> Result<Vec<Term>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {TERM_COLUMNS}
               FROM terms
              WHERE language_id = ?1 AND text_lc LIKE '%' || ?2 || '%'
              ORDER BY (text_lc = ?2) DESC, text_lc ASC
              LIMIT 50"
        ))?;
        let mut terms: Vec<Term> = stmt
            .query_map(params![language_id.to_string(), needle], row_to_term)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        populate_tags_and_parents(&conn, &mut terms)?;
        Ok(terms)
    }

    fn list_terms(&self, filter: &TermFilter) -> Result<Vec<Term>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {TERM_COLUMNS} FROM terms WHERE 1=1");
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(language_id) = &filter.language_id {
            sql.push_str(" AND language_id = ?");
            values.push(Box::new(language_id.to_string()));
        }
        if let Some(min) = filter.status_min {
            sql.push_str(" AND status >= ?");
            values.push(Box::new(min.as_i64()));
        }
        if let Some(max) = filter.status_max {
            sql.push_str(" AND status <= ?");
            values.push(Box::new(max.as_i64()));
        }
        if !filter.include_ignored {
            sql.push_str(" AND status <> ?");
            values.push(Box::new(TermStatus::Ignored.as_i64()));
        }
        if filter.parents_only {
            sql.push_str(" AND EXISTS (SELECT 1 FROM term_parents tp WHERE tp.parent_id = terms.id)");
        }
        if let Some(days) = filter.age_min_days {
            sql.push_str(" AND julianday('now') - julianday(created_at) >= ?");
            values.push(Box::new(days));
        }
        if let Some(days) = filter.age_max_days {
            sql.push_str(" AND julianday('now') - julianday(created_at) <= ?");
            values.push(Box::new(days));
        }
        if let Some(search) = &filter.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                sql.push_str(" AND text_lc LIKE '%' || ? || '%'");
                values.push(Box::new(needle));
            }
        }
        sql.push_str(" ORDER BY text_lc ASC");

        let mut stmt = conn.prepare(&sql)?;
        let mut terms: Vec<Term> = stmt
            .query_map(params_from_iter(values), row_to_term)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        populate_tags_and_parents(&conn, &mut terms)?;
        Ok(terms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
