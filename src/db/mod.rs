use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
pub mod entities;
mod mappers;
use eyre::WrapErr;
use color_eyre::Result;
use entities::*;
use mappers::{map_article, map_user, map_user_grade, map_user_pin};
use crate::utils::time_utils::current_timestamp;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

// All the DB stuff is done in a non-async way, the
// handlers just call into here directly.

const SCHEMA: &str = "
BEGIN;
CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  username TEXT NOT NULL UNIQUE,
  password_hash TEXT NOT NULL,
  created INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS articles (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  summary TEXT NOT NULL,
  content TEXT,
  author TEXT NOT NULL DEFAULT '',
  date INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS user_pins (
  user_id INTEGER NOT NULL,
  article_id INTEGER NOT NULL,
  date INTEGER NOT NULL,
  PRIMARY KEY (user_id, article_id)
);
CREATE TABLE IF NOT EXISTS user_grades (
  user_id INTEGER NOT NULL,
  article_id INTEGER NOT NULL,
  grade INTEGER NOT NULL,
  date INTEGER NOT NULL,
  PRIMARY KEY (user_id, article_id)
);
CREATE TABLE IF NOT EXISTS click_events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  article_id INTEGER NOT NULL,
  date INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS search_events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER,
  keywords TEXT NOT NULL,
  results INTEGER NOT NULL,
  date INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_click_events_user ON click_events (user_id);
CREATE INDEX IF NOT EXISTS idx_search_events_user ON search_events (user_id);
COMMIT;
";

// Idempotent, runs at every startup.
pub fn init_schema(pool: &Pool) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute_batch(SCHEMA)
    .context("Creating the database schema")
}

// Stole most of the signature from the rusqlite doc.
// Careful to use a later version of the crate,
// Google takes you to old versions of the doc.
pub(crate) fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: IntoIterator,
    P::Item: ToSql,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  // Do the reference counting thing and get a connection
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

pub fn user_by_id(
  pool: &Pool,
  user_id: i64
) -> Result<Option<User>> {
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(
    "SELECT id, username, password_hash, created FROM users WHERE id = ?"
  )?;
  stmt.query_row(params![user_id], map_user)
    .optional()
    .context("Fetch user by id")
}

pub fn user_by_username(
  pool: &Pool,
  username: &str
) -> Result<Option<User>> {
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(
    "SELECT id, username, password_hash, created FROM users WHERE username = ?"
  )?;
  stmt.query_row(params![username], map_user)
    .optional()
    .context("Fetch user by username")
}

pub fn insert_user(
  pool: &Pool,
  username: &str,
  password_hash: &str
) -> Result<i64> {
  let conn = pool.clone().get()?;
  conn.execute(
    "INSERT INTO users (username, password_hash, created) VALUES (?, ?, ?)",
    params![username, password_hash, current_timestamp()]
  ).context("Insert a new user")?;
  Ok(conn.last_insert_rowid())
}

pub fn article_by_id(
  pool: &Pool,
  article_id: i64
) -> Result<Option<Article>> {
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(
    "SELECT id, title, summary, content, author, date
    FROM articles WHERE id = ?"
  )?;
  stmt.query_row(params![article_id], map_article)
    .optional()
    .context("Fetch article by id")
}

// Content generator behind the local-only endpoint.
// Gives the search index something to chew on.
pub fn insert_placeholder_articles(
  pool: &Pool,
  count: u32
) -> Result<u32> {
  let conn = pool.clone().get()?;
  let now = current_timestamp();
  let mut stmt = conn.prepare(
    "INSERT INTO articles (title, summary, content, author, date)
    VALUES (?, ?, ?, ?, ?)"
  )?;
  for n in 0..count {
    stmt.execute(params![
      format!("Placeholder article {}", n + 1),
      format!("Auto-generated placeholder number {}", n + 1),
      format!("Generated content for placeholder article {}.", n + 1),
      "generator",
      now
    ]).context("Insert a placeholder article")?;
  }
  Ok(count)
}

pub fn user_pin(
  pool: &Pool,
  user_id: i64,
  article_id: i64
) -> Result<Option<UserPin>> {
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(
    "SELECT user_id, article_id, date FROM user_pins
    WHERE user_id = ? AND article_id = ?"
  )?;
  stmt.query_row(params![user_id, article_id], map_user_pin)
    .optional()
    .context("Fetch a user pin")
}

pub fn user_grade(
  pool: &Pool,
  user_id: i64,
  article_id: i64
) -> Result<Option<UserGrade>> {
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(
    "SELECT user_id, article_id, grade, date FROM user_grades
    WHERE user_id = ? AND article_id = ?"
  )?;
  stmt.query_row(params![user_id, article_id], map_user_grade)
    .optional()
    .context("Fetch a user grade")
}

// Pinning twice just refreshes the pin date.
pub fn set_pin(
  pool: &Pool,
  user_id: i64,
  article_id: i64,
  pinned: bool
) -> Result<()> {
  let conn = pool.clone().get()?;
  if pinned {
    conn.execute(
      "INSERT OR REPLACE INTO user_pins (user_id, article_id, date)
      VALUES (?, ?, ?)",
      params![user_id, article_id, current_timestamp()]
    ).context("Insert a user pin")?;
  } else {
    conn.execute(
      "DELETE FROM user_pins WHERE user_id = ? AND article_id = ?",
      params![user_id, article_id]
    ).context("Delete a user pin")?;
  }
  Ok(())
}

// Last write wins.
pub fn set_grade(
  pool: &Pool,
  user_id: i64,
  article_id: i64,
  grade: i32
) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute(
    "INSERT OR REPLACE INTO user_grades (user_id, article_id, grade, date)
    VALUES (?, ?, ?, ?)",
    params![user_id, article_id, grade, current_timestamp()]
  ).context("Upsert a user grade")?;
  Ok(())
}

// One entry per distinct article, most recently
// clicked first.
pub fn clicked_articles(
  pool: &Pool,
  user_id: i64
) -> Result<Vec<Article>> {
  select_many(
    pool,
    "SELECT a.id, a.title, a.summary, a.content, a.author, a.date
    FROM articles a
    JOIN (
      SELECT article_id, MAX(date) AS last_click
      FROM click_events WHERE user_id = ?
      GROUP BY article_id
    ) c ON c.article_id = a.id
    ORDER BY c.last_click DESC",
    params![user_id],
    map_article
  )
}

pub fn pinned_articles(
  pool: &Pool,
  user_id: i64
) -> Result<Vec<Article>> {
  select_many(
    pool,
    "SELECT a.id, a.title, a.summary, a.content, a.author, a.date
    FROM articles a
    JOIN user_pins p ON p.article_id = a.id
    WHERE p.user_id = ?
    ORDER BY p.date DESC",
    params![user_id],
    map_article
  )
}

pub fn graded_articles(
  pool: &Pool,
  user_id: i64
) -> Result<Vec<UserGrade>> {
  select_many(
    pool,
    "SELECT user_id, article_id, grade, date FROM user_grades
    WHERE user_id = ? ORDER BY date DESC",
    params![user_id],
    map_user_grade
  )
}

// The two event inserts run on the behavior thread,
// which owns its connection for its whole lifetime.
// Hence &Connection and not &Pool here.

pub fn insert_search_event(
  conn: &Connection,
  user_id: Option<i64>,
  keywords: &str,
  results: i64
) -> Result<()> {
  conn.execute(
    "INSERT INTO search_events (user_id, keywords, results, date)
    VALUES (?, ?, ?, ?)",
    params![user_id, keywords, results, current_timestamp()]
  ).context("Insert a search event")?;
  Ok(())
}

pub fn insert_click_event(
  conn: &Connection,
  user_id: i64,
  article_id: i64
) -> Result<()> {
  conn.execute(
    "INSERT INTO click_events (user_id, article_id, date)
    VALUES (?, ?, ?)",
    params![user_id, article_id, current_timestamp()]
  ).context("Insert a click event")?;
  Ok(())
}

// Every connection of the memory manager is a brand new
// database, so the test pool is capped at one connection
// that every caller ends up sharing.
#[cfg(test)]
pub(crate) fn test_pool() -> Pool {
  let manager = r2d2_sqlite::SqliteConnectionManager::memory();
  let pool = Pool::builder()
    .max_size(1)
    .build(manager)
    .expect("In-memory pool");
  init_schema(&pool).expect("Schema init");
  pool
}
