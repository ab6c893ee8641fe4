/*
 * Client side of the article search index. The rest of
 * the app only ever sees the ArticleHit records coming
 * out of here, never the index internals.
 */

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use crate::db::{self, Pool};
use crate::utils::text_utils;

// Max amount of search terms to process:
const MAX_SEARCH_TERMS: usize = 10;
// Hard cap on hits returned for one query:
const MAX_RESULTS: usize = 15;

// Lightweight result record, not a full article. The
// summary doubles as the snippet.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleHit {
  pub id: i64,
  pub title: String,
  pub snippet: String,
  pub date: i64
}

// Every sanitized term has to match somewhere in the
// article. An empty term list is not an error, it just
// means zero hits.
pub fn search(pool: &Pool, keywords: &str) -> Result<Vec<ArticleHit>> {
  let terms = text_utils::sanitize_keywords(keywords, MAX_SEARCH_TERMS);
  if terms.is_empty() {
    return Ok(Vec::new());
  }

  let clauses: Vec<&str> = terms.iter()
    .map(|_| "(title LIKE ? OR summary LIKE ? OR content LIKE ?)")
    .collect();
  let query = format!(
    "SELECT id, title, summary, date FROM articles
    WHERE {} ORDER BY date DESC LIMIT {}",
    clauses.join(" AND "),
    MAX_RESULTS
  );
  // Three pattern params per term, one per LIKE:
  let params: Vec<String> = terms.iter()
    .flat_map(|t| {
      let pattern = format!("%{}%", t);
      vec![pattern.clone(), pattern.clone(), pattern]
    })
    .collect();

  db::select_many(pool, &query, params, |row| {
    Ok(ArticleHit {
      id: row.get(0)?,
      title: row.get(1)?,
      snippet: row.get(2)?,
      date: row.get(3)?
    })
  })
}
