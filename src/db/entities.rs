use serde::{Deserialize, Serialize};

// Ultra simple datatypes, which is something SQLite
// fits naturally into. The API never exposes these
// directly, there are DTO objects for that.

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  // Argon2 encoded hash, salt included.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created: i64
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Article {
  pub id: i64,
  pub title: String,
  pub summary: String,
  pub content: Option<String>,
  pub author: String,
  pub date: i64
}

// Existence of a row means the article is pinned
// for that user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPin {
  pub user_id: i64,
  pub article_id: i64,
  pub date: i64
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserGrade {
  pub user_id: i64,
  pub article_id: i64,
  pub grade: i32,
  pub date: i64
}
