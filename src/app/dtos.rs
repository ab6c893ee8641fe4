use serde::{Deserialize, Serialize};
use crate::db::entities::Article;
use crate::search::ArticleHit;
use crate::utils::time_utils;

// Entities and search hits both convert into the one
// article view the API responds with, via From. The
// per-user annotation fields start out empty and get
// filled in by the enrichment pass.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleViewDto {
  pub id: i64,
  // Search hits also carry the id as a string, JS
  // clients can't hold 64 bit ids in a number.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id_str: Option<String>,
  pub title: String,
  pub summary: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  pub date: String,
  pub pinned: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub grade: Option<i32>
}

impl From<Article> for ArticleViewDto {
  fn from(article: Article) -> Self {
    Self {
      id: article.id,
      id_str: None,
      title: article.title,
      summary: article.summary,
      content: article.content,
      author: Some(article.author),
      date: time_utils::timestamp_to_date_string(article.date),
      pinned: false,
      grade: None
    }
  }
}

impl From<ArticleHit> for ArticleViewDto {
  fn from(hit: ArticleHit) -> Self {
    Self {
      id: hit.id,
      id_str: Some(hit.id.to_string()),
      title: hit.title,
      summary: hit.snippet,
      content: None,
      author: None,
      date: time_utils::timestamp_to_date_string(hit.date),
      pinned: false,
      grade: None
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsLoginDto {
  pub is_login: bool
}

// The envelope every endpoint answers with. data and
// error are skipped when absent instead of going out
// as null.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<ErrorBody>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
  pub code: String,
  pub message: String
}

impl<T: Serialize> Envelope<T> {
  pub fn data(data: T) -> Self {
    Self {
      success: true,
      data: Some(data),
      error: None
    }
  }
}

impl Envelope<()> {
  pub fn empty() -> Self {
    Self {
      success: true,
      data: None,
      error: None
    }
  }

  pub fn error(code: &str, message: &str) -> Self {
    Self {
      success: false,
      data: None,
      error: Some(ErrorBody {
        code: code.to_string(),
        message: message.to_string()
      })
    }
  }
}
