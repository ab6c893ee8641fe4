use super::entities::*;
use rusqlite::{Error, Row};

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    username: row.get(1)?,
    password_hash: row.get(2)?,
    created: row.get(3)?
  })
}

pub fn map_article(row: &Row) -> Result<Article, Error> {
  Ok(Article {
    id: row.get(0)?,
    title: row.get(1)?,
    summary: row.get(2)?,
    content: row.get(3)?,
    author: row.get(4)?,
    date: row.get(5)?
  })
}

pub fn map_user_pin(row: &Row) -> Result<UserPin, Error> {
  Ok(UserPin {
    user_id: row.get(0)?,
    article_id: row.get(1)?,
    date: row.get(2)?
  })
}

pub fn map_user_grade(row: &Row) -> Result<UserGrade, Error> {
  Ok(UserGrade {
    user_id: row.get(0)?,
    article_id: row.get(1)?,
    grade: row.get(2)?,
    date: row.get(3)?
  })
}
