use crate::db::{self, Pool};
use super::dtos::ArticleViewDto;
use super::error::{map_db_error, Error};

// The enrichment pass. Looks up the pin and the grade
// for every view independently, in order, and fills the
// two annotation fields in place. Read only, callers
// decide whether it runs at all (it never does for
// anonymous visitors).
// Pin or grade rows carrying a zeroed article id count
// as no annotation.
pub fn annotate_views(
  pool: &Pool,
  user_id: i64,
  views: &mut [ArticleViewDto]
) -> Result<(), Error> {
  for view in views.iter_mut() {
    if let Some(pin) = db::user_pin(pool, user_id, view.id)
      .map_err(map_db_error)? {
        if pin.article_id != 0 {
          view.pinned = true;
        }
    }
    if let Some(grade) = db::user_grade(pool, user_id, view.id)
      .map_err(map_db_error)? {
        if grade.article_id != 0 {
          view.grade = Some(grade.grade);
        }
    }
  }
  Ok(())
}
