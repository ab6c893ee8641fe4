use actix_session::Session;
use log::warn;
use crate::db::{self, Pool};
use crate::db::entities::User;
use super::error::{map_db_error, Error};

pub const USER_ID_KEY: &str = "user_id";

// There is no "user id 0" style sentinel anywhere,
// being anonymous is its own variant.
pub enum SessionUser {
  Anonymous,
  Authenticated(User)
}

impl SessionUser {

  pub fn user_id(&self) -> Option<i64> {
    match self {
      SessionUser::Authenticated(user) => Some(user.id),
      SessionUser::Anonymous => None
    }
  }

  // Unwrap to the logged-in user or answer the no-user
  // business error.
  pub fn authenticated(self) -> Result<User, Error> {
    match self {
      SessionUser::Authenticated(user) => Ok(user),
      SessionUser::Anonymous => Err(Error::NoUser)
    }
  }

}

// Absence is always represented as Anonymous, never as
// an error. That covers no cookie, no stored id, an id
// that doesn't resolve to a user anymore, and a cookie
// value we can't read.
pub fn resolve(session: &Session, pool: &Pool) -> Result<SessionUser, Error> {
  let user_id = match session.get::<i64>(USER_ID_KEY) {
    Ok(id) => id,
    Err(e) => {
      warn!("Unreadable user id in the session cookie - {}", e);
      None
    }
  };
  match user_id {
    None => Ok(SessionUser::Anonymous),
    Some(id) => match db::user_by_id(pool, id).map_err(map_db_error)? {
      Some(user) => Ok(SessionUser::Authenticated(user)),
      // Stale cookie, the account is gone:
      None => Ok(SessionUser::Anonymous)
    }
  }
}

pub fn put_user_id(session: &Session, user_id: i64) -> Result<(), Error> {
  session.set(USER_ID_KEY, user_id)
    .map_err(|e| Error::InternalServerError(
      format!("Could not write the session cookie - {}", e)
    ))
}

pub fn clear_user_id(session: &Session) {
  session.remove(USER_ID_KEY);
}
