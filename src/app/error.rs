use actix_web::{
  error::ResponseError,
  HttpResponse
};
use derive_more::Display;
use log::error;
use super::dtos::Envelope;

// The full error messages for the internal variants
// should only ever show up in logs, the Display impl
// keeps them away from random internet people.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Invalid input: {}", _0)]
  InvalidInput(String),
  #[display(fmt = "Wrong username or password")]
  AuthenticationError,
  #[display(fmt = "Login required")]
  NoUser,
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String)
}

impl Error {
  // Stable codes, the frontend switches on these.
  pub fn code(&self) -> &'static str {
    match self {
      Error::InternalServerError(_) => "internal",
      Error::DatabaseError(_) => "db_error",
      Error::InvalidInput(_) => "invalid_input",
      Error::AuthenticationError => "auth_failed",
      Error::NoUser => "no_user",
      Error::NotFound(_) => "not_found"
    }
  }
}

impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    let body = Envelope::<()>::error(self.code(), &self.to_string());
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        HttpResponse::InternalServerError().json(body),
      Error::NotFound(_) => HttpResponse::NotFound().json(body),
      // Business failures answer 200, the envelope
      // carries the error.
      Error::InvalidInput(_) | Error::AuthenticationError | Error::NoUser =>
        HttpResponse::Ok().json(body)
    }
  }
}

// Data access uses eyre reports all over, handlers
// funnel them through here.
pub fn map_db_error(e: color_eyre::Report) -> Error {
  error!("Data access error - {}", e);
  Error::DatabaseError(e.to_string())
}
