// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  // Buffer size for the behavior tracking thread,
  // events are dropped once it's full.
  pub message_queue_size: usize,
  // Key used to sign the session cookie. Has to be
  // at least 32 bytes long.
  pub session_key: String
}

impl Config {

  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // Let's set the other default values. You have
    // to use lowercase when compared to what's
    // in the .env file.
    c.set_default("db_path", "./motor.db")?;
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("message_queue_size", 30)?;
    // Dev signing key. Deployments are expected to
    // provide SESSION_KEY in the environment.
    c.set_default(
      "session_key",
      "insecure-dev-session-key-change-me-in-prod"
    )?;

    c.merge(config::Environment::default())?;
    // The error has to be given a context for
    // color_eyre to work here:
    c.try_into()
      .context("Loading configuration from env")
  }

}
