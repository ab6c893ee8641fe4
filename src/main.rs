mod app;
mod behavior;
mod config;
mod db;
mod search;
mod utils;
use color_eyre::Result;
use std::env;

#[actix_web::main]
async fn main() -> Result<()> {
  // Pick up a .env file if there is one, actual env
  // vars take precedence over it.
  dotenv::dotenv().ok();
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info,actix_web=info");
  }
  env_logger::init();

  app::run().await
}
