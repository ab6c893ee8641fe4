use actix_web::{middleware, web, App, HttpServer};
use actix_cors::Cors;
use actix_session::CookieSession;
use r2d2_sqlite::SqliteConnectionManager;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use log::info;
use crate::behavior::BehaviorService;
use crate::config::Config;
use crate::db::{self, Pool};
mod handlers;
mod dtos;
mod error;
mod session;
mod enrich;
mod guards;

// Peers allowed to call the operational endpoints, like
// the placeholder article generator.
pub const ALLOWED_IP_ADDRESSES: [&str; 2] = ["127.0.0.1", "::1"];

// Declare app state struct:
pub struct AppState {
  pub pool: Pool,
  pub behavior: BehaviorService
}

// Function to start the server. Has to be async because
// of the .await at the end, the #[actix_web::main]
// decorator sits on main.rs.
pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .expect("Configuration (environment or .env file) is missing");

  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager)
    .expect("Database connection failed");
  db::init_schema(&pool)?;

  // The behavior tracker takes one pooled connection and
  // keeps it for the lifetime of its thread.
  let behavior = BehaviorService::open(&pool, config.message_queue_size)?;

  let session_key = config.session_key.clone().into_bytes();
  if session_key.len() < 32 {
    return Err(eyre!("The session_key setting has to be at least 32 bytes long"));
  }

  let app_state = web::Data::new(
    AppState {
      pool,
      behavior
    }
  );

  info!("Starting server on {}", config.bind_address);
  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .app_data(web::QueryConfig::default().error_handler(|_, _| {
        error::Error::InvalidInput(
          "Invalid query string arguments".to_string()
        ).into()
      }))
      .app_data(web::JsonConfig::default().error_handler(|_, _| {
        error::Error::InvalidInput(
          "Invalid or missing JSON body".to_string()
        ).into()
      }))
      .wrap(middleware::Logger::default())
      .wrap(
        CookieSession::signed(&session_key)
          .name("motor_session")
          .secure(false)
      )
      // The frontend is served from another origin:
      .wrap(Cors::permissive())
      .configure(endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(&config.bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
pub fn endpoints_config(cfg: &mut web::ServiceConfig) {
  // Guard that makes the generator endpoint respond with
  // a 404 when the peer address isn't allowed.
  let local_guard = guards::LocalRequestGuard::new(&ALLOWED_IP_ADDRESSES);

  cfg
    .route("/motor/article/search", web::get().to(handlers::search))
    .route("/motor/article/detail", web::get().to(handlers::article_detail))
    .route(
      "/motor/article/addArticle",
      web::get().guard(local_guard).to(handlers::add_article)
    )
    .route("/motor/user/login", web::post().to(handlers::login))
    .route("/motor/user/register", web::post().to(handlers::register))
    .route("/motor/user/is_login", web::post().to(handlers::is_login))
    .route("/motor/user/exit", web::post().to(handlers::exit))
    .route("/motor/user/click", web::get().to(handlers::click_history))
    .route("/motor/user/pin", web::get().to(handlers::pin_history))
    .route("/motor/user/grade", web::get().to(handlers::grade_history))
    .route("/motor/user/pin_article", web::post().to(handlers::pin_article))
    .route("/motor/user/grade_article", web::post().to(handlers::grade_article));
}
