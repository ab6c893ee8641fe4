use actix_web::{
  web,
  HttpResponse,
  Result
};
use actix_session::Session;
use log::{error, info};
use serde::Deserialize;
use crate::behavior::{ClickEvent, SearchEvent};
use crate::db;
use crate::search;
use crate::utils::passwords;
use super::dtos::*;
use super::enrich;
use super::error::{map_db_error, Error};
use super::session::{self, SessionUser};
use super::AppState;

// Module with all the API handler functions. Everything
// answers the same envelope, errors included, see the
// error module for that part.

/* --- Request body or query objects --- */
// These have to be public.
#[derive(Deserialize)]
pub struct SearchQuery {
  pub keywords: String
}

#[derive(Deserialize)]
pub struct DetailQuery {
  pub id: i64
}

#[derive(Deserialize)]
pub struct AddArticleQuery {
  pub count: u32
}

// Used by login and register both.
#[derive(Deserialize)]
pub struct CredentialsForm {
  pub username: String,
  pub password: String
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinForm {
  pub article_id: i64,
  pub pinned: bool
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeForm {
  pub article_id: i64,
  pub grade: i32
}
/* --- End request body or query objects --- */

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

pub async fn search(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
  session: Session
) -> Result<HttpResponse, Error> {
  let session_user = session::resolve(&session, &app_state.pool)?;
  let hits = search::search(&app_state.pool, &query.keywords)
    .map_err(map_db_error)?;

  // Losing the event must never fail the search itself:
  if let Err(e) = app_state.behavior.record_search(SearchEvent {
    user_id: session_user.user_id(),
    keywords: query.keywords.clone(),
    results: hits.len()
  }) {
    error!("Could not record a search event - {}", e);
  }

  let mut views: Vec<ArticleViewDto> =
    hits.into_iter().map(Into::into).collect();
  if let SessionUser::Authenticated(user) = &session_user {
    enrich::annotate_views(&app_state.pool, user.id, &mut views)?;
  }
  Ok(HttpResponse::Ok().json(Envelope::data(views)))
}

pub async fn article_detail(
  app_state: web::Data<AppState>,
  query: web::Query<DetailQuery>,
  session: Session
) -> Result<HttpResponse, Error> {
  let session_user = session::resolve(&session, &app_state.pool)?;
  let article = db::article_by_id(&app_state.pool, query.id)
    .map_err(map_db_error)?;
  let article = match article {
    Some(article) => article,
    None => return Err(Error::NotFound(String::from("Article does not exist")))
  };

  let mut view = ArticleViewDto::from(article);
  if let SessionUser::Authenticated(user) = &session_user {
    if let Err(e) = app_state.behavior.record_click(ClickEvent {
      user_id: user.id,
      article_id: view.id
    }) {
      error!("Could not record a click event - {}", e);
    }
    enrich::annotate_views(
      &app_state.pool,
      user.id,
      std::slice::from_mut(&mut view)
    )?;
  }
  Ok(HttpResponse::Ok().json(Envelope::data(view)))
}

// Sits behind the local-only guard, see the routing
// config.
pub async fn add_article(
  app_state: web::Data<AppState>,
  query: web::Query<AddArticleQuery>
) -> Result<HttpResponse, Error> {
  let count = db::insert_placeholder_articles(&app_state.pool, query.count)
    .map_err(map_db_error)?;
  info!("Generated {} placeholder articles", count);
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

pub async fn login(
  app_state: web::Data<AppState>,
  body: web::Json<CredentialsForm>,
  session: Session
) -> Result<HttpResponse, Error> {
  // Blank credentials never reach the user store.
  if body.username.trim().is_empty() || body.password.trim().is_empty() {
    return Err(Error::InvalidInput(
      String::from("Username and password are required")
    ));
  }
  let user = db::user_by_username(&app_state.pool, body.username.trim())
    .map_err(map_db_error)?;
  let user = match user {
    Some(user) => user,
    None => return Err(Error::AuthenticationError)
  };
  if !passwords::verify(&user.password_hash, &body.password) {
    return Err(Error::AuthenticationError);
  }
  session::put_user_id(&session, user.id)?;
  info!("User {} logged in", user.username);
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

pub async fn register(
  app_state: web::Data<AppState>,
  body: web::Json<CredentialsForm>,
  session: Session
) -> Result<HttpResponse, Error> {
  let username = body.username.trim();
  if username.is_empty() || body.password.trim().is_empty() {
    return Err(Error::InvalidInput(
      String::from("Username and password are required")
    ));
  }
  if db::user_by_username(&app_state.pool, username)
    .map_err(map_db_error)?
    .is_some() {
      return Err(Error::InvalidInput(
        String::from("Username is already taken")
      ));
  }
  let password_hash = passwords::hash(&body.password)
    .map_err(|e| {
      error!("Could not hash a password - {}", e);
      Error::InternalServerError(e.to_string())
    })?;
  let user_id = db::insert_user(&app_state.pool, username, &password_hash)
    .map_err(map_db_error)?;
  session::put_user_id(&session, user_id)?;
  info!("Registered user {}", username);
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

pub async fn is_login(
  app_state: web::Data<AppState>,
  session: Session
) -> Result<HttpResponse, Error> {
  let session_user = session::resolve(&session, &app_state.pool)?;
  Ok(HttpResponse::Ok().json(Envelope::data(IsLoginDto {
    is_login: session_user.user_id().is_some()
  })))
}

// Logging out without being logged in is an error, on
// purpose.
pub async fn exit(
  app_state: web::Data<AppState>,
  session: Session
) -> Result<HttpResponse, Error> {
  session::resolve(&session, &app_state.pool)?.authenticated()?;
  session::clear_user_id(&session);
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

pub async fn click_history(
  app_state: web::Data<AppState>,
  session: Session
) -> Result<HttpResponse, Error> {
  let user = session::resolve(&session, &app_state.pool)?.authenticated()?;
  let articles = db::clicked_articles(&app_state.pool, user.id)
    .map_err(map_db_error)?;
  let mut views: Vec<ArticleViewDto> =
    articles.into_iter().map(Into::into).collect();
  enrich::annotate_views(&app_state.pool, user.id, &mut views)?;
  Ok(HttpResponse::Ok().json(Envelope::data(views)))
}

pub async fn pin_history(
  app_state: web::Data<AppState>,
  session: Session
) -> Result<HttpResponse, Error> {
  let user = session::resolve(&session, &app_state.pool)?.authenticated()?;
  let articles = db::pinned_articles(&app_state.pool, user.id)
    .map_err(map_db_error)?;
  let mut views: Vec<ArticleViewDto> =
    articles.into_iter().map(Into::into).collect();
  enrich::annotate_views(&app_state.pool, user.id, &mut views)?;
  // The list is the pinned set by definition, the flag
  // goes up no matter what the lookup said.
  for view in views.iter_mut() {
    view.pinned = true;
  }
  Ok(HttpResponse::Ok().json(Envelope::data(views)))
}

pub async fn grade_history(
  app_state: web::Data<AppState>,
  session: Session
) -> Result<HttpResponse, Error> {
  let user = session::resolve(&session, &app_state.pool)?.authenticated()?;
  let grades = db::graded_articles(&app_state.pool, user.id)
    .map_err(map_db_error)?;
  let mut views: Vec<ArticleViewDto> = Vec::with_capacity(grades.len());
  for user_grade in grades {
    // Grades can outlive their article, skip the orphans.
    if let Some(article) = db::article_by_id(&app_state.pool, user_grade.article_id)
      .map_err(map_db_error)? {
        views.push(ArticleViewDto::from(article));
    }
  }
  enrich::annotate_views(&app_state.pool, user.id, &mut views)?;
  Ok(HttpResponse::Ok().json(Envelope::data(views)))
}

pub async fn pin_article(
  app_state: web::Data<AppState>,
  body: web::Json<PinForm>,
  session: Session
) -> Result<HttpResponse, Error> {
  let user = session::resolve(&session, &app_state.pool)?.authenticated()?;
  if body.article_id <= 0 {
    return Err(Error::InvalidInput(String::from("Invalid article id")));
  }
  db::set_pin(&app_state.pool, user.id, body.article_id, body.pinned)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

pub async fn grade_article(
  app_state: web::Data<AppState>,
  body: web::Json<GradeForm>,
  session: Session
) -> Result<HttpResponse, Error> {
  let user = session::resolve(&session, &app_state.pool)?.authenticated()?;
  if body.article_id <= 0 {
    return Err(Error::InvalidInput(String::from("Invalid article id")));
  }
  db::set_grade(&app_state.pool, user.id, body.article_id, body.grade)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(Envelope::<()>::empty()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::{endpoints_config, AppState};
  use crate::behavior::BehaviorService;
  use crate::db::test_pool;
  use actix_session::CookieSession;
  use actix_web::{test, App};
  use serde_json::{json, Value};

  const TEST_SESSION_KEY: [u8; 32] = [7; 32];

  fn test_state() -> (db::Pool, web::Data<AppState>) {
    let pool = test_pool();
    // The tracker gets its own store so it never fights
    // over the single test connection.
    let behavior = BehaviorService::open(&test_pool(), 4).unwrap();
    let state = web::Data::new(AppState {
      pool: pool.clone(),
      behavior
    });
    (pool, state)
  }

  macro_rules! test_app {
    ($state:expr) => {
      test::init_service(
        App::new()
          .app_data($state.clone())
          .app_data(web::JsonConfig::default().error_handler(|_, _| {
            Error::InvalidInput(
              "Invalid or missing JSON body".to_string()
            ).into()
          }))
          .wrap(
            CookieSession::signed(&TEST_SESSION_KEY).secure(false)
          )
          .configure(endpoints_config)
          .default_service(web::route().to(not_found))
      ).await
    };
  }

  macro_rules! body_json {
    ($resp:expr) => {{
      let body = test::read_body($resp).await;
      serde_json::from_slice::<Value>(&body).expect("JSON body")
    }};
  }

  // Registers a user and hands back the session cookie.
  macro_rules! register {
    ($app:expr, $username:expr) => {{
      let req = test::TestRequest::post()
        .uri("/motor/user/register")
        .set_json(&json!({ "username": $username, "password": "hunter2" }))
        .to_request();
      let resp = test::call_service(&mut $app, req).await;
      let cookie = resp.response().cookies().next()
        .expect("Session cookie").into_owned();
      let body = body_json!(resp);
      assert_eq!(Value::Bool(true), body["success"]);
      cookie
    }};
  }

  #[actix_rt::test]
  async fn anonymous_history_requests_are_rejected() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    for uri in &["/motor/user/click", "/motor/user/pin", "/motor/user/grade"] {
      let req = test::TestRequest::get().uri(uri).to_request();
      let resp = test::call_service(&mut app, req).await;
      assert!(resp.status().is_success());
      let body = body_json!(resp);
      assert_eq!(Value::Bool(false), body["success"]);
      assert_eq!("no_user", body["error"]["code"]);
      assert!(body.get("data").is_none());
    }
  }

  #[actix_rt::test]
  async fn login_with_blank_credentials_is_invalid_input() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    let req = test::TestRequest::post()
      .uri("/motor/user/login")
      .set_json(&json!({ "username": "  ", "password": "x" }))
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    let body = body_json!(resp);
    assert_eq!(Value::Bool(false), body["success"]);
    assert_eq!("invalid_input", body["error"]["code"]);
  }

  #[actix_rt::test]
  async fn missing_register_body_is_invalid_input() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    let req = test::TestRequest::post()
      .uri("/motor/user/register")
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    let body = body_json!(resp);
    assert_eq!("invalid_input", body["error"]["code"]);
  }

  #[actix_rt::test]
  async fn register_then_is_login_round_trip() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    let cookie = register!(app, "bob");

    let req = test::TestRequest::post()
      .uri("/motor/user/is_login")
      .cookie(cookie)
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["data"]["is_login"]);

    // Same call without the cookie:
    let req = test::TestRequest::post()
      .uri("/motor/user/is_login")
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["success"]);
    assert_eq!(Value::Bool(false), body["data"]["is_login"]);
  }

  #[actix_rt::test]
  async fn login_checks_the_password() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    register!(app, "alice");

    let req = test::TestRequest::post()
      .uri("/motor/user/login")
      .set_json(&json!({ "username": "alice", "password": "nope" }))
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!("auth_failed", body["error"]["code"]);

    // Unknown users fail the same way:
    let req = test::TestRequest::post()
      .uri("/motor/user/login")
      .set_json(&json!({ "username": "nobody", "password": "nope" }))
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!("auth_failed", body["error"]["code"]);

    let req = test::TestRequest::post()
      .uri("/motor/user/login")
      .set_json(&json!({ "username": "alice", "password": "hunter2" }))
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert!(resp.response().cookies().next().is_some());
    let body = body_json!(resp);
    assert_eq!(Value::Bool(true), body["success"]);
  }

  #[actix_rt::test]
  async fn duplicate_registration_is_rejected() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);
    register!(app, "henry");
    let req = test::TestRequest::post()
      .uri("/motor/user/register")
      .set_json(&json!({ "username": "henry", "password": "other" }))
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!("invalid_input", body["error"]["code"]);
  }

  #[actix_rt::test]
  async fn exit_requires_a_user_and_clears_the_session() {
    let (_pool, state) = test_state();
    let mut app = test_app!(state);

    let req = test::TestRequest::post().uri("/motor/user/exit").to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!("no_user", body["error"]["code"]);

    let cookie = register!(app, "carol");
    let req = test::TestRequest::post()
      .uri("/motor/user/exit")
      .cookie(cookie)
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    let exit_cookie = resp.response().cookies().next()
      .expect("Updated session cookie").into_owned();
    let body = body_json!(resp);
    assert_eq!(Value::Bool(true), body["success"]);

    let req = test::TestRequest::post()
      .uri("/motor/user/is_login")
      .cookie(exit_cookie)
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(false), body["data"]["is_login"]);
  }

  #[actix_rt::test]
  async fn search_is_enriched_for_the_session_user() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);
    db::insert_placeholder_articles(&pool, 3).unwrap();
    let cookie = register!(app, "dave");

    let req = test::TestRequest::post()
      .uri("/motor/user/pin_article")
      .cookie(cookie.clone())
      .set_json(&json!({ "articleId": 2, "pinned": true }))
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["success"]);

    let req = test::TestRequest::post()
      .uri("/motor/user/grade_article")
      .cookie(cookie.clone())
      .set_json(&json!({ "articleId": 1, "grade": 5 }))
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["success"]);

    let req = test::TestRequest::get()
      .uri("/motor/article/search?keywords=placeholder")
      .cookie(cookie.clone())
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    let hits = body["data"].as_array().unwrap();
    assert_eq!(3, hits.len());
    for hit in hits {
      assert!(hit.get("idStr").is_some());
      match hit["id"].as_i64().unwrap() {
        1 => {
          assert_eq!(json!(5), hit["grade"]);
          assert_eq!(Value::Bool(false), hit["pinned"]);
        },
        2 => {
          assert!(hit.get("grade").is_none());
          assert_eq!(Value::Bool(true), hit["pinned"]);
        },
        _ => {
          assert!(hit.get("grade").is_none());
          assert_eq!(Value::Bool(false), hit["pinned"]);
        }
      }
    }

    // The same search with no session has the base
    // fields only:
    let req = test::TestRequest::get()
      .uri("/motor/article/search?keywords=placeholder")
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    for hit in body["data"].as_array().unwrap() {
      assert_eq!(Value::Bool(false), hit["pinned"]);
      assert!(hit.get("grade").is_none());
    }
  }

  #[actix_rt::test]
  async fn pin_history_forces_the_pinned_flag() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);
    db::insert_placeholder_articles(&pool, 2).unwrap();
    let cookie = register!(app, "eve");

    let req = test::TestRequest::post()
      .uri("/motor/user/pin_article")
      .cookie(cookie.clone())
      .set_json(&json!({ "articleId": 1, "pinned": true }))
      .to_request();
    test::call_service(&mut app, req).await;

    let req = test::TestRequest::get()
      .uri("/motor/user/pin")
      .cookie(cookie.clone())
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    let views = body["data"].as_array().unwrap();
    assert_eq!(1, views.len());
    assert_eq!(json!(1), views[0]["id"]);
    assert_eq!(Value::Bool(true), views[0]["pinned"]);

    // Unpin, the list empties out:
    let req = test::TestRequest::post()
      .uri("/motor/user/pin_article")
      .cookie(cookie.clone())
      .set_json(&json!({ "articleId": 1, "pinned": false }))
      .to_request();
    test::call_service(&mut app, req).await;
    let req = test::TestRequest::get()
      .uri("/motor/user/pin")
      .cookie(cookie)
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert!(body["data"].as_array().unwrap().is_empty());
  }

  #[actix_rt::test]
  async fn grade_history_lists_graded_articles() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);
    db::insert_placeholder_articles(&pool, 2).unwrap();
    let cookie = register!(app, "frank");

    let req = test::TestRequest::post()
      .uri("/motor/user/grade_article")
      .cookie(cookie.clone())
      .set_json(&json!({ "articleId": 2, "grade": 3 }))
      .to_request();
    test::call_service(&mut app, req).await;

    let req = test::TestRequest::get()
      .uri("/motor/user/grade")
      .cookie(cookie)
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    let views = body["data"].as_array().unwrap();
    assert_eq!(1, views.len());
    assert_eq!(json!(2), views[0]["id"]);
    assert_eq!(json!(3), views[0]["grade"]);
    assert_eq!(Value::Bool(false), views[0]["pinned"]);
  }

  #[actix_rt::test]
  async fn click_history_lists_clicked_articles() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);
    db::insert_placeholder_articles(&pool, 2).unwrap();
    let cookie = register!(app, "grace");

    // First registered user gets id 1:
    let conn = pool.clone().get().unwrap();
    db::insert_click_event(&conn, 1, 2).unwrap();
    drop(conn);

    let req = test::TestRequest::get()
      .uri("/motor/user/click")
      .cookie(cookie)
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    let views = body["data"].as_array().unwrap();
    assert_eq!(1, views.len());
    assert_eq!(json!(2), views[0]["id"]);
  }

  #[actix_rt::test]
  async fn article_detail_answers_the_view_or_not_found() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);
    db::insert_placeholder_articles(&pool, 1).unwrap();

    let req = test::TestRequest::get()
      .uri("/motor/article/detail?id=1")
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["success"]);
    assert_eq!(json!("Placeholder article 1"), body["data"]["title"]);

    let req = test::TestRequest::get()
      .uri("/motor/article/detail?id=99")
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert_eq!(404, resp.status().as_u16());
    let body = body_json!(resp);
    assert_eq!("not_found", body["error"]["code"]);
  }

  #[actix_rt::test]
  async fn add_article_is_local_only() {
    let (pool, state) = test_state();
    let mut app = test_app!(state);

    // No peer address doesn't match the route at all:
    let req = test::TestRequest::get()
      .uri("/motor/article/addArticle?count=2")
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert_eq!(404, resp.status().as_u16());

    // Loopback is allowed:
    let req = test::TestRequest::get()
      .uri("/motor/article/addArticle?count=2")
      .peer_addr("127.0.0.1:12345".parse().unwrap())
      .to_request();
    let body = body_json!(test::call_service(&mut app, req).await);
    assert_eq!(Value::Bool(true), body["success"]);
    assert!(db::article_by_id(&pool, 2).unwrap().is_some());
  }

}
