use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Account, AccountId},
    helpers::hash_password,
    AccountApiError,
    AuthApi,
};

use super::{
    helpers::{get_auth_config, send},
    mocks::MockAccountManager,
};
use crate::{
    auth::TokenIssuer,
    routes::{LoginRoute, RegisterRoute},
};

fn account(id: i64, login: &str, password_hash: &str) -> Account {
    let t = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    Account {
        id: AccountId(id),
        login: login.to_string(),
        password_hash: password_hash.to_string(),
        created_at: t,
        updated_at: t,
    }
}

fn configure(db: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(RegisterRoute::<MockAccountManager>::new())
            .service(LoginRoute::<MockAccountManager>::new())
            .app_data(web::Data::new(AuthApi::new(db)));
    }
}

fn post_json(path: &str, body: &'static str) -> TestRequest {
    TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(body)
}

#[actix_web::test]
async fn register_returns_a_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_create_account()
        .withf(|a| a.login == "alice" && a.password_hash.starts_with("$argon2"))
        .times(1)
        .returning(|a| Ok(account(7, &a.login, &a.password_hash)));
    let res = send(post_json("/register", r#"{"login":" alice ","password":"hunter2"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let header = res.authorization.expect("No Authorization header");
    let token = header.strip_prefix("Bearer ").expect("Not a bearer token");
    let claims = TokenIssuer::new(&get_auth_config()).validate_token(token).expect("Token is not valid");
    assert_eq!(claims.sub, AccountId(7));
    assert_eq!(claims.login, "alice");
}

#[actix_web::test]
async fn register_with_a_taken_login() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_create_account().returning(|a| Err(AccountApiError::LoginTaken(a.login)));
    let res = send(post_json("/register", r#"{"login":"alice","password":"hunter2"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert!(res.authorization.is_none());
    assert_eq!(res.body, r#"{"error":"The login 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_with_bad_input() {
    let _ = env_logger::try_init().ok();
    let res = send(post_json("/register", r#"{"login":"  ","password":"hunter2"}"#), configure(MockAccountManager::new()))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res =
        send(post_json("/register", r#"{"login":"alice","password":""}"#), configure(MockAccountManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(post_json("/register", r#"{"login":"alice"}"#), configure(MockAccountManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(post_json("/register", "login=alice&password=x"), configure(MockAccountManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.starts_with(r#"{"error":"#), "{}", res.body);
}

#[actix_web::test]
async fn login_with_the_right_password() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter2").unwrap();
    let mut db = MockAccountManager::new();
    db.expect_fetch_account_by_login()
        .withf(|login| login == "alice")
        .returning(move |login| Ok(Some(account(3, login, &hash))));
    let res = send(post_json("/login", r#"{"login":"alice","password":"hunter2"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let header = res.authorization.expect("No Authorization header");
    let claims = TokenIssuer::new(&get_auth_config())
        .validate_token(header.trim_start_matches("Bearer "))
        .expect("Token is not valid");
    assert_eq!(claims.sub, AccountId(3));
}

#[actix_web::test]
async fn login_with_the_wrong_password() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("hunter2").unwrap();
    let mut db = MockAccountManager::new();
    db.expect_fetch_account_by_login().returning(move |login| Ok(Some(account(3, login, &hash))));
    let res = send(post_json("/login", r#"{"login":"alice","password":"hunter3"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.authorization.is_none());
    assert_eq!(res.body, r#"{"error":"Authentication Error. Invalid login or password."}"#);
}

#[actix_web::test]
async fn login_with_an_unknown_account() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_account_by_login().returning(|_| Ok(None));
    let res = send(post_json("/login", r#"{"login":"mallory","password":"hunter2"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. Invalid login or password."}"#);
}

#[actix_web::test]
async fn backend_failures_are_not_leaked() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_account_by_login()
        .returning(|_| Err(AccountApiError::DatabaseError("no such table: accounts".into())));
    let res = send(post_json("/login", r#"{"login":"alice","password":"hunter2"}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, r#"{"error":"An internal server error occurred"}"#);
}
