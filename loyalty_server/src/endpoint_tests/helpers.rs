use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web::{self, ServiceConfig},
    App,
};
use log::debug;
use loyalty_engine::db_types::AccountId;

use crate::{auth::TokenIssuer, config::AuthConfig, routes::json_config};

pub const ALICE: AccountId = AccountId(1);

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("d1f3a4b9c35e0e6a0cf42b2d1c8d7d1eb5a0a6f2e4c1b7d93e2f5a8c6b0d4e7f", Duration::from_secs(3600))
}

pub fn issue_token(account_id: AccountId, login: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(account_id, login).expect("Failed to sign token")
}

pub fn alice_token() -> String {
    issue_token(ALICE, "alice")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub authorization: Option<String>,
    pub body: String,
}

/// Sends `req` to an app built from `configure`, with the token issuer and JSON error handling the server installs.
pub async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    let app = App::new()
        .app_data(json_config())
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let authorization = res.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, authorization, body }
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((AUTHORIZATION, TokenIssuer::bearer(token)))
}
