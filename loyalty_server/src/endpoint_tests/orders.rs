use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{AccountId, Order, OrderNumber, OrderStatus, Points, SubmitOutcome},
    OrderRegistryApi,
    OrderRegistryError,
};

use super::{
    helpers::{alice_token, send, with_token, ALICE},
    mocks::MockOrderManager,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

fn order(number: &str, status: OrderStatus, accrual: i64) -> Order {
    let t = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    Order {
        id: 1,
        number: OrderNumber::new_unchecked(number),
        owner_id: ALICE,
        status,
        accrual: Points::from(accrual),
        submitted_at: t,
        updated_at: t,
    }
}

fn configure(db: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(SubmitOrderRoute::<MockOrderManager>::new())
            .service(MyOrdersRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(OrderRegistryApi::new(db)));
    }
}

fn submit(number: &'static str) -> TestRequest {
    with_token(TestRequest::post().uri("/orders").set_payload(number), &alice_token())
}

#[actix_web::test]
async fn orders_need_a_token() {
    let _ = env_logger::try_init().ok();
    let res = send(TestRequest::get().uri("/orders"), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. No access token was provided."}"#);

    let req = TestRequest::post().uri("/orders").set_payload("12345678903");
    let res = send(with_token(req, "not.a.token"), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let mut token = alice_token();
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let res = send(with_token(TestRequest::get().uri("/orders"), &token), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn submit_a_new_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_submit_order()
        .withf(|number, owner| number.as_str() == "12345678903" && *owner == ALICE)
        .times(1)
        .returning(|n, _| Ok(SubmitOutcome::Accepted(order(n.as_str(), OrderStatus::New, 0))));
    let res = send(submit("12345678903\n"), configure(db)).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn resubmit_own_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_submit_order()
        .returning(|n, _| Ok(SubmitOutcome::AlreadyOwnedBySelf(order(n.as_str(), OrderStatus::Processing, 0))));
    let res = send(submit("12345678903"), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn submit_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_submit_order().returning(|_, _| Ok(SubmitOutcome::OwnedByOther));
    let res = send(submit("12345678903"), configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"Order 12345678903 has already been submitted by another user"}"#);
}

#[actix_web::test]
async fn submit_malformed_numbers() {
    let _ = env_logger::try_init().ok();
    // The backend must never see these, so the mock has no expectations
    let res = send(submit("12345678904"), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = send(submit("9223372036854775809"), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = send(submit("1234-5678"), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = send(submit(""), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(submit("   "), configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn submit_when_the_backend_fails() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_submit_order().returning(|_, _| Err(OrderRegistryError::DatabaseError("database is locked".into())));
    let res = send(submit("12345678903"), configure(db)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, r#"{"error":"An internal server error occurred"}"#);
}

#[actix_web::test]
async fn fetch_my_orders_when_there_are_none() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_account().withf(|owner| *owner == ALICE).returning(|_| Ok(vec![]));
    let res = send(with_token(TestRequest::get().uri("/orders"), &alice_token()), configure(db)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_account().returning(|_| {
        Ok(vec![
            order("12345678903", OrderStatus::Processed, 50050),
            order("79927398713", OrderStatus::Invalid, 0),
            order("2377225624", OrderStatus::New, 0),
        ])
    });
    let res = send(with_token(TestRequest::get().uri("/orders"), &alice_token()), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, ORDERS_JSON);
}

#[actix_web::test]
async fn orders_are_fetched_for_the_token_holder() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_for_account().withf(|owner| *owner == AccountId(42)).times(1).returning(|_| Ok(vec![]));
    let token = super::helpers::issue_token(AccountId(42), "bob");
    let res = send(with_token(TestRequest::get().uri("/orders"), &token), configure(db)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

const ORDERS_JSON: &str = r#"[{"number":"12345678903","status":"PROCESSED","accrual":500.5,"uploaded_at":"2024-06-10T12:00:00Z"},{"number":"79927398713","status":"INVALID","uploaded_at":"2024-06-10T12:00:00Z"},{"number":"2377225624","status":"NEW","uploaded_at":"2024-06-10T12:00:00Z"}]"#;
