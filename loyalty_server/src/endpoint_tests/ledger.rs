use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Balance, OrderNumber, Points, Withdrawal, WithdrawalOutcome},
    LedgerApi,
    LedgerError,
};

use super::{
    helpers::{alice_token, send, with_token, ALICE},
    mocks::MockLedgerManager,
};
use crate::routes::{MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn withdrawal(id: i64, number: &str, amount: i64) -> Withdrawal {
    Withdrawal {
        id,
        number: OrderNumber::new_unchecked(number),
        owner_id: ALICE,
        amount: Points::from(amount),
        processed_at: Utc.with_ymd_and_hms(2024, 6, 11, 9, 30, 0).unwrap(),
    }
}

fn configure(db: MockLedgerManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(MyBalanceRoute::<MockLedgerManager>::new())
            .service(WithdrawRoute::<MockLedgerManager>::new())
            .service(MyWithdrawalsRoute::<MockLedgerManager>::new())
            .app_data(web::Data::new(LedgerApi::new(db)));
    }
}

fn withdraw(body: &'static str) -> TestRequest {
    let req = TestRequest::post().uri("/balance/withdraw").insert_header(ContentType::json()).set_payload(body);
    with_token(req, &alice_token())
}

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_balance()
        .withf(|owner| *owner == ALICE)
        .returning(|_| Ok(Balance::new(Points::from(54250), Points::from(4200))));
    let res = send(with_token(TestRequest::get().uri("/balance"), &alice_token()), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"current":500.5,"withdrawn":42}"#);
}

#[actix_web::test]
async fn balance_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let res = send(TestRequest::get().uri("/balance"), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdraw_points() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw()
        .withf(|w| w.owner_id == ALICE && w.number.as_str() == "2377225624" && w.amount == Points::from(75100))
        .times(1)
        .returning(|w| Ok(WithdrawalOutcome::Completed(withdrawal(1, w.number.as_str(), w.amount.value()))));
    let res = send(withdraw(r#"{"order":"2377225624","sum":751}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"order":"2377225624","sum":751,"processed_at":"2024-06-11T09:30:00Z"}"#);
}

#[actix_web::test]
async fn withdraw_more_than_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw().returning(|_| Ok(WithdrawalOutcome::InsufficientFunds { available: Points::from(1050) }));
    let res = send(withdraw(r#"{"order":"2377225624","sum":11}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(res.body, r#"{"error":"Insufficient funds. 10.50 available, 11.00 requested"}"#);
}

#[actix_web::test]
async fn withdraw_against_a_used_reference() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw().returning(|_| Ok(WithdrawalOutcome::DuplicateReference));
    let res = send(withdraw(r#"{"order":"2377225624","sum":1}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdraw_with_bad_input() {
    let _ = env_logger::try_init().ok();
    // Bad references and non-positive amounts are rejected before the backend is called
    let res = send(withdraw(r#"{"order":"2377225625","sum":1}"#), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = send(withdraw(r#"{"order":"2377225624","sum":0}"#), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = send(withdraw(r#"{"order":"2377225624","sum":-5}"#), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    // These never make it past the JSON extractor
    let res = send(withdraw(r#"{"order":"2377225624","sum":7.515}"#), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(withdraw(r#"{"order":"2377225624"}"#), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = send(withdraw("2377225624"), configure(MockLedgerManager::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn withdraw_from_a_deleted_account() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_withdraw().returning(|w| Err(LedgerError::AccountNotFound(w.owner_id)));
    let res = send(withdraw(r#"{"order":"2377225624","sum":1}"#), configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_withdrawals_when_there_are_none() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_withdrawals_for_account().returning(|_| Ok(vec![]));
    let res = send(with_token(TestRequest::get().uri("/withdrawals"), &alice_token()), configure(db)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn fetch_my_withdrawals() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedgerManager::new();
    db.expect_fetch_withdrawals_for_account()
        .withf(|owner| *owner == ALICE)
        .returning(|_| Ok(vec![withdrawal(1, "2377225624", 50000), withdrawal(2, "79927398713", 125)]));
    let res = send(with_token(TestRequest::get().uri("/withdrawals"), &alice_token()), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        r#"[{"order":"2377225624","sum":500,"processed_at":"2024-06-11T09:30:00Z"},{"order":"79927398713","sum":1.25,"processed_at":"2024-06-11T09:30:00Z"}]"#
    );
}
