//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions. Password hashing is CPU-bound and is pushed onto the
//! blocking pool by [`AuthApi`].
use actix_web::{error::JsonPayloadError, get, http::header::AUTHORIZATION, web, HttpRequest, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    db_types::{SubmitOutcome, WithdrawalOutcome},
    AccountManagement,
    AuthApi,
    LedgerApi,
    LedgerManagement,
    OrderManagement,
    OrderRegistryApi,
};

use crate::{
    auth::{Principal, TokenIssuer},
    data_objects::{Credentials, OrderResponse, WithdrawalRequest, WithdrawalResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Malformed JSON bodies are reported with the same `{"error": ...}` body as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Rejected JSON body. {e}");
        ServerError::InvalidRequestBody(e.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/register" impl AccountManagement);
/// Creates an account and logs it in. The access token is returned in the `Authorization` header.
pub async fn register<B: AccountManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let Credentials { login, password } = body.into_inner();
    let account = api.register(&login, &password).await?;
    let token = signer.issue_token(account.id, &account.login)?;
    Ok(HttpResponse::Ok().insert_header((AUTHORIZATION, TokenIssuer::bearer(&token))).finish())
}

route!(login => Post "/login" impl AccountManagement);
pub async fn login<B: AccountManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let Credentials { login, password } = body.into_inner();
    if login.trim().is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody("login and password are required".into()));
    }
    let account = api.authenticate(&login, &password).await?;
    let token = signer.issue_token(account.id, &account.login)?;
    Ok(HttpResponse::Ok().insert_header((AUTHORIZATION, TokenIssuer::bearer(&token))).finish())
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement);
/// The request body is the bare order number as plain text.
pub async fn submit_order<B: OrderManagement>(
    principal: Principal,
    body: web::Bytes,
    api: web::Data<OrderRegistryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let raw = std::str::from_utf8(&body)
        .map_err(|e| ServerError::InvalidRequestBody(format!("The order number is not valid UTF-8. {e}")))?
        .trim();
    if raw.is_empty() {
        return Err(ServerError::InvalidRequestBody("The order number is missing".into()));
    }
    trace!("💻️ {} submitted order [{raw}]", principal.login);
    let number = OrderRegistryApi::<B>::validate_number(raw)?;
    match api.submit(&number, principal.account_id).await? {
        SubmitOutcome::Accepted(_) => Ok(HttpResponse::Accepted().finish()),
        SubmitOutcome::AlreadyOwnedBySelf(_) => Ok(HttpResponse::Ok().finish()),
        SubmitOutcome::OwnedByOther => {
            Err(ServerError::Conflict(format!("Order {number} has already been submitted by another user")))
        },
    }
}

route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(
    principal: Principal,
    api: web::Data<OrderRegistryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching orders for {}", principal.login);
    let orders = api.list_orders(principal.account_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Ledger  ----------------------------------------------------
route!(my_balance => Get "/balance" impl LedgerManagement);
pub async fn my_balance<B: LedgerManagement>(
    principal: Principal,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching balance for {}", principal.login);
    let balance = api.balance(principal.account_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/balance/withdraw" impl LedgerManagement);
pub async fn withdraw<B: LedgerManagement>(
    principal: Principal,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    trace!("💻️ {} requested a withdrawal of {sum} against [{order}]", principal.login);
    match api.withdraw(principal.account_id, &order, sum).await? {
        WithdrawalOutcome::Completed(w) => Ok(HttpResponse::Ok().json(WithdrawalResponse::from(w))),
        WithdrawalOutcome::InsufficientFunds { available } => {
            Err(ServerError::InsufficientFunds(format!("{available} available, {sum} requested")))
        },
        WithdrawalOutcome::DuplicateReference => {
            Err(ServerError::Conflict(format!("A withdrawal against {order} has already been made")))
        },
    }
}

route!(my_withdrawals => Get "/withdrawals" impl LedgerManagement);
pub async fn my_withdrawals<B: LedgerManagement>(
    principal: Principal,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching withdrawals for {}", principal.login);
    let withdrawals = api.list_withdrawals(principal.account_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}
