use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{AccrualClient, AuthApi, LedgerApi, OrderRegistryApi, SqliteDatabase};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual_worker::start_accrual_worker,
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        json_config,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

/// Connects to the database, starts the reconciliation worker and serves HTTP until the server is stopped (SIGINT or
/// SIGTERM). The worker is then asked to stop and is awaited before this function returns.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    } else {
        info!("🚀️ Skipping database migrations");
    }
    let client = AccrualClient::new(&config.accrual.base_url, config.accrual.timeout)
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    info!("🚀️ Accrual authority: {}", client.base_url());
    let shutdown = CancellationToken::new();
    let worker = start_accrual_worker(db.clone(), client, config.accrual.interval, shutdown.clone());
    let result = match create_server_instance(config, db.clone()) {
        Ok(srv) => srv.await.map_err(ServerError::from),
        Err(e) => Err(e),
    };
    info!("🚀️ Server stopped. Waiting for the reconciliation worker to finish");
    shutdown.cancel();
    if let Err(e) = worker.await {
        error!("🚀️ The reconciliation worker did not shut down cleanly. {e}");
    }
    db.close().await;
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderRegistryApi::new(db.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
