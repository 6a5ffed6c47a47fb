use actix_web::{web, App, HttpServer};
use chat_relay_service::{
    config, db, error, logging, routes,
    services::{PostgresChatDirectory, PostgresIdentityService},
    state::AppState,
    storage::PostgresGateway,
    websocket::{broadcaster::GroupBroadcaster, registry::ConnectionRegistry},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let db = db::init_pool(&cfg.database_url, cfg.db_pool_size)?;

    let registry = ConnectionRegistry::new();
    let broadcaster = GroupBroadcaster::new();

    let state = AppState {
        db: db.clone(),
        registry,
        broadcaster,
        gateway: Arc::new(PostgresGateway::new(db.clone())),
        identity: Arc::new(PostgresIdentityService::new(db.clone())),
        directory: Arc::new(PostgresChatDirectory::new(db.clone())),
        config: cfg.clone(),
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting chat-relay-service");

    HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .service(routes::wsroute::ws_handler)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("run server: {e}")))
}
