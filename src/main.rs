use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;

use stockschool::config::AppConfig;
use stockschool::databases::auth::logindb::PgUserStore;
use stockschool::databases::auth::tempdb::PgPendingStore;
use stockschool::databases::auth::PendingStore;
use stockschool::databases::{setup_backend, spawn_pending_sweeper};
use stockschool::routes;
use stockschool::services::signup::AuthService;
use stockschool::services::sms::Fast2SmsGateway;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let pool = setup_backend(&config.server).await?;

    let pending: Arc<dyn PendingStore> = Arc::new(PgPendingStore::new(pool.clone()));
    let users = Arc::new(PgUserStore::new(pool));
    let gateway = Arc::new(Fast2SmsGateway::new(config.otp.clone()));

    let _sweeper = spawn_pending_sweeper(
        pending.clone(),
        Duration::from_secs(config.server.sweep_interval_secs),
    );

    let service = web::Data::new(AuthService::new(pending, users, gateway, config.otp.clone()));
    let smtp = web::Data::new(config.smtp.clone());

    let bind = (config.server.host.clone(), config.server.port);
    info!("🚀 Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(service.clone())
            .app_data(smtp.clone())
            .configure(routes::init)
    })
    .bind(bind)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server exited with an error")
}
