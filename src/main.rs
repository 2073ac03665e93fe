use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use order_notifier::config;
use order_notifier::db;
use order_notifier::routes;
use order_notifier::services::{DeliveryClient, WebhookClient};
use order_notifier::sweep::spawn_sweep_worker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Starting order notifier on {}:{}",
        config.host,
        config.port
    );

    let db_pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    db::run_migrations(&db_pool).await.map_err(|e| {
        log::error!("Migration error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let webhook_client = WebhookClient::new(config.dispatch.webhook_timeout).map_err(|e| {
        log::error!("Webhook client error: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let delivery_client: Arc<dyn DeliveryClient> = Arc::new(webhook_client);

    let sweep_worker = spawn_sweep_worker(
        db_pool.clone(),
        Arc::clone(&delivery_client),
        config.sweep.clone(),
    );

    let host = config.host.clone();
    let port = config.port;
    let client_data: web::Data<dyn DeliveryClient> = web::Data::from(delivery_client);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(client_data.clone())
            .wrap(middleware::Logger::default())
            .wrap(routes::cors())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        if let Some(worker) = sweep_worker {
            worker.abort();
        }
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
