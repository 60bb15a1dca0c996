use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cm_api::{create_app, AppState, HttpSettings};
use cm_core::{InMemoryOtpStore, OtpManager, OtpManagerConfig, OtpStore, OtpSweeper, SweepConfig};
use cm_infra::cache::{RedisClient, RedisOtpStore};
use cm_infra::database::{DatabasePool, MySqlOtpStore};
use cm_infra::email::{create_email_service, EmailNotifier, EmailService};
use cm_shared::{AppConfig, LogFormat, LoggingConfig, OtpStoreBackend};

type Mailer = EmailNotifier<dyn EmailService>;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.logging);

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    tracing::info!(
        environment = ?config.environment,
        store = ?config.otp.store,
        email_provider = ?config.smtp.provider,
        "Starting Campus Market API server"
    );

    let mailer = create_email_service(&config.smtp).context("Failed to set up email delivery")?;
    let notifier: Arc<Mailer> = Arc::new(EmailNotifier::new(mailer));

    match config.otp.store {
        OtpStoreBackend::Memory => serve(config, Arc::new(InMemoryOtpStore::new()), notifier).await,
        OtpStoreBackend::MySql => {
            let pool = DatabasePool::new(config.database.clone())
                .await
                .context("Failed to connect to MySQL")?;
            if config.database.run_migrations {
                pool.run_migrations().await.context("Failed to run migrations")?;
            }
            let store = Arc::new(MySqlOtpStore::new(pool.get_pool().clone()));
            let result = serve(config, store, notifier).await;
            pool.close().await;
            result
        }
        OtpStoreBackend::Redis => {
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("Failed to connect to Redis")?;
            serve(config, Arc::new(RedisOtpStore::new(client)), notifier).await
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.source_location)
        .with_line_number(logging.source_location);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Runs the HTTP server and the expiry sweep until shutdown
async fn serve<S>(config: AppConfig, store: Arc<S>, notifier: Arc<Mailer>) -> anyhow::Result<()>
where
    S: OtpStore + 'static,
{
    let manager = Arc::new(OtpManager::new(
        store,
        notifier,
        OtpManagerConfig::from(&config.otp),
    ));

    let sweeper = Arc::new(OtpSweeper::new(manager.clone(), SweepConfig::from(&config.otp)));
    let sweeper_handle = sweeper.start();

    let app_state = web::Data::new(AppState::new(manager));
    let settings = HttpSettings {
        environment: config.environment,
        cors: config.cors.clone(),
        max_payload_size: config.server.max_payload_size,
    };

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(app_state.clone(), &settings))
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive))
        .shutdown_timeout(config.server.shutdown_timeout);
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server error");

    tracing::info!("Server stopped, shutting down expiry sweep");
    if let Err(e) = sweeper_handle.shutdown().await {
        tracing::error!(error = %e, "Expiry sweep did not stop cleanly");
    }

    result
}
