//! Booking Bot Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use booking_bot_config::{load_settings, Settings};
use booking_bot_persistence::{InMemoryTurnLogStore, ScyllaConfig, TurnLogStore};
use booking_bot_server::{create_router, init_metrics, AppState, BookingBot, BotServices};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("BOOKING_BOT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        },
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!("Starting Booking Bot Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let turn_log = init_turn_log(&config).await;
    let services = BotServices::from_settings(&config, turn_log)?;
    let bot = BookingBot::new(&config, services)?;

    let status = bot.service_status();
    tracing::info!(
        intent = status.intent,
        knowledge_base = status.knowledge_base,
        sentiment = status.sentiment,
        "External services"
    );
    if !status.intent {
        tracing::warn!("Intent service is not configured, only flight booking is available");
    }

    let mut state = AppState::new(config.clone(), bot);

    if config.observability.metrics_enabled {
        match init_metrics() {
            Ok(handle) => {
                tracing::info!("Initialized Prometheus metrics at /metrics");
                state = state.with_metrics(handle);
            },
            Err(e) => tracing::warn!(error = %e, "Failed to install metrics recorder"),
        }
    }

    let cleanup = state.sessions.start_cleanup_task();

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Turn log backed by ScyllaDB when enabled, in memory otherwise
async fn init_turn_log(config: &Settings) -> Arc<dyn TurnLogStore> {
    let in_memory = || {
        Arc::new(InMemoryTurnLogStore::with_capacity(config.persistence.memory_capacity))
            as Arc<dyn TurnLogStore>
    };

    if !config.persistence.enabled {
        tracing::info!(
            capacity = config.persistence.memory_capacity,
            "Persistence disabled, keeping the most recent turn records in memory"
        );
        return in_memory();
    }

    tracing::info!("Initializing ScyllaDB persistence layer...");
    match booking_bot_persistence::init(ScyllaConfig::from(&config.persistence)).await {
        Ok(persistence) => {
            tracing::info!(
                hosts = ?config.persistence.scylla_hosts,
                keyspace = %config.persistence.keyspace,
                "ScyllaDB persistence initialized"
            );
            Arc::new(persistence.turn_log)
        },
        Err(e) => {
            tracing::error!(
                "Failed to initialize ScyllaDB: {}. Falling back to in-memory.",
                e
            );
            in_memory()
        },
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("booking_bot={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
