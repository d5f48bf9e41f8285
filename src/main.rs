use book_rental::{
    adapters::{
        memory::MemoryStore,
        postgres::{self, PostgresCatalog, PostgresLoanHistory, PostgresRentalLedger},
    },
    api::{handlers::AppState, router::create_router},
    application::rental::ServiceDependencies,
    config::{AppConfig, LoggingConfig, StorageKind},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("book_rental={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_dependencies(config: &AppConfig) -> Result<ServiceDependencies, Box<dyn std::error::Error>> {
    let policy = config.rental.policy();
    let operation_timeout = config.rental.operation_timeout();

    match config.database.storage {
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            Ok(ServiceDependencies {
                rental_ledger: store.clone(),
                loan_history: store.clone(),
                catalog: store,
                policy,
                operation_timeout,
            })
        }
        StorageKind::Postgres => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!("Connected to database");

            postgres::run_migrations(&pool).await?;
            tracing::info!("Database migrations completed");

            Ok(ServiceDependencies {
                rental_ledger: Arc::new(PostgresRentalLedger::new(pool.clone())),
                loan_history: Arc::new(PostgresLoanHistory::new(pool.clone())),
                catalog: Arc::new(PostgresCatalog::new(pool)),
                policy,
                operation_timeout,
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    tracing::info!(
        min_days = config.rental.min_days,
        max_days = config.rental.max_days,
        timeout_ms = config.rental.operation_timeout_ms,
        "Starting book rental server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service_deps = build_dependencies(&config).await?;

    let app_state = Arc::new(AppState {
        service_deps,
        jwt_secret: config.auth.jwt_secret.clone(),
    });

    let app = create_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
