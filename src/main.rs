use rusty_library_lending::{
    adapters::{
        book_service::{HttpBookService, LocalBookService},
        postgres::{PostgresLoanRepository, PostgresStockLedger},
    },
    api::{handlers::AppState, router::create_router},
    application::{lending::ServiceDependencies, stock::StockAdjuster},
    config::Config,
    ports::BookService,
};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SIGINTまたはSIGTERMを待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rusty_library_lending=debug,tower_http=debug,axum=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize adapters
    let stock_ledger = Arc::new(PostgresStockLedger::new(pool.clone()));
    let stock_adjuster = StockAdjuster::new(stock_ledger, config.retry_policy());
    let loan_repository = Arc::new(PostgresLoanRepository::new(pool.clone()));

    let book_service: Arc<dyn BookService> = match &config.book_service_url {
        Some(url) => {
            tracing::info!("Using remote book service at {}", url);
            Arc::new(HttpBookService::new(url.as_str(), config.book_service_timeout)?)
        }
        None => {
            tracing::info!("Using local stock ledger as book service");
            Arc::new(LocalBookService::new(stock_adjuster.clone()))
        }
    };

    // Create service dependencies
    let service_deps = ServiceDependencies {
        loan_repository,
        book_service,
    };

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        stock_adjuster: Arc::new(stock_adjuster),
    });

    // Create router
    let app = create_router(app_state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server shut down gracefully");

    Ok(())
}
