use std::{process, sync::Arc, time::Duration};

use blogo::{
    application::{
        auth::TokenIssuer,
        blogs::BlogService,
        error::AppError,
        repos::{BlogsRepo, UsersRepo},
        users::UserService,
    },
    config,
    infra::{
        auth::JwtAuthority,
        cache::build_cache,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        seed, telemetry,
    },
};
use sqlx::PgPool;
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation("database.url must be configured"))?;

    PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "blogo::migrate", "migrations applied");
    Ok(())
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = PostgresRepositories::new(pool);
    seed::seed(&repositories, &repositories)
        .await
        .map_err(|err| AppError::unexpected(format!("seeding failed: {err}")))?;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    if !settings.auth.has_secret() {
        return Err(AppError::validation(
            "auth.jwt_secret must be configured to serve the API",
        ));
    }

    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let repositories = PostgresRepositories::new(pool);

    let cache = build_cache(&settings.cache).await;
    let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtAuthority::from_settings(&settings.auth));
    let users_repo: Arc<dyn UsersRepo> = Arc::new(repositories.clone());
    let blogs_repo: Arc<dyn BlogsRepo> = Arc::new(repositories.clone());

    let state = AppState::new(
        UserService::new(users_repo, cache.clone(), tokens.clone()),
        BlogService::new(blogs_repo, cache),
        tokens,
    )
    .with_database(repositories)
    .with_request_timeout(settings.server.request_timeout);

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "blogo::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    // bound the drain once the signal fires
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline(grace) => {
            warn!(
                target = "blogo::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "blogo::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target = "blogo::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "blogo::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target = "blogo::serve", "shutdown signal received");
}

/// Resolves `grace` after the first shutdown signal; pending until then.
async fn drain_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}
