use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use folio::{
    application::{
        auth::AuthService,
        categories::CategoryService,
        dashboard::DashboardService,
        error::AppError,
        imaging::ImageProcessor,
        media::MediaService,
        posts::PostService,
        projects::ProjectService,
        storage::ObjectStorage,
        tags::TagService,
        views::ViewService,
    },
    config,
    domain::media::MediaPolicy,
    infra::{
        cache::RedisViewStore,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, LoginRateLimiter},
        storage::S3ObjectStorage,
        telemetry,
    },
};
use tokio::sync::Notify;
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
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target: "folio::migrate", "migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let jwt_secret = settings
        .auth
        .jwt_secret
        .clone()
        .ok_or_else(|| InfraError::configuration("auth.jwt_secret is not configured"))?;

    let repositories = init_repositories(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let view_store = RedisViewStore::new(&settings.redis)
        .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
    let storage: Arc<dyn ObjectStorage> =
        Arc::new(S3ObjectStorage::connect(&settings.storage).await);

    let state = build_api_state(&settings, repositories, Arc::new(view_store), storage, &jwt_secret)?;

    if let Some(password) = settings.auth.admin_password.as_deref() {
        let created = state
            .auth
            .ensure_admin_exists(&settings.auth.admin_username, password)
            .await
            .map_err(|err| AppError::unexpected(format!("failed to seed admin: {err}")))?;
        if created {
            info!(
                target: "folio::auth",
                username = %settings.auth.admin_username,
                "admin account created"
            );
        }
    }

    serve_http(&settings, state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(
    settings: &config::Settings,
    repositories: Arc<PostgresRepositories>,
    view_store: Arc<RedisViewStore>,
    storage: Arc<dyn ObjectStorage>,
    jwt_secret: &str,
) -> Result<ApiState, AppError> {
    let jwt_expiry = time::Duration::try_from(settings.auth.jwt_expiry)
        .map_err(|err| InfraError::configuration(format!("auth.jwt_expiry_seconds: {err}")))?;
    let upload_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("uploads.max_request_bytes exceeds usize"))?;

    let views = ViewService::new(view_store, repositories.clone())
        .with_ttl(settings.views.ttl)
        .with_salt(settings.views.ip_salt.as_str());

    Ok(ApiState {
        posts: Arc::new(PostService::new(repositories.clone())),
        categories: Arc::new(CategoryService::new(repositories.clone())),
        tags: Arc::new(TagService::new(repositories.clone())),
        projects: Arc::new(ProjectService::new(repositories.clone())),
        media: Arc::new(MediaService::new(
            repositories.clone(),
            storage.clone(),
            MediaPolicy::default(),
            ImageProcessor::default(),
        )),
        views: Arc::new(views),
        auth: Arc::new(AuthService::new(
            repositories.clone(),
            jwt_secret.as_bytes(),
            jwt_expiry,
        )),
        dashboard: Arc::new(DashboardService::new(repositories.clone())),
        database: repositories,
        storage,
        login_limiter: Arc::new(LoginRateLimiter::new(
            settings.auth.login_window,
            settings.auth.login_max_attempts.get(),
        )),
        upload_limit,
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target: "folio::http", addr = %settings.server.addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        () = shutdown_signal() => {}
    }

    info!(target: "folio::http", "shutdown requested, draining connections");
    shutdown.notify_one();

    drain(server, settings.server.graceful_shutdown).await
}

async fn drain(
    server: tokio::task::JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), AppError> {
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                target: "folio::http",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target: "folio::http", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target: "folio::http", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
