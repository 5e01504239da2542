use todo_api::{
    application::todo_service::TodoServiceImpl,
    config::{Config, StoreKind},
    domain::repository::TodoRepository,
    http::routing::{self, todos},
    infrastructure::{json_repo::JsonFileTodoRepository, memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    match &config.store {
        StoreKind::Memory => serve(InMemoryTodoRepository::default(), &config).await,
        StoreKind::Json(path) => serve(JsonFileTodoRepository::new(path), &config).await,
        StoreKind::Sqlite(url) => serve(SqliteTodoRepository::connect(url).await?, &config).await,
    }
}

async fn serve<R: TodoRepository + Clone>(repo: R, config: &Config) -> anyhow::Result<()> {
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);
    let router = routing::app(todos::router(todos::AppState { service }));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, store = ?config.store, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
