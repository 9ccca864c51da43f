use std::net::SocketAddr;
use std::sync::Arc;

use move_resolver::{config::Config, server, EngineSession, OpeningBook, Resolver, UciLauncher};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let book = match OpeningBook::load(&config.book_path, config.book_match) {
        Ok(book) if book.is_empty() => {
            warn!(path = %config.book_path.display(), "opening book has no usable lines");
            book
        }
        Ok(book) => {
            info!(lines = book.len(), mode = ?book.mode(), "loaded opening book");
            book
        }
        Err(e) => {
            warn!(error = %e, "opening book unavailable, every move goes to the engine");
            OpeningBook::empty(config.book_match)
        }
    };

    let launcher =
        UciLauncher::new(&config.engine_path).with_options(config.engine_options.clone());
    let session = Arc::new(EngineSession::new(launcher));
    if let Err(e) = session.start().await {
        warn!(error = %e, "engine will be started on first search");
    }

    let app = server::serve_resolver(Resolver::new(book, Arc::clone(&session)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    session.shutdown().await;
    Ok(())
}
