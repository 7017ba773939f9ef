use std::future::Future;
use std::sync::Arc;

use picshelf_core::Shelf;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Picshelf HTTP server.
pub struct PicshelfServer {
    config: ServerConfig,
    shelf: Arc<Shelf>,
}

impl PicshelfServer {
    pub fn new(config: ServerConfig, shelf: Arc<Shelf>) -> Self {
        Self { config, shelf }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.shelf)), &self.config)
    }

    /// Serve until the process is stopped.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("picshelf server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picshelf_core::ShelfConfig;

    #[test]
    fn server_construction() {
        let dir = tempfile::tempdir().unwrap();
        let shelf = Arc::new(Shelf::open(ShelfConfig::with_root(dir.path())).unwrap());
        let server = PicshelfServer::new(ServerConfig::default(), shelf);
        assert_eq!(server.config().bind_addr, "127.0.0.1:3000".parse().unwrap());
        let _router = server.router();
    }
}
