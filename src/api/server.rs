//! HTTP server lifecycle for the Fleet Sentinel API.

use crate::Sentinel;
use crate::api::configure;
use crate::config::{ApiConfig, DEFAULT_WORKERS};
use crate::error::{Error, Result};

use actix_cors::Cors;
use actix_web::{App, HttpServer, dev::ServerHandle, middleware, web::Data};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// How long [`ApiHandle::shutdown`] waits for the server task.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for controlling a running API server
#[derive(Clone)]
pub struct ApiHandle {
    server: ServerHandle,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    local_addrs: Vec<SocketAddr>,
    config: ApiConfig,
}

impl ApiHandle {
    /// Addresses the server is bound to
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Get the API configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Stop accepting connections, drain in-flight requests and wait for
    /// the server task to finish.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Stopping API server");
        self.server.stop(true).await;

        let mut task = self.task.lock().await;
        if let Some(h) = task.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, h).await {
                Ok(Err(e)) => tracing::warn!("Error while joining API server task: {}", e),
                Ok(Ok(())) => {}
                Err(_) => tracing::warn!("Timeout waiting for API server task to finish"),
            }
        }

        Ok(())
    }
}

/// The HTTP API server
pub struct ApiServer;

impl ApiServer {
    /// Bind the API and serve it from a background task
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved or bound.
    #[tracing::instrument(skip(sentinel, config), fields(address = %config.address, port = config.port))]
    pub async fn start(sentinel: Arc<Sentinel>, config: ApiConfig) -> Result<ApiHandle> {
        let addr_str = format!("{}:{}", config.address, config.port);
        let addr = addr_str
            .to_socket_addrs()
            .map_err(|e| Error::Other(format!("Failed to parse socket address: {}", e)))?
            .next()
            .ok_or_else(|| Error::Other(format!("Could not parse socket address: {}", addr_str)))?;

        let sentinel = Data::new(sentinel);
        let server_builder = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(middleware::Logger::default())
                .wrap(cors)
                .app_data(sentinel.clone())
                .configure(configure)
        });

        let workers = config.workers.unwrap_or(DEFAULT_WORKERS);
        tracing::info!(workers = workers, "Setting number of Actix Web workers");

        let server_builder = server_builder
            .workers(workers)
            .bind(addr)
            .map_err(|e| Error::Other(format!("Failed to bind server: {}", e)))?;
        let local_addrs = server_builder.addrs();

        let server = server_builder.run();
        let server_handle = server.handle();

        let task = tokio::spawn(async move {
            if let Err(e) = server.await {
                tracing::error!(error = %e, "API server error");
            }
            tracing::info!("API server shut down completely");
        });

        tracing::info!(addrs = ?local_addrs, "API server started");

        Ok(ApiHandle {
            server: server_handle,
            task: Arc::new(Mutex::new(Some(task))),
            local_addrs,
            config,
        })
    }
}
