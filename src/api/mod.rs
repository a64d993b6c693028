//! HTTP API for Fleet Sentinel using Actix Web.
//!
//! Exposes the lifecycle and monitoring operations of a shared
//! [`Sentinel`](crate::Sentinel) as JSON endpoints under `/api`:
//!
//! - `GET /api/servers`, `POST /api/servers/deploy`
//! - `GET /api/servers/{name}`, `GET /api/servers/{name}/events`
//! - `POST /api/servers/{name}/stop|restart|terminate`
//! - `DELETE /api/servers/{name}/delete`
//! - `GET /api/metrics`, `GET /api/alerts`, `GET /api/system/processes`
//! - `GET /api/stats`
//!
//! # Examples
//!
//! ```no_run
//! use fleet_sentinel::api::ApiServer;
//! use fleet_sentinel::config::ApiConfig;
//! use fleet_sentinel::{Config, Sentinel};
//! use std::sync::Arc;
//!
//! # async fn run() -> fleet_sentinel::Result<()> {
//! let sentinel = Arc::new(Sentinel::new(Config::default()).await?);
//! let handle = ApiServer::start(sentinel, ApiConfig::default()).await?;
//!
//! tokio::signal::ctrl_c().await.ok();
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actix_error;
pub mod handlers;
mod server;
pub mod types;

pub use actix_error::ApiError;
pub use server::{ApiHandle, ApiServer};

use actix_web::web;

/// Register every API route.
///
/// Expects a `Data<Arc<Sentinel>>` in the application data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/servers", web::get().to(handlers::list_servers))
            .route("/servers/deploy", web::post().to(handlers::deploy_server))
            .route("/servers/{name}", web::get().to(handlers::get_server))
            .route("/servers/{name}/events", web::get().to(handlers::server_events))
            .route("/servers/{name}/stop", web::post().to(handlers::stop_server))
            .route("/servers/{name}/restart", web::post().to(handlers::restart_server))
            .route("/servers/{name}/terminate", web::post().to(handlers::terminate_server))
            .route("/servers/{name}/delete", web::delete().to(handlers::delete_server))
            .route("/metrics", web::get().to(handlers::metrics))
            .route("/alerts", web::get().to(handlers::alerts))
            .route("/system/processes", web::get().to(handlers::processes))
            .route("/stats", web::get().to(handlers::stats)),
    );
}
