//! HTTP request handlers for the Fleet Sentinel API.
//!
//! Each handler is a thin adapter over one [`Sentinel`] operation.

use crate::Sentinel;
use crate::api::actix_error::ApiError;
use crate::api::types::{
    AlertList, DeployRequest, DeployResponse, EventList, LimitQuery, MetricsResponse,
    OperationResponse, ProcessList, ServerList,
};
use crate::error::Error;
use crate::server::ResourceStatus;

use actix_web::{
    HttpResponse,
    web::{Bytes, Data, Path, Query},
};
use std::sync::Arc;

type SentinelData = Data<Arc<Sentinel>>;

/// `GET /api/servers`
pub async fn list_servers(sentinel: SentinelData) -> HttpResponse {
    let servers = sentinel.list().await;
    HttpResponse::Ok().json(ServerList {
        count: servers.len(),
        servers,
    })
}

/// `POST /api/servers/deploy`
///
/// The body is optional; an empty one deploys a `web_server`.
pub async fn deploy_server(sentinel: SentinelData, body: Bytes) -> Result<HttpResponse, ApiError> {
    let request: DeployRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeployRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?
    };
    tracing::debug!(?request, "Deploy requested over HTTP");

    let server = sentinel
        .deploy(&request.resource_type, request.id.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(DeployResponse {
        success: server.status() != ResourceStatus::Failed,
        server,
    }))
}

/// `GET /api/servers/{name}`
pub async fn get_server(sentinel: SentinelData, name: Path<String>) -> Result<HttpResponse, Error> {
    let name = name.into_inner();
    match sentinel.get(&name).await {
        Some(server) => Ok(HttpResponse::Ok().json(server)),
        None => Err(Error::ResourceNotFound(name)),
    }
}

/// `GET /api/servers/{name}/events`
pub async fn server_events(
    sentinel: SentinelData,
    name: Path<String>,
    query: Query<LimitQuery>,
) -> HttpResponse {
    let events = sentinel.events(Some(name.as_str()), query.limit).await;
    HttpResponse::Ok().json(EventList { events })
}

/// `POST /api/servers/{name}/stop`
pub async fn stop_server(sentinel: SentinelData, name: Path<String>) -> HttpResponse {
    let success = sentinel.stop(&name).await;
    HttpResponse::Ok().json(OperationResponse { success })
}

/// `POST /api/servers/{name}/restart`
pub async fn restart_server(sentinel: SentinelData, name: Path<String>) -> HttpResponse {
    let success = sentinel.restart(&name).await;
    HttpResponse::Ok().json(OperationResponse { success })
}

/// `POST /api/servers/{name}/terminate`
pub async fn terminate_server(sentinel: SentinelData, name: Path<String>) -> HttpResponse {
    let success = sentinel.terminate(&name).await;
    HttpResponse::Ok().json(OperationResponse { success })
}

/// `DELETE /api/servers/{name}/delete`
pub async fn delete_server(sentinel: SentinelData, name: Path<String>) -> HttpResponse {
    let success = sentinel.delete(&name).await;
    HttpResponse::Ok().json(OperationResponse { success })
}

/// `GET /api/metrics`
///
/// Takes a fresh sample, so alerts raised here land in the alert log.
pub async fn metrics(sentinel: SentinelData) -> HttpResponse {
    let sample = sentinel.sample().await;
    HttpResponse::Ok().json(MetricsResponse {
        alerts: sample.alert_messages(),
        metrics: sample.snapshot,
    })
}

/// `GET /api/alerts`
pub async fn alerts(sentinel: SentinelData, query: Query<LimitQuery>) -> HttpResponse {
    let alerts = sentinel.recent_alerts(query.or_default()).await;
    HttpResponse::Ok().json(AlertList { alerts })
}

/// `GET /api/system/processes`
pub async fn processes(sentinel: SentinelData, query: Query<LimitQuery>) -> HttpResponse {
    let processes = sentinel.top_processes(query.or_default()).await;
    HttpResponse::Ok().json(ProcessList { processes })
}

/// `GET /api/stats`
pub async fn stats(sentinel: SentinelData) -> HttpResponse {
    HttpResponse::Ok().json(sentinel.stats().await)
}
