use actix_web::{App, http::StatusCode, test, web::Data};
use async_trait::async_trait;
use fleet_sentinel::api::configure;
use fleet_sentinel::config::RuntimeConfig;
use fleet_sentinel::error::Result;
use fleet_sentinel::monitor::{MetricsSource, NetworkIo, ProcessInfo};
use fleet_sentinel::runtime::SimulatedBackend;
use fleet_sentinel::{Config, Sentinel};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Host that always reports CPU just above the default ceiling.
struct BusyHost;

#[async_trait]
impl MetricsSource for BusyHost {
    async fn cpu_percent(&self, _interval: Duration) -> Result<f64> {
        Ok(81.2)
    }

    fn memory_percent(&self) -> Result<f64> {
        Ok(50.0)
    }

    fn disk_percent(&self, _path: &Path) -> Result<f64> {
        Ok(40.0)
    }

    fn net_io_counters(&self) -> Result<NetworkIo> {
        Ok(NetworkIo::default())
    }

    fn pid_count(&self) -> Result<usize> {
        Ok(3)
    }

    async fn list_processes(&self) -> Result<Vec<ProcessInfo>> {
        Ok((1..=30)
            .map(|pid| ProcessInfo {
                pid,
                name: format!("worker-{}", pid),
                cpu_percent: pid as f64,
                memory_percent: 0.5,
            })
            .collect())
    }
}

async fn sentinel() -> Arc<Sentinel> {
    let runtime = RuntimeConfig {
        simulated_delay_ms: 0,
        ..RuntimeConfig::default()
    };
    let backend = Box::new(SimulatedBackend::new(&runtime));
    let config = Config {
        runtime,
        ..Config::default()
    };

    Arc::new(Sentinel::with_parts(config, backend, Arc::new(BusyHost)).await)
}

macro_rules! app {
    ($sentinel:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($sentinel.clone()))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_deploy_and_list() {
    let sentinel = sentinel().await;
    let app = app!(sentinel);

    let req = test::TestRequest::post()
        .uri("/api/servers/deploy")
        .set_json(json!({"type": "database_server", "id": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["server"]["name"], "database_server_1");
    assert_eq!(body["server"]["type"], "database_server");
    assert_eq!(body["server"]["status"], "running");
    assert_eq!(body["server"]["network_address"], "192.168.1.10");

    let req = test::TestRequest::get().uri("/api/servers").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["servers"][0]["name"], "database_server_1");
}

#[actix_web::test]
async fn test_deploy_defaults_to_web_server() {
    let sentinel = sentinel().await;
    let app = app!(sentinel);

    let req = test::TestRequest::post().uri("/api/servers/deploy").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["server"]["type"], "web_server");
    assert_eq!(sentinel.list().await.len(), 1);
}

#[actix_web::test]
async fn test_deploy_errors() {
    let sentinel = sentinel().await;
    let app = app!(sentinel);

    let req = test::TestRequest::post()
        .uri("/api/servers/deploy")
        .set_json(json!({"type": "cache_server"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 400);
    assert!(body["error"].as_str().unwrap().contains("cache_server"));

    let req = test::TestRequest::post()
        .uri("/api/servers/deploy")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    sentinel.deploy("web_server", Some("1")).await.unwrap();
    let req = test::TestRequest::post()
        .uri("/api/servers/deploy")
        .set_json(json!({"type": "web_server", "id": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    assert_eq!(sentinel.list().await.len(), 1);
}

#[actix_web::test]
async fn test_get_server() {
    let sentinel = sentinel().await;
    sentinel.deploy("web_server", Some("1")).await.unwrap();
    let app = app!(sentinel);

    let req = test::TestRequest::get().uri("/api/servers/web_server_1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["is_real"], false);

    let req = test::TestRequest::get().uri("/api/servers/web_server_2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 404);
}

#[actix_web::test]
async fn test_lifecycle_routes() {
    let sentinel = sentinel().await;
    sentinel.deploy("web_server", Some("1")).await.unwrap();
    let app = app!(sentinel);

    let post = |path: &str| test::TestRequest::post().uri(path).to_request();

    let body: Value = test::call_and_read_body_json(&app, post("/api/servers/web_server_1/stop")).await;
    assert_eq!(body, json!({"success": true}));

    let body: Value = test::call_and_read_body_json(&app, post("/api/servers/web_server_1/stop")).await;
    assert_eq!(body, json!({"success": false}));

    let body: Value =
        test::call_and_read_body_json(&app, post("/api/servers/web_server_1/restart")).await;
    assert_eq!(body, json!({"success": true}));

    let body: Value =
        test::call_and_read_body_json(&app, post("/api/servers/web_server_1/terminate")).await;
    assert_eq!(body, json!({"success": true}));
    assert_eq!(
        sentinel.get("web_server_1").await.unwrap().status(),
        fleet_sentinel::ResourceStatus::Terminated
    );

    let req = test::TestRequest::get()
        .uri("/api/servers/web_server_1/events?limit=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["events"][0]["event"], "terminated");
    assert_eq!(body["events"][1]["event"], "restarted");
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::delete()
        .uri("/api/servers/web_server_1/delete")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"success": true}));
    assert!(sentinel.list().await.is_empty());
}

#[actix_web::test]
async fn test_metrics_and_alerts() {
    let sentinel = sentinel().await;
    let app = app!(sentinel);

    let req = test::TestRequest::get().uri("/api/metrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["metrics"]["cpu_usage"], 81.2);
    assert_eq!(body["alerts"], json!(["High CPU usage: 81.2%"]));

    let req = test::TestRequest::get().uri("/api/alerts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(body["alerts"][0]["metric"], "cpu_usage");
}

#[actix_web::test]
async fn test_processes_limit() {
    let sentinel = sentinel().await;
    let app = app!(sentinel);

    let req = test::TestRequest::get().uri("/api/system/processes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let processes = body["processes"].as_array().unwrap();
    assert_eq!(processes.len(), 20);
    assert_eq!(processes[0]["name"], "worker-30");

    let req = test::TestRequest::get()
        .uri("/api/system/processes?limit=3")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["processes"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_stats() {
    let sentinel = sentinel().await;
    sentinel.deploy("web_server", Some("1")).await.unwrap();
    sentinel.deploy("database_server", Some("1")).await.unwrap();
    sentinel.stop("web_server_1").await;
    sentinel.sample().await;
    let app = app!(sentinel);

    let req = test::TestRequest::get().uri("/api/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body,
        json!({
            "total_servers": 2,
            "active_servers": 1,
            "real_servers": 0,
            "total_alerts": 1,
            "runtime_enabled": false
        })
    );
}
