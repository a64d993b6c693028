use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fleet_sentinel::config::{RuntimeConfig, TemplateCatalog};
use fleet_sentinel::error::{Error, Result};
use fleet_sentinel::runtime::{
    self, BackendKind, BackendRef, ContainerRuntime, RealBackend, RuntimeBackend,
    SimulatedBackend, UnitSummary,
};
use fleet_sentinel::server::{LifecycleEvent, ResourceLifecycleManager, ResourceStatus};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Runtime {}

    #[async_trait]
    impl ContainerRuntime for Runtime {
        async fn probe(&self) -> bool;
        async fn list_units(&self, name_prefixes: &[String]) -> Result<Vec<UnitSummary>>;
        async fn create_and_start(&self, name: &str, image: &str, command: &[String]) -> Result<String>;
        async fn stop(&self, id: &str, grace: Option<Duration>) -> Result<()>;
        async fn start(&self, id: &str) -> Result<()>;
        async fn remove(&self, id: &str, force: bool) -> Result<()>;
        async fn inspect_address(&self, id: &str) -> Result<Option<String>>;
    }
}

fn instant_config() -> RuntimeConfig {
    RuntimeConfig {
        simulated_delay_ms: 0,
        ..RuntimeConfig::default()
    }
}

async fn simulated_manager() -> ResourceLifecycleManager {
    let backend = Box::new(SimulatedBackend::new(&instant_config()));
    ResourceLifecycleManager::new(TemplateCatalog::default(), backend).await
}

async fn real_manager(runtime: MockRuntime) -> ResourceLifecycleManager {
    let backend = Box::new(RealBackend::new(Arc::new(runtime), &instant_config()));
    ResourceLifecycleManager::new(TemplateCatalog::default(), backend).await
}

/// A runtime that accepts a single deploy of `id` at `address`.
fn runtime_with_deploy(id: &'static str, address: &'static str) -> MockRuntime {
    let mut runtime = MockRuntime::new();
    runtime.expect_list_units().returning(|_| Ok(Vec::new()));
    runtime
        .expect_create_and_start()
        .times(1)
        .returning(move |_, _, _| Ok(id.to_string()));
    runtime
        .expect_inspect_address()
        .returning(move |_| Ok(Some(address.to_string())));
    runtime
}

fn unit(name: &str, id: &str, status_text: &str) -> UnitSummary {
    UnitSummary {
        name: name.to_string(),
        id: id.to_string(),
        status_text: status_text.to_string(),
        image: "nginx:alpine".to_string(),
        created_at: None,
    }
}

#[tokio::test]
async fn test_simulated_deploy() -> Result<()> {
    let mut manager = simulated_manager().await;
    assert_eq!(manager.backend_kind(), BackendKind::Simulated);
    assert!(manager.is_empty());

    let web = manager.deploy("web_server", Some("1")).await?;
    assert_eq!(web.name(), "web_server_1");
    assert_eq!(web.resource_type(), "web_server");
    assert_eq!(web.status(), ResourceStatus::Running);
    assert!(!web.is_real());
    assert!(web.backend_ref().is_none());
    assert_eq!(web.network_address(), "192.168.1.10");
    assert_eq!(web.image(), "nginx:alpine");

    let db = manager.deploy("database_server", Some("1")).await?;
    assert_eq!(db.network_address(), "192.168.1.11");

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.get("web_server_1"), Some(web));

    Ok(())
}

#[tokio::test]
async fn test_derived_ids_are_unique() -> Result<()> {
    let mut manager = simulated_manager().await;

    let first = manager.deploy("web_server", None).await?;
    let second = manager.deploy("web_server", None).await?;

    assert!(first.name().starts_with("web_server_"));
    assert!(second.name().starts_with("web_server_"));
    assert_ne!(first.name(), second.name());
    assert_eq!(manager.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_deploy_unknown_type() {
    let mut manager = simulated_manager().await;
    manager.deploy("web_server", Some("1")).await.unwrap();

    let result = manager.deploy("cache_server", Some("1")).await;

    assert!(matches!(result, Err(Error::UnknownResourceType(t)) if t == "cache_server"));
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.events(None, None).len(), 1);
}

#[tokio::test]
async fn test_deploy_duplicate_id() {
    let mut manager = simulated_manager().await;
    manager.deploy("web_server", Some("7")).await.unwrap();

    let result = manager.deploy("web_server", Some("7")).await;

    assert!(matches!(result, Err(Error::ResourceExists(name)) if name == "web_server_7"));
    assert_eq!(manager.len(), 1);
}

#[tokio::test]
async fn test_deploy_all() {
    let mut manager = simulated_manager().await;

    let deployed = manager.deploy_all().await;

    let types: Vec<&str> = deployed.iter().map(|r| r.resource_type()).collect();
    assert_eq!(types, vec!["database_server", "monitoring_server", "web_server"]);
    assert!(deployed.iter().all(|r| r.status() == ResourceStatus::Running));
    assert_eq!(manager.list(), deployed);
}

#[tokio::test]
async fn test_stop_and_restart() -> Result<()> {
    let mut manager = simulated_manager().await;
    manager.deploy("web_server", Some("1")).await?;

    // Restart only applies to stopped resources
    assert!(!manager.restart("web_server_1").await);

    assert!(manager.stop("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Stopped);
    assert!(!manager.stop("web_server_1").await);

    assert!(manager.restart("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Running);
    assert!(!manager.restart("web_server_1").await);

    assert!(!manager.stop("web_server_2").await);
    assert!(!manager.restart("web_server_2").await);

    Ok(())
}

#[tokio::test]
async fn test_terminate_is_repeatable() -> Result<()> {
    let mut manager = simulated_manager().await;
    let deployed = manager.deploy("web_server", Some("1")).await?;

    assert!(manager.terminate("web_server_1").await);
    assert!(manager.terminate("web_server_1").await);

    let terminated = manager.get("web_server_1").unwrap();
    assert_eq!(terminated.status(), ResourceStatus::Terminated);
    assert_eq!(terminated.deployed_at(), deployed.deployed_at());

    assert!(!manager.stop("web_server_1").await);
    assert!(!manager.restart("web_server_1").await);
    assert!(!manager.terminate("web_server_9").await);

    Ok(())
}

#[tokio::test]
async fn test_delete() -> Result<()> {
    let mut manager = simulated_manager().await;
    manager.deploy("web_server", Some("1")).await?;
    manager.deploy("web_server", Some("2")).await?;

    assert!(manager.delete("web_server_1").await);
    assert!(manager.get("web_server_1").is_none());
    assert!(!manager.delete("web_server_1").await);

    let names: Vec<String> = manager.list().iter().map(|r| r.name().to_string()).collect();
    assert_eq!(names, vec!["web_server_2"]);

    // The name is free again
    manager.deploy("web_server", Some("1")).await?;
    assert_eq!(manager.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_events_newest_first() -> Result<()> {
    let mut manager = simulated_manager().await;
    manager.deploy("web_server", Some("1")).await?;
    manager.deploy("database_server", Some("1")).await?;
    manager.stop("web_server_1").await;
    manager.restart("web_server_1").await;

    let events: Vec<LifecycleEvent> = manager
        .events(Some("web_server_1"), None)
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(
        events,
        vec![
            LifecycleEvent::Restarted,
            LifecycleEvent::Stopped,
            LifecycleEvent::Deployed
        ]
    );

    let latest = manager.events(None, Some(2));
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].event, LifecycleEvent::Restarted);
    assert_eq!(latest[1].event, LifecycleEvent::Stopped);

    // No-op transitions are not journaled
    manager.restart("web_server_1").await;
    assert_eq!(manager.events(None, None).len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_real_deploy() -> Result<()> {
    let mut runtime = MockRuntime::new();
    runtime.expect_list_units().times(1).returning(|_| Ok(Vec::new()));
    runtime
        .expect_create_and_start()
        .withf(|name, image, command| {
            name.to_string() == "web_server_1"
                && image.to_string() == "nginx:alpine"
                && command.len() == 2
        })
        .times(1)
        .returning(|_, _, _| Ok("3f2a9c1e7b44d0aa".to_string()));
    runtime
        .expect_inspect_address()
        .returning(|_| Ok(Some("172.17.0.2".to_string())));

    let mut manager = real_manager(runtime).await;
    assert_eq!(manager.backend_kind(), BackendKind::Real);

    let web = manager.deploy("web_server", Some("1")).await?;

    assert_eq!(web.status(), ResourceStatus::Running);
    assert!(web.is_real());
    assert_eq!(web.backend_ref(), Some(&BackendRef::new("3f2a9c1e7b44d0aa")));
    assert_eq!(web.network_address(), "172.17.0.2");

    Ok(())
}

#[tokio::test]
async fn test_real_deploy_failure_is_recorded() -> Result<()> {
    let mut runtime = MockRuntime::new();
    runtime.expect_list_units().returning(|_| Ok(Vec::new()));
    runtime
        .expect_create_and_start()
        .times(1)
        .returning(|_, _, _| Err(Error::BackendCall("pull access denied".to_string())));

    let mut manager = real_manager(runtime).await;
    let web = manager.deploy("web_server", Some("1")).await?;

    assert_eq!(web.status(), ResourceStatus::Failed);
    assert!(!web.is_real());
    assert!(web.backend_ref().is_none());
    assert_eq!(manager.len(), 1);

    let events = manager.events(Some("web_server_1"), None);
    assert_eq!(events[0].event, LifecycleEvent::DeployFailed);
    assert!(events[0].details.as_deref().unwrap_or_default().contains("pull access denied"));

    // Failed resources cannot be stopped or restarted, only terminated or deleted
    assert!(!manager.stop("web_server_1").await);
    assert!(!manager.restart("web_server_1").await);
    assert!(manager.delete("web_server_1").await);

    Ok(())
}

#[tokio::test]
async fn test_real_stop_failure_keeps_registry_state() -> Result<()> {
    let mut runtime = runtime_with_deploy("abc123", "172.17.0.3");
    runtime
        .expect_stop()
        .withf(|id, grace| id.to_string() == "abc123" && *grace == Some(Duration::from_secs(2)))
        .times(1)
        .returning(|_, _| Err(Error::BackendCall("no such container".to_string())));
    runtime
        .expect_start()
        .times(1)
        .returning(|_| Err(Error::BackendCall("no such container".to_string())));

    let mut manager = real_manager(runtime).await;
    manager.deploy("web_server", Some("1")).await?;

    assert!(manager.stop("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Stopped);

    assert!(manager.restart("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Running);

    Ok(())
}

#[tokio::test]
async fn test_real_terminate_and_delete() -> Result<()> {
    let mut runtime = runtime_with_deploy("abc123", "172.17.0.3");
    runtime
        .expect_stop()
        .withf(|_, grace| grace.is_none())
        .times(2)
        .returning(|_, _| Err(Error::BackendCall("container already stopped".to_string())));
    runtime
        .expect_remove()
        .withf(|id, force| id.to_string() == "abc123" && *force)
        .times(1)
        .returning(|_, _| Ok(()));

    let mut manager = real_manager(runtime).await;
    manager.deploy("web_server", Some("1")).await?;

    assert!(manager.terminate("web_server_1").await);
    assert!(manager.terminate("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Terminated);

    assert!(manager.delete("web_server_1").await);
    assert!(manager.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_real_delete_survives_remove_failure() -> Result<()> {
    let mut runtime = runtime_with_deploy("abc123", "172.17.0.3");
    runtime.expect_remove().times(1).returning(|_, _| {
        Err(Error::BackendCall(
            "removal of container abc123 is already in progress".to_string(),
        ))
    });

    let mut manager = real_manager(runtime).await;
    manager.deploy("web_server", Some("1")).await?;

    assert!(manager.delete("web_server_1").await);
    assert!(manager.list().iter().all(|r| r.name() != "web_server_1"));
    assert!(manager.get("web_server_1").is_none());
    assert_eq!(
        manager.events(Some("web_server_1"), Some(1))[0].event,
        LifecycleEvent::Deleted
    );

    Ok(())
}

#[tokio::test]
async fn test_reconciliation() {
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();

    let mut runtime = MockRuntime::new();
    runtime
        .expect_list_units()
        .withf(|prefixes| prefixes.len() == 3)
        .times(1)
        .returning(move |_| {
            Ok(vec![
                UnitSummary {
                    created_at: Some(created),
                    ..unit("web_server_1", "aaa111", "Up 2 hours")
                },
                unit("database_server_2", "bbb222", "Exited (0) 3 days ago"),
                unit("monitoring_server_3", "ccc333", "Created"),
                unit("cache_server_1", "ddd444", "Up 1 minute"),
            ])
        });
    runtime
        .expect_inspect_address()
        .withf(|id| id.to_string() == "aaa111")
        .times(1)
        .returning(|_| Ok(Some("172.17.0.5".to_string())));

    let manager = real_manager(runtime).await;

    assert_eq!(manager.len(), 3);

    let web = manager.get("web_server_1").unwrap();
    assert_eq!(web.resource_type(), "web_server");
    assert_eq!(web.status(), ResourceStatus::Running);
    assert!(web.is_real());
    assert_eq!(web.backend_ref(), Some(&BackendRef::new("aaa111")));
    assert_eq!(web.network_address(), "172.17.0.5");
    assert_eq!(web.deployed_at(), created);

    let db = manager.get("database_server_2").unwrap();
    assert_eq!(db.resource_type(), "database_server");
    assert_eq!(db.status(), ResourceStatus::Stopped);
    assert_eq!(db.network_address(), "unavailable");

    let monitoring = manager.get("monitoring_server_3").unwrap();
    assert_eq!(monitoring.status(), ResourceStatus::Terminated);

    assert!(manager.get("cache_server_1").is_none());
    assert_eq!(manager.events(None, None).len(), 3);
}

#[tokio::test]
async fn test_reconciled_names_block_explicit_ids() {
    let mut runtime = MockRuntime::new();
    runtime
        .expect_list_units()
        .returning(|_| Ok(vec![unit("web_server_1", "aaa111", "Exited (0) 1 hour ago")]));

    let mut manager = real_manager(runtime).await;
    let result = manager.deploy("web_server", Some("1")).await;

    assert!(matches!(result, Err(Error::ResourceExists(_))));
}

#[tokio::test]
async fn test_reconciliation_failure_starts_empty() {
    let mut runtime = MockRuntime::new();
    runtime
        .expect_list_units()
        .times(1)
        .returning(|_| Err(Error::Reconciliation("Malformed unit listing line: 'x'".to_string())));

    let manager = real_manager(runtime).await;

    assert!(manager.is_empty());
    assert_eq!(manager.backend_kind(), BackendKind::Real);
}

#[tokio::test]
async fn test_select_backend() {
    let mut available = MockRuntime::new();
    available.expect_probe().times(1).returning(|| true);
    let backend = runtime::select_backend(Arc::new(available), &instant_config()).await;
    assert_eq!(backend.kind(), BackendKind::Real);

    let mut missing = MockRuntime::new();
    missing.expect_probe().times(1).returning(|| false);
    let backend = runtime::select_backend(Arc::new(missing), &instant_config()).await;
    assert_eq!(backend.kind(), BackendKind::Simulated);
}

/// Runtime whose stop never finishes in time.
struct HangingRuntime;

#[async_trait]
impl ContainerRuntime for HangingRuntime {
    async fn probe(&self) -> bool {
        true
    }

    async fn list_units(&self, _name_prefixes: &[String]) -> Result<Vec<UnitSummary>> {
        Ok(Vec::new())
    }

    async fn create_and_start(&self, _name: &str, _image: &str, _command: &[String]) -> Result<String> {
        Ok("hang".to_string())
    }

    async fn stop(&self, _id: &str, _grace: Option<Duration>) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    async fn start(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _id: &str, _force: bool) -> Result<()> {
        Ok(())
    }

    async fn inspect_address(&self, _id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_stop_times_out() {
    let config = RuntimeConfig {
        stop_timeout_secs: 1,
        ..instant_config()
    };
    let backend = RealBackend::new(Arc::new(HangingRuntime), &config);

    let result = backend.stop(&BackendRef::new("hang")).await;

    assert!(matches!(result, Err(Error::Timeout(_))));
}

#[tokio::test]
async fn test_stop_timeout_does_not_block_lifecycle() -> Result<()> {
    let config = RuntimeConfig {
        stop_timeout_secs: 1,
        ..instant_config()
    };
    let backend = Box::new(RealBackend::new(Arc::new(HangingRuntime), &config));
    let mut manager = ResourceLifecycleManager::new(TemplateCatalog::default(), backend).await;

    let web = manager.deploy("web_server", Some("1")).await?;
    assert_eq!(web.network_address(), "unavailable");

    assert!(manager.stop("web_server_1").await);
    assert_eq!(manager.get("web_server_1").unwrap().status(), ResourceStatus::Stopped);

    Ok(())
}
