use fleet_sentinel::api::ApiServer;
use fleet_sentinel::error::Result;
use fleet_sentinel::{ResourceStatus, Sentinel};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const SAMPLE_CYCLES: usize = 5;
const SAMPLE_PAUSE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Console output filtered by RUST_LOG, plus a daily rolling file under logs/
    let file_appender = tracing_appender::rolling::daily("logs", "automation");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    tracing::info!("Starting fleet-sentinel demo");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/config.json".to_string());
    let sentinel = Arc::new(Sentinel::from_config_file(&config_path).await?);
    println!("Backend: {}", sentinel.backend_kind().await);

    println!("\n=== Deploying infrastructure ===");
    for server in sentinel.deploy_all().await {
        println!(
            "- {} [{}] {} (real: {})",
            server.name(),
            server.status(),
            server.network_address(),
            server.is_real()
        );
    }

    println!("\n=== Monitoring ===");
    for cycle in 1..=SAMPLE_CYCLES {
        let sample = sentinel.sample().await;
        let metrics = &sample.snapshot;
        println!(
            "[{}/{}] cpu {:.1}% | memory {:.1}% | disk {:.1}% | {} processes",
            cycle,
            SAMPLE_CYCLES,
            metrics.cpu_usage,
            metrics.memory_usage,
            metrics.disk_usage,
            metrics.process_count
        );
        for message in sample.alert_messages() {
            println!("  ALERT: {}", message);
        }

        if cycle < SAMPLE_CYCLES {
            tokio::time::sleep(SAMPLE_PAUSE).await;
        }
    }

    println!("\n=== Top processes ===");
    for process in sentinel.top_processes(5).await {
        println!(
            "- {} (pid {}): cpu {:.1}% memory {:.1}%",
            process.name, process.pid, process.cpu_percent, process.memory_percent
        );
    }

    // Walk the first running server through its states
    let running = sentinel
        .list()
        .await
        .into_iter()
        .find(|server| server.status() == ResourceStatus::Running);
    if let Some(server) = running {
        println!("\n=== Lifecycle of {} ===", server.name());
        println!("stop: {}", sentinel.stop(server.name()).await);
        println!("restart: {}", sentinel.restart(server.name()).await);
        println!("terminate: {}", sentinel.terminate(server.name()).await);
        println!("delete: {}", sentinel.delete(server.name()).await);
    }

    let stats = sentinel.stats().await;
    println!(
        "\n{} servers, {} running, {} real, {} alerts",
        stats.total_servers, stats.active_servers, stats.real_servers, stats.total_alerts
    );

    if let Some(api_config) = sentinel.config().api.clone() {
        let handle = ApiServer::start(sentinel.clone(), api_config).await?;
        println!("\nAPI listening on {:?}, press Ctrl+C to stop", handle.local_addrs());

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        handle.shutdown().await?;
    }

    tracing::info!("Demo finished");
    Ok(())
}
