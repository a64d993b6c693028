// src/runtime/docker.rs
use crate::error::{Error, Result};
use crate::runtime::{ContainerRuntime, UnitSummary};
use async_process::{Command, Stdio};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::time::Duration;

const LIST_FORMAT: &str = "{{.Names}}|{{.ID}}|{{.Status}}|{{.Image}}|{{.CreatedAt}}";
const ADDRESS_FORMAT: &str = "{{range .NetworkSettings.Networks}}{{.IPAddress}}{{end}}";

/// [`ContainerRuntime`] driving the Docker command-line client.
///
/// Any binary speaking the same CLI (e.g. `podman`) works as well.
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Create a client invoking `binary`
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run one CLI command and return its trimmed stdout
    async fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        tracing::debug!(binary = %self.binary, ?args, "Invoking container runtime");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    Error::BackendUnavailable(format!("'{}' is not installed", self.binary))
                }
                _ => Error::BackendCall(format!("Failed to run {}: {}", self.binary, e)),
            })?;

        if !output.status.success() {
            return Err(Error::BackendCall(format!(
                "{} {} failed: {}",
                self.binary,
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Parse one `docker ps` line in [`LIST_FORMAT`].
///
/// The creation time is optional; the first four fields are not.
pub(crate) fn parse_unit_line(line: &str) -> Result<UnitSummary> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 4 {
        return Err(Error::Reconciliation(format!(
            "Malformed unit listing line: '{}'",
            line
        )));
    }

    Ok(UnitSummary {
        name: parts[0].to_string(),
        id: parts[1].to_string(),
        status_text: parts[2].to_string(),
        image: parts[3].to_string(),
        created_at: parts.get(4).and_then(|raw| parse_created_at(raw)),
    })
}

/// Parse Docker's `CreatedAt`, e.g. `2024-01-15 10:30:00 +0000 UTC`.
pub(crate) fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    // Drop the trailing zone abbreviation, chrono cannot parse it
    let stamp = raw.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|created| created.with_timezone(&Utc))
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn probe(&self) -> bool {
        self.run(&["ps"]).await.is_ok()
    }

    async fn list_units(&self, name_prefixes: &[String]) -> Result<Vec<UnitSummary>> {
        if name_prefixes.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["ps".to_string(), "-a".to_string()];
        for prefix in name_prefixes {
            args.push("--filter".to_string());
            args.push(format!("name={}", prefix));
        }
        args.push("--format".to_string());
        args.push(LIST_FORMAT.to_string());

        let stdout = self.run(&args).await?;
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_unit_line)
            .collect()
    }

    async fn create_and_start(&self, name: &str, image: &str, command: &[String]) -> Result<String> {
        let mut args = vec!["run", "-d", "--name", name, image];
        args.extend(command.iter().map(String::as_str));

        let id = self.run(&args).await?;
        if id.is_empty() {
            return Err(Error::BackendCall(format!(
                "Runtime returned no id for {}",
                name
            )));
        }
        Ok(id)
    }

    async fn stop(&self, id: &str, grace: Option<Duration>) -> Result<()> {
        match grace {
            Some(grace) => {
                let secs = grace.as_secs().to_string();
                self.run(&["stop", "-t", secs.as_str(), id]).await?;
            }
            None => {
                self.run(&["stop", id]).await?;
            }
        }
        Ok(())
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.run(&["start", id]).await?;
        Ok(())
    }

    async fn remove(&self, id: &str, force: bool) -> Result<()> {
        if force {
            self.run(&["rm", "-f", id]).await?;
        } else {
            self.run(&["rm", id]).await?;
        }
        Ok(())
    }

    async fn inspect_address(&self, id: &str) -> Result<Option<String>> {
        let address = self.run(&["inspect", "-f", ADDRESS_FORMAT, id]).await?;
        Ok(Some(address).filter(|a| !a.is_empty()))
    }
}
