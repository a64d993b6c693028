use crate::error::{Error, Result};
use crate::monitor::Metric;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of HTTP workers when `api.workers` is not set.
pub const DEFAULT_WORKERS: usize = 4;

/// Placeholder substituted with the resource id in a name pattern.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Deployment template for one resource type.
///
/// The JSON form keeps the original `name` key for the pattern. Any key
/// that is not `name`, `image` or `command` is kept as a default attribute
/// and copied onto every resource deployed from the template.
///
/// ```
/// use fleet_sentinel::config::ResourceTemplate;
///
/// let template: ResourceTemplate = serde_json::from_str(r#"{
///     "name": "web_server_{id}",
///     "image": "nginx:alpine",
///     "port": 80
/// }"#).unwrap();
///
/// assert_eq!(template.format_name("7"), "web_server_7");
/// assert_eq!(template.defaults["port"], 80);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// Catalog key this template was loaded under.
    #[serde(skip)]
    pub type_name: String,

    /// Display name pattern, containing `{id}`.
    #[serde(rename = "name")]
    pub name_pattern: String,

    /// Container image used by the real backend.
    #[serde(default = "default_image")]
    pub image: String,

    /// Command run inside the container, empty for the image default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Default attributes copied onto each deployed resource.
    #[serde(flatten)]
    pub defaults: Map<String, Value>,
}

fn default_image() -> String {
    "busybox:latest".to_string()
}

impl ResourceTemplate {
    /// Build a template with no default attributes.
    pub fn new(type_name: &str, name_pattern: &str, image: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name_pattern: name_pattern.to_string(),
            image: image.to_string(),
            command: Vec::new(),
            defaults: Map::new(),
        }
    }

    /// Substitute `id` into the name pattern.
    pub fn format_name(&self, id: &str) -> String {
        self.name_pattern.replace(ID_PLACEHOLDER, id)
    }
}

/// Read-only mapping from resource type name to deployment template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ResourceTemplate>",
    into = "BTreeMap<String, ResourceTemplate>"
)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, ResourceTemplate>,
}

impl From<BTreeMap<String, ResourceTemplate>> for TemplateCatalog {
    fn from(mut templates: BTreeMap<String, ResourceTemplate>) -> Self {
        for (type_name, template) in templates.iter_mut() {
            template.type_name = type_name.clone();
        }
        Self { templates }
    }
}

impl From<TemplateCatalog> for BTreeMap<String, ResourceTemplate> {
    fn from(catalog: TemplateCatalog) -> Self {
        catalog.templates
    }
}

impl TemplateCatalog {
    /// Build a catalog from a list of templates, keyed by their `type_name`.
    pub fn from_templates(templates: impl IntoIterator<Item = ResourceTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.type_name.clone(), t))
                .collect(),
        }
    }

    /// Look up a template by type name.
    pub fn get(&self, type_name: &str) -> Option<&ResourceTemplate> {
        self.templates.get(type_name)
    }

    /// Type names in catalog order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Templates in catalog order.
    pub fn templates(&self) -> impl Iterator<Item = &ResourceTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Infer the resource type of a unit name.
    ///
    /// The longest type name that `unit_name` starts with wins, so
    /// `web_server_api_1` maps to `web_server_api` when both `web_server`
    /// and `web_server_api` are cataloged.
    pub fn infer_type(&self, unit_name: &str) -> Option<&str> {
        self.type_names()
            .filter(|type_name| unit_name.starts_with(type_name))
            .max_by_key(|type_name| type_name.len())
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        let sleeper = vec!["sleep".to_string(), "3600".to_string()];
        Self::from_templates([
            ResourceTemplate {
                command: sleeper.clone(),
                ..ResourceTemplate::new("web_server", "web_server_{id}", "nginx:alpine")
            },
            ResourceTemplate {
                command: sleeper.clone(),
                ..ResourceTemplate::new("database_server", "database_server_{id}", "redis:alpine")
            },
            ResourceTemplate {
                command: sleeper,
                ..ResourceTemplate::new("monitoring_server", "monitoring_server_{id}", "busybox:latest")
            },
        ])
    }
}

/// Per-metric alert ceilings.
///
/// Keys accept both the long (`cpu_usage`) and short (`cpu`) metric names.
/// A metric without an entry is never thresholded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ThresholdConfig(BTreeMap<Metric, f64>);

impl TryFrom<BTreeMap<String, f64>> for ThresholdConfig {
    type Error = Error;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self> {
        raw.into_iter()
            .map(|(key, ceiling)| Ok((key.parse::<Metric>()?, ceiling)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self)
    }
}

impl From<ThresholdConfig> for BTreeMap<String, f64> {
    fn from(thresholds: ThresholdConfig) -> Self {
        thresholds
            .0
            .into_iter()
            .map(|(metric, ceiling)| (metric.key().to_string(), ceiling))
            .collect()
    }
}

impl ThresholdConfig {
    /// Build a threshold table from `(metric, ceiling)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (Metric, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Ceiling configured for `metric`, if any.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    /// Configured `(metric, ceiling)` pairs in metric order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(metric, ceiling)| (*metric, *ceiling))
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new([(Metric::Cpu, 80.0), (Metric::Memory, 85.0), (Metric::Disk, 90.0)])
    }
}

/// Settings for the monitoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Alert ceilings.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Window over which CPU utilization is observed, in milliseconds.
    #[serde(default = "default_cpu_interval_ms")]
    pub cpu_interval_ms: u64,

    /// Filesystem path whose disk usage is reported.
    #[serde(default = "default_disk_path")]
    pub disk_path: PathBuf,

    /// Maximum number of alerts the caller-owned alert log retains.
    /// `None` keeps every alert for the process lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_log_capacity: Option<usize>,
}

fn default_cpu_interval_ms() -> u64 {
    1000
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("/")
}

impl MonitoringConfig {
    pub fn cpu_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_interval_ms)
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            cpu_interval_ms: default_cpu_interval_ms(),
            disk_path: default_disk_path(),
            alert_log_capacity: None,
        }
    }
}

/// Settings for the runtime backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Container runtime CLI binary.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Hard deadline for a `stop` call against the runtime, in seconds.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Grace period handed to the runtime's own stop, in seconds.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    /// Artificial processing delay of a simulated deploy, in milliseconds.
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,

    /// Address prefix for simulated resources; the host part is
    /// the registry size plus ten.
    #[serde(default = "default_simulated_subnet")]
    pub simulated_subnet: String,
}

fn default_binary() -> String {
    "docker".to_string()
}

fn default_stop_timeout_secs() -> u64 {
    5
}

fn default_stop_grace_secs() -> u64 {
    2
}

fn default_simulated_delay_ms() -> u64 {
    2000
}

fn default_simulated_subnet() -> String {
    "192.168.1.".to_string()
}

impl RuntimeConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            stop_timeout_secs: default_stop_timeout_secs(),
            stop_grace_secs: default_stop_grace_secs(),
            simulated_delay_ms: default_simulated_delay_ms(),
            simulated_subnet: default_simulated_subnet(),
        }
    }
}

/// Settings for the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to.
    #[serde(default = "default_address")]
    pub address: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of Actix Web workers, defaults to [`DEFAULT_WORKERS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            workers: None,
        }
    }
}

/// Main configuration for Fleet Sentinel.
///
/// # JSON Schema
///
/// ```json
/// {
///   "templates": {
///     "web_server": { "name": "web_server_{id}", "image": "nginx:alpine", "cpu": 2 }
///   },
///   "monitoring": {
///     "thresholds": { "cpu_usage": 80, "memory_usage": 85, "disk_usage": 90 },
///     "cpu_interval_ms": 1000
///   },
///   "runtime": { "binary": "docker", "stop_timeout_secs": 5 },
///   "api": { "port": 5000 }
/// }
/// ```
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Resource type catalog.
    #[serde(default)]
    pub templates: TemplateCatalog,

    /// Monitoring engine settings.
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Runtime backend settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// HTTP API settings, absent when the API is not served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,
}

impl Config {
    /// Loads a configuration from a file path.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, everything
    /// else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The contents are not valid JSON/YAML
    /// * The document does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml_str(&content),
            _ => Self::parse_from_str(&content),
        }
    }

    /// Parses a configuration from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Parses a configuration from a YAML string.
    pub fn parse_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse YAML config: {}", e)))
    }
}
