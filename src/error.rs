/// Error handling module for Fleet Sentinel.
///
/// This module defines the error types used throughout the library.
/// Only a few of them ever reach the caller of a lifecycle operation:
/// backend and metrics failures are logged and absorbed by the
/// lifecycle manager and the monitoring engine.
///
/// # Example
///
/// ```
/// use fleet_sentinel::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::UnknownResourceType(kind)) => println!("No template for '{}'", kind),
///         Err(Error::ResourceExists(name)) => println!("'{}' is already deployed", name),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the fleet-sentinel library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The file cannot be read
    /// - The JSON or YAML document is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but contains invalid values.
    ///
    /// This error occurs when:
    /// - A name pattern has no `{id}` placeholder
    /// - A threshold is outside 0..=100
    /// - The resource catalog is empty
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Deploy was asked for a type the template catalog does not know.
    ///
    /// Raised before any registry mutation.
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A caller-supplied id formats to a name that is already registered.
    #[error("Resource already exists: {0}")]
    ResourceExists(String),

    /// Requested resource is not in the registry.
    ///
    /// Lifecycle operations report a missing name as `false`; this variant
    /// is only used by lookups that must return a record.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The external container runtime could not be reached at all.
    ///
    /// This error occurs when:
    /// - The runtime binary is not installed
    /// - The runtime daemon is not running
    #[error("Container runtime unavailable: {0}")]
    BackendUnavailable(String),

    /// An individual create/stop/start/remove/inspect call failed.
    #[error("Container runtime call failed: {0}")]
    BackendCall(String),

    /// The startup listing of existing units failed or was malformed.
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    /// The host metrics source could not produce a reading.
    #[error("Metrics source error: {0}")]
    Metrics(String),

    /// Operation timed out.
    ///
    /// This error occurs when:
    /// - A stop call exceeds the configured stop timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for fleet-sentinel operations.
pub type Result<T> = std::result::Result<T, Error>;
