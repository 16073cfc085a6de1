//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Capability errors
//! - 2xx: Center errors
//! - 3xx: Config errors
//! - 4xx: Application errors
//! - 5xx: Network errors
//! - 6xx: Storage errors
//! - 7xx: Cluster errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output.
///
/// Each variant maps to a numeric code (e.g., `CapabilityNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Capability errors (1xx)
    // ========================================
    /// E101: Capability is neither synced nor installed
    CapabilityNotFound,
    /// E102: Capability manifest or template is malformed
    CapabilityInvalid,
    /// E103: Operation not supported for this capability kind
    CapabilityUnsupported,
    /// E104: A required parameter was not supplied
    ParameterRequired,
    /// E105: A parameter value could not be coerced to its declared kind
    ParameterTypeMismatch,

    // ========================================
    // Center errors (2xx)
    // ========================================
    /// E201: Center is not registered
    CenterNotFound,
    /// E202: No capability center is configured at all
    CenterNotConfigured,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Application errors (4xx)
    // ========================================
    /// E401: Component does not exist in the application document
    ComponentNotFound,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E501: Registry or template URI unreachable
    RemoteFetchFailed,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Local file operation failed
    IoError,
    /// E602: Stored data could not be (de)serialized
    SerializationError,

    // ========================================
    // Cluster errors (7xx)
    // ========================================
    /// E701: Cluster API call failed
    ClusterError,
    /// E703: Backing API group is not served by the cluster
    MissingProvider,
    /// E704: Chart install or uninstall failed
    ProvisionFailed,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Document or input validation failed
    ValidationFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Generic lookup failure
    NotFound,
    /// E902: Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code (e.g., 101 for `CapabilityNotFound`).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::CapabilityNotFound => 101,
            Self::CapabilityInvalid => 102,
            Self::CapabilityUnsupported => 103,
            Self::ParameterRequired => 104,
            Self::ParameterTypeMismatch => 105,

            Self::CenterNotFound => 201,
            Self::CenterNotConfigured => 202,

            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            Self::ComponentNotFound => 401,

            Self::RemoteFetchFailed => 501,

            Self::IoError => 601,
            Self::SerializationError => 602,

            Self::ClusterError => 701,
            Self::MissingProvider => 703,
            Self::ProvisionFailed => 704,

            Self::ValidationFailed => 801,

            Self::NotFound => 901,
            Self::InternalError => 902,
        }
    }

    /// Get the code as a string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Static recovery hint for this code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::CapabilityNotFound => "Run `capkit center sync` and `capkit cap list` to see available capabilities",
            Self::CapabilityInvalid => "Check the definition manifest and its template body in the center",
            Self::CapabilityUnsupported => "Scope capabilities are not managed by capkit yet",
            Self::ParameterRequired => "Pass the parameter with `--set <name>=<value>`",
            Self::ParameterTypeMismatch => "Check the parameter type with `capkit cap show <name>`",

            Self::CenterNotFound => "Run `capkit center list` to see registered centers",
            Self::CenterNotConfigured => "Register a center with `capkit center add <name> <address>`",

            Self::ConfigInvalid => "Check TOML syntax in the config file",
            Self::ConfigMissingRequired => "Set the required value in config.toml or through CAPKIT_* variables",

            Self::ComponentNotFound => "Check the component name in the application file",

            Self::RemoteFetchFailed => "Check network access to the center and that the token is valid",

            Self::IoError => "Check that the capkit home directory exists and is writable",
            Self::SerializationError => "The stored file may be corrupted. Re-sync the center or remove the file",

            Self::ClusterError => "Check cluster connectivity with `kubectl cluster-info`",
            Self::MissingProvider => "Install the controller that serves the missing API group, then retry",
            Self::ProvisionFailed => "Check `helm` output and chart repository access, then retry",

            Self::ValidationFailed => "Review the validation message and fix the input",

            Self::NotFound => "The requested resource was not found. Check the identifier",
            Self::InternalError => "An unexpected error occurred. Please report it with the full output",
        }
    }

    /// Whether a user can act on this error without code changes.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError | Self::InternalError)
    }

    /// Category name derived from the numeric family.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "capability",
            2 => "center",
            3 => "config",
            4 => "application",
            5 => "network",
            6 => "storage",
            7 => "cluster",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Every defined code, in numeric order.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::CapabilityNotFound,
            Self::CapabilityInvalid,
            Self::CapabilityUnsupported,
            Self::ParameterRequired,
            Self::ParameterTypeMismatch,
            Self::CenterNotFound,
            Self::CenterNotConfigured,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::ComponentNotFound,
            Self::RemoteFetchFailed,
            Self::IoError,
            Self::SerializationError,
            Self::ClusterError,
            Self::MissingProvider,
            Self::ProvisionFailed,
            Self::ValidationFailed,
            Self::NotFound,
            Self::InternalError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
