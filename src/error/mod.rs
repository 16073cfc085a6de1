//! Error handling for capkit.
//!
//! This module provides:
//! - [`CapError`]: The main error enum for all capkit operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for capkit operations.
#[derive(Error, Debug)]
pub enum CapError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("{0} not exist")]
    CapabilityNotFound(String),

    #[error("{0} center not exist")]
    CenterNotFound(String),

    #[error("no capability center configured")]
    NoCenterConfigured,

    #[error("component {component} not found in application {application}")]
    ComponentNotFound {
        application: String,
        component: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("invalid capability: {0}")]
    InvalidCapability(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    #[error("provision failed: {0}")]
    Provision(String),

    #[error("required flag(s) \"{0}\" not set")]
    RequiredParameter(String),

    #[error("get flag(s) \"{parameter}\" err {reason}")]
    TypeMismatch { parameter: String, reason: String },

    #[error("installing capability '{capability}'... expected provider: {provider}")]
    MissingProvider {
        capability: String,
        provider: String,
    },

    #[error("cluster error: {0}")]
    Cluster(String),

    #[error("{0}")]
    Unsupported(String),
}

impl CapError {
    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::CapabilityNotFound(_) => ErrorCode::CapabilityNotFound,
            Self::CenterNotFound(_) => ErrorCode::CenterNotFound,
            Self::NoCenterConfigured => ErrorCode::CenterNotConfigured,
            Self::ComponentNotFound { .. } => ErrorCode::ComponentNotFound,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidCapability(_) => ErrorCode::CapabilityInvalid,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::RemoteFetch(_) => ErrorCode::RemoteFetchFailed,
            Self::Provision(_) => ErrorCode::ProvisionFailed,
            Self::RequiredParameter(_) => ErrorCode::ParameterRequired,
            Self::TypeMismatch { .. } => ErrorCode::ParameterTypeMismatch,
            Self::MissingProvider { .. } => ErrorCode::MissingProvider,
            Self::Cluster(_) => ErrorCode::ClusterError,
            Self::Unsupported(_) => ErrorCode::CapabilityUnsupported,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::CapabilityNotFound(name) => Some(serde_json::json!({ "capability": name })),
            Self::CenterNotFound(name) => Some(serde_json::json!({ "center": name })),
            Self::ComponentNotFound {
                application,
                component,
            } => Some(serde_json::json!({ "application": application, "component": component })),
            Self::RequiredParameter(name) => Some(serde_json::json!({ "parameter": name })),
            Self::TypeMismatch { parameter, reason } => {
                Some(serde_json::json!({ "parameter": parameter, "reason": reason }))
            }
            Self::MissingProvider {
                capability,
                provider,
            } => Some(serde_json::json!({ "capability": capability, "provider": provider })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// True for the "absent" family, which callers often treat as nothing to do.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CapabilityNotFound(_)
                | Self::CenterNotFound(_)
                | Self::ComponentNotFound { .. }
                | Self::NotFound(_)
        )
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_cap_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "CAPABILITY_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_cap_error(err: &CapError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&CapError> for StructuredError {
    fn from(err: &CapError) -> Self {
        Self::from_cap_error(err)
    }
}

/// Result type alias using CapError.
pub type Result<T> = std::result::Result<T, CapError>;
