//! Step-by-step results of install and uninstall.
//!
//! Neither operation is transactional. A report says which steps finished
//! before a failure so that retry or cleanup tooling can pick up from there.

use std::fmt;

use serde::Serialize;

use crate::capability::Capability;
use crate::error::{CapError, ErrorCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Lookup,
    ProvisionChart,
    ResolveKind,
    Register,
    Commit,
    DeleteDefinition,
    UninstallChart,
    RemoveLocal,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lookup => "lookup",
            Self::ProvisionChart => "provision chart",
            Self::ResolveKind => "resolve kind",
            Self::Register => "register",
            Self::Commit => "commit",
            Self::DeleteDefinition => "delete definition",
            Self::UninstallChart => "uninstall chart",
            Self::RemoveLocal => "remove local",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOutcome {
    Done,
    /// Nothing to do for this capability (no chart, scope kind, ...).
    Skipped,
    /// The cluster already had it; counted as success.
    AlreadyExisted,
    /// The cluster no longer had it; counted as success.
    AlreadyAbsent,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

#[derive(Debug, Serialize)]
pub struct StepFailure {
    pub step: Step,
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip)]
    pub error: CapError,
}

/// Which steps of an install or uninstall completed, and how it ended.
#[derive(Debug, Serialize)]
pub struct OperationReport {
    pub capability: String,
    pub completed: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    /// The installed capability, after a successful install.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<Capability>,
}

impl OperationReport {
    pub(crate) fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            completed: Vec::new(),
            failure: None,
            installed: None,
        }
    }

    pub(crate) fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.completed.push(StepRecord { step, outcome });
    }

    pub(crate) fn fail(mut self, step: Step, error: CapError) -> Self {
        self.failure = Some(StepFailure {
            step,
            code: error.code(),
            message: error.to_string(),
            error,
        });
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    #[must_use]
    pub fn outcome_of(&self, step: Step) -> Option<StepOutcome> {
        self.completed
            .iter()
            .find(|record| record.step == step)
            .map(|record| record.outcome)
    }

    /// Collapse into the installed capability or the failing step's error.
    pub fn into_result(self) -> Result<Option<Capability>> {
        match self.failure {
            Some(failure) => Err(failure.error),
            None => Ok(self.installed),
        }
    }
}
