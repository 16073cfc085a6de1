//! Capability documents and the logic that works on them alone.

pub mod applicability;
pub mod catalog;
pub mod template;
mod types;

pub use types::{
    Capability, CapabilityKind, DEFAULT_DESCRIPTION, DESCRIPTION_ANNOTATION, InstallDescriptor,
    InstallStatus, Parameter, ParameterKind, ResourceKindInfo, Source,
};
