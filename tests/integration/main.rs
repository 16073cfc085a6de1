//! Integration test suite entry point.

mod appfile_workflow;
mod center_workflow;
mod github_center;
mod install_workflow;
