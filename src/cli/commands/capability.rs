use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::warn;

use crate::app::AppContext;
use crate::capability::CapabilityKind;
use crate::capability::catalog::{list_center_capabilities, list_traits};
use crate::cli::output::{HumanLayout, emit_human, emit_json, json_ok, json_partial};
use crate::error::Result;
use crate::installer::{OperationReport, StepOutcome};
use crate::store::CapabilityStore;

#[derive(Args, Debug)]
pub struct CapArgs {
    #[command(subcommand)]
    pub command: CapCommand,
}

#[derive(Subcommand, Debug)]
pub enum CapCommand {
    /// Install a capability from a center (`<center>/<name>`)
    Install(CapInstallArgs),
    /// Remove an installed capability
    Uninstall(CapUninstallArgs),
    /// List synced capabilities and whether they are installed
    List(CapListArgs),
    /// Show an installed capability and its parameters
    Show(CapShowArgs),
    /// Rebuild the installed set from definitions in the cluster
    SyncCluster(CapSyncClusterArgs),
}

#[derive(Args, Debug)]
pub struct CapInstallArgs {
    /// Capability address, `<center>/<name>`
    pub target: String,
}

#[derive(Args, Debug)]
pub struct CapUninstallArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CapListArgs {
    /// Only this center
    #[arg(long)]
    pub center: Option<String>,
}

#[derive(Args, Debug)]
pub struct CapShowArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CapSyncClusterArgs {
    /// workload or trait
    #[arg(long, default_value = "workload")]
    pub kind: String,

    /// Label selector for definition objects
    #[arg(long, short = 'l')]
    pub selector: Option<String>,

    /// Directory relative template URIs resolve against
    #[arg(long)]
    pub template_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TraitsArgs {
    /// Only traits that apply to this workload
    #[arg(long, short = 'w')]
    pub workload: Option<String>,
}

pub fn run(ctx: &AppContext, args: &CapArgs) -> Result<()> {
    match &args.command {
        CapCommand::Install(args) => install(ctx, args),
        CapCommand::Uninstall(args) => uninstall(ctx, args),
        CapCommand::List(args) => list(ctx, args),
        CapCommand::Show(args) => show(ctx, args),
        CapCommand::SyncCluster(args) => sync_cluster(ctx, args),
    }
}

fn install(ctx: &AppContext, args: &CapInstallArgs) -> Result<()> {
    let report = ctx.installer().install_target(&args.target)?;
    emit_operation(ctx, "Capability Installed", report)
}

fn uninstall(ctx: &AppContext, args: &CapUninstallArgs) -> Result<()> {
    let report = ctx.installer().uninstall(&args.name);
    emit_operation(ctx, "Capability Uninstalled", report)
}

/// Print the step report, then surface the failure (if any) as the
/// command's error.
fn emit_operation(ctx: &AppContext, title: &str, report: OperationReport) -> Result<()> {
    if let Some(failure) = &report.failure {
        let completed: Vec<String> = report
            .completed
            .iter()
            .map(|record| record.step.to_string())
            .collect();
        warn!(
            capability = %report.capability,
            failed_step = %failure.step,
            completed = ?completed,
            "operation stopped part way; completed steps are not rolled back"
        );
    }

    if ctx.json() {
        if report.is_success() {
            emit_json(&json_ok(&report))?;
        }
        return report.into_result().map(|_| ());
    }

    let mut layout = HumanLayout::new();
    layout.title(title).kv("Capability", &report.capability);
    for record in &report.completed {
        let outcome = match record.outcome {
            StepOutcome::Done => "done",
            StepOutcome::Skipped => "skipped",
            StepOutcome::AlreadyExisted => "already existed",
            StepOutcome::AlreadyAbsent => "already absent",
        };
        layout.kv(&record.step.to_string(), outcome);
    }
    match &report.failure {
        Some(failure) => {
            layout.kv(&failure.step.to_string(), "FAILED");
            eprintln!("{}", layout.build());
        }
        None => emit_human(layout),
    }
    report.into_result().map(|_| ())
}

fn list(ctx: &AppContext, args: &CapListArgs) -> Result<()> {
    let views = list_center_capabilities(&ctx.store, args.center.as_deref())?;
    if ctx.json() {
        return emit_json(&json_ok(&views));
    }

    let mut layout = HumanLayout::new();
    layout.title("Capabilities");
    for view in &views {
        layout
            .section(&format!("{}/{}", view.center, view.name))
            .kv("Type", &view.kind.to_string())
            .kv("Definition", &view.definition)
            .kv("Status", &view.status.to_string())
            .kv("Applies to", &view.applies_to.join(", "))
            .kv("Description", &view.description)
            .blank();
    }
    emit_human(layout);
    Ok(())
}

fn show(ctx: &AppContext, args: &CapShowArgs) -> Result<()> {
    let capability = ctx.store.find_installed_any(&args.name)?;
    if ctx.json() {
        return emit_json(&json_ok(serde_json::json!({
            "capability": capability,
            "schema": capability.parameter_schema(),
        })));
    }

    let mut layout = HumanLayout::new();
    layout
        .title(&capability.name)
        .kv("Type", &capability.kind.to_string())
        .kv("Definition", &capability.crd_name)
        .kv("Description", capability.description_or_default())
        .kv("Center", capability.center_name().unwrap_or("-"));
    if let Some(kind) = &capability.resource_kind {
        layout.kv("Resource", &format!("{}.{}", kind.api_version, kind.kind));
    }
    if let Some(chart) = capability.chart_name() {
        layout.kv("Chart", chart);
    }
    if !capability.applies_to.is_empty() {
        layout.kv("Applies to", &capability.applies_to.join(", "));
    }
    layout.blank().section("Parameters");
    for param in &capability.parameters {
        let mut line = format!("{} ({})", param.lookup_key(), param.kind.as_str());
        if param.required {
            line.push_str(" required");
        }
        if let Some(default) = &param.default {
            line.push_str(&format!(" default={default}"));
        }
        if let Some(usage) = &param.usage {
            line.push_str(&format!(": {usage}"));
        }
        layout.bullet(&line);
    }
    emit_human(layout);
    Ok(())
}

fn sync_cluster(ctx: &AppContext, args: &CapSyncClusterArgs) -> Result<()> {
    let kind = CapabilityKind::parse(&args.kind)?;
    let base = match &args.template_root {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let transport = ctx.body_transport(&base)?;
    let report = ctx
        .installer()
        .sync_from_cluster(kind, args.selector.as_deref(), &transport)?;

    if ctx.json() {
        return emit_json(&json_partial(
            &report,
            report.committed.len(),
            report.errors.len(),
        ));
    }
    let mut layout = HumanLayout::new();
    layout
        .title("Synced From Cluster")
        .kv("Kind", &kind.to_string())
        .kv("Committed", &report.committed.len().to_string());
    for name in &report.committed {
        layout.bullet(name);
    }
    for error in &report.errors {
        layout.bullet(&format!("skipped: {error}"));
    }
    emit_human(layout);
    Ok(())
}

pub fn run_traits(ctx: &AppContext, args: &TraitsArgs) -> Result<()> {
    let traits = list_traits(&ctx.store, args.workload.as_deref())?;
    if ctx.json() {
        return emit_json(&json_ok(&traits));
    }

    let mut layout = HumanLayout::new();
    layout.title("Traits");
    for t in &traits {
        layout
            .section(&t.name)
            .kv("Applies to", &t.applies_to.join(", "))
            .kv("Description", t.description_or_default())
            .blank();
    }
    emit_human(layout);
    Ok(())
}
