use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, json_ok, json_partial};
use crate::error::Result;
use crate::registry::{CenterConfig, SyncReport};

#[derive(Args, Debug)]
pub struct CenterArgs {
    #[command(subcommand)]
    pub command: CenterCommand,
}

#[derive(Subcommand, Debug)]
pub enum CenterCommand {
    /// Register a center and sync it
    Add(CenterAddArgs),
    /// List registered centers
    List,
    /// Remove a center's cache and registration
    Remove(CenterRemoveArgs),
    /// Sync one center, or all of them
    Sync(CenterSyncArgs),
}

#[derive(Args, Debug)]
pub struct CenterAddArgs {
    pub name: String,
    /// GitHub repository URL or local directory
    pub address: String,

    /// Token for private repositories
    #[arg(long, env = "CAPKIT_CENTER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct CenterRemoveArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CenterSyncArgs {
    /// Center to sync (default: all)
    pub name: Option<String>,
}

pub fn run(ctx: &AppContext, args: &CenterArgs) -> Result<()> {
    match &args.command {
        CenterCommand::Add(args) => add(ctx, args),
        CenterCommand::List => list(ctx),
        CenterCommand::Remove(args) => remove(ctx, args),
        CenterCommand::Sync(args) => sync(ctx, args),
    }
}

fn add(ctx: &AppContext, args: &CenterAddArgs) -> Result<()> {
    let token = args.token.clone().filter(|t| !t.is_empty());
    let center = CenterConfig::new(&args.name, &args.address).with_token(token);
    let report = ctx.centers().add(center)?;
    emit_reports(ctx, "Center Added", &[report])
}

fn list(ctx: &AppContext) -> Result<()> {
    let centers = ctx.centers().list()?;
    if ctx.json() {
        // Tokens stay out of the output.
        let rows: Vec<_> = centers
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "address": c.address }))
            .collect();
        return emit_json(&json_ok(rows));
    }

    let mut layout = HumanLayout::new();
    layout.title("Capability Centers");
    if centers.is_empty() {
        layout.push_line("no capability center configured");
    }
    for center in &centers {
        layout.kv(&center.name, &center.address);
    }
    emit_human(layout);
    Ok(())
}

fn remove(ctx: &AppContext, args: &CenterRemoveArgs) -> Result<()> {
    ctx.centers().remove(&args.name)?;
    if ctx.json() {
        emit_json(&json_ok(serde_json::json!({ "removed": args.name })))
    } else {
        let mut layout = HumanLayout::new();
        layout.title("Center Removed").kv("Name", &args.name);
        emit_human(layout);
        Ok(())
    }
}

fn sync(ctx: &AppContext, args: &CenterSyncArgs) -> Result<()> {
    let reports = ctx.centers().sync(args.name.as_deref())?;
    emit_reports(ctx, "Centers Synced", &reports)
}

fn emit_reports(ctx: &AppContext, title: &str, reports: &[SyncReport]) -> Result<()> {
    let synced: usize = reports.iter().map(SyncReport::count).sum();
    let failed: usize = reports.iter().map(|r| r.errors.len()).sum();
    if ctx.json() {
        return emit_json(&json_partial(reports, synced, failed));
    }

    let mut layout = HumanLayout::new();
    layout.title(title);
    for report in reports {
        layout
            .section(&report.center)
            .kv("Synced", &report.count().to_string());
        for name in &report.synced {
            layout.bullet(name);
        }
        for error in &report.errors {
            layout.bullet(&format!("skipped: {error}"));
        }
        layout.blank();
    }
    emit_human(layout);
    Ok(())
}
