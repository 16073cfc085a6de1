use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, json_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommand,
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Show an application file
    Show(AppShowArgs),
    /// List application files in an environment
    List(AppListArgs),
}

#[derive(Args, Debug)]
pub struct AppShowArgs {
    pub name: String,

    #[arg(long, short = 'e', default_value = "default", env = "CAPKIT_ENV")]
    pub env: String,
}

#[derive(Args, Debug)]
pub struct AppListArgs {
    #[arg(long, short = 'e', default_value = "default", env = "CAPKIT_ENV")]
    pub env: String,
}

pub fn run(ctx: &AppContext, args: &AppArgs) -> Result<()> {
    match &args.command {
        AppCommand::Show(args) => show(ctx, args),
        AppCommand::List(args) => list(ctx, args),
    }
}

fn show(ctx: &AppContext, args: &AppShowArgs) -> Result<()> {
    let app = ctx.workflow(&args.env).show(&args.name)?;
    if ctx.json() {
        return emit_json(&json_ok(&app));
    }
    let rendered = serde_yaml::to_string(&app)?;
    let mut layout = HumanLayout::new();
    layout
        .title(&app.name)
        .kv("Env", &args.env)
        .kv("Path", &ctx.appfiles.path(&args.env, &app.name).display().to_string())
        .blank()
        .push_line(rendered.trim_end());
    emit_human(layout);
    Ok(())
}

fn list(ctx: &AppContext, args: &AppListArgs) -> Result<()> {
    let names = ctx.appfiles.list(&args.env)?;
    if ctx.json() {
        return emit_json(&json_ok(&names));
    }
    let mut layout = HumanLayout::new();
    layout.title(&format!("Applications ({})", args.env));
    for name in &names {
        layout.bullet(name);
    }
    emit_human(layout);
    Ok(())
}
