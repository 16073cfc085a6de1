use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::appfile::{Application, Inputs};
use crate::cli::output::{HumanLayout, emit_human, emit_json, json_ok};
use crate::error::Result;

/// Where an application file lives.
#[derive(Args, Debug, Clone)]
pub struct AppTarget {
    /// Environment the application file belongs to
    #[arg(long, short = 'e', default_value = "default", env = "CAPKIT_ENV")]
    pub env: String,

    /// Application name (default: the component name)
    #[arg(long, short = 'a')]
    pub app: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Component name
    pub component: String,

    /// Workload capability (required for a new component)
    #[arg(long = "type", short = 't')]
    pub workload_type: Option<String>,

    /// Parameter value, `key=value` (repeatable)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    #[command(flatten)]
    pub target: AppTarget,
}

#[derive(Args, Debug)]
pub struct TraitArgs {
    #[command(subcommand)]
    pub command: TraitCommand,
}

#[derive(Subcommand, Debug)]
pub enum TraitCommand {
    /// Attach a trait to a component, or update its values
    Attach(TraitAttachArgs),
    /// Remove a trait from a component
    Detach(TraitDetachArgs),
}

#[derive(Args, Debug)]
pub struct TraitAttachArgs {
    pub component: String,
    #[arg(value_name = "TRAIT")]
    pub trait_name: String,

    /// Parameter value, `key=value` (repeatable)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    #[command(flatten)]
    pub target: AppTarget,
}

#[derive(Args, Debug)]
pub struct TraitDetachArgs {
    pub component: String,
    #[arg(value_name = "TRAIT")]
    pub trait_name: String,

    #[command(flatten)]
    pub target: AppTarget,
}

#[derive(Args, Debug)]
pub struct ComponentArgs {
    #[command(subcommand)]
    pub command: ComponentCommand,
}

#[derive(Subcommand, Debug)]
pub enum ComponentCommand {
    /// Remove a component from its application file
    Delete(ComponentDeleteArgs),
}

#[derive(Args, Debug)]
pub struct ComponentDeleteArgs {
    pub component: String,

    #[command(flatten)]
    pub target: AppTarget,
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let inputs = Inputs::from_pairs(&args.values)?;
    let app = ctx.workflow(&args.target.env).run(
        &args.component,
        args.target.app.as_deref(),
        args.workload_type.as_deref(),
        &inputs,
    )?;
    emit_component(ctx, "Component Saved", &app, &args.component)
}

pub fn run_trait(ctx: &AppContext, args: &TraitArgs) -> Result<()> {
    match &args.command {
        TraitCommand::Attach(args) => {
            let inputs = Inputs::from_pairs(&args.values)?;
            let app = ctx.workflow(&args.target.env).attach_trait(
                &args.component,
                args.target.app.as_deref(),
                &args.trait_name,
                &inputs,
            )?;
            emit_component(ctx, "Trait Attached", &app, &args.component)
        }
        TraitCommand::Detach(args) => {
            let app = ctx.workflow(&args.target.env).detach_trait(
                &args.component,
                args.target.app.as_deref(),
                &args.trait_name,
            )?;
            emit_component(ctx, "Trait Detached", &app, &args.component)
        }
    }
}

pub fn run_component(ctx: &AppContext, args: &ComponentArgs) -> Result<()> {
    match &args.command {
        ComponentCommand::Delete(args) => {
            let removed = ctx
                .workflow(&args.target.env)
                .delete_component(&args.component, args.target.app.as_deref())?;
            if ctx.json() {
                return emit_json(&json_ok(serde_json::json!({
                    "component": args.component,
                    "removed": removed,
                })));
            }
            let mut layout = HumanLayout::new();
            layout
                .title("Component Deleted")
                .kv("Component", &args.component)
                .kv("Removed", &removed.to_string());
            emit_human(layout);
            Ok(())
        }
    }
}

fn emit_component(ctx: &AppContext, title: &str, app: &Application, component: &str) -> Result<()> {
    let doc = app.component(component);
    if ctx.json() {
        return emit_json(&json_ok(serde_json::json!({
            "application": app.name,
            "component": component,
            "document": doc,
        })));
    }

    let mut layout = HumanLayout::new();
    layout
        .title(title)
        .kv("Application", &app.name)
        .kv("Component", component);
    if let Some(doc) = doc {
        layout.kv("Workload", &doc.workload_type);
        for (key, value) in &doc.fields {
            layout.kv(key, &value.to_string());
        }
        for (name, fields) in &doc.traits {
            layout.blank().section(name);
            for (key, value) in fields {
                layout.kv(key, &value.to_string());
            }
        }
    }
    emit_human(layout);
    Ok(())
}
