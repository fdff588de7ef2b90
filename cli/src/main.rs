//! `clanforge` - offline operator tool
//!
//! Applies templates to, snapshots and restores a workspace kept in a JSON
//! file, using the same provisioning context as a hosted deployment.

mod workspace_file;

use anyhow::{bail, Context, Result};
use clanforge_core::{ProvisionConfig, Provisioner};
use clanforge_graph::{PlatformClient, WorkspaceId};
use clanforge_snapshot::SnapshotId;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let template = Arg::new("template")
        .long("template")
        .short('t')
        .required(true)
        .help("Template name");

    Command::new("clanforge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Provision, snapshot and restore clan workspaces")
        .subcommand_required(true)
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .short('w')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Workspace JSON file (created if missing)"),
        )
        .arg(
            Arg::new("workspace-id")
                .long("workspace-id")
                .global(true)
                .default_value("1")
                .value_parser(value_parser!(u64))
                .help("Id for a newly created workspace file"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("templates").about("List available templates"))
        .subcommand(
            Command::new("plan")
                .about("Show what applying a template would create")
                .arg(template.clone()),
        )
        .subcommand(
            Command::new("apply")
                .about("Create the template's missing categories and channels")
                .arg(template),
        )
        .subcommand(Command::new("snapshot").about("Capture the workspace"))
        .subcommand(Command::new("snapshots").about("List snapshots, newest first"))
        .subcommand(
            Command::new("restore")
                .about("Recreate missing entities from a snapshot")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(SnapshotId))
                        .help("Snapshot id"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<ProvisionConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => ProvisionConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ProvisionConfig::default()),
    }
}

fn workspace_path(matches: &ArgMatches) -> Result<&Path> {
    match matches.get_one::<PathBuf>("workspace") {
        Some(path) => Ok(path.as_path()),
        None => bail!("--workspace <FILE> is required for this command"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };
    init_tracing(args.get_flag("json"));
    let config = load_config(args)?;

    if name == "templates" {
        let provisioner = Provisioner::builder(Arc::new(clanforge_graph::SimulatedPlatform::new()))
            .with_config(config)
            .build()?;
        for template in provisioner.catalog().iter() {
            println!(
                "{:<14} {:>2} categories {:>3} channels  {}",
                template.name,
                template.categories.len(),
                template.channel_count(),
                template.description
            );
        }
        return Ok(());
    }

    let path = workspace_path(args)?;
    let fallback = WorkspaceId(*args.get_one::<u64>("workspace-id").unwrap_or(&1));
    let (sim, workspace) = workspace_file::load(path, fallback)?;
    let sim = Arc::new(sim);
    let platform: Arc<dyn PlatformClient> = sim.clone();
    let provisioner = Provisioner::builder(platform).with_config(config).build()?;

    match name {
        "plan" => {
            let template = required(args, "template")?;
            let plan = provisioner.plan_template(workspace, template).await?;
            println!("{} already present", plan.present);
            for category in &plan.categories {
                println!("+ category {category}");
            }
            for (category, channel) in &plan.channels {
                println!("+ channel  {category} / {channel}");
            }
            println!("{} to create", plan.to_create());
        }
        "apply" => {
            let template = required(args, "template")?;
            let report = provisioner.apply_template(workspace, template).await?;
            workspace_file::save(path, &sim, workspace)?;
            println!(
                "{} created, {} already present, {} errors",
                report.created.len(),
                report.skipped.len(),
                report.errors.len()
            );
            for error in &report.errors {
                println!("! {error}");
            }
        }
        "snapshot" => {
            let meta = provisioner.create_snapshot(workspace).await?;
            println!(
                "{} ({} roles, {} categories, {} channels)",
                meta.snapshot_id, meta.role_count, meta.category_count, meta.channel_count
            );
        }
        "snapshots" => {
            for meta in provisioner.list_snapshots(workspace).await? {
                println!(
                    "{}  {}  v{}  {} roles, {} categories, {} channels",
                    meta.snapshot_id,
                    meta.created_at.to_rfc3339(),
                    meta.format_version,
                    meta.role_count,
                    meta.category_count,
                    meta.channel_count
                );
            }
        }
        "restore" => {
            let id = *args
                .get_one::<SnapshotId>("id")
                .context("--id is required")?;
            let report = provisioner.restore_snapshot(workspace, id).await?;
            workspace_file::save(path, &sim, workspace)?;
            println!(
                "{} roles and {} channels restored, {} overwrites applied, {} errors",
                report.roles_restored,
                report.channels_restored,
                report.overwrites_applied,
                report.errors.len()
            );
            for error in &report.errors {
                println!("! {error}");
            }
        }
        other => bail!("unknown command `{other}`"),
    }
    Ok(())
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("--{id} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn restore_parses_snapshot_ids() {
        let id = SnapshotId::generate();
        let matches = cli()
            .try_get_matches_from(["clanforge", "restore", "-w", "ws.json", "--id", id.to_string().as_str()])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<SnapshotId>("id"), Some(&id));
        assert_eq!(args.get_one::<PathBuf>("workspace"), Some(&PathBuf::from("ws.json")));
    }

    #[test]
    fn apply_requires_a_template() {
        assert!(cli()
            .try_get_matches_from(["clanforge", "apply", "-w", "ws.json"])
            .is_err());
    }
}
