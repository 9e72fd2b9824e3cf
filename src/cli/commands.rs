//! Command dispatch: settings, service wiring and per-command handlers

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::services::{parse_relation_chain, TreeService};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ReconstructOptions, RelationKind, StartInfo};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `rstree --help`".into(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_dir = resolve_config_dir(cli)?;
    let mut settings = Settings::load(Some(config_dir.as_path()))?;
    if let Some(key) = &cli.children_key {
        settings.children_key = key.clone();
    }
    debug!("settings: {:?}", settings);

    let container = ServiceContainer::new(settings);
    let service = container.tree_service();

    match command {
        Commands::Walk { file } => walk(&service, file),
        Commands::Annotate {
            file,
            relation_key,
            start,
            output,
        } => annotate(
            &service,
            file,
            relation_key.as_deref(),
            start.as_deref(),
            output.as_deref(),
        ),
        Commands::Path {
            file,
            chain,
            relation_field,
            relation_key,
            keep_node_info,
        } => path(
            &service,
            file,
            chain,
            *relation_field,
            relation_key.as_deref(),
            *keep_node_info,
        ),
        Commands::Tree { file, label } => tree(&service, file, label.as_deref()),
        Commands::Config { command } => config(&service, command, &config_dir),
        Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_config_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) if dir.is_dir() => Ok(dir.clone()),
        Some(dir) => Err(InfraError::ConfigDir(dir.clone()).into()),
        None => std::env::current_dir().map_err(|e| InfraError::WorkingDir(e).into()),
    }
}

#[instrument(skip(service))]
fn walk(service: &TreeService, file: &Path) -> CliResult<()> {
    let doc = service.load(file)?;
    for node in service.walk(&doc)? {
        output::info(&node);
    }
    Ok(())
}

#[instrument(skip(service))]
fn annotate(
    service: &TreeService,
    file: &Path,
    relation_key: Option<&str>,
    start: Option<&str>,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let mut start_info = match start {
        Some(text) => {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| CliError::InvalidArgs(format!("--start: {}", e)))?;
            StartInfo::from_value(&value)
        }
        None => StartInfo::new(),
    };
    if let Some(key) = relation_key {
        start_info = start_info.with_relation_key(key);
    }

    let mut doc = service.load(file)?;
    let visited = service.annotate(&mut doc, &start_info)?;

    match output_path {
        Some(target) => {
            service.save(target, &doc)?;
            output::success(&format!(
                "annotated {} nodes -> {}",
                visited,
                target.display()
            ));
        }
        None => output::info(&service.to_json(&doc)?),
    }
    Ok(())
}

#[instrument(skip(service))]
fn path(
    service: &TreeService,
    file: &Path,
    chain: &str,
    relation_field: Option<RelationKind>,
    relation_key: Option<&str>,
    keep_node_info: bool,
) -> CliResult<()> {
    let chain = parse_relation_chain(chain)?;
    let settings = service.settings();

    let mut options = ReconstructOptions::new()
        .relation_kind(relation_field.unwrap_or(settings.relation_field))
        .keep_node_info(keep_node_info || settings.keep_node_info);
    if let Some(key) = relation_key {
        options = options.start(StartInfo::new().with_relation_key(key));
    }

    let mut doc = service.load(file)?;
    let branch = service.reconstruct(&mut doc, &chain, &options)?;
    output::info(&service.to_json(&branch)?);
    Ok(())
}

#[instrument(skip(service))]
fn tree(service: &TreeService, file: &Path, label: Option<&str>) -> CliResult<()> {
    let doc = service.load(file)?;
    let label = label.unwrap_or(service.settings().label_key.as_str());
    output::info(&service.render(&doc, label)?);
    Ok(())
}

fn config(service: &TreeService, command: &ConfigCommands, config_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&service.settings().to_toml()?);
        }
        ConfigCommands::Path => {
            output::header("Config files (lowest to highest precedence)");
            match global_config_path() {
                Some(global) => output::detail(&global.display(), global.exists()),
                None => output::detail(&"global: no config directory", false),
            }
            let local = local_config_path(config_dir);
            output::detail(&local.display(), local.exists());
        }
    }
    Ok(())
}
