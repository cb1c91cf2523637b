//! command dispatch for the instana provider cli.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use instana_core::StateMap;
use instana_engine::{
    upgrade_state, ProviderMeta, ProviderRegistry, Resource, ResourceData, VersionedState,
};
use instana_provider::{provider_registry, ProviderConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// top-level cli definition.
#[derive(Parser)]
#[command(name = "instana-provider-cli")]
#[command(about = "Drive instana provider lifecycle callbacks against persisted state files")]
pub(crate) struct Cli {
    /// provider configuration (yaml or json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

/// cli subcommands.
#[derive(Subcommand)]
enum Command {
    /// list resources and data sources
    Resources,
    Validate {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Create {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Read {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Update {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Delete {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Import {
        #[arg(short = 'r', long)]
        resource: String,
        #[arg(long)]
        id: String,
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
    Lookup {
        #[arg(short = 'd', long)]
        data_source: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
}

/// lifecycle callbacks that rewrite the state file they were given.
#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Create,
    Read,
    Update,
    Delete,
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let registry = provider_registry();
    let config_path = cli.config;

    match cli.command {
        Command::Resources => {
            for resource in registry.resources() {
                println!(
                    "resource {} (schema version {})",
                    resource.name(),
                    resource.schema_version()
                );
            }
            for source in registry.data_sources() {
                println!("data source {}", source.name());
            }
        }
        Command::Validate { resource, file } => {
            let resource = registry_resource(&registry, &resource)?;
            let stored = read_state_file(&file)?;
            let upgraded = stored.schema_version < resource.schema_version();
            let state = load_resource_state(resource, stored)?;
            let data = ResourceData::from_state(resource.schema(), state)
                .with_context(|| format!("load state: {}", file.display()))?;
            let errors = resource.schema().validate(data.state());
            for error in &errors {
                eprintln!("error: {error}");
            }
            if !errors.is_empty() {
                bail!("{} validation errors in {}", errors.len(), file.display());
            }
            if upgraded {
                write_state_file(&file, resource.schema_version(), data.state())?;
            }
            println!("ok");
        }
        Command::Create { resource, file } => {
            let resource = registry_resource(&registry, &resource)?;
            run_lifecycle(resource, config_path.as_deref(), &file, Lifecycle::Create).await?;
        }
        Command::Read { resource, file } => {
            let resource = registry_resource(&registry, &resource)?;
            run_lifecycle(resource, config_path.as_deref(), &file, Lifecycle::Read).await?;
        }
        Command::Update { resource, file } => {
            let resource = registry_resource(&registry, &resource)?;
            run_lifecycle(resource, config_path.as_deref(), &file, Lifecycle::Update).await?;
        }
        Command::Delete { resource, file } => {
            let resource = registry_resource(&registry, &resource)?;
            run_lifecycle(resource, config_path.as_deref(), &file, Lifecycle::Delete).await?;
        }
        Command::Import {
            resource,
            id,
            output,
        } => {
            let resource = registry_resource(&registry, &resource)?;
            let meta = provider_meta(config_path.as_deref())?;
            let mut data = ResourceData::new(resource.schema());
            resource
                .import(&meta, &mut data, &id)
                .await
                .with_context(|| format!("import {} {id}", resource.name()))?;
            write_state_file(&output, resource.schema_version(), data.state())?;
            println!("imported {} into {}", data.id(), output.display());
        }
        Command::Lookup { data_source, file } => {
            let source = registry
                .data_source(&data_source)
                .ok_or_else(|| anyhow!("unknown data source {data_source}"))?;
            let meta = provider_meta(config_path.as_deref())?;
            let stored = read_state_file(&file)?;
            let mut data = ResourceData::from_state(source.schema(), stored.state)
                .with_context(|| format!("load state: {}", file.display()))?;
            source
                .read(&meta, &mut data)
                .await
                .with_context(|| format!("lookup {}", source.name()))?;
            write_state_file(&file, stored.schema_version, data.state())?;
            println!("found {}", data.id());
        }
    }

    Ok(())
}

fn registry_resource<'r>(
    registry: &'r ProviderRegistry,
    name: &str,
) -> Result<&'r dyn Resource> {
    registry
        .resource(name)
        .ok_or_else(|| anyhow!("unknown resource {name}"))
}

async fn run_lifecycle(
    resource: &dyn Resource,
    config_path: Option<&Path>,
    file: &Path,
    lifecycle: Lifecycle,
) -> Result<()> {
    let meta = provider_meta(config_path)?;
    let stored = read_state_file(file)?;
    let state = load_resource_state(resource, stored)?;
    let mut data = ResourceData::from_state(resource.schema(), state)
        .with_context(|| format!("load state: {}", file.display()))?;

    let outcome = match lifecycle {
        Lifecycle::Create => resource.create(&meta, &mut data).await,
        Lifecycle::Read => resource.read(&meta, &mut data).await,
        Lifecycle::Update => resource.update(&meta, &mut data).await,
        Lifecycle::Delete => resource.delete(&meta, &mut data).await,
    };
    outcome.with_context(|| format!("{lifecycle:?} {}", resource.name()))?;
    write_state_file(file, resource.schema_version(), data.state())?;

    if data.id().is_empty() {
        println!("{} has no remote object", resource.name());
    } else {
        println!("{} {}", resource.name(), data.id());
    }
    Ok(())
}

/// load provider configuration, falling back to defaults and the environment.
fn load_config(path: Option<&Path>) -> Result<ProviderConfig> {
    let Some(path) = path else {
        return Ok(ProviderConfig::default());
    };
    let raw =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))
}

fn provider_meta(config_path: Option<&Path>) -> Result<ProviderMeta> {
    load_config(config_path)?.provider_meta()
}

/// read a state file from disk.
fn read_state_file(path: &Path) -> Result<VersionedState> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read state: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse state: {}", path.display()))
}

/// bring stored state up to the resource's current schema version.
fn load_resource_state(resource: &dyn Resource, stored: VersionedState) -> Result<StateMap> {
    let current = resource.schema_version();
    if stored.schema_version > current {
        bail!(
            "state was written by schema version {} but {} is at version {current}",
            stored.schema_version,
            resource.name()
        );
    }
    debug!(
        resource = resource.name(),
        from = stored.schema_version,
        to = current,
        "loading state"
    );
    let upgraders = resource.state_upgraders();
    Ok(upgrade_state(&upgraders, stored.schema_version, stored.state)?)
}

/// write a state file to disk.
fn write_state_file(path: &Path, schema_version: u32, state: &StateMap) -> Result<()> {
    let file = VersionedState {
        schema_version,
        state: state.clone(),
    };
    let raw = serde_json::to_string_pretty(&file)?;
    fs::write(path, raw).with_context(|| format!("write state: {}", path.display()))
}
