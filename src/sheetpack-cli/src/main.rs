use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directory_pack::DirectoryPack;
use sheetpack_core::{
    init_logging, AppDirs, Config, ContentSource, ContentType, ContentTypeRegistry, EnvelopeValue,
    MultiPageInfo, Record, ResponseEnvelope, Resolver, ValidationError,
};
use sheetpack_plugin::{ExecPluginPack, PluginConfig, PluginInfo};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "sheetpack", version, about = "Character sheet content packs")]
struct Cli {
    /// Pack name from config.toml or a pack directory (takes precedence over config)
    #[arg(long, global = true)]
    pack: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every content tag a pack can be asked for
    Tags,
    /// Resolve one content type and print a summary of the response
    Call(CallCommand),
    /// Serve the selected pack over the plugin protocol on stdin/stdout
    Serve,
    /// Pack management commands
    #[command(subcommand)]
    Packs(PacksCommand),
}

#[derive(Debug, Subcommand)]
enum PacksCommand {
    /// List packs configured in config.toml
    List,
}

#[derive(Debug, Parser, Clone)]
struct CallCommand {
    /// Content tag, e.g. `spells` or `info`
    method: String,
    /// Asset path for `info` and `image`
    arg: Option<String>,
    /// Resolve through an external plugin executable instead of a pack directory
    #[arg(long)]
    plugin: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum CallTarget {
    Directory(PathBuf),
    Plugin(PathBuf),
}

#[derive(Debug, Error)]
enum CallTargetError {
    #[error("--plugin cannot be combined with --pack")]
    PluginWithPack,
    #[error("{0}")]
    Pack(#[from] ValidationError),
}

impl CallCommand {
    fn target(
        &self,
        config: &Config,
        dirs: &AppDirs,
        cli_pack: Option<&str>,
    ) -> Result<CallTarget, CallTargetError> {
        match &self.plugin {
            Some(_) if cli_pack.is_some() => Err(CallTargetError::PluginWithPack),
            Some(executable) => Ok(CallTarget::Plugin(executable.clone())),
            None => Ok(CallTarget::Directory(config.resolve_pack(cli_pack, dirs)?)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, &dirs)?;

    match cli.command {
        Command::Tags => {
            for tag in ContentTypeRegistry::global().all_tags() {
                println!("{tag}");
            }
        }
        Command::Packs(PacksCommand::List) => print_packs(&config, &dirs),
        Command::Call(call) => {
            let envelope = match call.target(&config, &dirs, cli.pack.as_deref())? {
                CallTarget::Directory(dir) => {
                    let (resolver, _) = open_pack(&config, dir)?;
                    resolver.call(&call.method, call.arg.as_deref())
                }
                CallTarget::Plugin(executable) => {
                    let plugin = ExecPluginPack::new(PluginConfig::new(&executable))
                        .with_context(|| format!("failed to start plugin {}", executable.display()))?;
                    plugin.call(&call.method, call.arg.as_deref())
                }
            };
            println!("{}", summarize(&call.method, &envelope));
        }
        Command::Serve => {
            let dir = config.resolve_pack(cli.pack.as_deref(), &dirs)?;
            let (resolver, info) = open_pack(&config, dir)?;
            tracing::info!(
                "Serving pack '{}' (config dir: {})",
                info.id,
                dirs.config_dir().display()
            );
            sheetpack_plugin::serve(&resolver, &info, io::stdin().lock(), io::stdout().lock())?;
        }
    }

    Ok(())
}

fn open_pack(config: &Config, dir: PathBuf) -> Result<(Resolver, PluginInfo)> {
    let pack = DirectoryPack::load(&dir)
        .with_context(|| format!("failed to open pack at {}", dir.display()))?;
    let manifest = pack.manifest();
    let info = PluginInfo::new(
        manifest.id.clone(),
        manifest.name.clone(),
        manifest.version.clone().unwrap_or_default(),
    );
    let resolver = Resolver::with_options(Arc::new(pack), config.resolver_options());
    Ok((resolver, info))
}

/// One human-readable line (plus page titles for `info`) per response.
fn summarize(tag: &str, envelope: &ResponseEnvelope) -> String {
    let Some(entry) = envelope.entry() else {
        return format!("{tag}: not provided by this pack");
    };

    match (&entry.value, ContentType::from_tag(&entry.key)) {
        (EnvelopeValue::Message(message), _) => format!("exception: {message}"),
        (EnvelopeValue::Image(image), _) => format!(
            "{}: {} ({} bytes)",
            entry.key,
            image.format,
            image.bytes.len()
        ),
        (EnvelopeValue::Bytes(bytes), Some(ContentType::Record(record))) => {
            match Record::from_bytes(record, bytes) {
                Ok(list) => format!("{}: {} record(s)", entry.key, list.len()),
                Err(err) => format!("{}: {} bytes (undecodable: {err})", entry.key, bytes.len()),
            }
        }
        (EnvelopeValue::Bytes(bytes), Some(ContentType::Info)) => {
            match MultiPageInfo::from_bytes(bytes) {
                Ok(info) => {
                    let mut lines = vec![format!("{}: {} page(s)", entry.key, info.pages.len())];
                    lines.extend(
                        info.titles()
                            .enumerate()
                            .map(|(index, title)| format!("  {}. {title}", index + 1)),
                    );
                    lines.join("\n")
                }
                Err(err) => format!("{}: {} bytes (undecodable: {err})", entry.key, bytes.len()),
            }
        }
        (EnvelopeValue::Bytes(bytes), _) => format!("{}: {} bytes", entry.key, bytes.len()),
    }
}

fn print_packs(config: &Config, dirs: &AppDirs) {
    println!("Installed packs directory: {}", dirs.packs_dir().display());
    if config.packs.is_empty() {
        println!("No packs configured. Set packs.<name> in config.toml.");
        return;
    }

    for (name, dir) in &config.packs {
        let default_marker = if config.default_pack.as_deref() == Some(name) {
            " (default)"
        } else {
            ""
        };
        println!("Pack: {}{} -> {}", name, default_marker, dir.display());
    }
}
