use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use callerid_cli::config::{AppConfig, ConfigManager, get_config};
use callerid_cli::output::OutputFormat;
use callerid_cli::providers::ContactBook;
use callerid_core::{
    CacheKey, ChannelCallback, ContactCache, FsPhotoFetcher, Presentation, QueryDispatcher,
    RawQuery,
};

#[derive(Parser)]
#[command(name = "callerid")]
#[command(author, version, about = "Caller identity resolution harness", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one or more numbers and print every update
    Resolve {
        /// Numbers to resolve
        #[arg(required = true)]
        numbers: Vec<String>,

        /// Contact book to read providers from (overrides providers.contacts_file)
        #[arg(short, long)]
        contacts: Option<PathBuf>,

        /// ISO country code of the call
        #[arg(long, default_value = "")]
        country_iso: String,

        /// Name supplied by the network
        #[arg(long, default_value = "")]
        cnap: String,

        /// Treat the calls as incoming
        #[arg(long)]
        incoming: bool,

        /// Presentation reported by the network
        #[arg(long, value_enum, default_value = "allowed")]
        presentation: PresentationArg,

        /// Resolve every number under the same call key, in order
        #[arg(long)]
        same_key: bool,

        /// Force-complete dispatches after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Output format (defaults to output.default_format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration as TOML
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., cache.dispatch_timeout_ms)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.dispatch_timeout_ms)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresentationArg {
    Allowed,
    Restricted,
    Unknown,
    Payphone,
}

impl From<PresentationArg> for Presentation {
    fn from(arg: PresentationArg) -> Self {
        match arg {
            PresentationArg::Allowed => Presentation::Allowed,
            PresentationArg::Restricted => Presentation::Restricted,
            PresentationArg::Unknown => Presentation::Unknown,
            PresentationArg::Payphone => Presentation::Payphone,
        }
    }
}

struct ResolveArgs {
    numbers: Vec<String>,
    country_iso: String,
    cnap: String,
    incoming: bool,
    presentation: Presentation,
    same_key: bool,
    format: Option<OutputFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("callerid_core", log::LevelFilter::Debug)
            .filter_module("callerid_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Commands::Resolve {
            numbers,
            contacts,
            country_iso,
            cnap,
            incoming,
            presentation,
            same_key,
            timeout_ms,
            format,
        } => {
            let mut config = get_config().context("Failed to load configuration")?;
            config.apply_cli_overrides(contacts, timeout_ms);
            let args = ResolveArgs {
                numbers,
                country_iso,
                cnap,
                incoming,
                presentation: presentation.into(),
                same_key,
                format,
            };
            resolve_command(config, args).await?;
        }
        Commands::Config { command } => config_command(command),
    }

    Ok(())
}

async fn resolve_command(config: AppConfig, args: ResolveArgs) -> Result<()> {
    let format = match args.format {
        Some(format) => format,
        None => OutputFormat::from_string(&config.output.default_format)?,
    };
    let formatter = format.formatter(config.output.color_enabled);

    let book = match &config.providers.contacts_file {
        Some(path) => ContactBook::load(path)?,
        None => {
            log::warn!("No contact book configured; every number resolves as unknown");
            ContactBook::default()
        }
    };
    let book = Arc::new(book);

    let dispatcher = QueryDispatcher::builder(book.clone())
        .directories(book.clone(), book.clone())
        .network(book.clone())
        .geocoder(book)
        .photos(Arc::new(FsPhotoFetcher))
        .config(&config.cache)
        .build();
    let cache = ContactCache::new(Arc::new(dispatcher), &config.cache)?;

    let (callback, mut events) = ChannelCallback::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", formatter.format_event(&event)?);
        }
        Ok::<_, anyhow::Error>(formatter)
    });

    let mut keys = Vec::new();
    for (index, number) in args.numbers.iter().enumerate() {
        let key = if args.same_key {
            CacheKey::from("call-1")
        } else {
            CacheKey::new(format!("call-{}", index + 1))
        };
        let query = RawQuery::new(key.clone(), number.as_str())
            .incoming(args.incoming)
            .with_country_iso(args.country_iso.as_str())
            .with_cnap_name(args.cnap.as_str())
            .with_presentation(args.presentation);

        log::debug!("Resolving {key}");
        cache.resolve(query, callback.clone());
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    cache.wait_idle().await;
    // The channel closes once the cache has released its copies of the callback
    drop(callback);
    let formatter = printer.await.context("Event printer failed")??;

    for key in &keys {
        println!("{}", formatter.format_final(key, cache.get(key).as_ref())?);
    }

    let stats = cache.stats();
    log::debug!(
        "Dispatches: {}, stages applied: {}, stale dropped: {}",
        stats.dispatches_started,
        stats.stages_applied,
        stats.stale_dropped
    );
    Ok(())
}

fn config_command(command: ConfigCommand) {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
        ConfigCommand::Show => match manager
            .load()
            .and_then(|config| Ok(toml::to_string_pretty(&config)?))
        {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::Get { key } => match manager.get(&key) {
            Ok(value) => {
                println!("{value}");
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::Set { key, value } => match manager.set(&key, &value) {
            Ok(()) => {
                eprintln!("{}", format!("Set {key} = {value}").green());
                eprintln!(
                    "Configuration saved to: {}",
                    manager.get_config_path().display()
                );
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::List => match manager.list() {
            Ok(items) => {
                eprintln!("Config file: {}", manager.get_config_path().display());
                let mut section = "";
                for (key, value) in &items {
                    let (head, rest) = key.split_once('.').unwrap_or(("general", key));
                    if head != section {
                        println!("[{}]", head.yellow());
                        section = head;
                    }
                    println!("  {} = {}", rest.cyan(), value);
                }
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
    }
}
