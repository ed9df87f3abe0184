use clap::Parser;
use directories::ProjectDirs;
use notuql::api::{
    ConfigAction, MessageLevel, NotuqlApi, NotuqlConfig, NotuqlPaths, OutputFormat,
};
use notuql::error::{NotuqlError, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod args;
mod print;
use args::{Cli, Commands};
use print::{print_compiled, print_messages};

const HOME_ENV: &str = "NOTUQL_HOME";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: NotuqlApi,
    format: OutputFormat,
    pretty: bool,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let ctx = init_context(&cli)?;

    match cli.command {
        Commands::Compile { query } => handle_compile(&ctx, query),
        Commands::Check { query } => handle_check(&ctx, query),
        Commands::Batch { path } => handle_batch(&ctx, &path),
        Commands::Config { key, value } => handle_config(&ctx, key, value),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| NotuqlError::Api(format!("Failed to set tracing subscriber: {}", e)))
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let config_dir = match std::env::var_os(HOME_ENV) {
        Some(home) => PathBuf::from(home),
        None => ProjectDirs::from("com", "notuql", "notuql")
            .ok_or_else(|| NotuqlError::Config("Could not determine config dir".into()))?
            .config_dir()
            .to_path_buf(),
    };

    let api = NotuqlApi::new(NotuqlPaths { config_dir });
    let config = match api.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("ignoring unreadable config: {}", e);
            NotuqlConfig::default()
        }
    };

    Ok(AppContext {
        api,
        format: cli.format.unwrap_or(config.format),
        pretty: config.pretty,
    })
}

fn handle_compile(ctx: &AppContext, query: Vec<String>) -> Result<()> {
    let result = ctx.api.compile(&query)?;
    print_compiled(&result.compiled, ctx.format, ctx.pretty, false)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_check(ctx: &AppContext, query: Vec<String>) -> Result<()> {
    let result = ctx.api.check(&query)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_batch(ctx: &AppContext, path: &Path) -> Result<()> {
    let result = ctx.api.batch(path)?;
    print_compiled(&result.compiled, ctx.format, ctx.pretty, true)?;
    print_messages(&result.messages);

    if result.has_errors() {
        let failed = result
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .count();
        return Err(NotuqlError::Api(format!(
            "{} of the queries in {} failed to compile",
            failed,
            path.display()
        )));
    }
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config(action)?;
    if let Some(config) = &result.config {
        for key in NotuqlConfig::KEYS {
            if let Some(value) = config.get(key) {
                println!("{} = {}", key, value);
            }
        }
    }
    print_messages(&result.messages);
    Ok(())
}
