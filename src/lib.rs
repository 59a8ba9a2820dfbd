pub mod board;
pub mod config;
pub mod errors;
pub mod feed;
pub mod filter;
pub mod metadata;
pub mod models;
pub mod render;
pub mod schedule;
mod utils;
pub mod view;

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use board::Board;
use config::{AppConfig, ConfigStore};
use feed::{Feed, FeedLoader, FeedSource};
use filter::{FilterOptions, PastPolicy, SelectOption};
use render::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "event-board", version, about = "List upcoming events from a JSON feed")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the events that match the given filters
    List {
        #[command(flatten)]
        feed: FeedArgs,

        /// Event type, or "all"
        #[arg(long = "type", default_value = filter::ALL)]
        event_type: String,

        /// City id or name, or "all"
        #[arg(long, default_value = filter::ALL)]
        city: String,

        /// Style id or name, or "all"
        #[arg(long, default_value = filter::ALL)]
        style: String,

        /// Include events that are already over
        #[arg(long)]
        show_past: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the values each filter can take
    Options {
        #[command(flatten)]
        feed: FeedArgs,

        #[arg(long, value_enum, default_value_t = OptionsFormat::Text)]
        format: OptionsFormat,
    },
    /// Inspect or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Path,
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OptionsFormat {
    Text,
    Json,
}

impl From<OptionsFormat> for OutputFormat {
    fn from(format: OptionsFormat) -> Self {
        match format {
            OptionsFormat::Text => OutputFormat::Text,
            OptionsFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
struct FeedArgs {
    /// Events feed URL or file path
    #[arg(long)]
    events: Option<String>,

    /// Metadata feed URL or file path
    #[arg(long, conflicts_with = "no_meta")]
    meta: Option<String>,

    /// Ignore any configured metadata feed
    #[arg(long)]
    no_meta: bool,

    /// IANA timezone used for dates and "today"
    #[arg(long)]
    timezone: Option<String>,

    #[arg(long, value_enum)]
    past_policy: Option<PastPolicy>,

    /// Request timeout in seconds, 0 for none
    #[arg(long)]
    timeout: Option<u64>,
}

impl FeedArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(events) = &self.events {
            config.events_url = events.clone();
        }
        if self.no_meta {
            config.meta_url = None;
        } else if let Some(meta) = &self.meta {
            config.meta_url = Some(meta.clone());
        }
        if let Some(timezone) = &self.timezone {
            config.timezone = timezone.clone();
        }
        if let Some(policy) = self.past_policy {
            config.past_policy = policy;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
    }
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("event_board_lib=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let store = match &cli.config {
        Some(path) => ConfigStore::load_from(path.clone()),
        None => ConfigStore::load(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Command::List {
            feed,
            event_type,
            city,
            style,
            show_past,
            format,
            output,
        } => {
            let config = effective_config(&store, &feed)?;
            let Some(mut board) = load_board(&config).await? else {
                write_output(output.as_ref(), &render::render_load_error(format))?;
                return Ok(ExitCode::FAILURE);
            };
            board.set_type(&event_type);
            board.set_city(&city);
            board.set_style(&style);
            board.set_show_past(show_past);

            let cards = board.visible(Utc::now());
            info!(shown = cards.len(), "rendering events");
            let rendered = render::render(&cards, format).context("failed to render events")?;
            write_output(output.as_ref(), &rendered)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Options { feed, format } => {
            let config = effective_config(&store, &feed)?;
            let Some(board) = load_board(&config).await? else {
                write_output(None, &render::render_load_error(format.into()))?;
                return Ok(ExitCode::FAILURE);
            };
            let options = board.options();
            let rendered = match format {
                OptionsFormat::Json => {
                    serde_json::to_string_pretty(&options).context("failed to render options")?
                }
                OptionsFormat::Text => options_text(&options),
            };
            write_output(None, &rendered)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            config_command(&store, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn effective_config(store: &ConfigStore, args: &FeedArgs) -> Result<AppConfig> {
    let mut config = store.read()?;
    config.apply_env();
    args.apply(&mut config);
    Ok(config)
}

/// `Ok(None)` is a failed feed load; the caller shows the error message.
async fn load_board(config: &AppConfig) -> Result<Option<Board>> {
    let tz = config.tz()?;
    let loader = FeedLoader::new(tz, config.request_timeout())?;

    match fetch_feed(&loader, config).await {
        Ok(feed) => Ok(Some(Board::new(feed, config.past_policy, tz))),
        Err(err) => {
            error!(error = %err, "failed to load events");
            Ok(None)
        }
    }
}

async fn fetch_feed(loader: &FeedLoader, config: &AppConfig) -> Result<Feed, errors::FeedError> {
    let events: FeedSource = config.events_url.parse()?;
    let meta = config
        .meta_url
        .as_deref()
        .map(str::parse::<FeedSource>)
        .transpose()?;
    loader.load(&events, meta.as_ref()).await
}

fn write_output(target: Option<&PathBuf>, contents: &str) -> Result<()> {
    match target {
        Some(path) => fs::write(path, format!("{contents}\n"))
            .with_context(|| format!("unable to write output to {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn options_text(options: &FilterOptions) -> String {
    let section = |name: &str, items: &[SelectOption]| {
        let lines: Vec<String> = items
            .iter()
            .map(|option| format!("  {:<16} {}", option.value, option.label))
            .collect();
        format!("{name}:\n{}", lines.join("\n"))
    };

    [
        section("Types", &options.types),
        section("Cities", &options.cities),
        section("Styles", &options.styles),
    ]
    .join("\n\n")
}

fn config_command(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = store.read()?;
            for key in config::KEYS {
                println!("{key} = {}", config.get(key)?);
            }
        }
        ConfigAction::Path => println!("{}", store.path().display()),
        ConfigAction::Set { key, value } => {
            let updated = store.update(|config| config.set(&key, &value))?;
            info!(%key, path = %store.path().display(), "configuration updated");
            println!("{key} = {}", updated.get(&key)?);
        }
    }
    Ok(())
}
