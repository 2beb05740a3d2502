// tunebot - playlist chat bot
// Runs the bot against the console transport; a real chat transport
// would sit in the same place and call PlaylistBot::handle per update

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tunebot::{config::LoggingConfig, transport::console, Config, PlaylistBot, UserId};

#[derive(Parser)]
#[command(name = "tunebot")]
#[command(about = "Chat bot that collects shared tracks into named playlists")]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// User id the console starts talking as
    #[arg(long, default_value_t = 1)]
    user: i64,
}

fn init_logging(logging: &LoggingConfig, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&logging.directory, "tunebot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    // In dev mode, also log to stderr (in addition to file)
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if dev {
        eprintln!("🔧 Dev mode: Debug output enabled to stderr + file");
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Keep the guard alive so buffered log lines get flushed on exit
    let _log_guard = init_logging(&config.logging, args.dev)?;
    info!("🎵 tunebot starting up");

    let bot = PlaylistBot::from_config(&config);
    let sweeper = bot.spawn_session_sweeper(
        config.sessions.sweep_interval(),
        config.sessions.idle_timeout(),
    );

    console::run(bot, UserId(args.user)).await?;

    sweeper.abort();
    info!("tunebot shut down");
    Ok(())
}
