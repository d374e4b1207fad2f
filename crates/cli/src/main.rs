mod auth_commands;
mod send_command;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use {
    clap::{Parser, Subcommand},
    textrelay_auth::{SessionGate, StaticSession, TokenSession},
    textrelay_config::TextrelayConfig,
    textrelay_relay::{Composer, RelaySender},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "textrelay", about = "Send text messages through an authenticated relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Only read config from this directory.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message.
    Send {
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        text: String,
        /// Use this credential instead of the stored session.
        #[arg(long, env = "TEXTRELAY_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Session management.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default configuration if no file exists yet.
    Init,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn handle_config(action: ConfigAction, config: &TextrelayConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        },
        ConfigAction::Path => {
            println!("{}", textrelay_config::find_or_default_config_path().display());
        },
        ConfigAction::Init => {
            let path = textrelay_config::find_or_default_config_path();
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                let path = textrelay_config::save_config(&TextrelayConfig::default())?;
                println!("Wrote {}", path.display());
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(dir) = cli.config_dir.clone() {
        textrelay_config::set_config_dir(dir);
    }
    let config = textrelay_config::discover_and_load();
    info!(version = env!("CARGO_PKG_VERSION"), "textrelay starting");

    match cli.command {
        Commands::Send { to, text, token } => {
            let gate: Arc<dyn SessionGate> = match token {
                Some(token) => Arc::new(StaticSession::new(Some(token))),
                None => Arc::new(TokenSession::from_config(&config.session)),
            };
            let composer = Composer::new(gate, RelaySender::from_config(&config.relay)?);
            let sent = send_command::run_send(&composer, to, text).await?;
            Ok(if sent {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        },
        Commands::Auth { action } => {
            let session = TokenSession::from_config(&config.session);
            auth_commands::handle_auth(action, &session).await?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Config { action } => {
            handle_config(action, &config)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
