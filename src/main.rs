use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use homework_watchbot::config;
use homework_watchbot::model::{Cursor, CursorPolicy};
use homework_watchbot::notifier::{Notifier, TelegramMessenger};
use homework_watchbot::poller::Poller;
use homework_watchbot::tracking::PracticumClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Watch homework review status and report changes to Telegram")]
struct Args {
    /// Path to YAML config file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Override when the poll cursor moves forward
    #[arg(long, value_enum)]
    advance_cursor_on: Option<CursorPolicy>,

    /// Also send a notice to the chat when a cycle fails
    #[arg(long)]
    notify_errors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = match config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(critical = true, %err, "cannot start: configuration is incomplete");
            std::process::exit(1);
        }
    };
    if let Some(policy) = args.advance_cursor_on {
        cfg.app.advance_cursor_on = policy;
    }
    if args.notify_errors {
        cfg.app.notify_errors = true;
    }

    let tracker = PracticumClient::new(
        cfg.practicum.token.clone(),
        cfg.endpoint_url()?,
        cfg.request_timeout(),
    )?;
    let notifier = Notifier::new(
        TelegramMessenger::new(cfg.telegram.bot_token.clone()),
        cfg.recipient(),
    );
    let cursor = Cursor::starting_at(Cursor::now().as_secs(), cfg.app.retry_period_secs);
    let mut poller = Poller::new(tracker, notifier, cursor, cfg.poll_settings());

    if args.once {
        info!(%cursor, "running a single poll cycle");
        let _ = poller.tick().await;
        return Ok(());
    }

    poller
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(?err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("homework watchbot stopped");
    Ok(())
}
