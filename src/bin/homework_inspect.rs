use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use homework_watchbot::config;
use homework_watchbot::model::Cursor;
use homework_watchbot::response;
use homework_watchbot::tracking::{PracticumClient, TrackingApi};
use homework_watchbot::verdict;

#[derive(Parser, Debug)]
#[command(about = "Fetch homework statuses once and print what the bot would send")]
struct Args {
    /// Path to YAML config (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll window start in unix seconds
    #[arg(long, default_value = "0")]
    from_date: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let client = PracticumClient::new(
        cfg.practicum.token.clone(),
        cfg.endpoint_url()?,
        cfg.request_timeout(),
    )?;

    println!("Endpoint: {}", client.endpoint());
    let payload = client.fetch(Cursor(args.from_date)).await?;
    println!("Response:");
    println!("{}", serde_json::to_string_pretty(&payload)?);

    match response::extract(&payload)? {
        Some(homework) => {
            println!("Latest homework: {:?}", homework);
            match verdict::render(&homework) {
                Ok(text) => println!("Message: {}", text),
                Err(err) => println!("Cannot render message: {}", err),
            }
        }
        None => println!("No homeworks in window starting at {}", args.from_date),
    }
    Ok(())
}
