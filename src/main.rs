//! chromock CLI - exercise the mock surface by hand.
//!
//! Usage:
//!   chromock ping '{"op":"ping"}' --respond '{"value":42}'
//!   chromock alarm refresh --delay-minutes 0.05
//!   chromock config

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use chromock::event::listener;
use chromock::mock::{Alarm, AlarmSpec, MessageEvent};
use chromock::{install, Config, Environment, Location};

#[derive(Parser)]
#[command(name = "chromock")]
#[command(about = "In-process stand-in for the Chrome extension API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/chromock/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page location the surface is installed into
    #[arg(long, global = true, value_name = "URL")]
    location: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message through runtime.sendMessage and print the response
    Ping {
        /// Message as JSON
        message: String,

        /// Register a listener that answers with this JSON
        #[arg(long, value_name = "JSON")]
        respond: Option<String>,
    },

    /// Schedule an alarm and wait for it to fire
    Alarm {
        /// Alarm name
        name: String,

        /// Delay before firing, in minutes
        #[arg(long, default_value_t = 0.0)]
        delay_minutes: f64,
    },

    /// Print the effective configuration
    Config,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load()),
    }
}

fn parse_json(text: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON: {text}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chromock::diagnostics::init_tracing("chromock=info");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let mut env = match cli.location.as_deref() {
        Some(href) => Environment::with_location(Location::from_href(href)),
        None => Environment::new(),
    };
    install(&mut env, &config);
    let chrome = env
        .chrome()
        .context("chromock surface was not installed")?;

    match cli.command {
        Commands::Ping { message, respond } => {
            let message = parse_json(&message)?;
            if let Some(respond) = respond {
                let answer = parse_json(&respond)?;
                chrome
                    .runtime()
                    .on_message()
                    .subscribe(listener(move |event: &MessageEvent| {
                        event.respond(answer.clone());
                    }));
            }

            let response = chrome.runtime().send_message(message);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Alarm {
            name,
            delay_minutes,
        } => {
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            chrome.alarms().on_alarm().subscribe(listener(move |alarm: &Alarm| {
                let _ = tx.send(alarm.clone());
            }));

            let spec = AlarmSpec::new(name).delay_in_minutes(delay_minutes);
            let wait = spec.delay.saturating_add(Duration::from_secs(5));
            chrome.alarms().create(spec);

            let alarm = tokio::time::timeout(wait, rx.recv())
                .await
                .context("Alarm did not fire in time")?
                .context("Alarm channel closed")?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
