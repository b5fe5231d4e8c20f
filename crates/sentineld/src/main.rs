//! Sentinel daemon - voice-driven desktop assistant engine.
//!
//! The real deployment wires microphone/TTS and a desktop automation
//! backend to the engine; this binary is a thin text driver over the same
//! `process()` pipeline, useful for exercising decisions from a terminal.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use sentinel_common::plan::ActionStep;
use sentinel_common::SentinelConfig;
use sentineld::core::SentinelCore;
use sentineld::engine::{ActionExecutor, Engine, EngineCallbacks, SpeechPort};
use sentineld::resolver::{HttpResolver, IntentResolver, OfflineResolver};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sentineld", version, about = "Sentinel assistant engine")]
struct Cli {
    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process a single command and exit
    #[arg(long)]
    command: Option<String>,

    /// Skip the remote resolver even if configured
    #[arg(long)]
    offline: bool,
}

/// Console stand-in for the desktop automation backend: prints what the
/// real executor would do.
struct ConsoleExecutor;

#[async_trait]
impl ActionExecutor for ConsoleExecutor {
    async fn execute(&self, step: &ActionStep) -> Result<String> {
        Ok(format!("{} {:?}", step.kind(), step))
    }
}

/// Console stand-in for speech: prints responses, reads stdin lines.
struct ConsoleSpeech;

#[async_trait]
impl SpeechPort for ConsoleSpeech {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("sentinel> {}", text);
        Ok(())
    }

    async fn transcribe(&self) -> Result<Option<String>> {
        let line = tokio::task::spawn_blocking(|| {
            print!(">> ");
            io::stdout().flush().ok();
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) => None,
                Ok(_) => Some(line.trim().to_string()),
                Err(_) => None,
            }
        })
        .await?;
        Ok(line.filter(|l| !l.is_empty()))
    }
}

async fn run_with_resolver<R: IntentResolver>(
    config: &SentinelConfig,
    resolver: R,
    command: Option<String>,
) {
    let core = SentinelCore::new(config, resolver);
    let callbacks = EngineCallbacks {
        on_status: Box::new(|label| info!("status: {}", label)),
        on_log: Box::new(|message| info!("{}", message)),
    };
    let (mut engine, handle) = Engine::new(core, ConsoleExecutor, ConsoleSpeech, callbacks);

    match command {
        Some(text) => {
            let _ = engine.handle_text(&text).await;
        }
        None => {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.stop();
                }
            });
            engine.run().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SentinelConfig::load(path)?,
        None => SentinelConfig::load_default()?,
    };

    info!("Sentinel v{} starting", sentinel_common::VERSION);

    if cli.offline || !config.llm.enabled {
        run_with_resolver(&config, OfflineResolver, cli.command).await;
    } else {
        let resolver = HttpResolver::new(config.llm.clone())?;
        run_with_resolver(&config, resolver, cli.command).await;
    }

    Ok(())
}
