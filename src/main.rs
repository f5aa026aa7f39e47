// src/main.rs
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use crate::ai::GeminiModel;
use crate::config::{Overrides, Settings};
use crate::convert::FailureKind;
use crate::input::clipboard::write_system_clipboard_text;
use crate::input::{HeadlessPreview, ImageCandidate};
use crate::session::Session;

mod ai;
mod config;
mod convert;
mod gui;
mod input;
mod session;

#[derive(Parser)]
#[command(name = "eqsnap")]
#[command(about = "Turn a picture of an equation into LaTeX with Gemini", long_about = None)]
struct Cli {
    /// Gemini API key (default: $GEMINI_API_KEY, then $API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini model name (default: $GEMINI_MODEL or gemini-2.5-flash)
    #[arg(long, short = 'm', global = true)]
    model: Option<String>,

    /// Gemini API base URL (default: $GEMINI_API_URL or the public endpoint)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Give up on a request after this many seconds (default: 120)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run graphical user interface (default)
    Gui,
    /// Convert one image file and print the LaTeX
    Convert {
        /// Image of the equation
        path: PathBuf,

        /// Also copy the result to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Check that the API key is accepted
    CheckKey,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info")
    );

    let cli = Cli::parse();

    // A missing key stops us here, before any window opens.
    let settings = Settings::resolve(Overrides {
        api_key: cli.api_key,
        model: cli.model,
        api_url: cli.api_url,
        timeout_secs: cli.timeout_secs,
    })?;
    info!("Using {:?}", settings);

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => gui::run_gui(settings),
        Commands::Convert { path, copy } => run_convert_cli(&settings, path, copy),
        Commands::CheckKey => check_key(&settings),
    }
}

fn run_convert_cli(settings: &Settings, path: PathBuf, copy: bool) -> Result<()> {
    info!("Starting headless conversion of {}", path.display());

    let model = GeminiModel::new(settings)?;
    let mut session = Session::new(HeadlessPreview::default());
    if !session.submit_candidate(ImageCandidate::from_path(&path)) {
        bail!("{}", FailureKind::InvalidInput.message());
    }

    let outcome = session.generate_blocking(&model).cloned();
    match outcome {
        Some(outcome) => match (outcome.latex(), outcome.error_message()) {
            (Some(latex), _) => {
                println!("{}", latex);
                if copy {
                    write_system_clipboard_text(latex)?;
                    info!("LaTeX copied to clipboard");
                }
                Ok(())
            }
            (None, Some(message)) => bail!("{}", message),
            (None, None) => bail!("Conversion produced no outcome"),
        },
        None => bail!("Conversion produced no outcome"),
    }
}

fn check_key(settings: &Settings) -> Result<()> {
    info!("Checking Gemini API key against {}...", settings.api_base_url);

    let model = GeminiModel::new(settings)?;
    match model.list_models() {
        Ok(models) => {
            println!("✓ API key accepted by {}", settings.api_base_url);
            println!("✓ {} model(s) available", models.len());
            let configured = models
                .iter()
                .any(|m| m.name.trim_start_matches("models/") == settings.model);
            if configured {
                println!("✓ Configured model '{}' is available", settings.model);
            } else {
                println!("✗ Configured model '{}' was not listed", settings.model);
                for m in models.iter().filter(|m| m.name.contains("gemini")).take(10) {
                    println!("  - {} ({})", m.name.trim_start_matches("models/"), m.display_name);
                }
            }
            Ok(())
        }
        Err(e) if e.is_invalid_credential() => {
            error!("Gemini rejected the API key: {}", e);
            bail!("Invalid API Key. Please check your configuration.")
        }
        Err(e) => {
            error!("Could not reach Gemini: {}", e);
            bail!("Could not reach Gemini at {}: {}", settings.api_base_url, e)
        }
    }
}
