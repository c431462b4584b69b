use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lobster_core::{get_ai, CoinGeckoClient, Config, Oracle, VibeCoder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

/// Log file written by the interactive UI, inside the config directory.
const LOG_FILE_NAME: &str = "lobster.log";

#[derive(Parser)]
#[command(name = "lobster", version)]
#[command(about = "The Large Lobster Model: ask the Oracle, or vibe code a single-page app")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Gemini model for both the Oracle and the Vibe Coder
    #[arg(short, long, global = true, env = "LOBSTER_MODEL")]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the Lobster Oracle a single question
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Generate a single-page HTML app from a description
    Vibe {
        /// What to build
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Write the document to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Save the default Gemini model to the config file
    Model {
        /// Model id, e.g. gemini-3-flash-preview
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command {
        None => {
            init_logging(cli.debug, LogTarget::File);
            run_tui(config, cli.model).await
        }
        Some(Commands::Ask { message }) => {
            init_logging(cli.debug, LogTarget::Stderr);
            ask(&config, cli.model, &message.join(" ")).await
        }
        Some(Commands::Vibe { prompt, out }) => {
            init_logging(cli.debug, LogTarget::Stderr);
            vibe(&config, cli.model, &prompt.join(" "), out.as_deref()).await
        }
        Some(Commands::Model { id }) => {
            init_logging(cli.debug, LogTarget::Stderr);
            Config::save_default_model(&id)?;
            println!("Default model set to {}", id);
            Ok(())
        }
    }
}

enum LogTarget {
    Stderr,
    File,
}

fn init_logging(debug: bool, target: LogTarget) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Stderr => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        // The alternate screen owns stderr, so the UI logs to a file.
        LogTarget::File => {
            let Some(file) = open_log_file() else {
                return;
            };
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }

    if debug {
        info!("Debug logging enabled");
    }
}

fn open_log_file() -> Option<fs::File> {
    let dir = Config::config_dir().ok()?;
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
        .ok()
}

async fn run_tui(config: Config, model: Option<String>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(config, model);
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        app.poll_tasks().await;
        terminal.draw(|frame| ui::render(app, frame))?;

        // Ticks arrive every few hundred milliseconds, so finished tasks are picked up promptly.
        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn ask(config: &Config, model: Option<String>, message: &str) -> Result<()> {
    let client = get_ai(config);
    let prices = CoinGeckoClient::new(config.price_base_url());
    let model = model.unwrap_or_else(|| config.model().to_string());

    let mut oracle = Oracle::new();
    oracle.input = message.to_string();
    if !oracle.send(&client, &prices, &model).await {
        bail!("Nothing to ask");
    }

    if let Some(reply) = oracle.turns().last() {
        println!("{}", reply.content);
    }
    Ok(())
}

async fn vibe(
    config: &Config,
    model: Option<String>,
    prompt: &str,
    out: Option<&Path>,
) -> Result<()> {
    let client = get_ai(config);
    let model = model.unwrap_or_else(|| config.coder_model().to_string());

    let mut coder = VibeCoder::new();
    coder.prompt = prompt.to_string();
    if !coder.generate(&client, &model).await {
        bail!("Nothing to generate");
    }

    let Some(document) = coder.document() else {
        bail!("Generation failed; run with --debug for details");
    };
    write_document(document, out)
}

fn write_document(document: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", document.len(), path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["lobster", "ask", "price", "of", "bitcoin"]);
        match cli.command {
            Some(Commands::Ask { message }) => assert_eq!(message.join(" "), "price of bitcoin"),
            _ => panic!("expected ask"),
        }

        let cli = Cli::parse_from(["lobster", "--debug", "vibe", "snake", "-o", "game.html"]);
        assert!(cli.debug);
        match cli.command {
            Some(Commands::Vibe { prompt, out }) => {
                assert_eq!(prompt, vec!["snake"]);
                assert_eq!(out, Some(PathBuf::from("game.html")));
            }
            _ => panic!("expected vibe"),
        }

        assert!(Cli::parse_from(["lobster"]).command.is_none());
    }

    #[test]
    fn test_write_document_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.html");
        write_document("<html></html>", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_document_reports_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.html");
        assert!(write_document("<html></html>", Some(&path)).is_err());
    }
}
