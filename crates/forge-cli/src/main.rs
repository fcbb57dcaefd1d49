mod account;
mod app;
mod command;
mod suggestions;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use app::{App, PendingReply};
use clap::{Parser, Subcommand};
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use forge_api::{BackendConfig, HttpBackend, MediaBackend};
use forge_app::Config;
use forge_auth::{MemoryLocation, SessionStore};
use forge_core::{RequestOrchestrator, TransientArtifacts, VideoGenerator};
use forge_db::Store;
use parking_lot::Mutex;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio_stream::StreamExt;
use tracing::info;

const SERVICE_NAME: &str = "forge";
const LOADING_MESSAGE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "forge", about = "Edit photos and generate images and videos from the terminal.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the terminal UI (default).
    Tui,
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign in with Google in the browser.
    Google,
    /// Sign out and forget the stored session.
    Logout,
    /// Show who is signed in.
    Whoami,
}

/// Restore the terminal to its original state. Called on normal exit and
/// from the panic hook.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Log to a file under the data directory; the terminal belongs to the UI.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(forge_app::log_path()?)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "forge=info,forge_core=info,forge_api=info,forge_auth=info,forge_db=warn",
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    init_logging()?;
    info!(version = env!("CARGO_PKG_VERSION"), backend = %config.backend_url, "forge starting");

    let store = Arc::new(Mutex::new(Store::open(forge_app::database_path()?)?));
    let mut sessions = SessionStore::new(SERVICE_NAME, store);
    let backend = forge_api::backend(BackendConfig {
        base_url: config.backend_url.clone(),
    });

    // Nothing has redirected here at startup, so this restores the stored
    // session if there is one.
    sessions.rehydrate(&MemoryLocation::new(config.callback_url.clone()))?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(&config, &mut sessions, backend).await,
        Command::Login { email } => account::login(&mut sessions, &backend, email).await,
        Command::Signup { name, email } => {
            account::signup(&mut sessions, &backend, name, email).await
        }
        Command::Google => account::google(&mut sessions, &backend, &config.callback_url).await,
        Command::Logout => {
            sessions.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match sessions.current() {
                Some(session) => println!(
                    "{} <{}> (id {})",
                    session.identity.name, session.identity.email, session.identity.id
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
    }
}

async fn run_tui(
    config: &Config,
    sessions: &mut SessionStore,
    backend: HttpBackend,
) -> Result<(), Box<dyn std::error::Error>> {
    if !sessions.is_authenticated() {
        println!("Sign in to continue (or run `forge signup` / `forge google`).");
        account::login(sessions, &backend, None).await?;
    }

    let backend: Arc<dyn MediaBackend> = Arc::new(backend);
    let video = VideoGenerator::new(
        Arc::clone(&backend),
        TransientArtifacts::new(forge_app::artifact_dir()?),
    )
    .with_poll_interval(config.video_poll_interval);
    let mut app = App::new(
        RequestOrchestrator::new(backend),
        video,
        sessions.current().cloned(),
    );

    // Install a panic hook that restores the terminal before printing the
    // panic message, so the user isn't left with a broken terminal.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let mut events = EventStream::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    restore_terminal();
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventStream,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inflight: Option<PendingReply> = None;
    let mut loading_interval = tokio::time::interval(LOADING_MESSAGE_INTERVAL);
    loading_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            // Terminal events (keyboard, resize)
            Some(Ok(event)) = events.next() => {
                if let Event::Key(key) = event
                    && key.kind == KeyEventKind::Press
                    && let Some(request) = app.handle_key(key)
                {
                    inflight = Some(app.dispatch(request));
                }
            }

            // The in-flight edit or generation request
            reply = async {
                match inflight.as_mut() {
                    Some(pending) => pending.await,
                    None => std::future::pending().await,
                }
            } => {
                inflight = None;
                app.handle_reply(reply);
            }

            // Video job progress
            Some(state) = app.video.advance(), if app.video.is_running() => {
                app.handle_video_update(state);
            }

            _ = loading_interval.tick() => app.tick(),
        }

        // Cancelled or abandoned by a mode switch.
        if !app.busy {
            inflight = None;
        }
    }
    Ok(())
}
