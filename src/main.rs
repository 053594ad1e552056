use std::{
    io::{self, Write},
    panic,
    path::PathBuf,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    execute,
    style::ResetColor,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use tracing::{info, warn};
use tuirealm::{
    PollStrategy,
    terminal::{CrosstermTerminalAdapter, TerminalBridge},
};

use projects_board::{
    app::App,
    auth::LocalAuth,
    cli::{self, RootCommand},
    logging::{init_logging, print_log_location},
    page::ProjectsPage,
    realm::init_application,
    settings::Settings,
    store::{DataAccess, MemoryStore, SqliteStore},
    theme::ThemePreset,
    types::Session,
    ui,
};

#[derive(Parser, Debug)]
#[command(
    name = "projects-board",
    about = "Manage your projects and browse their tasks from the terminal",
    version = env!("PROJECTS_BOARD_BUILD_VERSION"),
    author
)]
struct Cli {
    /// User id to sign in as (overrides `user` in settings)
    #[arg(short, long, global = true, value_name = "UID")]
    user: Option<String>,

    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Keep all data in memory for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[arg(long, value_name = "PRESET")]
    theme: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<RootCommand>,
}

impl Cli {
    fn session(&self, settings: &Settings) -> Option<Session> {
        match self.user.as_deref().map(str::trim) {
            Some(uid) if !uid.is_empty() => Some(Session::new(uid)),
            _ => settings.session(),
        }
    }

    fn database_path(&self, settings: &Settings) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| settings.resolved_database_path())
    }
}

enum RunOutcome {
    Continue,
    Exit(i32),
}

static TERMINAL_RESTORED: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    let log = match init_logging() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err:#}");
            None
        }
    };
    if let Some(handle) = log.as_ref() {
        install_panic_hook_with_log(handle.path.clone());
    }

    let outcome = run_app().await;
    if matches!(outcome, Ok(RunOutcome::Continue) | Err(_))
        && let Some(handle) = log.as_ref()
    {
        print_log_location(&handle.path);
    }

    match outcome {
        Ok(RunOutcome::Continue) => Ok(()),
        Ok(RunOutcome::Exit(code)) => {
            drop(log);
            std::process::exit(code);
        }
        Err(err) => Err(err),
    }
}

async fn run_app() -> Result<RunOutcome> {
    let cli = Cli::parse();
    let mut settings = Settings::load();

    if let Some(raw) = cli.theme.as_deref() {
        match ThemePreset::from_str(raw) {
            Ok(preset) => settings.theme = preset.as_str().to_string(),
            Err(()) => warn!("ignoring unknown --theme '{raw}'"),
        }
    }

    let session = cli.session(&settings);

    if let Some(command) = cli.command.clone() {
        let store = if cli.ephemeral {
            SqliteStore::open_in_memory().await?
        } else {
            SqliteStore::open(cli.database_path(&settings)).await?
        };
        let code = cli::run(&store, session.as_ref(), command, cli.json, cli.quiet).await;
        store.close().await;
        return Ok(RunOutcome::Exit(code));
    }

    let store: Arc<dyn DataAccess> = if cli.ephemeral {
        info!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let path = cli.database_path(&settings);
        info!("opening database {}", path.display());
        Arc::new(SqliteStore::open(&path).await?)
    };

    let tick_interval = Duration::from_millis(settings.tick_interval_ms);
    let auth = Arc::new(LocalAuth::new(session.clone()));
    let page = ProjectsPage::new(store);
    let mut app = App::new(page, auth, settings, session).with_settings_persistence(!cli.ephemeral);
    app.poll_auth();

    let mut realm = init_application(tick_interval)?;
    let _guard = TerminalGuard;
    let mut terminal = setup_terminal()?;

    let mut redraw = true;
    while !app.should_quit() {
        if redraw {
            terminal
                .draw(|frame| ui::render(frame, &app))
                .context("failed to render frame")?;
            redraw = false;
        }

        if app.has_pending_load() {
            app.finish_pending_load().await;
            redraw = true;
            continue;
        }

        let messages = realm
            .tick(PollStrategy::Once)
            .context("failed to process tui-realm tick")?;

        if !messages.is_empty() {
            redraw = true;
        }

        for message in messages {
            app.update(message).await?;
            if app.has_pending_load() {
                terminal
                    .draw(|frame| ui::render(frame, &app))
                    .context("failed to render frame")?;
                app.finish_pending_load().await;
            }
        }
    }

    let _ = terminal.disable_raw_mode();
    let _ = terminal.leave_alternate_screen();
    let _ = terminal.clear_screen();
    TERMINAL_RESTORED.store(true, Ordering::SeqCst);

    Ok(RunOutcome::Continue)
}

fn setup_terminal() -> Result<TerminalBridge<CrosstermTerminalAdapter>> {
    TERMINAL_RESTORED.store(false, Ordering::SeqCst);

    let mut terminal =
        TerminalBridge::new_crossterm().context("failed to initialize terminal bridge")?;
    terminal
        .enable_raw_mode()
        .context("failed to enable raw mode")?;
    terminal
        .enter_alternate_screen()
        .context("failed to enter alternate screen")?;

    Ok(terminal)
}

fn install_panic_hook_with_log(log_path: PathBuf) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        eprintln!();
        eprintln!("projects-board crashed. Log file: {}", log_path.display());
        eprintln!();
        previous_hook(panic_info);
    }));
}

fn restore_terminal() -> Result<()> {
    if TERMINAL_RESTORED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = disable_raw_mode();
    let mut stderr = io::stderr();
    let _ = execute!(stderr, LeaveAlternateScreen, Show, ResetColor);
    let _ = stderr.flush();

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}
