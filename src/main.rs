use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
use std::io::{self, IsTerminal, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use imapsync_status::app::{load_users, poll_event, Action, AppEvent, AppState, CliOverrides, Config};
use imapsync_status::jobs::JobRegistry;
use imapsync_status::poll::{PollState, Poller, StatusSink};
use imapsync_status::progress::Aggregator;
use imapsync_status::sink::{open_or_restore, HeadlessSink, JsonSink, TerminalSink};
use imapsync_status::ui;

/// Imapsync Status - live progress of running imapsync jobs
#[derive(Parser)]
#[command(name = "imapsync-status")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debugging info to the log file
    #[arg(short = 'v', long)]
    debug: bool,

    /// The path of the CSV file containing the list of users
    #[arg(short = 'u', long = "user-file", default_value = "users.csv")]
    user_file: PathBuf,

    /// Skip the first line of the CSV file
    #[arg(long)]
    skip_first_line: bool,

    /// Show only running users
    #[arg(short = 'r', long)]
    show_running: bool,

    /// Draw below the prompt instead of clearing the console
    #[arg(short = 'n', long)]
    no_clear_console: bool,

    /// Directory holding the imapsync-<user>.pid markers
    #[arg(short = 'd', long, env = "IMAPSYNC_PID_DIR")]
    pid_dir: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(short = 'i', long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Print one status line per refresh instead of the dashboard
    #[arg(long, conflicts_with = "json")]
    headless: bool,

    /// Print one JSON object per refresh instead of the dashboard
    #[arg(long)]
    json: bool,

    /// Poll once, print the result and exit (implies --headless unless --json)
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            pid_dir: self.pid_dir.clone(),
            interval_ms: self.interval_ms,
            show_running: self.show_running,
            no_clear_console: self.no_clear_console,
            debug: self.debug,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = Config::load().context("Failed to load config")?;
    let mut config = file_config.clone();
    config.apply_cli(&cli.overrides());

    init_logging(&config.log_level)?;

    match file_config.save_if_missing() {
        Ok(true) => info!("Wrote default config"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to save default config: {:#}", e),
    }

    // 起動時エラーはここで終了
    let users = match load_users(&cli.user_file, cli.skip_first_line) {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded {} users from {}", users.len(), cli.user_file.display());

    let registry = JobRegistry::new(config.pid_dir.clone(), users.clone());
    let aggregator = Aggregator::new(users.len()).with_tail_window(config.tail_window_bytes);
    let poller = Poller::new(registry, aggregator, config.refresh_interval());

    if cli.once {
        let state = poller.poll_once(&PollState::new(users.len()));
        let stdout = io::stdout().lock();
        return if cli.json {
            JsonSink::new(stdout).publish(&state.snapshot, &state.samples)
        } else {
            HeadlessSink::new(stdout).publish(&state.snapshot, &state.samples)
        };
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let cancel = CancellationToken::new();
    runtime.spawn(wait_for_signal(cancel.clone()));

    if cli.json {
        let mut sink = JsonSink::new(io::stdout());
        runtime.block_on(poller.run(&mut sink, cancel));
        return Ok(());
    }
    if cli.headless || !io::stdout().is_terminal() {
        let mut sink = HeadlessSink::new(io::stdout());
        runtime.block_on(poller.run(&mut sink, cancel));
        return Ok(());
    }

    let state = AppState::new(&users, config.ui.show_running);
    run_tui(&runtime, &poller, state, config.ui.clear_console, cancel)
}

fn init_logging(level: &str) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("", "", "imapsync-status")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("imapsync-status"));

    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("imapsync-status.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_file),
        )
        .init();

    info!("Imapsync Status starting");
    Ok(())
}

/// Cancel on SIGINT or SIGTERM
async fn wait_for_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                cancel.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
            _ = cancel.cancelled() => return,
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = cancel.cancelled() => return,
        }
    }
    info!("Shutdown signal received");
    cancel.cancel();
}

fn run_tui(
    runtime: &tokio::runtime::Runtime,
    poller: &Poller,
    state: AppState,
    clear_console: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let user_count = state.users.len();

    enable_raw_mode()?;
    // 失敗時は端末を元に戻してから終了
    let terminal = open_or_restore(
        || open_terminal(clear_console, user_count),
        || {
            if clear_console {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
            }
            let _ = disable_raw_mode();
        },
    )
    .context("Failed to initialize terminal")?;

    // キー入力は別スレッドで監視し、終了時はトークンをキャンセル
    let (action_tx, action_rx) = tokio::sync::mpsc::unbounded_channel::<Action>();
    let input = Arc::new(Notify::new());
    let key_cancel = cancel.clone();
    let key_input = Arc::clone(&input);
    let key_reader = runtime.spawn_blocking(move || read_keys(action_tx, key_input, key_cancel));

    let mut sink = TerminalSink::new(terminal, state, action_rx);
    let result = match sink.draw() {
        Ok(()) => {
            runtime.block_on(poller.run_with_input(&mut sink, &input, cancel.clone()));
            Ok(())
        }
        Err(e) => Err(e),
    };

    cancel.cancel();
    if let Err(e) = runtime.block_on(key_reader) {
        tracing::warn!("Key reader stopped abnormally: {}", e);
    }

    let mut terminal = sink.into_terminal();
    disable_raw_mode()?;
    if clear_console {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;
    println!();

    result.context("Dashboard failed")
}

fn open_terminal(clear_console: bool, user_count: usize) -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    if clear_console {
        execute!(stdout, EnterAlternateScreen)?;
        Terminal::new(CrosstermBackend::new(stdout))
    } else {
        Terminal::with_options(
            CrosstermBackend::new(stdout),
            TerminalOptions {
                viewport: Viewport::Inline(ui::full_height(user_count)),
            },
        )
    }
}

/// Forward key presses until cancelled; quit keys cancel the poll loop.
/// Every forwarded key and every resize wakes the loop for a redraw.
fn read_keys(
    actions: tokio::sync::mpsc::UnboundedSender<Action>,
    input: Arc<Notify>,
    cancel: CancellationToken,
) {
    while !cancel.is_cancelled() {
        match poll_event(Duration::from_millis(100)) {
            Ok(Some(AppEvent::Key(key))) => match Action::from(key) {
                Action::Quit => {
                    info!("Quit requested");
                    cancel.cancel();
                }
                Action::None => {}
                action => {
                    let _ = actions.send(action);
                    input.notify_one();
                }
            },
            Ok(Some(AppEvent::Resize(_, _))) => input.notify_one(),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to read terminal input: {}", e);
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}
