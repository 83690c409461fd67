mod app;
mod config;
mod player;
mod prompt;
mod streams;
mod theme;
mod ui;
mod web;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    style::{Color as TermColor, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, style::Color, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, Popup};
use config::AppConfig;
use player::{volume, Player};
use streams::StreamList;
use theme::Palette;

#[derive(Parser, Debug)]
#[command(name = "sointu")]
#[command(version)]
#[command(about = "A small internet radio controller with a web page and a terminal UI")]
struct Args {
    /// Run the web UI instead of the terminal UI
    #[arg(long)]
    serve: bool,

    /// Address for the web UI to bind to
    #[arg(short, long)]
    ip: Option<String>,

    /// Port for the web UI
    #[arg(short, long)]
    port: Option<u16>,

    /// Streams file (JSON)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Add a stream from the terminal
    #[arg(long)]
    add: bool,

    /// Print the stream list
    #[arg(long)]
    list: bool,

    /// Output volume and stream count as JSON
    #[arg(long)]
    status: bool,

    /// Play a stream by name until Ctrl+C
    #[arg(long)]
    play: Option<String>,
}

impl Args {
    /// Command line values win over the config file
    fn apply(&self, config: &mut AppConfig) {
        if let Some(ip) = &self.ip {
            config.ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(file) = &self.file {
            config.streams_file = file.clone();
        }
    }

    fn runs_tui(&self) -> bool {
        !(self.serve || self.add || self.list || self.status || self.play.is_some())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.runs_tui());

    let mut config = AppConfig::load().unwrap_or_default();
    args.apply(&mut config);

    // Handle CLI-only commands
    if args.status {
        return print_status(&config).await;
    }

    if args.list {
        return print_list(&config);
    }

    if args.add {
        return add_stream(&config);
    }

    if let Some(name) = &args.play {
        return play_stream(&config, name).await;
    }

    if args.serve {
        return run_web(config).await;
    }

    run_tui(config).await
}

/// Log to stderr, or to a file while the terminal UI owns the screen
fn init_logging(tui: bool) {
    let log_file = tui
        .then(|| AppConfig::config_dir().ok())
        .flatten()
        .and_then(|dir| std::fs::File::create(dir.join("sointu.log")).ok());

    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    match log_file {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

async fn print_status(config: &AppConfig) -> Result<()> {
    let streams = StreamList::load(&config.streams_file)?;
    let volume = volume::get_volume().await.ok();

    let output = serde_json::json!({
        "volume": volume,
        "streams": streams.len(),
        "streams_file": streams.path(),
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn print_list(config: &AppConfig) -> Result<()> {
    let streams = StreamList::load(&config.streams_file)?;
    let palette = Palette::from_config(config.palette.as_deref());

    for row in app::stream_rows(&streams, &palette) {
        let badge = format!(" {} ", row.label)
            .with(TermColor::Black)
            .on(term_color(row.color))
            .bold();
        println!("{} {}", badge, row.name);
    }

    Ok(())
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        _ => TermColor::Reset,
    }
}

fn add_stream(config: &AppConfig) -> Result<()> {
    let mut streams = StreamList::load(&config.streams_file)?;
    let mut prompter = prompt::LinePrompter::new(io::stdin().lock(), io::stdout());

    if prompt::add_stream(&mut prompter, &mut prompt::FileForm::new(&mut streams))? {
        println!("Saved to {}", streams.path().display());
    }
    Ok(())
}

async fn play_stream(config: &AppConfig, name: &str) -> Result<()> {
    let streams = StreamList::load(&config.streams_file)?;
    let Some(stream) = streams.find(name) else {
        anyhow::bail!("No stream named '{}' in {}", name, streams.path().display());
    };

    player::program_exists(&config.player)?;

    let mut player = Player::new(config.player.clone(), config.sink.clone());
    player.play(&stream.name, &stream.address).await?;
    if config.notifications {
        player::notify_playing(&stream.name);
    }

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        result = player.wait() => {
            result?;
            false
        }
    };

    if interrupted {
        player.stop().await?;
    }
    Ok(())
}

async fn run_web(config: AppConfig) -> Result<()> {
    for program in [config.player.as_str(), "wpctl"] {
        if let Err(e) = player::program_exists(program) {
            tracing::warn!("{}", e);
        }
    }

    let streams = StreamList::load(&config.streams_file)?;
    let volume = volume::get_volume().await.unwrap_or_else(|e| {
        tracing::warn!("Could not read volume, assuming 50%: {}", e);
        50
    });

    let state = Arc::new(Mutex::new(web::WebState {
        streams,
        player: Player::new(config.player.clone(), config.sink.clone()),
        palette: Palette::from_config(config.palette.as_deref()),
        selection: 0,
        volume,
        notifications: config.notifications,
    }));

    web::serve(&format!("{}:{}", config.ip, config.port), state).await
}

async fn run_tui(config: AppConfig) -> Result<()> {
    if let Err(e) = player::program_exists(&config.player) {
        tracing::warn!("{}", e);
    }

    // Create app state before taking over the terminal so load errors stay readable
    let mut app = App::new(config).await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown().await?;
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        let _ = app.tick().await;
    }
}
