mod action;
mod app;
mod auth;
mod config;
mod controller;
mod error;
mod github;
mod source;
mod state;
mod tui;
mod types;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::controller::Controller;
use crate::error::Result;
use crate::github::GitHub;
use crate::tui::{Event, EventHandler};
use crate::types::{IssueFilter, IssueQuery};

/// Log directives used when `RUST_LOG` is unset. Output shares the terminal
/// with the UI, so only startup problems get through.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Browse a repository's issues page by page.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Repository identifier, URL-encoded or plain (e.g. facebook%2Freact)
    repository: String,

    /// API base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Initial issue state filter
    #[arg(long, value_enum, default_value_t = IssueFilter::All)]
    filter: IssueFilter,

    /// Initial page (1-based)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let base_url = cli.base_url.as_deref().unwrap_or(&config.api.base_url);
    let token = auth::load_token(&config.api);
    let github = GitHub::new(base_url, token, config.api.timeout())?;

    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let mut controller = Controller::new(Arc::new(github), action_tx)
        .with_initial_query(IssueQuery::first_page(cli.filter).with_page(cli.page));
    controller.open_repository(&cli.repository)?;

    tui::install_panic_hook();
    let result = run(App::new(controller), action_rx).await;
    tui::restore()?;

    result
}

async fn run(
    mut app: App,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
) -> Result<()> {
    let mut terminal = tui::init()?;

    let tick_rate = Duration::from_millis(120);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        app.update(action);
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
