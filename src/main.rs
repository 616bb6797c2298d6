use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use scopelog_engine::{
    BufferSink, ConsoleSink, EngineConfig, FileStorage, LogEngine, LogEngineBuilder,
    RecordBuffer, load_config,
};
use scopelog_tui::{
    Action, AppState, Event, EventHandler, FilterPanel, HelpOverlay, KeyBindings, KeyContext,
    LogViewerScreen, Tui,
};
use scopelog_types::{Notification, SeverityMask};

mod demo;

use demo::{DEFAULT_NAMESPACES, DemoTraffic};

/// Scopelog - namespaced, severity-filtered logging with a live filter panel
#[derive(Parser, Debug)]
#[command(name = "scopelog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Namespace to register (repeatable, replaces configured namespaces)
    #[arg(short = 'n', long = "namespace", value_name = "NAME")]
    namespaces: Vec<String>,

    /// Directory the filter state is persisted in
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Storage key the filter state is persisted under
    #[arg(long, value_name = "KEY")]
    storage_key: Option<String>,

    /// Disable coloured decoration
    #[arg(long)]
    no_color: bool,

    /// Mask for namespaces without a stored preference, e.g. "error,warn" or "all"
    #[arg(long, value_name = "MASK")]
    default_severity: Option<SeverityMask>,

    /// Milliseconds between demo log calls
    #[arg(long, default_value = "250")]
    tick_ms: u64,

    /// Number of output lines kept in the viewer
    #[arg(long, default_value = "10000")]
    buffer_size: usize,

    /// Print one sample line per namespace and level to stderr, then exit
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = if args.print {
        run_print(&args)
    } else {
        run_app(&args).await
    };

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Merge the config file with command line overrides
fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if !args.namespaces.is_empty() {
        config.namespaces = args.namespaces.clone();
    }
    if config.namespaces.is_empty() {
        config.namespaces = DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect();
    }
    if let Some(key) = &args.storage_key {
        config.storage_key = key.clone();
    }
    if let Some(mask) = args.default_severity {
        config.default_severity = mask;
    }
    if args.no_color {
        config.disable_colors = true;
    }

    Ok(config)
}

/// Attach file storage when a location is known, otherwise keep the in-memory default
fn with_storage(builder: LogEngineBuilder, args: &Args) -> LogEngineBuilder {
    let storage = match &args.storage_dir {
        Some(dir) => Some(FileStorage::new(dir)),
        None => FileStorage::default_location(),
    };

    match storage {
        Some(storage) => {
            info!(dir = %storage.dir().display(), "persisting filters");
            builder.storage(storage)
        }
        None => {
            warn!("no data directory available, filters will not be persisted");
            builder
        }
    }
}

fn run_print(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    let builder = LogEngine::builder(config).sink(ConsoleSink::stderr());
    let mut engine = with_storage(builder, args).build();

    for call in DemoTraffic::sample_calls(engine.namespaces()) {
        engine.log(call.severity, &call.namespace, call.args);
    }

    Ok(())
}

async fn run_app(args: &Args) -> Result<()> {
    let config = build_config(args)?;

    let sink = BufferSink::new(args.buffer_size);
    let records = sink.buffer().clone();

    // Initialize event handler; engine notifications are forwarded into it
    let mut events = EventHandler::new(Duration::from_millis(args.tick_ms.max(1)));
    let notify_tx = events.sender();

    let builder = LogEngine::builder(config)
        .sink(sink)
        .on_ready(move |engine| {
            for kind in [
                Notification::FilterStateChanged,
                Notification::ShowPanel,
                Notification::HidePanel,
            ] {
                let tx = notify_tx.clone();
                engine.subscribe(kind, move || {
                    tx.notify(kind);
                });
            }
        });
    let mut engine = with_storage(builder, args).build();

    let mut demo = DemoTraffic::new(engine.namespaces());
    let mut state = AppState::new();
    let keybindings = KeyBindings::new();

    let mut tui = Tui::new()?;
    render(&mut tui, &mut state, &engine, &records)?;

    // Main event loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let context = if state.panel.is_visible() {
                            KeyContext::FilterPanel
                        } else {
                            KeyContext::LogViewer
                        };
                        if let Some(action) = keybindings.get_action(context, &key) {
                            handle_action(&mut state, &mut engine, &records, action);
                        }
                    }
                    Event::Tick => {
                        if let Some(call) = demo.next_call() {
                            engine.log(call.severity, &call.namespace, call.args);
                            state.ui_state.render_dirty = true;
                        }
                    }
                    Event::Resize(_, _) => {
                        state.ui_state.render_dirty = true;
                    }
                    Event::Error(e) => {
                        warn!(error = %e, "terminal input error");
                    }
                    Event::Notify(kind) => {
                        state.handle_notification(kind);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                state.should_quit = true;
            }
        }

        if state.should_quit {
            break;
        }

        if state.ui_state.render_dirty {
            render(&mut tui, &mut state, &engine, &records)?;
        }
    }

    // Cleanup
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(
    state: &mut AppState,
    engine: &mut LogEngine,
    records: &RecordBuffer,
    action: Action,
) {
    state.ui_state.render_dirty = true;

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }

        // Visibility changes round-trip through engine notifications
        Action::ToggleFilterPanel => {
            if state.panel.is_visible() {
                engine.hide_filter_panel();
            } else {
                engine.show_filter_panel();
            }
        }
        Action::CloseFilterPanel => {
            engine.hide_filter_panel();
        }

        // Filter panel grid
        Action::PanelUp => state.panel.move_up(),
        Action::PanelDown => state.panel.move_down(engine.namespaces().len()),
        Action::PanelLeft => state.panel.move_left(),
        Action::PanelRight => state.panel.move_right(),
        Action::PanelToggle => {
            state.panel.toggle(engine);
        }

        // Log viewer actions
        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::PageUp => state.scroll_up(20),
        Action::PageDown => state.scroll_down(20),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }
        Action::ClearLogs => {
            records.clear();
            state.reset_scroll();
        }
    }
}

fn render(
    tui: &mut Tui,
    state: &mut AppState,
    engine: &LogEngine,
    records: &RecordBuffer,
) -> Result<()> {
    tui.terminal().draw(|frame| {
        LogViewerScreen::render(frame, state, engine, records);

        FilterPanel::render(frame, &state.panel, engine);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;
    state.ui_state.render_dirty = false;

    Ok(())
}
