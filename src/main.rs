//! Keyboard Button playground
//!
//! Renders a row of keys in the terminal and drives them with the mouse.

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Widget},
    Frame, Terminal,
};
use std::{
    fs::File,
    io::stdout,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use keyboard_button::{
    config::{self, Config},
    ui::{
        App, AppState, CommitLog, HelpPanel, KeyVisual, PointerAction, StatusBar, TextPanel,
        ThemeColors, KEY_HEIGHT,
    },
};

/// Rows reserved above the keys for the option callout
const CALLOUT_ROWS: u16 = 4;

fn init_logging() -> Result<()> {
    let path = std::env::temp_dir().join("keyboard-button.log");
    let file = File::create(&path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Saved config if there is one, otherwise terminal defaults written out for editing
fn load_config() -> Config {
    match config::config_path() {
        Ok(path) if path.exists() => match Config::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring unreadable config {}: {}", path.display(), e);
                Config::terminal()
            }
        },
        Ok(_) => {
            let config = Config::terminal();
            if let Err(e) = config.save() {
                warn!("could not write default config: {}", e);
            }
            config
        }
        Err(e) => {
            warn!("{}", e);
            Config::terminal()
        }
    }
}

fn draw(frame: &mut Frame, app: &mut App) {
    let colors = ThemeColors::from_theme(app.config.ui.theme);
    let size = frame.area();
    Block::default()
        .style(Style::default().bg(colors.bg))
        .render(size, frame.buffer_mut());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),                                // Text and log
            Constraint::Length(KEY_HEIGHT + CALLOUT_ROWS + 2), // Keyboard tray
            Constraint::Length(1),                             // Status bar
        ])
        .split(size);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);

    {
        let document = app.document();
        frame.render_widget(TextPanel::new(&document.text, document.focused, colors), top[0]);
    }
    if app.show_help {
        frame.render_widget(HelpPanel::new(colors), top[1]);
    } else {
        frame.render_widget(CommitLog::new(app.log().commits(), colors), top[1]);
    }

    // Keyboard tray, keys sit one row above its bottom edge to leave room for shadows
    let tray = chunks[1];
    Block::default()
        .style(Style::default().bg(colors.tray))
        .render(tray, frame.buffer_mut());
    app.layout(keyboard_button::button::Rect::new(
        tray.x as f32,
        tray.y as f32,
        tray.width as f32,
        tray.height.saturating_sub(1) as f32,
    ));
    let scenes: Vec<_> = app.draw_order().map(|b| b.scene()).collect();
    for scene in &scenes {
        frame.render_widget(KeyVisual::new(scene), size);
    }

    let elapsed = app.elapsed_formatted();
    let status = StatusBar::new(
        app.state.name(),
        app.gesture_state().name(),
        &elapsed,
        app.log().commits().len(),
        colors,
    )
    .message(app.get_status());
    frame.render_widget(status, chunks[2]);
}

fn main() -> Result<()> {
    init_logging()?;
    info!("keyboard-button {} starting", env!("CARGO_PKG_VERSION"));

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let config = load_config();
    let tick_rate = config.refresh_interval();
    let mut app = App::new(config);
    app.set_status("Press ? for help".to_string());

    let result = run(&mut terminal, &mut app, tick_rate, &interrupted);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result?;

    println!("\nKeyboard Button session complete.");
    println!("Text typed: {:?}", app.document().text);
    println!("Commits: {}", app.log().commits().len());
    println!("Session duration: {}", app.elapsed_formatted());

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    tick_rate: std::time::Duration,
    interrupted: &AtomicBool,
) -> Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| draw(frame, app))?;

        // Wake up in time for the next long press
        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()).min(tick_rate))
            .unwrap_or(tick_rate);

        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Mouse(mouse) => {
                    let action = match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => Some(PointerAction::Press),
                        MouseEventKind::Drag(MouseButton::Left) => Some(PointerAction::Drag),
                        MouseEventKind::Up(MouseButton::Left) => Some(PointerAction::Release),
                        _ => None,
                    };
                    if let Some(action) = action {
                        app.handle_mouse(action, mouse.column, mouse.row, now);
                    }
                }
                Event::FocusLost => app.cancel_touch(now),
                Event::Key(key) => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit()
                    }
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => app.cancel_touch(now),
                    KeyCode::Char('f') => app.toggle_focus(),
                    KeyCode::Char('c') => app.clear_text(),
                    KeyCode::Char('n') => app.toggle_narrow(),
                    KeyCode::Char('p') => app.toggle_trackpad(),
                    KeyCode::Char('t') => app.toggle_theme(),
                    KeyCode::Char('?') => app.toggle_help(),
                    KeyCode::Char('e') => {
                        let filename = format!(
                            "keyboard_button_report_{}.json",
                            chrono::Utc::now().format("%Y%m%d_%H%M%S")
                        );
                        if let Err(e) = app.export_report(&filename) {
                            app.set_status(format!("Export failed: {}", e));
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            app.quit();
        }
        if app.state == AppState::Quitting {
            info!("quitting after {} commits", app.log().commits().len());
            return Ok(());
        }
    }
}
