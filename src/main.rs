use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use metric_atlas::app::App;
use metric_atlas::config::{init_logging, Cli};
use metric_atlas::data;
use metric_atlas::selection::{SelectionError, SelectionState};
use metric_atlas::ui;
use ratatui::DefaultTerminal;
use std::time::Duration;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    // Everything is loaded before the terminal switches to raw mode, so a
    // failed load is reported as a plain error instead of a blank map
    let catalog = cli.load_catalog()?;
    let dataset = data::load(&cli.topology, &cli.data)
        .inspect_err(|e| error!(error = %e, "initial load failed"))
        .with_context(|| {
            format!(
                "loading {} and {} (set --topology/--data to point elsewhere)",
                cli.topology.display(),
                cli.data.display()
            )
        })?;
    let selection = SelectionState::with_defaults(
        &catalog,
        cli.metric.as_deref(),
        &cli.baseline,
        cli.year.as_deref(),
    )
    .context("invalid initial selection")?;
    info!(
        metric = selection.metric(),
        year = selection.year(),
        baseline = selection.baseline_country(),
        "starting"
    );

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(dataset, catalog, selection, size.width, size.height);

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log selection changes the catalog rejected; the previous state stays
fn report(result: Result<(), SelectionError>) {
    if let Err(e) = result {
        warn!(error = %e, "selection rejected");
    }
}

/// Handle key presses: dropdown navigation first, then global bindings
fn handle_key(app: &mut App, key: KeyEvent) {
    if app.dropdown.is_some() {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.dropdown_move(-1),
            KeyCode::Down | KeyCode::Char('j') => app.dropdown_move(1),
            KeyCode::PageUp => app.dropdown_move(-10),
            KeyCode::PageDown => app.dropdown_move(10),
            KeyCode::Home => app.dropdown_move(i32::MIN),
            KeyCode::End => app.dropdown_move(i32::MAX),
            KeyCode::Enter => report(app.dropdown_commit()),
            KeyCode::Esc | KeyCode::Char('q') => app.close_dropdown(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Selector controls
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Enter => app.open_dropdown(),
        KeyCode::Char('[') => report(app.step_focused(-1)),
        KeyCode::Char(']') => report(app.step_focused(1)),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_outlines(),
        KeyCode::Char('f') | KeyCode::Char('F') => app.map_renderer.toggle_fills(),

        // Reset view
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

/// Handle mouse events for hovering, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.hover_at(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(control) = app.control_at(mouse.column, mouse.row) {
                // Clicking a selector opens its dropdown
                app.focus = control;
                app.open_dropdown();
            } else if app.map_pixel(mouse.column, mouse.row).is_some() {
                app.close_dropdown();
                app.last_mouse = Some((mouse.column, mouse.row));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
            app.hover_at(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                Event::FocusLost => app.clear_hover(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
