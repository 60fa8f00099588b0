//! rasm - terminal front end for the rasm_origin patch
//!
//! Loads the binding table, starts the device, binds one slider per
//! configured control and runs the UI until quit.

use std::fs::{self, File, OpenOptions};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Terminal,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rasm_config::Config;
use rasm_engine::{Device, DeviceDescriptor, InputSource};
use rasm_input::{Command, InputHandler};
use rasm_params::{ParameterRegistry, Ticks};
use rasm_sync::{BindingSet, ControlHandle, ParameterSource, SyncContext};
use rasm_tui::{App, HelpWidget, SliderBank, SliderWidget, StatusBarWidget, Theme};

/// Frame rate for UI updates
const FPS: u64 = 30;

/// Rows taken by one slider (border, track, ticks, border)
const SLIDER_HEIGHT: u16 = 4;

/// Everything that lives for one run
struct Session {
    device: Device,
    sliders: SliderBank,
    bindings: BindingSet,
    input: Option<InputSource>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "rasm starting");

    let config = Config::load();
    let registry = Arc::new(config.registry());

    // Engine first: no binding exists before the device is up
    let device = Device::new(DeviceDescriptor::rasm_origin());
    let source: Arc<dyn ParameterSource> = Arc::new(device.clone());

    let sliders = build_sliders(&config, &registry);
    let ctx = SyncContext::new(registry, source);
    let bindings = BindingSet::build(&ctx, &sliders, &config.mapping_entries());

    let input = match InputSource::acquire() {
        Ok(input) => Some(input),
        Err(e) => {
            warn!(error = %e, "continuing without live input");
            None
        }
    };

    let mut session = Session {
        device,
        sliders,
        bindings,
        input,
    };

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut session);

    // Cleanup
    session.bindings.teardown();
    drop(session.input.take());
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("rasm stopped");
    result
}

/// Log to `<data_dir>/rasm/rasm.log`; the terminal belongs to the UI
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    match open_log_file() {
        Ok(file) => {
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(_) => {
            let _ = builder.with_writer(io::stderr).try_init();
        }
    }
}

fn open_log_file() -> io::Result<File> {
    let path = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rasm")
        .join("rasm.log");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// One slider per configured control, labelled from its parameter spec
fn build_sliders(config: &Config, registry: &ParameterRegistry) -> SliderBank {
    let mut bank = SliderBank::new();
    for control in &config.controls {
        let spec = registry.get(&control.parameter).cloned();
        let label = spec
            .as_ref()
            .map_or_else(|| control.control.clone(), |s| s.label().to_string());
        bank.add(control.control.clone(), label, spec);
    }
    debug!(sliders = bank.len(), "slider bank built");
    bank
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
) -> anyhow::Result<()> {
    let mut app = App::new(session.sliders.len());
    let mut input_handler = InputHandler::new();

    let frame_duration = Duration::from_millis(1000 / FPS);
    let mut last_frame = Instant::now();

    let skipped = session.bindings.skipped().len();
    if skipped > 0 {
        app.state.set_warning(format!(
            "{} of {} controls could not be bound, see log",
            skipped,
            skipped + session.bindings.len()
        ));
    } else {
        app.state.set_message(format!(
            "{} - {} sliders bound | Press ? for help",
            session.device.descriptor().name,
            session.bindings.len()
        ));
    }

    loop {
        if app.should_quit {
            break;
        }

        app.state.frame_count = app.state.frame_count.wrapping_add(1);
        app.state
            .update_input_level(session.input.as_ref().map(InputSource::level));

        // Render
        terminal.draw(|frame| {
            render_ui(frame, &app, session);
        })?;

        // Handle input
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = input_handler.handle_key(key) {
                        handle_command(&mut app, session, cmd);
                    }

                    // Update mode in app state
                    app.state.set_mode(input_handler.mode());
                    app.state.command_buffer = input_handler.command_buffer().to_string();
                }
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    Ok(())
}

fn handle_command(app: &mut App, session: &mut Session, cmd: Command) {
    match cmd {
        // Focus
        Command::FocusNext => app.state.focus_next(),
        Command::FocusPrev => app.state.focus_prev(),

        // Slider movement goes through the user input path
        Command::Nudge(fraction) => {
            if let Some(entry) = session.sliders.at(app.state.focused) {
                entry.control.nudge(fraction);
            }
        }
        Command::Jump(fraction) => {
            if let Some(entry) = session.sliders.at(app.state.focused) {
                entry.control.jump(fraction);
            }
        }

        // Engine-originated changes
        Command::ResetEngine => {
            session.device.reset();
            app.state.set_success("Parameters reset to initial values");
        }
        Command::PollAll => {
            let polled = session.bindings.poll_all();
            app.state.set_message(format!(
                "Polled {} of {} bindings",
                polled,
                session.bindings.len()
            ));
        }
        Command::SetParameter(name, value) => match session.device.set_by_key(&name, value) {
            Ok(stored) => app.state.set_success(format!("{} = {}", name, stored)),
            Err(e) => app.state.set_error(e.to_string()),
        },

        Command::RemoveControl(id) => match session.sliders.remove(&id) {
            Some(entry) => {
                let removed = session.bindings.prune(&session.sliders);
                app.state.set_slider_count(session.sliders.len());
                app.state.set_warning(format!(
                    "Removed {} ({} binding{} torn down)",
                    entry.control.id(),
                    removed,
                    if removed == 1 { "" } else { "s" }
                ));
            }
            None => app.state.set_error(format!("No slider named {}", id)),
        },

        // UI
        Command::ToggleHelp => app.state.toggle_help(),
        Command::SetTheme(name) => app.state.set_theme(&name),
        Command::EnterCommandMode => app.state.clear_message(),
        Command::EnterNormalMode => {}
        Command::Unknown(line) => app.state.set_error(format!("Unknown command: {}", line)),

        Command::Quit => app.quit(),
    }
}

fn render_ui(frame: &mut ratatui::Frame, app: &App, session: &Session) {
    let area = frame.area();
    let theme = &app.state.theme;

    // Clear with background
    frame.render_widget(Block::default().style(theme.normal()), area);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(SLIDER_HEIGHT),
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], theme, &session.device.descriptor().name);
    render_sliders(frame, chunks[1], app, session);

    let status = StatusBarWidget::new(app.state.mode, &app.state.command_buffer, theme)
        .message(app.state.message.as_deref(), app.state.message_type)
        .bindings(session.bindings.len(), session.bindings.skipped().len())
        .input_level(app.state.meter_level());
    frame.render_widget(status, chunks[2]);

    if app.state.show_help {
        let help_area = centered_rect(58, 28, area);
        frame.render_widget(Clear, help_area);
        frame.render_widget(HelpWidget::new(theme), help_area);
    }
}

fn render_sliders(frame: &mut ratatui::Frame, area: Rect, app: &App, session: &Session) {
    let theme = &app.state.theme;
    let rows = Layout::vertical(
        session
            .sliders
            .iter()
            .map(|_| Constraint::Length(SLIDER_HEIGHT))
            .chain(std::iter::once(Constraint::Min(0))),
    )
    .split(area);

    for (index, entry) in session.sliders.iter().enumerate() {
        let snapshot = entry.control.snapshot();
        let mut widget = SliderWidget::new(&entry.label, snapshot, theme)
            .focused(index == app.state.focused);

        if let Some(spec) = &entry.spec {
            widget = widget.ticks(Ticks::for_spec(spec, snapshot.span()));
            if let Some(binding) = session.bindings.get(entry.control.id()) {
                widget = widget.value_text(spec.format_value(binding.last_known()));
            }
        }
        frame.render_widget(widget, rows[index]);
    }
}

fn render_title(frame: &mut ratatui::Frame, area: Rect, theme: &Theme, device: &str) {
    let title_text = format!(" RASM - {} ", device);
    let title_len = title_text.chars().count();
    let padding = (area.width as usize).saturating_sub(title_len) / 2;
    let rest = (area.width as usize).saturating_sub(padding + title_len);
    let padded = format!(
        "{:═<pad$}{}{:═<rest$}",
        "",
        title_text,
        "",
        pad = padding,
        rest = rest
    );

    let line = Line::from(Span::styled(padded, theme.title()));
    frame.render_widget(Paragraph::new(line), area);
}

/// Create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
