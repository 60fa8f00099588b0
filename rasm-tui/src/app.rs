//! Application state management (Elm architecture)

use crate::theme::Theme;
use rasm_input::Mode;

/// Frames a meter peak is held before decaying (~667ms at 30fps)
const PEAK_HOLD_FRAMES: u16 = 20;
const PEAK_DECAY: f32 = 0.92;

/// Message type for status bar coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    // UI state
    pub mode: Mode,
    pub command_buffer: String,
    pub message: Option<String>,
    pub message_type: MessageType,
    pub show_help: bool,

    // Slider focus
    pub focused: usize,
    pub slider_count: usize,

    // Live input meter; None when no input source is running
    pub input_level: Option<f32>,
    pub input_peak: f32,
    peak_hold_frames: u16,

    // Theme
    pub theme: Theme,

    pub frame_count: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
            message: None,
            message_type: MessageType::Info,
            show_help: false,
            focused: 0,
            slider_count: 0,
            input_level: None,
            input_peak: 0.0,
            peak_hold_frames: 0,
            theme: Theme::default(),
            frame_count: 0,
        }
    }
}

impl AppState {
    pub fn new(slider_count: usize) -> Self {
        Self {
            slider_count,
            ..Self::default()
        }
    }

    /// Set current mode
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if mode != Mode::Command {
            self.command_buffer.clear();
        }
    }

    /// Toggle help display
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Set theme by name
    pub fn set_theme(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => {
                self.theme = theme;
                self.set_success(format!("Theme set to: {}", self.theme.name));
            }
            None => self.set_error(format!("Unknown theme: {}. Use green/amber/cyber", name)),
        }
    }

    pub fn focus_next(&mut self) {
        if self.slider_count > 0 {
            self.focused = (self.focused + 1) % self.slider_count;
        }
    }

    pub fn focus_prev(&mut self) {
        if self.slider_count > 0 {
            self.focused = (self.focused + self.slider_count - 1) % self.slider_count;
        }
    }

    /// Keep focus valid after sliders were removed
    pub fn set_slider_count(&mut self, count: usize) {
        self.slider_count = count;
        if self.focused >= count {
            self.focused = count.saturating_sub(1);
        }
    }

    /// Clear any displayed message
    pub fn clear_message(&mut self) {
        self.message = None;
        self.message_type = MessageType::Info;
    }

    /// Set a message to display (info level)
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Info;
    }

    /// Set a success message (green)
    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Success;
    }

    /// Set a warning message (yellow)
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Warning;
    }

    /// Set an error message (red)
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Error;
    }

    /// Update the input meter with peak hold (call once per frame)
    pub fn update_input_level(&mut self, level: Option<f32>) {
        self.input_level = level;
        let Some(level) = level else {
            self.input_peak = 0.0;
            self.peak_hold_frames = 0;
            return;
        };

        if level > self.input_peak {
            self.input_peak = level;
            self.peak_hold_frames = PEAK_HOLD_FRAMES;
        } else if self.peak_hold_frames > 0 {
            self.peak_hold_frames -= 1;
        } else {
            self.input_peak = (self.input_peak * PEAK_DECAY).max(level);
            if self.input_peak < 0.001 {
                self.input_peak = 0.0;
            }
        }
    }

    /// Level shown on the meter, `None` without an input source
    pub fn meter_level(&self) -> Option<f32> {
        self.input_level.map(|_| self.input_peak)
    }
}

/// Main application wrapper
pub struct App {
    pub state: AppState,
    pub should_quit: bool,
}

impl App {
    pub fn new(slider_count: usize) -> Self {
        Self {
            state: AppState::new(slider_count),
            should_quit: false,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
