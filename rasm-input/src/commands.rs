//! Command definitions for rasm

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
    Help,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
            Mode::Help => "HELP",
        }
    }
}

/// Commands that can be dispatched from input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Slider focus
    FocusNext,
    FocusPrev,

    // Slider movement, as fractions of the focused slider's display range
    Nudge(f64),
    Jump(f64),

    // Engine
    ResetEngine,
    PollAll,
    /// Write a value straight to the engine, bypassing the slider
    SetParameter(String, f64),

    /// Take a slider off the surface, unbinding it
    RemoveControl(String),

    // UI
    ToggleHelp,
    SetTheme(String),

    // Mode changes
    EnterCommandMode,
    EnterNormalMode,

    // Application
    Quit,

    /// Command line that did not parse
    Unknown(String),
}
