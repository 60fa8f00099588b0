//! Modal state machine for keyboard input

use crate::commands::{Command, Mode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Fine and coarse nudge sizes, as fractions of the display range
const NUDGE_FINE: f64 = 0.01;
const NUDGE_COARSE: f64 = 0.1;

/// Handles keyboard input and converts to commands
pub struct InputHandler {
    mode: Mode,
    command_buffer: String,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
        }
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get current command buffer (for display)
    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Command => self.handle_command_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        let coarse = key.modifiers.contains(KeyModifiers::SHIFT);
        let nudge = if coarse { NUDGE_COARSE } else { NUDGE_FINE };

        match key.code {
            // Mode switching
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_buffer.clear();
                Some(Command::EnterCommandMode)
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }

            // Focus navigation
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => Some(Command::FocusNext),
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => Some(Command::FocusPrev),

            // Slider movement
            KeyCode::Left | KeyCode::Char('h') => Some(Command::Nudge(-nudge)),
            KeyCode::Right | KeyCode::Char('l') => Some(Command::Nudge(nudge)),
            KeyCode::Char('H') => Some(Command::Nudge(-NUDGE_COARSE)),
            KeyCode::Char('L') => Some(Command::Nudge(NUDGE_COARSE)),
            KeyCode::PageDown => Some(Command::Nudge(-NUDGE_COARSE)),
            KeyCode::PageUp => Some(Command::Nudge(NUDGE_COARSE)),
            KeyCode::Home => Some(Command::Jump(0.0)),
            KeyCode::End => Some(Command::Jump(1.0)),
            KeyCode::Char(c @ '0'..='9') => {
                let digit = (c as u8 - b'0') as f64;
                Some(Command::Jump(digit / 10.0))
            }

            // Engine
            KeyCode::Char('r') => Some(Command::ResetEngine),
            KeyCode::Char('p') => Some(Command::PollAll),

            // Quit
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),

            _ => None,
        }
    }

    fn handle_command_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let buffer = std::mem::take(&mut self.command_buffer);
                let cmd = Self::parse_command(&buffer);
                if cmd == Command::ToggleHelp {
                    self.mode = Mode::Help;
                }
                Some(cmd)
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_buffer.clear();
                Some(Command::EnterNormalMode)
            }
            KeyCode::Backspace => {
                self.command_buffer.pop();
                if self.command_buffer.is_empty() {
                    self.mode = Mode::Normal;
                    Some(Command::EnterNormalMode)
                } else {
                    None
                }
            }
            KeyCode::Char(c) => {
                self.command_buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn parse_command(buffer: &str) -> Command {
        let input = buffer.trim();

        match input {
            "q" | "quit" => return Command::Quit,
            "reset" => return Command::ResetEngine,
            "poll" => return Command::PollAll,
            "help" => return Command::ToggleHelp,
            _ => {}
        }

        // set <parameter> <value>
        if let Some(rest) = input.strip_prefix("set ") {
            let mut parts = rest.split_whitespace();
            if let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
                if let Ok(value) = value.parse::<f64>() {
                    return Command::SetParameter(name.to_string(), value);
                }
            }
        }

        if let Some(control) = input.strip_prefix("remove ") {
            let control = control.trim();
            if !control.is_empty() {
                return Command::RemoveControl(control.to_string());
            }
        }

        if let Some(name) = input.strip_prefix("theme ") {
            let name = name.trim();
            if !name.is_empty() {
                return Command::SetTheme(name.to_string());
            }
        }

        Command::Unknown(input.to_string())
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') => {
                self.mode = Mode::Normal;
                Some(Command::Quit)
            }
            // Any other key closes help
            _ => {
                self.mode = Mode::Normal;
                Some(Command::ToggleHelp)
            }
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(handler: &mut InputHandler, line: &str) -> Option<Command> {
        assert_eq!(handler.handle_key(key(KeyCode::Char(':'))), Some(Command::EnterCommandMode));
        for c in line.chars() {
            assert_eq!(handler.handle_key(key(KeyCode::Char(c))), None);
        }
        handler.handle_key(key(KeyCode::Enter))
    }

    #[test]
    fn test_focus_keys() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key(KeyCode::Tab)), Some(Command::FocusNext));
        assert_eq!(handler.handle_key(key(KeyCode::Char('j'))), Some(Command::FocusNext));
        assert_eq!(handler.handle_key(key(KeyCode::BackTab)), Some(Command::FocusPrev));
        assert_eq!(handler.handle_key(key(KeyCode::Up)), Some(Command::FocusPrev));
    }

    #[test]
    fn test_nudge_and_jump() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key(KeyCode::Right)), Some(Command::Nudge(0.01)));
        assert_eq!(handler.handle_key(key(KeyCode::Char('h'))), Some(Command::Nudge(-0.01)));
        assert_eq!(
            handler.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT)),
            Some(Command::Nudge(-0.1))
        );
        assert_eq!(handler.handle_key(key(KeyCode::PageUp)), Some(Command::Nudge(0.1)));
        assert_eq!(handler.handle_key(key(KeyCode::End)), Some(Command::Jump(1.0)));
        assert_eq!(handler.handle_key(key(KeyCode::Char('7'))), Some(Command::Jump(0.7)));
    }

    #[test]
    fn test_quit_keys() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(handler.handle_key(key(KeyCode::Esc)), Some(Command::Quit));

        handler.handle_key(key(KeyCode::Char(':')));
        assert_eq!(
            handler.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key(KeyCode::Char('?'))), Some(Command::ToggleHelp));
        assert_eq!(handler.mode(), Mode::Help);
        assert_eq!(handler.handle_key(key(KeyCode::Char('x'))), Some(Command::ToggleHelp));
        assert_eq!(handler.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line() {
        let mut handler = InputHandler::new();
        assert_eq!(
            type_line(&mut handler, "set volume 0.25"),
            Some(Command::SetParameter("volume".into(), 0.25))
        );
        assert_eq!(handler.mode(), Mode::Normal);
        assert_eq!(type_line(&mut handler, "reset"), Some(Command::ResetEngine));
        assert_eq!(
            type_line(&mut handler, "theme amber"),
            Some(Command::SetTheme("amber".into()))
        );
        assert_eq!(
            type_line(&mut handler, "remove release-slider"),
            Some(Command::RemoveControl("release-slider".into()))
        );
        assert_eq!(
            type_line(&mut handler, "set volume loud"),
            Some(Command::Unknown("set volume loud".into()))
        );
    }

    #[test]
    fn test_command_backspace_and_escape() {
        let mut handler = InputHandler::new();
        handler.handle_key(key(KeyCode::Char(':')));
        handler.handle_key(key(KeyCode::Char('p')));
        assert_eq!(handler.command_buffer(), "p");
        assert_eq!(handler.handle_key(key(KeyCode::Backspace)), Some(Command::EnterNormalMode));
        assert_eq!(handler.mode(), Mode::Normal);

        handler.handle_key(key(KeyCode::Char(':')));
        handler.handle_key(key(KeyCode::Char('q')));
        assert_eq!(handler.handle_key(key(KeyCode::Esc)), Some(Command::EnterNormalMode));
        assert_eq!(handler.command_buffer(), "");
    }
}
