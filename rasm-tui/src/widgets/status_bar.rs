//! Status bar widget - mode indicator, command line and binding summary

use crate::app::MessageType;
use crate::theme::Theme;
use rasm_input::Mode;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for displaying the status bar with mode and command input
pub struct StatusBarWidget<'a> {
    mode: Mode,
    command_buffer: &'a str,
    message: Option<&'a str>,
    message_type: MessageType,
    theme: &'a Theme,
    bound: usize,
    skipped: usize,
    input_level: Option<f32>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, command_buffer: &'a str, theme: &'a Theme) -> Self {
        Self {
            mode,
            command_buffer,
            message: None,
            message_type: MessageType::Info,
            theme,
            bound: 0,
            skipped: 0,
            input_level: None,
        }
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    pub fn bindings(mut self, bound: usize, skipped: usize) -> Self {
        self.bound = bound;
        self.skipped = skipped;
        self
    }

    /// Live input level; `None` when no input was acquired
    pub fn input_level(mut self, level: Option<f32>) -> Self {
        self.input_level = level;
        self
    }

    fn mode_string(&self) -> (&'static str, Style) {
        match self.mode {
            Mode::Normal => ("NORMAL", self.theme.highlight()),
            Mode::Command => ("COMMAND", Style::from(self.theme.accent)),
            Mode::Help => ("HELP", self.theme.highlight()),
        }
    }

    fn level_spans(&self) -> Vec<Span<'static>> {
        const CELLS: usize = 8;
        match self.input_level {
            Some(level) => {
                let filled = ((level.clamp(0.0, 1.0) * CELLS as f32).round() as usize).min(CELLS);
                vec![
                    Span::styled("IN ", self.theme.dim()),
                    Span::styled("▮".repeat(filled), self.theme.meter_style(level)),
                    Span::styled("▯".repeat(CELLS - filled), self.theme.dim()),
                ]
            }
            None => vec![Span::styled("IN --", self.theme.dim())],
        }
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(10), // Mode indicator
            Constraint::Min(20),    // Command/message area
            Constraint::Length(12), // Binding count
            Constraint::Length(12), // Input level
            Constraint::Length(22), // Help hint
        ])
        .split(area);

        // Mode indicator
        let (mode_text, mode_style) = self.mode_string();
        let mode_line = Line::from(vec![
            Span::raw("["),
            Span::styled(mode_text, mode_style),
            Span::raw("]"),
        ]);
        Paragraph::new(mode_line).render(chunks[0], buf);

        // Command/message area
        let content = if self.mode == Mode::Command {
            Line::from(vec![
                Span::styled(":", Style::from(self.theme.accent)),
                Span::styled(self.command_buffer, self.theme.normal()),
                Span::styled("█", self.theme.highlight()), // Cursor
            ])
        } else if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.dim(),
                MessageType::Success => Style::from(self.theme.accent),
                MessageType::Warning => Style::default().fg(self.theme.warning),
                MessageType::Error => Style::default().fg(self.theme.danger),
            };
            Line::from(Span::styled(msg, msg_style))
        } else {
            Line::from(Span::styled(
                "Ready. Press ? for help, : for commands",
                self.theme.dim(),
            ))
        };
        Paragraph::new(content).render(chunks[1], buf);

        // Bindings: "5 bound" or "4 bound 1!" when entries were skipped
        let mut spans = vec![Span::styled(format!("{} bound", self.bound), self.theme.dim())];
        if self.skipped > 0 {
            spans.push(Span::styled(
                format!(" {}!", self.skipped),
                Style::default().fg(self.theme.warning),
            ));
        }
        Paragraph::new(Line::from(spans)).render(chunks[2], buf);

        Paragraph::new(Line::from(self.level_spans())).render(chunks[3], buf);

        // Help hint
        let help = match self.mode {
            Mode::Normal => "j/k:select h/l:move ?",
            Mode::Command => "Enter:run  Esc:cancel",
            Mode::Help => "any key:close",
        };
        let help_line = Line::from(Span::styled(help, self.theme.dim()));
        Paragraph::new(help_line).render(chunks[4], buf);
    }
}

/// Help overlay widget
pub struct HelpWidget<'a> {
    theme: &'a Theme,
}

impl<'a> HelpWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    fn help_lines() -> Vec<&'static str> {
        vec![
            "╔══════════════════════════════════════════════════════╗",
            "║                 RASM - rasm_origin                   ║",
            "╠══════════════════════════════════════════════════════╣",
            "║ SLIDERS                                              ║",
            "║   Tab / j / ↓     Select next slider                 ║",
            "║   S-Tab / k / ↑   Select previous slider             ║",
            "║   h / l, ← / →    Move 1% of range                   ║",
            "║   H / L, PgDn/Up  Move 10% of range                  ║",
            "║   Home / End      Jump to start / end                ║",
            "║   0-9             Jump to 0% ... 90%                 ║",
            "╠──────────────────────────────────────────────────────╣",
            "║ ENGINE                                               ║",
            "║   r               Reset parameters to initial values ║",
            "║   p               Poll bindings now                  ║",
            "╠──────────────────────────────────────────────────────╣",
            "║ COMMANDS (:)                                         ║",
            "║   :set <param> <value>   Write a parameter directly  ║",
            "║   :reset                 Reset parameters            ║",
            "║   :poll                  Poll bindings now           ║",
            "║   :theme <name>          green / amber / cyber       ║",
            "║   :remove <control>      Remove a slider             ║",
            "║   :q                     Quit                        ║",
            "╠══════════════════════════════════════════════════════╣",
            "║             Any key closes help, q quits             ║",
            "╚══════════════════════════════════════════════════════╝",
        ]
    }
}

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear background
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        let help_text = Self::help_lines();
        let start_x = area.x + area.width.saturating_sub(56) / 2;
        let start_y = area.y + area.height.saturating_sub(help_text.len() as u16) / 2;

        for (i, line) in help_text.iter().enumerate() {
            let y = start_y + i as u16;
            if y >= area.y + area.height {
                break;
            }

            for (j, ch) in line.chars().enumerate() {
                let x = start_x + j as u16;
                if x >= area.x + area.width {
                    break;
                }

                let style = if matches!(ch, '║' | '╔' | '╗' | '╚' | '╝' | '═' | '╠' | '╣' | '─') {
                    self.theme.border()
                } else {
                    self.theme.normal()
                };

                buf[(x, y)].set_char(ch).set_style(style);
            }
        }
    }
}
