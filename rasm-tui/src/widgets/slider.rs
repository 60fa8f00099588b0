//! Slider widget - horizontal track with knob, tick marks and readout

use crate::control::SliderSnapshot;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};
use rasm_params::Ticks;

const KNOB: char = '●';
const FILL: char = '━';
const TRACK: char = '─';
const TICK: char = '┴';

/// Column of a fraction on a track `width` cells wide
fn column(fraction: f64, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * (width - 1) as f64).round() as u16
}

/// Widget for one bound slider
pub struct SliderWidget<'a> {
    label: &'a str,
    snapshot: SliderSnapshot,
    theme: &'a Theme,
    focused: bool,
    ticks: Option<Ticks>,
    value_text: Option<String>,
}

impl<'a> SliderWidget<'a> {
    pub fn new(label: &'a str, snapshot: SliderSnapshot, theme: &'a Theme) -> Self {
        Self {
            label,
            snapshot,
            theme,
            focused: false,
            ticks: None,
            value_text: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Tick positions spanning the slider's display range
    pub fn ticks(mut self, ticks: Ticks) -> Self {
        self.ticks = Some(ticks);
        self
    }

    /// Engine-side value shown next to the position
    pub fn value_text(mut self, text: String) -> Self {
        self.value_text = Some(text);
        self
    }

    fn readout(&self) -> String {
        match &self.value_text {
            Some(text) => format!("{:>5.1} │ {}", self.snapshot.value, text),
            None => format!("{:>5.1}", self.snapshot.value),
        }
    }
}

impl Widget for SliderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_active()
        } else {
            self.theme.border()
        };
        let title_style = if self.focused {
            self.theme.highlight()
        } else {
            self.theme.title()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} ", self.label.to_uppercase()),
                title_style,
            ));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 8 || inner.height < 1 {
            return;
        }

        // Readout on the right, track takes the rest
        let readout = self.readout();
        let readout_width = readout.chars().count() as u16 + 1;
        let track_width = inner.width.saturating_sub(readout_width).max(4);

        let knob = column(self.snapshot.fraction(), track_width);
        let y = inner.y;
        for i in 0..track_width {
            let x = inner.x + i;
            let (ch, style) = if i == knob {
                let style = if self.focused {
                    self.theme.highlight()
                } else {
                    self.theme.slider_fill(false)
                };
                (KNOB, style)
            } else if i < knob {
                (FILL, self.theme.slider_fill(self.focused))
            } else {
                (TRACK, self.theme.slider_track())
            };
            buf[(x, y)].set_char(ch).set_style(style);
        }

        let mut x = inner.x + track_width + 1;
        for ch in readout.chars() {
            if x >= inner.x + inner.width {
                break;
            }
            buf[(x, y)].set_char(ch).set_style(self.theme.normal());
            x += 1;
        }

        // Tick marks under the track; too many to tell apart are skipped
        let Some(ticks) = self.ticks else {
            return;
        };
        let span = self.snapshot.span();
        if inner.height < 2 || span <= 0.0 || ticks.len() > (track_width / 2) as usize {
            return;
        }
        let tick_y = inner.y + 1;
        for position in ticks {
            let x = inner.x + column(position / span, track_width);
            buf[(x, tick_y)]
                .set_char(TICK)
                .set_style(self.theme.tick_style());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasm_params::ticks;

    fn snapshot(value: f64) -> SliderSnapshot {
        SliderSnapshot {
            value,
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }
    }

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    #[test]
    fn test_column() {
        assert_eq!(column(0.0, 41), 0);
        assert_eq!(column(0.5, 41), 20);
        assert_eq!(column(1.0, 41), 40);
        assert_eq!(column(2.0, 41), 40);
        assert_eq!(column(0.5, 0), 0);
    }

    #[test]
    fn test_knob_position() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        SliderWidget::new("volume", snapshot(100.0), &theme).render(area, &mut buf);

        let track = row(&buf, 1, 40);
        let knob = track.chars().position(|c| c == KNOB).unwrap();
        // Full value: knob on the last track cell, everything before filled
        assert!(track.chars().take(knob).skip(1).all(|c| c == FILL));
        assert!(track.contains("100.0"));
    }

    #[test]
    fn test_ticks_drawn_for_stepped_range() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 4);
        let mut buf = Buffer::empty(area);
        SliderWidget::new("dynamics", snapshot(50.0), &theme)
            .ticks(ticks(4.0))
            .value_text("2".to_string())
            .render(area, &mut buf);

        let tick_row = row(&buf, 2, 60);
        assert_eq!(tick_row.chars().filter(|&c| c == TICK).count(), 5);
        assert!(row(&buf, 1, 60).contains("│ 2"));
    }

    #[test]
    fn test_dense_ticks_skipped() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        SliderWidget::new("volume", snapshot(0.0), &theme)
            .ticks(ticks(100.0))
            .render(area, &mut buf);

        assert_eq!(row(&buf, 2, 40).chars().filter(|&c| c == TICK).count(), 0);
    }
}
