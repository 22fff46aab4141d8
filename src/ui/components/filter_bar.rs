use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// One toggle in the filter toolbar.
pub struct Chip {
    pub label: &'static str,
    pub on: bool,
    /// Holds the toolbar's single tab stop.
    pub tab_stop: bool,
    pub focused: bool,
}

pub struct FilterBar<'a> {
    chips: Vec<Chip>,
    active: bool,
    theme: &'a Theme,
}

impl<'a> FilterBar<'a> {
    pub fn new(chips: Vec<Chip>, active: bool, theme: &'a Theme) -> Self {
        Self {
            chips,
            active,
            theme,
        }
    }
}

impl Widget for FilterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut spans = vec![Span::styled(
            " Filters ",
            Style::default().fg(if self.active { colors.accent() } else { colors.muted() }),
        )];
        for chip in &self.chips {
            let mut style = if chip.on {
                Style::default().fg(colors.bg()).bg(colors.chip_on())
            } else {
                Style::default().fg(colors.fg())
            };
            if chip.focused {
                style = Style::default()
                    .fg(colors.focus_fg())
                    .bg(colors.focus_bg())
                    .add_modifier(Modifier::BOLD);
            } else if chip.tab_stop && !self.active {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            let mark = if chip.on { "●" } else { "○" };
            spans.push(Span::styled(format!(" {mark} {} ", chip.label), style));
            spans.push(Span::raw(" "));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// The in-page search field.
pub struct SearchField<'a> {
    input: &'a LineInput,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SearchField<'a> {
    pub fn new(input: &'a LineInput, focused: bool, theme: &'a Theme) -> Self {
        Self {
            input,
            focused,
            theme,
        }
    }
}

impl Widget for SearchField<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let label_style = Style::default().fg(if self.focused { colors.accent() } else { colors.muted() });
        let text_style = Style::default().fg(colors.fg());

        let mut spans = vec![Span::styled(" Search: ", label_style)];
        if !self.focused && self.input.is_empty() {
            spans.push(Span::styled("press / to search", Style::default().fg(colors.muted())));
        } else {
            let (before, cursor, after) = self.input.render_parts();
            spans.push(Span::styled(before, text_style));
            if self.focused {
                let cursor_style = Style::default().fg(colors.bg()).bg(colors.fg());
                let ch = cursor.map(String::from).unwrap_or_else(|| " ".to_string());
                spans.push(Span::styled(ch, cursor_style));
            } else if let Some(ch) = cursor {
                spans.push(Span::styled(ch.to_string(), text_style));
            }
            spans.push(Span::styled(after, text_style));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
