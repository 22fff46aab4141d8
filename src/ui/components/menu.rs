use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
}

impl MenuItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Titled list with a cursor, used for the home page and the slot picker.
pub struct Menu<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(title: &'a str, subtitle: &'a str, items: Vec<MenuItem>, theme: &'a Theme) -> Self {
        Self {
            title,
            subtitle,
            items,
            selected: 0,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.title,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.subtitle, Style::default().fg(colors.fg()))),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        // two lines per entry; scroll so the cursor stays on screen
        let per_page = usize::from(layout[2].height / 2).max(1);
        let first = self.selected.saturating_sub(per_page - 1);

        let mut lines = Vec::new();
        for (i, item) in self.items.iter().enumerate().skip(first).take(per_page) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };
            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            lines.push(Line::from(Span::styled(
                label_text,
                Style::default()
                    .fg(if is_selected { colors.accent() } else { colors.fg() })
                    .add_modifier(if is_selected {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    }),
            )));
            lines.push(Line::from(Span::styled(
                format!("       {}", item.description),
                Style::default().fg(colors.muted()),
            )));
        }
        Paragraph::new(lines).render(layout[2], buf);
    }
}
