use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::app::Palette;
use crate::catalog::{Catalog, EntryLocation};
use crate::ui::theme::Theme;

pub struct PaletteView<'a> {
    palette: &'a Palette,
    catalog: &'a Catalog,
    theme: &'a Theme,
}

impl<'a> PaletteView<'a> {
    pub fn new(palette: &'a Palette, catalog: &'a Catalog, theme: &'a Theme) -> Self {
        Self {
            palette,
            catalog,
            theme,
        }
    }

    fn location_label(&self, category: usize, location: EntryLocation) -> String {
        let Some(category) = self.catalog.category(category) else {
            return String::new();
        };
        match location {
            EntryLocation::Page => "page".to_string(),
            EntryLocation::Item(_) => category.name.clone(),
            EntryLocation::OfferingItem { offering, .. } => match category.offerings.get(offering) {
                Some(offering) => format!("{} › {}", category.name, offering.name),
                None => category.name.clone(),
            },
        }
    }
}

impl Widget for PaletteView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);
        let block = Block::bordered()
            .title(" Go to ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let (before, cursor, after) = self.palette.query.render_parts();
        let query = Line::from(vec![
            Span::styled("> ", Style::default().fg(colors.accent())),
            Span::styled(before, Style::default().fg(colors.fg())),
            Span::styled(
                cursor.map(String::from).unwrap_or_else(|| " ".to_string()),
                Style::default().fg(colors.bg()).bg(colors.fg()),
            ),
            Span::styled(after, Style::default().fg(colors.fg())),
        ]);
        Paragraph::new(query).render(Rect { height: 1, ..inner }, buf);

        let list_height = usize::from(inner.height - 1);
        let selected = self.palette.selected();
        let first = selected.saturating_sub(list_height.saturating_sub(1));
        let mut lines = Vec::new();
        for (i, entry) in self.palette.results().enumerate().skip(first).take(list_height) {
            let style = if i == selected {
                Style::default()
                    .fg(colors.focus_fg())
                    .bg(colors.focus_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", entry.name), style),
                Span::styled(
                    format!(" {}", self.location_label(entry.category, entry.location)),
                    Style::default().fg(colors.muted()),
                ),
            ]));
        }
        if self.palette.result_count() == 0 {
            lines.push(Line::from(Span::styled(" No matches", Style::default().fg(colors.muted()))));
        }
        Paragraph::new(lines).render(
            Rect {
                y: inner.y + 1,
                height: inner.height - 1,
                ..inner
            },
            buf,
        );
    }
}
