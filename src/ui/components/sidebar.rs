use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::catalog::Catalog;
use crate::store::schema::SlotProgress;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::theme::Theme;

/// Category list with per-page completion and an overall bar at the bottom.
pub struct Sidebar<'a> {
    catalog: &'a Catalog,
    progress: &'a SlotProgress,
    current: Option<usize>,
    slot: u8,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        catalog: &'a Catalog,
        progress: &'a SlotProgress,
        current: Option<usize>,
        slot: u8,
        theme: &'a Theme,
    ) -> Self {
        Self {
            catalog,
            progress,
            current,
            slot,
            theme,
        }
    }
}

fn shortcut(index: usize) -> String {
    match index {
        0..=8 => (index + 1).to_string(),
        9 => "0".to_string(),
        _ => " ".to_string(),
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(format!(" Slot {} ", self.slot))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let mut done_total = 0;
        let mut total = 0;
        let mut lines = Vec::new();
        for (i, category) in self.catalog.categories.iter().enumerate() {
            let (done, count) = self.progress.completion(category);
            done_total += done;
            total += count;
            let current = self.current == Some(i);
            let name_style = if current {
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD)
            } else if count > 0 && done == count {
                Style::default().fg(colors.complete())
            } else {
                Style::default().fg(colors.fg())
            };
            let name_width = usize::from(inner.width).saturating_sub(10);
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", shortcut(i)), Style::default().fg(colors.muted())),
                Span::styled(format!("{:<name_width$.name_width$}", category.name), name_style),
                Span::styled(format!("{done:>3}/{count:<3}"), Style::default().fg(colors.muted())),
            ]));
        }

        let list_height = inner.height.saturating_sub(3);
        Paragraph::new(lines).render(Rect { height: list_height, ..inner }, buf);

        if inner.height >= 3 {
            let bar_area = Rect {
                y: inner.bottom() - 3,
                height: 3,
                ..inner
            };
            ProgressBar::new("Overall", done_total, total, self.theme).render(bar_area, buf);
        }
    }
}
