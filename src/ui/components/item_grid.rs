use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};

use crate::app::{CELL_HEIGHT, GridViewport};
use crate::catalog::{Category, CategoryKind, Item};
use crate::store::schema::SlotProgress;
use crate::ui::theme::Theme;

/// The collection grid of a category page. Only the rows inside the
/// viewport are drawn.
pub struct ItemGrid<'a> {
    category: &'a Category,
    visible: &'a [usize],
    progress: &'a SlotProgress,
    viewport: GridViewport,
    cell_width: u16,
    focused: Option<usize>,
    show_focus: bool,
    theme: &'a Theme,
}

impl<'a> ItemGrid<'a> {
    pub fn new(
        category: &'a Category,
        visible: &'a [usize],
        progress: &'a SlotProgress,
        viewport: GridViewport,
        cell_width: u16,
        theme: &'a Theme,
    ) -> Self {
        Self {
            category,
            visible,
            progress,
            viewport,
            cell_width,
            focused: None,
            show_focus: true,
            theme,
        }
    }

    /// `show_focus` is false in mouse mode: the focused cell is then only
    /// underlined instead of highlighted.
    pub fn focus(mut self, focused: Option<usize>, show_focus: bool) -> Self {
        self.focused = focused;
        self.show_focus = show_focus;
        self
    }

    fn status_text(&self, item: &Item) -> String {
        match (self.category.kind, item.max_hearts) {
            (CategoryKind::Npc, Some(max)) => {
                let hearts = self.progress.hearts(&item.id);
                format!("♥ {hearts}/{max}")
            }
            (CategoryKind::TempleRequirements, _) => {
                let collected = if self.progress.collected.contains(&item.id) { "have" } else { "need" };
                let offered = if self.progress.offered.contains(&item.id) { ", offered" } else { "" };
                format!("{collected}{offered}")
            }
            _ if item.seasons.is_empty() => "any season".to_string(),
            _ => item
                .seasons
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join("/"),
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

impl Widget for ItemGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        if self.visible.is_empty() {
            Paragraph::new(Line::from("No items match the current filters"))
                .style(Style::default().fg(colors.muted()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        let columns = self.viewport.columns.max(1);
        let cell_width = self.cell_width.min(area.width).max(1);
        let text_width = usize::from(cell_width.saturating_sub(3));

        for position in self.viewport.visible_range(self.visible.len()) {
            let Some(item) = self.category.items.get(self.visible[position]) else {
                continue;
            };
            let row = (position / columns).saturating_sub(self.viewport.first_row);
            let column = position % columns;
            let x = area.x + column as u16 * cell_width;
            let y = area.y + row as u16 * CELL_HEIGHT;
            if x >= area.right() || y >= area.bottom() {
                continue;
            }
            let width = cell_width.min(area.right() - x);

            let complete = self.progress.is_complete(self.category.kind, item);
            let is_focused = self.focused == Some(position);
            let mut name_style = Style::default().fg(if complete { colors.complete() } else { colors.fg() });
            if is_focused && self.show_focus {
                name_style = Style::default()
                    .fg(colors.focus_fg())
                    .bg(colors.focus_bg())
                    .add_modifier(Modifier::BOLD);
            } else if is_focused {
                name_style = name_style.add_modifier(Modifier::UNDERLINED);
            }

            let mark = if complete { "✓" } else { "·" };
            let name = format!(" {mark} {}", truncate(&item.name, text_width));
            buf.set_stringn(x, y, format!("{name:<w$}", w = usize::from(width)), usize::from(width), name_style);

            if y + 1 < area.bottom() {
                let status_color = match self.category.kind {
                    CategoryKind::Npc => colors.heart(),
                    _ => colors.muted(),
                };
                let status = format!("   {}", truncate(&self.status_text(item), text_width));
                buf.set_stringn(x, y + 1, status, usize::from(width), Style::default().fg(status_color));
            }
        }
    }
}
