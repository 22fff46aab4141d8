use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::catalog::Category;
use crate::nav::offering::{OFFERING_COLUMNS, OfferingLevel, OfferingNavState};
use crate::store::schema::SlotProgress;
use crate::ui::theme::Theme;

/// Cells taken by one item (checkbox, space, padded name).
pub const ITEM_WIDTH: u16 = 26;
/// Blank cells before the first item of a row.
pub const ITEM_INDENT: u16 = 5;

/// What one line of the list holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferingRow {
    Header(usize),
    /// A row of up to two items starting at item `first`.
    Items { offering: usize, first: usize },
}

pub fn offering_rows(category: &Category, state: &OfferingNavState) -> Vec<OfferingRow> {
    let mut rows = Vec::new();
    for (oi, offering) in category.offerings.iter().enumerate() {
        rows.push(OfferingRow::Header(oi));
        if state.expanded_offerings.contains(&offering.slug) {
            for first in (0..offering.items.len()).step_by(OFFERING_COLUMNS) {
                rows.push(OfferingRow::Items { offering: oi, first });
            }
        }
    }
    rows
}

/// Index of the row holding focus (0 when nothing matches).
pub fn focus_row(rows: &[OfferingRow], state: &OfferingNavState) -> usize {
    rows.iter()
        .position(|row| match (*row, state.level) {
            (OfferingRow::Header(oi), OfferingLevel::Offerings) => oi == state.focused_offering_index,
            (OfferingRow::Items { offering, first }, OfferingLevel::Items) => {
                offering == state.focused_offering_index
                    && state
                        .focused_item_index
                        .is_some_and(|item| item / OFFERING_COLUMNS == first / OFFERING_COLUMNS)
            }
            _ => false,
        })
        .unwrap_or(0)
}

/// First row drawn in a list `height` rows tall so the focused row shows.
pub fn scroll_offset(focus_row: usize, height: u16) -> usize {
    focus_row.saturating_sub(usize::from(height.max(1)) - 1)
}

/// Offering headers with their expanded item grids beneath.
pub struct OfferingList<'a> {
    category: &'a Category,
    state: &'a OfferingNavState,
    progress: &'a SlotProgress,
    show_focus: bool,
    theme: &'a Theme,
}

impl<'a> OfferingList<'a> {
    pub fn new(
        category: &'a Category,
        state: &'a OfferingNavState,
        progress: &'a SlotProgress,
        show_focus: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            category,
            state,
            progress,
            show_focus,
            theme,
        }
    }

    fn focus_style(&self, base: Style) -> Style {
        let colors = &self.theme.colors;
        if self.show_focus {
            Style::default()
                .fg(colors.focus_fg())
                .bg(colors.focus_bg())
                .add_modifier(Modifier::BOLD)
        } else {
            base.add_modifier(Modifier::UNDERLINED)
        }
    }

    /// One line per [`OfferingRow`], in the same order.
    fn lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let mut lines = Vec::new();

        for (oi, offering) in self.category.offerings.iter().enumerate() {
            let expanded = self.state.expanded_offerings.contains(&offering.slug);
            let done = offering
                .items
                .iter()
                .filter(|item| self.progress.offered.contains(&item.id))
                .count();
            let complete = !offering.items.is_empty() && done == offering.items.len();
            let arrow = if expanded { "▾" } else { "▸" };
            let header_focused =
                self.state.level == OfferingLevel::Offerings && self.state.focused_offering_index == oi;

            let base = Style::default()
                .fg(if complete { colors.complete() } else { colors.accent() })
                .add_modifier(Modifier::BOLD);
            let header_style = if header_focused { self.focus_style(base) } else { base };
            let mut spans = vec![
                Span::styled(format!(" {arrow} {} ", offering.name), header_style),
                Span::styled(
                    format!(" {done}/{}", offering.items.len()),
                    Style::default().fg(colors.muted()),
                ),
            ];
            if !offering.reward.is_empty() {
                spans.push(Span::styled(
                    format!("  reward: {}", offering.reward),
                    Style::default().fg(colors.muted()),
                ));
            }
            lines.push(Line::from(spans));

            if !expanded {
                continue;
            }
            for (row, chunk) in offering.items.chunks(OFFERING_COLUMNS).enumerate() {
                let mut spans = vec![Span::raw(" ".repeat(usize::from(ITEM_INDENT)))];
                for (col, item) in chunk.iter().enumerate() {
                    let index = row * OFFERING_COLUMNS + col;
                    let offered = self.progress.offered.contains(&item.id);
                    let base = Style::default().fg(if offered { colors.complete() } else { colors.fg() });
                    let focused = self.state.level == OfferingLevel::Items
                        && self.state.focused_offering_index == oi
                        && self.state.focused_item_index == Some(index);
                    let mark = if offered { "[✓]" } else { "[ ]" };
                    let text = format!("{mark} {:<w$}", item.name, w = usize::from(ITEM_WIDTH) - 4);
                    spans.push(Span::styled(text, if focused { self.focus_style(base) } else { base }));
                }
                lines.push(Line::from(spans));
            }
        }
        lines
    }
}

impl Widget for OfferingList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.category.offerings.is_empty() {
            Paragraph::new(" This altar has no offerings")
                .style(Style::default().fg(self.theme.colors.muted()))
                .render(area, buf);
            return;
        }
        let rows = offering_rows(self.category, self.state);
        let scroll = scroll_offset(focus_row(&rows, self.state), area.height);
        Paragraph::new(self.lines())
            .scroll((scroll as u16, 0))
            .render(area, buf);
    }
}
