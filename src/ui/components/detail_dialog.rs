use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::app::{
    CONTROL_COLLECT, CONTROL_HEARTS_DOWN, CONTROL_HEARTS_UP, CONTROL_OFFER, detail_controls,
};
use crate::catalog::{Category, CategoryKind, Item};
use crate::store::schema::SlotProgress;
use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

/// Item details with the dialog's buttons along the bottom.
pub struct DetailDialog<'a> {
    category: &'a Category,
    item: &'a Item,
    progress: &'a SlotProgress,
    controls: Vec<&'static str>,
    current: Option<&'static str>,
    theme: &'a Theme,
}

impl<'a> DetailDialog<'a> {
    pub fn new(
        category: &'a Category,
        item: &'a Item,
        progress: &'a SlotProgress,
        current: Option<&'static str>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            category,
            item,
            progress,
            controls: detail_controls(category.kind, item),
            current,
            theme,
        }
    }
}

/// Where the dialog sits on a screen of `screen`.
pub fn dialog_area(screen: Rect) -> Rect {
    centered_rect(50, 50, screen)
}

/// The control whose button covers (`column`, `row`) in a dialog drawn at
/// `area`. Buttons run left to right along the last inner row.
pub fn button_at(controls: &[&'static str], area: Rect, column: u16, row: u16) -> Option<&'static str> {
    let inner = Block::bordered().inner(area);
    if inner.height < 2 || row != inner.bottom() - 1 || column >= inner.right() {
        return None;
    }
    let mut x = inner.x;
    for control in controls {
        let width = button_text(control).chars().count() as u16;
        if column >= x && column < x + width {
            return Some(*control);
        }
        x += width + 1;
    }
    None
}

fn button_text(control: &str) -> String {
    format!("[ {} ]", button_label(control))
}

fn button_label(control: &str) -> &'static str {
    match control {
        CONTROL_HEARTS_UP => "+ heart",
        CONTROL_HEARTS_DOWN => "- heart",
        CONTROL_COLLECT => "collected",
        CONTROL_OFFER => "offered",
        _ => "close",
    }
}

impl Widget for DetailDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);
        let block = Block::bordered()
            .title(format!(" {} ", self.item.name))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let item = self.item;
        let mut lines = vec![Line::from(Span::styled(
            self.category.name.as_str(),
            Style::default().fg(colors.muted()),
        ))];
        if !item.seasons.is_empty() {
            let seasons: Vec<&str> = item.seasons.iter().map(|s| s.label()).collect();
            lines.push(Line::from(format!("Seasons: {}", seasons.join(", "))));
        }
        if let Some(max) = item.max_hearts {
            let hearts = self.progress.hearts(&item.id);
            lines.push(Line::from(vec![
                Span::raw("Hearts: "),
                Span::styled(
                    format!("{}{}", "♥".repeat(usize::from(hearts)), "♡".repeat(usize::from(max - hearts.min(max)))),
                    Style::default().fg(colors.heart()),
                ),
                Span::raw(format!(" {hearts}/{max}")),
            ]));
        }
        if self.category.kind != CategoryKind::Npc {
            let collected = self.progress.collected.contains(&item.id);
            lines.push(Line::from(format!("Collected: {}", if collected { "yes" } else { "no" })));
        }
        if self.category.kind == CategoryKind::TempleRequirements {
            let offered = self.progress.offered.contains(&item.id);
            lines.push(Line::from(format!("Offered: {}", if offered { "yes" } else { "no" })));
        }
        if !item.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(item.description.as_str()));
        }

        let body_height = inner.height.saturating_sub(2);
        Paragraph::new(lines)
            .style(Style::default().fg(colors.fg()))
            .wrap(Wrap { trim: true })
            .render(Rect { height: body_height, ..inner }, buf);

        if inner.height < 2 {
            return;
        }
        let mut buttons = Vec::new();
        for control in &self.controls {
            let style = if self.current == Some(*control) {
                Style::default()
                    .fg(colors.focus_fg())
                    .bg(colors.focus_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.accent())
            };
            buttons.push(Span::styled(button_text(control), style));
            buttons.push(Span::raw(" "));
        }
        Paragraph::new(Line::from(buttons)).render(
            Rect {
                y: inner.bottom() - 1,
                height: 1,
                ..inner
            },
            buf,
        );
    }
}
