use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::ui::theme::Theme;

const SHORTCUTS: &[(&str, &[(&str, &str)])] = &[
    (
        "Anywhere",
        &[
            ("1-9, 0", "open category"),
            ("H / S / T", "home, save slots, temple"),
            ("Ctrl+K", "command palette"),
            ("Ctrl+B", "toggle sidebar"),
            ("?", "this help"),
            ("q, Ctrl+C", "quit"),
        ],
    ),
    (
        "Category pages",
        &[
            ("arrows, hjkl", "move focus"),
            ("Home / End", "first / last item"),
            ("Enter, Space", "toggle collected, open villager"),
            ("i", "item details"),
            ("+ / -", "hearts"),
            ("o", "toggle offered"),
            ("/", "search"),
            ("Tab", "grid, search, filters"),
        ],
    ),
    (
        "Filters",
        &[
            ("f", "enter toolbar, then next chip"),
            ("F", "clear filters"),
            ("Alt+1..4", "toggle season"),
            ("Esc", "leave toolbar, blur, clear search"),
        ],
    ),
];

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);
        let block = Block::bordered()
            .title(" Keyboard shortcuts ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = Vec::new();
        for (section, keys) in SHORTCUTS {
            lines.push(Line::from(Span::styled(
                *section,
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            )));
            for (key, action) in *keys {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {key:<14}"), Style::default().fg(colors.fg())),
                    Span::styled(*action, Style::default().fg(colors.muted())),
                ]));
            }
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "Esc or ? to close",
            Style::default().fg(colors.muted()),
        )));
        Paragraph::new(lines).render(inner, buf);
    }
}
