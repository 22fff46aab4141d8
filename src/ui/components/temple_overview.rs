use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::catalog::Catalog;
use crate::store::schema::SlotProgress;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::theme::Theme;

/// One completion bar per altar; the cursor picks which altar Enter opens.
pub struct TempleOverview<'a> {
    catalog: &'a Catalog,
    progress: &'a SlotProgress,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> TempleOverview<'a> {
    pub fn new(catalog: &'a Catalog, progress: &'a SlotProgress, selected: usize, theme: &'a Theme) -> Self {
        Self {
            catalog,
            progress,
            selected,
            theme,
        }
    }
}

impl Widget for TempleOverview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Temple ")
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        let altars: Vec<_> = self.catalog.altars().collect();
        if altars.is_empty() {
            Paragraph::new(" No altars in this catalog")
                .style(Style::default().fg(colors.muted()))
                .render(inner, buf);
            return;
        }

        let mut constraints: Vec<Constraint> = altars.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let mut done_total = 0;
        let mut total = 0;
        for (row, (_, altar)) in altars.iter().enumerate() {
            let (done, count) = self.progress.completion(altar);
            done_total += done;
            total += count;
            let label = if row == self.selected {
                format!("> {}", altar.name)
            } else {
                altar.name.clone()
            };
            ProgressBar::new(&label, done, count, self.theme).render(rows[row], buf);
        }

        let summary = Line::from(vec![
            Span::styled(" Offered ", Style::default().fg(colors.muted())),
            Span::styled(format!("{done_total} of {total}"), Style::default().fg(colors.accent())),
            Span::styled("  [Enter] open altar", Style::default().fg(colors.muted())),
        ]);
        Paragraph::new(summary).render(rows[altars.len()], buf);
    }
}
