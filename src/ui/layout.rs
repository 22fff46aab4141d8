use ratatui::layout::{Constraint, Direction, Layout, Rect};

const SIDEBAR_WIDTH: u16 = 26;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: sidebar fits beside the grid
    Medium, // 60-99 cols: sidebar only on request
    Narrow, // <60 cols: never a sidebar
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 100 {
            LayoutTier::Wide
        } else if area.width >= 60 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn allows_sidebar(&self) -> bool {
        *self != LayoutTier::Narrow
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub sidebar: Option<Rect>,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect, sidebar_open: bool) -> Self {
        let tier = LayoutTier::from_area(area);

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);

        if sidebar_open && tier.allows_sidebar() {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                .split(vertical[1]);

            Self {
                header: vertical[0],
                sidebar: Some(horizontal[0]),
                main: horizontal[1],
                footer: vertical[2],
                tier,
            }
        } else {
            Self {
                header: vertical[0],
                main: vertical[1],
                sidebar: None,
                footer: vertical[2],
                tier,
            }
        }
    }
}

/// Rows of a category page: title, search field, filter chips, then the grid.
pub struct CategoryLayout {
    pub title: Rect,
    pub search: Rect,
    pub filters: Rect,
    pub grid: Rect,
}

impl CategoryLayout {
    pub fn new(main: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(main);
        Self {
            title: rows[0],
            search: rows[1],
            filters: rows[2],
            grid: rows[3],
        }
    }

    /// Altar pages have no search or chips; their list starts below the title.
    pub fn altar_list(&self) -> Rect {
        Rect {
            y: self.search.y,
            height: self.grid.bottom().saturating_sub(self.search.y),
            ..self.grid
        }
    }
}

/// How many `cell_width`-wide cells fit across `width`.
pub fn grid_columns(width: u16, cell_width: u16) -> usize {
    usize::from((width / cell_width.max(1)).max(1))
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 10;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar_respects_tier_and_toggle() {
        let wide = Rect::new(0, 0, 120, 40);
        assert!(AppLayout::new(wide, true).sidebar.is_some());
        assert!(AppLayout::new(wide, false).sidebar.is_none());
        let narrow = Rect::new(0, 0, 50, 40);
        assert!(AppLayout::new(narrow, true).sidebar.is_none());
    }

    #[test]
    fn test_category_layout_gives_grid_the_rest() {
        let main = Rect::new(26, 1, 94, 37);
        let layout = CategoryLayout::new(main);
        assert_eq!(layout.search.y, 2);
        assert_eq!(layout.grid.y, 4);
        assert_eq!(layout.grid.height, 34);
        assert_eq!(layout.grid.width, 94);

        let list = layout.altar_list();
        assert_eq!((list.x, list.y), (26, 2));
        assert_eq!(list.height, 36);
    }

    #[test]
    fn test_grid_columns_never_zero() {
        assert_eq!(grid_columns(100, 24), 4);
        assert_eq!(grid_columns(10, 24), 1);
        assert_eq!(grid_columns(10, 0), 10);
    }

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[q] Quit", "[?] Help", "[/] Search"], 20);
        assert_eq!(lines, vec![" [q] Quit  [?] Help", " [/] Search"]);
        assert!(pack_hint_lines(&[], 20).is_empty());
    }

    #[test]
    fn test_centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 30, 8);
        let popup = centered_rect(50, 50, area);
        assert!(popup.width <= area.width && popup.height <= area.height);
    }
}
