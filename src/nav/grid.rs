use crate::nav::focus::Scroller;
use crate::nav::memory::FocusMemory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridAction {
    Up,
    Down,
    Left,
    Right,
    First,
    Last,
    Select,
    Details,
    HeartsChange(i8),
    ToggleOffered,
}

impl GridAction {
    pub fn is_move(self) -> bool {
        matches!(
            self,
            GridAction::Up
                | GridAction::Down
                | GridAction::Left
                | GridAction::Right
                | GridAction::First
                | GridAction::Last
        )
    }
}

/// Page-supplied activation handlers. Pages only implement what applies to
/// them; the defaults drop the action.
pub trait GridCallbacks {
    fn on_select(&mut self, _index: usize) {}
    fn on_details(&mut self, _index: usize) {}
    fn on_hearts_change(&mut self, _index: usize, _delta: i8) {}
    fn on_toggle_offered(&mut self, _index: usize) {}
}

/// Single-index focus over a list laid out as rows of `column_count` cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridNavigator {
    category: String,
    item_count: usize,
    column_count: usize,
    focused: Option<usize>,
}

impl GridNavigator {
    /// Mount a grid for `category`, restoring the last remembered focus when
    /// it still points at an item.
    pub fn restore(
        category: &str,
        item_count: usize,
        column_count: usize,
        memory: &FocusMemory,
    ) -> Self {
        let focused = if item_count == 0 {
            None
        } else {
            Some(
                memory
                    .get(category)
                    .filter(|index| *index < item_count)
                    .unwrap_or(0),
            )
        };
        Self {
            category: category.to_string(),
            item_count,
            column_count: column_count.max(1),
            focused,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// (row, column) of the focused cell.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.focused
            .map(|index| (index / self.column_count, index % self.column_count))
    }

    pub fn row_count(&self) -> usize {
        self.item_count.div_ceil(self.column_count)
    }

    /// The visible item list changed length (filtering, search).
    pub fn set_item_count(&mut self, item_count: usize, memory: &mut FocusMemory) {
        self.item_count = item_count;
        let clamped = match self.focused {
            _ if item_count == 0 => None,
            Some(index) => Some(index.min(item_count - 1)),
            None => Some(0),
        };
        if clamped != self.focused {
            self.focused = clamped;
            if let Some(index) = clamped {
                memory.remember(&self.category, index);
            }
        }
    }

    pub fn set_column_count(&mut self, column_count: usize) {
        self.column_count = column_count.max(1);
    }

    /// Pointer focus. Out-of-range requests clamp to the last item.
    pub fn focus_index(
        &mut self,
        index: usize,
        memory: &mut FocusMemory,
        scroller: &mut dyn Scroller,
    ) {
        if self.item_count == 0 {
            return;
        }
        self.move_to(index.min(self.item_count - 1), memory, scroller);
    }

    fn move_to(&mut self, index: usize, memory: &mut FocusMemory, scroller: &mut dyn Scroller) {
        if self.focused == Some(index) {
            return;
        }
        self.focused = Some(index);
        memory.remember(&self.category, index);
        scroller.scroll_to_index(index);
    }

    fn target(&self, action: GridAction) -> Option<usize> {
        let current = self.focused?;
        let last = self.item_count.checked_sub(1)?;
        let cols = self.column_count;
        let target = match action {
            GridAction::Up => current.checked_sub(cols).unwrap_or(current),
            GridAction::Down if current + cols <= last => current + cols,
            GridAction::Down => current,
            GridAction::Left => current.saturating_sub(1),
            GridAction::Right => (current + 1).min(last),
            GridAction::First => 0,
            GridAction::Last => last,
            _ => current,
        };
        Some(target)
    }

    /// Apply one action. Moves that hit an edge leave the index unchanged and
    /// still count as handled; activation with nothing focused is not.
    pub fn dispatch(
        &mut self,
        action: GridAction,
        callbacks: &mut impl GridCallbacks,
        memory: &mut FocusMemory,
        scroller: &mut dyn Scroller,
    ) -> bool {
        if action.is_move() {
            if let Some(target) = self.target(action) {
                self.move_to(target, memory, scroller);
            }
            return true;
        }

        let Some(index) = self.focused else {
            return false;
        };
        match action {
            GridAction::Select => callbacks.on_select(index),
            GridAction::Details => callbacks.on_details(index),
            GridAction::HeartsChange(delta) => callbacks.on_hearts_change(index, delta),
            GridAction::ToggleOffered => callbacks.on_toggle_offered(index),
            _ => {}
        }
        true
    }
}
