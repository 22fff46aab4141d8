use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Default pointer travel (in cells) that flips keyboard mode back to mouse.
pub const POINTER_MOVE_THRESHOLD: u16 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Mouse,
    Keyboard,
}

/// Classifies the current input modality so renderers know whether to paint
/// keyboard focus rings or rely on hover highlighting.
#[derive(Clone, Debug)]
pub struct InteractionModeDetector {
    mode: InteractionMode,
    last_pointer: Option<(u16, u16)>,
    threshold: u16,
}

impl Default for InteractionModeDetector {
    fn default() -> Self {
        Self::new(POINTER_MOVE_THRESHOLD)
    }
}

impl InteractionModeDetector {
    pub fn new(threshold: u16) -> Self {
        Self {
            mode: InteractionMode::Mouse,
            last_pointer: None,
            threshold,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_keyboard(&self) -> bool {
        self.mode == InteractionMode::Keyboard
    }

    /// Returns true when the mode changed.
    pub fn on_key(&mut self, key: &KeyEvent) -> bool {
        if !is_navigation_key(key) {
            return false;
        }
        self.set(InteractionMode::Keyboard)
    }

    /// Pointer movement only counts once it has travelled past the threshold
    /// from the last recorded position; small jitter keeps keyboard mode.
    pub fn on_pointer_move(&mut self, column: u16, row: u16) -> bool {
        let previous = self.last_pointer.replace((column, row));
        if self.mode != InteractionMode::Keyboard {
            return false;
        }
        let Some((last_col, last_row)) = previous else {
            return false;
        };
        let dx = u32::from(column.abs_diff(last_col));
        let dy = u32::from(row.abs_diff(last_row));
        let threshold = u32::from(self.threshold);
        if dx * dx + dy * dy > threshold * threshold {
            self.set(InteractionMode::Mouse)
        } else {
            false
        }
    }

    pub fn on_pointer_press(&mut self, column: u16, row: u16) -> bool {
        self.last_pointer = Some((column, row));
        self.set(InteractionMode::Mouse)
    }

    fn set(&mut self, mode: InteractionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::debug!(?mode, "interaction mode changed");
        self.mode = mode;
        true
    }
}

/// Plain movement keys only; Ctrl and Alt chords are commands.
pub fn is_navigation_key(key: &KeyEvent) -> bool {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return false;
    }
    matches!(
        key.code,
        KeyCode::Up
            | KeyCode::Down
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End
            | KeyCode::PageUp
            | KeyCode::PageDown
            | KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Enter
            | KeyCode::Char('h' | 'j' | 'k' | 'l' | ' ')
    )
}
