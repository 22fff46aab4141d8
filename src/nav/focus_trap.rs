use crossterm::event::{KeyCode, KeyEvent};

use crate::nav::focus::{FocusHandle, FocusTarget, ModalPresence};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapOutcome {
    /// The trap consumed the key (focus cycled inside the dialog).
    Handled,
    /// Escape: the owner should close the dialog.
    CloseRequested,
    /// Not a trap key; the dialog's own handler may use it.
    Ignored,
}

/// Confines Tab order to a dialog's controls and remembers where focus was
/// before the dialog opened.
#[derive(Clone, Debug)]
pub struct FocusTrap {
    controls: Vec<FocusTarget>,
    cursor: usize,
    restore: Option<FocusTarget>,
}

impl FocusTrap {
    /// Seize focus: remember the current target, then focus `initial` (when it
    /// is one of the controls) or the first control.
    pub fn open(
        controls: Vec<FocusTarget>,
        initial: Option<FocusTarget>,
        focus: &mut dyn FocusHandle,
    ) -> Self {
        let restore = focus.focused();
        let cursor = initial
            .and_then(|target| controls.iter().position(|c| *c == target))
            .unwrap_or(0);
        if let Some(target) = controls.get(cursor) {
            focus.move_focus_to(*target);
        }
        Self {
            controls,
            cursor,
            restore,
        }
    }

    pub fn current(&self) -> Option<FocusTarget> {
        self.controls.get(self.cursor).copied()
    }

    pub fn restore_target(&self) -> Option<FocusTarget> {
        self.restore
    }

    pub fn focus_next(&mut self, focus: &mut dyn FocusHandle) {
        if self.controls.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.controls.len();
        focus.move_focus_to(self.controls[self.cursor]);
    }

    pub fn focus_prev(&mut self, focus: &mut dyn FocusHandle) {
        if self.controls.is_empty() {
            return;
        }
        let len = self.controls.len();
        self.cursor = (self.cursor + len - 1) % len;
        focus.move_focus_to(self.controls[self.cursor]);
    }

    /// Pointer focus onto a control inside the dialog.
    pub fn focus_control(&mut self, target: FocusTarget, focus: &mut dyn FocusHandle) -> bool {
        match self.controls.iter().position(|c| *c == target) {
            Some(pos) => {
                self.cursor = pos;
                focus.move_focus_to(target);
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, focus: &mut dyn FocusHandle) -> TrapOutcome {
        match key.code {
            KeyCode::Esc => TrapOutcome::CloseRequested,
            KeyCode::Tab => {
                self.focus_next(focus);
                TrapOutcome::Handled
            }
            KeyCode::BackTab => {
                self.focus_prev(focus);
                TrapOutcome::Handled
            }
            _ => TrapOutcome::Ignored,
        }
    }

    /// Release the trap and hand focus back to whatever held it before.
    pub fn close(self, focus: &mut dyn FocusHandle) {
        match self.restore {
            Some(target) => focus.move_focus_to(target),
            None => focus.blur(),
        }
    }
}

/// Nested dialogs. The topmost trap owns Tab order; the stack being
/// non-empty is what "a modal is open" means to the navigators.
#[derive(Clone, Debug, Default)]
pub struct FocusTrapStack {
    traps: Vec<FocusTrap>,
}

impl FocusTrapStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        controls: Vec<FocusTarget>,
        initial: Option<FocusTarget>,
        focus: &mut dyn FocusHandle,
    ) {
        self.traps.push(FocusTrap::open(controls, initial, focus));
    }

    pub fn pop(&mut self, focus: &mut dyn FocusHandle) -> bool {
        match self.traps.pop() {
            Some(trap) => {
                trap.close(focus);
                true
            }
            None => false,
        }
    }

    pub fn top(&self) -> Option<&FocusTrap> {
        self.traps.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut FocusTrap> {
        self.traps.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.traps.len()
    }

    pub fn handle_key(&mut self, key: &KeyEvent, focus: &mut dyn FocusHandle) -> TrapOutcome {
        match self.traps.last_mut() {
            Some(trap) => trap.handle_key(key, focus),
            None => TrapOutcome::Ignored,
        }
    }
}

impl ModalPresence for FocusTrapStack {
    fn is_any_modal_open(&self) -> bool {
        !self.traps.is_empty()
    }
}
