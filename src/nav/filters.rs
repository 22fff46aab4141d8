//! Roving-tabindex navigation over the filter toolbar.
//!
//! The toolbar is a single tab stop. While the navigator is inactive that
//! stop is the lowest registered filter; once activated, arrow keys move the
//! stop (and input focus) between filters with wrap-around. Filters appear and
//! disappear as the page changes, so indices are sparse.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};

use crate::nav::focus::{FocusHandle, FocusTarget};

/// Default delay before a blur out of the toolbar deactivates navigation.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Handle a filter control keeps for its lifetime: mount it when the control
/// is rendered, unmount it when the control goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterBinding {
    index: u32,
}

impl FilterBinding {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn mount(&self, nav: &mut RovingFilterNavigator) {
        nav.register(self.index);
    }

    pub fn unmount(&self, nav: &mut RovingFilterNavigator, focus: &mut dyn FocusHandle) {
        nav.unregister(self.index, focus);
    }
}

#[derive(Clone, Debug)]
pub struct RovingFilterNavigator {
    registered: BTreeSet<u32>,
    active: bool,
    focused: Option<u32>,
    blur_pending_since: Option<Instant>,
    settle: Duration,
}

impl Default for RovingFilterNavigator {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl RovingFilterNavigator {
    pub fn new(settle: Duration) -> Self {
        Self {
            registered: BTreeSet::new(),
            active: false,
            focused: None,
            blur_pending_since: None,
            settle,
        }
    }

    pub fn register_filter(&self, index: u32) -> FilterBinding {
        FilterBinding { index }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn focused(&self) -> Option<u32> {
        self.focused
    }

    pub fn registered(&self) -> impl Iterator<Item = u32> + '_ {
        self.registered.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    fn register(&mut self, index: u32) {
        self.registered.insert(index);
    }

    fn unregister(&mut self, index: u32, focus: &mut dyn FocusHandle) {
        if !self.registered.remove(&index) {
            return;
        }
        if !self.active || self.focused != Some(index) {
            return;
        }
        match self.nearest(index) {
            Some(fallback) => self.focus_index(fallback, focus),
            None => self.exit(),
        }
    }

    /// Mount and unmount bindings so the registered set matches the filters
    /// currently on screen.
    pub fn sync(&mut self, visible: &[u32], focus: &mut dyn FocusHandle) {
        let stale: Vec<u32> = self
            .registered
            .iter()
            .copied()
            .filter(|index| !visible.contains(index))
            .collect();
        for index in stale {
            self.register_filter(index).unmount(self, focus);
        }
        for &index in visible {
            self.register_filter(index).mount(self);
        }
    }

    /// Nearest remaining index by absolute distance; the lower one wins a tie.
    fn nearest(&self, removed: u32) -> Option<u32> {
        self.registered
            .iter()
            .copied()
            .min_by_key(|candidate| (candidate.abs_diff(removed), *candidate))
    }

    fn focus_index(&mut self, index: u32, focus: &mut dyn FocusHandle) {
        self.focused = Some(index);
        self.blur_pending_since = None;
        focus.move_focus_to(FocusTarget::Filter(index));
    }

    pub fn activate(&mut self, focus: &mut dyn FocusHandle) {
        let Some(first) = self.registered.first().copied() else {
            return;
        };
        self.active = true;
        tracing::debug!(filter = first, "filter navigation activated");
        self.focus_index(first, focus);
    }

    pub fn focus_next(&mut self, focus: &mut dyn FocusHandle) {
        if !self.active {
            self.activate(focus);
            return;
        }
        let next = self
            .focused
            .and_then(|current| {
                self.registered
                    .range((Bound::Excluded(current), Bound::Unbounded))
                    .next()
                    .copied()
            })
            .or_else(|| self.registered.first().copied());
        if let Some(index) = next {
            self.focus_index(index, focus);
        }
    }

    pub fn focus_prev(&mut self, focus: &mut dyn FocusHandle) {
        if !self.active {
            self.activate(focus);
            return;
        }
        let prev = self
            .focused
            .and_then(|current| self.registered.range(..current).next_back().copied())
            .or_else(|| self.registered.last().copied());
        if let Some(index) = prev {
            self.focus_index(index, focus);
        }
    }

    pub fn focus_first(&mut self, focus: &mut dyn FocusHandle) {
        if let Some(first) = self.registered.first().copied() {
            self.active = true;
            self.focus_index(first, focus);
        }
    }

    pub fn focus_last(&mut self, focus: &mut dyn FocusHandle) {
        if let Some(last) = self.registered.last().copied() {
            self.active = true;
            self.focus_index(last, focus);
        }
    }

    pub fn exit(&mut self) {
        if self.active {
            tracing::debug!("filter navigation exited");
        }
        self.active = false;
        self.focused = None;
        self.blur_pending_since = None;
    }

    /// 0 for the toolbar's single tab stop, -1 for every other filter.
    pub fn tab_index(&self, index: u32) -> i32 {
        let stop = if self.active {
            self.focused
        } else {
            self.registered.first().copied()
        };
        if stop == Some(index) && self.registered.contains(&index) {
            0
        } else {
            -1
        }
    }

    /// Keys understood while focus is inside the toolbar.
    pub fn handle_key(&mut self, key: &KeyEvent, focus: &mut dyn FocusHandle) -> bool {
        if !self.active {
            return false;
        }
        match key.code {
            KeyCode::Right | KeyCode::Char('l') => self.focus_next(focus),
            KeyCode::Left | KeyCode::Char('h') => self.focus_prev(focus),
            KeyCode::Home => self.focus_first(focus),
            KeyCode::End => self.focus_last(focus),
            KeyCode::Esc => self.exit(),
            _ => return false,
        }
        true
    }

    /// Focus moved somewhere. Leaving the toolbar schedules an exit after the
    /// settle delay; coming back (an internal focus move) cancels it.
    pub fn focus_changed(&mut self, target: Option<FocusTarget>, now: Instant) {
        if !self.active {
            return;
        }
        match target {
            Some(FocusTarget::Filter(index)) if self.registered.contains(&index) => {
                self.focused = Some(index);
                self.blur_pending_since = None;
            }
            _ => {
                if self.blur_pending_since.is_none() {
                    self.blur_pending_since = Some(now);
                }
            }
        }
    }

    /// Returns true when a pending blur deactivated the navigator.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.blur_pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.settle => {
                self.exit();
                true
            }
            _ => false,
        }
    }
}
