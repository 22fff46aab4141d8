//! Focus targets and the host capabilities the navigators call into.
//!
//! The navigators never touch the terminal directly. A host (the app, or a
//! test double) implements these traits and decides what "moving focus" or
//! "scrolling into view" means for its surface.

/// Something that can hold input focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    /// A filter chip in the toolbar, by its registered index.
    Filter(u32),
    /// A cell of the item grid, by visible index.
    GridItem(usize),
    /// A collapsed offering header on an altar page.
    Offering(usize),
    /// An item inside an expanded offering.
    OfferingItem { offering: usize, item: usize },
    /// The in-page search field.
    SearchInput,
    /// A named control inside a modal dialog.
    Control(&'static str),
}

impl FocusTarget {
    pub fn is_filter(self) -> bool {
        matches!(self, FocusTarget::Filter(_))
    }

    /// Whether keystrokes go to a text field while this target is focused.
    pub fn is_text_input(self) -> bool {
        matches!(self, FocusTarget::SearchInput)
    }
}

pub trait FocusHandle {
    fn focused(&self) -> Option<FocusTarget>;
    fn move_focus_to(&mut self, target: FocusTarget);
    fn blur(&mut self);
}

pub trait ModalPresence {
    fn is_any_modal_open(&self) -> bool;
}

pub trait Scroller {
    fn scroll_to_index(&mut self, index: usize);
}

/// Plain focus holder. Hosts that have no richer notion of focus can embed
/// one of these and hand it to the navigators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusState {
    current: Option<FocusTarget>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_typing(&self) -> bool {
        self.current.is_some_and(FocusTarget::is_text_input)
    }
}

impl FocusHandle for FocusState {
    fn focused(&self) -> Option<FocusTarget> {
        self.current
    }

    fn move_focus_to(&mut self, target: FocusTarget) {
        self.current = Some(target);
    }

    fn blur(&mut self) {
        self.current = None;
    }
}

impl ModalPresence for bool {
    fn is_any_modal_open(&self) -> bool {
        *self
    }
}

/// Scroller that ignores requests, for hosts without a viewport.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScroll;

impl Scroller for NoScroll {
    fn scroll_to_index(&mut self, _index: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_state_tracks_text_input() {
        let mut focus = FocusState::new();
        assert!(!focus.is_typing());
        focus.move_focus_to(FocusTarget::SearchInput);
        assert!(focus.is_typing());
        focus.move_focus_to(FocusTarget::GridItem(3));
        assert!(!focus.is_typing());
        focus.blur();
        assert_eq!(focus.focused(), None);
    }
}
