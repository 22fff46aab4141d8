//! Two-level navigation for altar pages.
//!
//! Level one moves between collapsed offering headers. Activating a header
//! expands it and drops into level two, a fixed two-column grid over that
//! offering's items. Walking off the top of the item grid, walking off the
//! bottom, or pressing Escape collapses the offering and returns to level
//! one (walking off the bottom also advances to the next offering).

use std::collections::BTreeSet;

use crate::nav::focus::ModalPresence;

/// Items inside an offering are always laid out two per row.
pub const OFFERING_COLUMNS: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OfferingLevel {
    #[default]
    Offerings,
    Items,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferingKey {
    Up,
    Down,
    Left,
    Right,
    Activate,
    ToggleOffered,
    Escape,
}

/// What the navigator needs to know about one offering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferingSummary {
    pub slug: String,
    pub item_count: usize,
}

impl OfferingSummary {
    pub fn new(slug: impl Into<String>, item_count: usize) -> Self {
        Self {
            slug: slug.into(),
            item_count,
        }
    }
}

pub trait OfferingCallbacks {
    fn on_toggle_offered(&mut self, offering: usize, item: usize);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfferingNavState {
    pub level: OfferingLevel,
    pub focused_offering_index: usize,
    pub focused_item_index: Option<usize>,
    pub expanded_offerings: BTreeSet<String>,
}

#[derive(Clone, Debug)]
pub struct OfferingNavigator {
    state: OfferingNavState,
    category: Option<String>,
    enabled: bool,
}

impl Default for OfferingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl OfferingNavigator {
    pub fn new() -> Self {
        Self {
            state: OfferingNavState::default(),
            category: None,
            enabled: true,
        }
    }

    pub fn state(&self) -> &OfferingNavState {
        &self.state
    }

    pub fn level(&self) -> OfferingLevel {
        self.state.level
    }

    pub fn is_expanded(&self, slug: &str) -> bool {
        self.state.expanded_offerings.contains(slug)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reset(&mut self) {
        self.state = OfferingNavState::default();
    }

    /// Reset whenever the category identity changes.
    pub fn sync_category(&mut self, category: &str) {
        if self.category.as_deref() != Some(category) {
            tracing::debug!(category, "offering navigator reset");
            self.category = Some(category.to_string());
            self.reset();
        }
    }

    /// Re-establish the state invariants after the offering data changed.
    pub fn sync_offerings(&mut self, offerings: &[OfferingSummary]) {
        if offerings.is_empty() {
            self.reset();
            return;
        }
        let state = &mut self.state;
        state
            .expanded_offerings
            .retain(|slug| offerings.iter().any(|o| &o.slug == slug));
        state.focused_offering_index = state.focused_offering_index.min(offerings.len() - 1);

        if state.level == OfferingLevel::Items {
            let offering = &offerings[state.focused_offering_index];
            let expanded = state.expanded_offerings.contains(&offering.slug);
            match state.focused_item_index {
                Some(item) if expanded && offering.item_count > 0 => {
                    state.focused_item_index = Some(item.min(offering.item_count - 1));
                }
                _ => {
                    state.expanded_offerings.remove(&offering.slug);
                    state.level = OfferingLevel::Offerings;
                    state.focused_item_index = None;
                }
            }
        }
    }

    /// Pointer toggle of a header. At level one the clicked header also
    /// takes focus; collapsing the offering that holds level-two focus
    /// returns to level one. Returns false for unknown slugs or while
    /// disabled.
    pub fn toggle_expanded(&mut self, offerings: &[OfferingSummary], slug: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(index) = offerings.iter().position(|o| o.slug == slug) else {
            return false;
        };
        let state = &mut self.state;
        if state.expanded_offerings.contains(slug) {
            if state.level == OfferingLevel::Items && state.focused_offering_index == index {
                self.collapse_current(offerings);
            } else {
                state.expanded_offerings.remove(slug);
            }
        } else {
            state.expanded_offerings.insert(slug.to_string());
        }
        if self.state.level == OfferingLevel::Offerings {
            self.state.focused_offering_index = index;
        }
        true
    }

    /// Jump straight to an item, expanding its offering. Out-of-range
    /// requests leave the state untouched and return false.
    pub fn reveal(&mut self, offerings: &[OfferingSummary], offering: usize, item: usize) -> bool {
        let Some(summary) = offerings.get(offering) else {
            return false;
        };
        if item >= summary.item_count {
            return false;
        }
        let state = &mut self.state;
        state.expanded_offerings.insert(summary.slug.clone());
        state.level = OfferingLevel::Items;
        state.focused_offering_index = offering;
        state.focused_item_index = Some(item);
        true
    }

    fn collapse_current(&mut self, offerings: &[OfferingSummary]) {
        if let Some(offering) = offerings.get(self.state.focused_offering_index) {
            self.state.expanded_offerings.remove(&offering.slug);
        }
        self.state.level = OfferingLevel::Offerings;
        self.state.focused_item_index = None;
    }

    /// Returns true when the key was consumed. Everything is ignored while
    /// disabled or while any modal dialog is open.
    pub fn handle(
        &mut self,
        key: OfferingKey,
        offerings: &[OfferingSummary],
        modal: &dyn ModalPresence,
        callbacks: &mut dyn OfferingCallbacks,
    ) -> bool {
        if !self.enabled || modal.is_any_modal_open() || offerings.is_empty() {
            return false;
        }
        match self.state.level {
            OfferingLevel::Offerings => self.handle_offerings(key, offerings),
            OfferingLevel::Items => self.handle_items(key, offerings, callbacks),
        }
    }

    fn handle_offerings(&mut self, key: OfferingKey, offerings: &[OfferingSummary]) -> bool {
        let last = offerings.len() - 1;
        let state = &mut self.state;
        match key {
            OfferingKey::Up => {
                state.focused_offering_index = state.focused_offering_index.saturating_sub(1);
                true
            }
            OfferingKey::Down => {
                state.focused_offering_index = (state.focused_offering_index + 1).min(last);
                true
            }
            OfferingKey::Activate => {
                let index = state.focused_offering_index.min(last);
                let offering = &offerings[index];
                if offering.item_count == 0 {
                    return false;
                }
                state.expanded_offerings.insert(offering.slug.clone());
                state.level = OfferingLevel::Items;
                state.focused_item_index = Some(0);
                true
            }
            _ => false,
        }
    }

    fn handle_items(
        &mut self,
        key: OfferingKey,
        offerings: &[OfferingSummary],
        callbacks: &mut dyn OfferingCallbacks,
    ) -> bool {
        let offering_index = self.state.focused_offering_index;
        let Some(offering) = offerings.get(offering_index) else {
            self.reset();
            return false;
        };
        let count = offering.item_count;
        let Some(item) = self.state.focused_item_index.filter(|item| *item < count) else {
            self.collapse_current(offerings);
            return false;
        };
        let column = item % OFFERING_COLUMNS;

        match key {
            OfferingKey::Up if item < OFFERING_COLUMNS => self.collapse_current(offerings),
            OfferingKey::Up => self.state.focused_item_index = Some(item - OFFERING_COLUMNS),
            OfferingKey::Down if item + OFFERING_COLUMNS >= count => {
                self.collapse_current(offerings);
                self.state.focused_offering_index = (offering_index + 1).min(offerings.len() - 1);
            }
            OfferingKey::Down => self.state.focused_item_index = Some(item + OFFERING_COLUMNS),
            OfferingKey::Left => {
                if column > 0 {
                    self.state.focused_item_index = Some(item - 1);
                }
            }
            OfferingKey::Right => {
                if column + 1 < OFFERING_COLUMNS && item + 1 < count {
                    self.state.focused_item_index = Some(item + 1);
                }
            }
            OfferingKey::Activate | OfferingKey::ToggleOffered => {
                callbacks.on_toggle_offered(offering_index, item);
            }
            OfferingKey::Escape => self.collapse_current(offerings),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Toggles(Vec<(usize, usize)>);

    impl OfferingCallbacks for Toggles {
        fn on_toggle_offered(&mut self, offering: usize, item: usize) {
            self.0.push((offering, item));
        }
    }

    fn offerings() -> Vec<OfferingSummary> {
        vec![
            OfferingSummary::new("spring-forage", 5),
            OfferingSummary::new("empty", 0),
            OfferingSummary::new("fish-tank", 4),
        ]
    }

    fn press(nav: &mut OfferingNavigator, key: OfferingKey) -> bool {
        nav.handle(key, &offerings(), &false, &mut Toggles::default())
    }

    fn assert_invariants(nav: &OfferingNavigator, offerings: &[OfferingSummary]) {
        let state = nav.state();
        match state.level {
            OfferingLevel::Offerings => assert_eq!(state.focused_item_index, None),
            OfferingLevel::Items => {
                let offering = &offerings[state.focused_offering_index];
                assert!(state.expanded_offerings.contains(&offering.slug));
                let item = state.focused_item_index.expect("item focus in level two");
                assert!(item < offering.item_count);
            }
        }
    }

    #[test]
    fn test_level_one_moves_clamp() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Up);
        assert_eq!(nav.state().focused_offering_index, 0);
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_offering_index, 2);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_offering_index, 2);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
    }

    #[test]
    fn test_activate_expands_into_level_two() {
        let mut nav = OfferingNavigator::new();
        assert!(press(&mut nav, OfferingKey::Activate));
        assert_eq!(nav.level(), OfferingLevel::Items);
        assert_eq!(nav.state().focused_item_index, Some(0));
        assert!(nav.is_expanded("spring-forage"));
        assert_invariants(&nav, &offerings());
    }

    #[test]
    fn test_activate_on_empty_offering_does_nothing() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Down);
        assert!(!press(&mut nav, OfferingKey::Activate));
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert!(!nav.is_expanded("empty"));
    }

    #[test]
    fn test_down_boundary_uses_item_count() {
        // items [a, b, c, d, e] in two columns
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(2));
        // 2 + 2 = 4 < 5: index 4 exists, keep going
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(4));
        assert_eq!(nav.level(), OfferingLevel::Items);
        // 4 + 2 = 6 >= 5: collapse and advance
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_offering_index, 1);
        assert_eq!(nav.state().focused_item_index, None);
        assert!(!nav.is_expanded("spring-forage"));
    }

    #[test]
    fn test_down_from_second_column_of_short_last_row_collapses() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Right);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(3));
        // 3 + 2 = 5 >= 5 even though item 4 sits on the next row
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_offering_index, 1);
    }

    #[test]
    fn test_down_off_last_offering_stays_on_last() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_offering_index, 2);
    }

    #[test]
    fn test_up_from_first_row_collapses() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Up);
        assert_eq!(nav.state().focused_item_index, Some(0));
        press(&mut nav, OfferingKey::Right);
        press(&mut nav, OfferingKey::Up);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_offering_index, 0);
        assert!(nav.state().expanded_offerings.is_empty());
    }

    #[test]
    fn test_left_right_stay_within_row() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Left);
        assert_eq!(nav.state().focused_item_index, Some(0));
        press(&mut nav, OfferingKey::Right);
        assert_eq!(nav.state().focused_item_index, Some(1));
        press(&mut nav, OfferingKey::Right);
        assert_eq!(nav.state().focused_item_index, Some(1));
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(3));
        press(&mut nav, OfferingKey::Left);
        assert_eq!(nav.state().focused_item_index, Some(2));
        // row two holds only item 4: Right has no partner
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(4));
        press(&mut nav, OfferingKey::Right);
        assert_eq!(nav.state().focused_item_index, Some(4));
    }

    #[test]
    fn test_toggle_offered_calls_back_without_moving() {
        let mut nav = OfferingNavigator::new();
        let mut toggles = Toggles::default();
        let list = offerings();
        nav.handle(OfferingKey::Down, &list, &false, &mut toggles);
        nav.handle(OfferingKey::Down, &list, &false, &mut toggles);
        nav.handle(OfferingKey::Activate, &list, &false, &mut toggles);
        nav.handle(OfferingKey::Right, &list, &false, &mut toggles);
        nav.handle(OfferingKey::ToggleOffered, &list, &false, &mut toggles);
        nav.handle(OfferingKey::Activate, &list, &false, &mut toggles);
        assert_eq!(toggles.0, vec![(2, 1), (2, 1)]);
        assert_eq!(nav.state().focused_item_index, Some(1));
        assert_eq!(nav.level(), OfferingLevel::Items);
    }

    #[test]
    fn test_escape_collapses() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Right);
        assert!(press(&mut nav, OfferingKey::Escape));
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_item_index, None);
        assert!(!press(&mut nav, OfferingKey::Escape));
    }

    #[test]
    fn test_suppressed_while_modal_open_or_disabled() {
        let mut nav = OfferingNavigator::new();
        let list = offerings();
        let mut toggles = Toggles::default();
        assert!(!nav.handle(OfferingKey::Down, &list, &true, &mut toggles));
        assert_eq!(nav.state().focused_offering_index, 0);

        nav.set_enabled(false);
        assert!(!nav.handle(OfferingKey::Down, &list, &false, &mut toggles));
        assert_eq!(nav.state().focused_offering_index, 0);
    }

    #[test]
    fn test_category_change_resets_state() {
        let mut nav = OfferingNavigator::new();
        nav.sync_category("pantry");
        press(&mut nav, OfferingKey::Activate);
        nav.sync_category("pantry");
        assert_eq!(nav.level(), OfferingLevel::Items);
        nav.sync_category("boiler-room");
        assert_eq!(nav.state(), &OfferingNavState::default());
    }

    #[test]
    fn test_sync_offerings_repairs_level_two() {
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Down);
        press(&mut nav, OfferingKey::Down);
        assert_eq!(nav.state().focused_item_index, Some(4));

        let shrunk = vec![OfferingSummary::new("spring-forage", 3)];
        nav.sync_offerings(&shrunk);
        assert_eq!(nav.state().focused_item_index, Some(2));
        assert_invariants(&nav, &shrunk);

        let emptied = vec![OfferingSummary::new("spring-forage", 0)];
        nav.sync_offerings(&emptied);
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_invariants(&nav, &emptied);
    }

    #[test]
    fn test_invariants_hold_over_key_sequences() {
        let keys = [
            OfferingKey::Up,
            OfferingKey::Down,
            OfferingKey::Left,
            OfferingKey::Right,
            OfferingKey::Activate,
            OfferingKey::Escape,
        ];
        let list = offerings();
        let mut nav = OfferingNavigator::new();
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let key = keys[(seed >> 16) as usize % keys.len()];
            nav.handle(key, &list, &false, &mut Toggles::default());
            assert_invariants(&nav, &list);
        }
    }

    #[test]
    fn test_pointer_collapse_of_focused_offering_leaves_level_two() {
        let list = offerings();
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);
        press(&mut nav, OfferingKey::Right);

        assert!(nav.toggle_expanded(&list, "spring-forage"));
        assert_eq!(nav.level(), OfferingLevel::Offerings);
        assert_eq!(nav.state().focused_item_index, None);
        assert!(nav.state().expanded_offerings.is_empty());
        assert_invariants(&nav, &list);
    }

    #[test]
    fn test_pointer_toggle_of_other_offering_keeps_item_focus() {
        let list = offerings();
        let mut nav = OfferingNavigator::new();
        press(&mut nav, OfferingKey::Activate);

        assert!(nav.toggle_expanded(&list, "fish-tank"));
        assert!(nav.is_expanded("fish-tank"));
        assert_eq!(nav.level(), OfferingLevel::Items);
        assert_eq!(nav.state().focused_offering_index, 0);
        assert_invariants(&nav, &list);

        assert!(nav.toggle_expanded(&list, "fish-tank"));
        assert!(!nav.is_expanded("fish-tank"));
        assert_invariants(&nav, &list);
    }

    #[test]
    fn test_pointer_toggle_at_level_one_focuses_header() {
        let list = offerings();
        let mut nav = OfferingNavigator::new();
        assert!(nav.toggle_expanded(&list, "fish-tank"));
        assert_eq!(nav.state().focused_offering_index, 2);
        assert!(nav.is_expanded("fish-tank"));
        assert_eq!(nav.level(), OfferingLevel::Offerings);

        assert!(!nav.toggle_expanded(&list, "missing"));
        nav.set_enabled(false);
        assert!(!nav.toggle_expanded(&list, "fish-tank"));
        assert!(nav.is_expanded("fish-tank"));
    }

    #[test]
    fn test_invariants_hold_when_pointer_and_keys_mix() {
        let list = offerings();
        let slugs = ["spring-forage", "empty", "fish-tank"];
        let keys = [
            OfferingKey::Up,
            OfferingKey::Down,
            OfferingKey::Right,
            OfferingKey::Activate,
            OfferingKey::Escape,
        ];
        let mut nav = OfferingNavigator::new();
        let mut seed: u32 = 11;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let pick = (seed >> 16) as usize;
            if pick % 3 == 0 {
                nav.toggle_expanded(&list, slugs[pick % slugs.len()]);
            } else {
                nav.handle(keys[pick % keys.len()], &list, &false, &mut Toggles::default());
            }
            assert_invariants(&nav, &list);
        }
    }

    #[test]
    fn test_reveal_jumps_into_level_two() {
        let list = offerings();
        let mut nav = OfferingNavigator::new();
        assert!(nav.reveal(&list, 2, 3));
        assert_eq!(nav.level(), OfferingLevel::Items);
        assert_eq!(nav.state().focused_offering_index, 2);
        assert_eq!(nav.state().focused_item_index, Some(3));
        assert_invariants(&nav, &list);

        assert!(!nav.reveal(&list, 1, 0));
        assert!(!nav.reveal(&list, 9, 0));
        assert_eq!(nav.state().focused_offering_index, 2);
    }
}
