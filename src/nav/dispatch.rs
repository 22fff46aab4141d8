//! The one global key listener.
//!
//! Every keystroke passes through [`KeyboardDispatchHub::handle_key`], which
//! decides in a fixed priority order whether it is a global shortcut, a key
//! for the filter toolbar, or a movement/activation key for whichever grid
//! surface currently owns navigation. The hub never calls page code; it
//! returns a [`Dispatch`] the host applies with its own state in hand.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::catalog::Season;
use crate::nav::filters::RovingFilterNavigator;
use crate::nav::focus::{FocusHandle, FocusTarget};
use crate::nav::grid::GridAction;
use crate::nav::interaction::{InteractionMode, InteractionModeDetector};
use crate::nav::offering::OfferingKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Home,
    SaveSlots,
    TempleOverview,
    Grid,
    Altar,
}

impl PageKind {
    pub fn is_grid_capable(self) -> bool {
        matches!(self, PageKind::Grid | PageKind::Altar)
    }
}

/// Which navigator interprets movement keys right now. Exactly one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationOwner {
    #[default]
    None,
    Grid,
    Offering,
    Filters,
}

/// The kind of grid handler a page registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridSurface {
    Grid,
    Offering,
}

impl From<GridSurface> for NavigationOwner {
    fn from(surface: GridSurface) -> Self {
        match surface {
            GridSurface::Grid => NavigationOwner::Grid,
            GridSurface::Offering => NavigationOwner::Offering,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    BlurInput,
    ClearSearch,
    GoHome,
    GoSaveSlots,
    GoTemple,
    FocusSearch,
    ToggleSidebar,
    OpenPalette,
    OpenCategory(usize),
    ToggleSeason(Season),
    ClearFilters,
    PressFilter(u32),
    CycleRegion { forward: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Ignored,
    /// Consumed inside the hub (help overlay, filter toolbar movement).
    Handled,
    Command(Command),
    Grid(GridAction),
    Offering(OfferingKey),
}

/// Per-keystroke facts the host knows and the hub does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchContext {
    pub page: PageKind,
    pub modal_open: bool,
    pub typing: bool,
    pub search_has_text: bool,
}

impl DispatchContext {
    pub fn page(page: PageKind) -> Self {
        Self {
            page,
            modal_open: false,
            typing: false,
            search_has_text: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyboardDispatchHub {
    help_open: bool,
    owner: NavigationOwner,
    registered: Option<GridSurface>,
    filters: RovingFilterNavigator,
    interaction: InteractionModeDetector,
}

impl KeyboardDispatchHub {
    pub fn new(filters: RovingFilterNavigator, interaction: InteractionModeDetector) -> Self {
        Self {
            help_open: false,
            owner: NavigationOwner::None,
            registered: None,
            filters,
            interaction,
        }
    }

    pub fn owner(&self) -> NavigationOwner {
        self.owner
    }

    pub fn is_help_open(&self) -> bool {
        self.help_open
    }

    pub fn close_help(&mut self) {
        self.help_open = false;
    }

    pub fn filters(&self) -> &RovingFilterNavigator {
        &self.filters
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    /// A page with a grid or altar mounted. Replaces any previous handler.
    pub fn register_grid(&mut self, surface: GridSurface) {
        self.registered = Some(surface);
        if self.owner != NavigationOwner::Filters {
            self.owner = surface.into();
        }
    }

    pub fn unregister_grid(&mut self) {
        self.registered = None;
        if self.owner != NavigationOwner::Filters {
            self.owner = NavigationOwner::None;
        }
    }

    fn fallback_owner(&self) -> NavigationOwner {
        self.registered
            .map(NavigationOwner::from)
            .unwrap_or(NavigationOwner::None)
    }

    /// Filters may deactivate on their own (removal, blur); hand ownership
    /// back to the grid when they do.
    fn settle_owner(&mut self) {
        if self.filters.is_active() {
            self.owner = NavigationOwner::Filters;
        } else if self.owner == NavigationOwner::Filters {
            self.owner = self.fallback_owner();
        }
    }

    pub fn activate_filters(&mut self, focus: &mut dyn FocusHandle) {
        self.filters.activate(focus);
        self.settle_owner();
    }

    pub fn advance_filters(&mut self, focus: &mut dyn FocusHandle) {
        self.filters.focus_next(focus);
        self.settle_owner();
    }

    pub fn exit_filters(&mut self) {
        self.filters.exit();
        self.settle_owner();
    }

    pub fn sync_filters(&mut self, visible: &[u32], focus: &mut dyn FocusHandle) {
        self.filters.sync(visible, focus);
        self.settle_owner();
    }

    pub fn focus_changed(&mut self, target: Option<FocusTarget>, now: Instant) {
        self.filters.focus_changed(target, now);
    }

    /// Returns true when something visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let exited = self.filters.tick(now);
        if exited {
            self.settle_owner();
        }
        exited
    }

    pub fn pointer_moved(&mut self, column: u16, row: u16) -> bool {
        self.interaction.on_pointer_move(column, row)
    }

    pub fn pointer_pressed(&mut self, column: u16, row: u16) -> bool {
        self.interaction.on_pointer_press(column, row)
    }

    pub fn handle_key(
        &mut self,
        key: &KeyEvent,
        ctx: &DispatchContext,
        focus: &mut dyn FocusHandle,
    ) -> Dispatch {
        if key.kind != KeyEventKind::Press {
            return Dispatch::Ignored;
        }
        self.interaction.on_key(key);

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl && key.code == KeyCode::Char('c') {
            return Dispatch::Command(Command::Quit);
        }

        if key.code == KeyCode::Esc {
            return self.handle_escape(ctx);
        }

        if is_help_toggle(key) {
            self.help_open = !self.help_open;
            tracing::debug!(open = self.help_open, "shortcut help toggled");
            return Dispatch::Handled;
        }
        if self.help_open {
            return Dispatch::Handled;
        }

        if !ctx.modal_open {
            match key.code {
                KeyCode::Tab => return Dispatch::Command(Command::CycleRegion { forward: true }),
                KeyCode::BackTab => {
                    return Dispatch::Command(Command::CycleRegion { forward: false });
                }
                _ => {}
            }
        }

        if ctx.typing {
            return Dispatch::Ignored;
        }

        if self.filters.is_active() {
            if self.filters.handle_key(key, focus) {
                self.settle_owner();
                return Dispatch::Handled;
            }
            if let (KeyCode::Enter | KeyCode::Char(' '), Some(index)) =
                (key.code, self.filters.focused())
            {
                return Dispatch::Command(Command::PressFilter(index));
            }
        }

        if let Some(command) = global_command(key, ctrl, alt) {
            return Dispatch::Command(command);
        }

        if ctx.page.is_grid_capable() && !ctrl && !alt {
            match key.code {
                KeyCode::Char('f') => {
                    if self.filters.is_active() {
                        self.advance_filters(focus);
                    } else {
                        self.activate_filters(focus);
                    }
                    return Dispatch::Handled;
                }
                KeyCode::Char('F') => return Dispatch::Command(Command::ClearFilters),
                _ => {}
            }
        }

        if ctx.modal_open || self.filters.is_active() {
            return Dispatch::Ignored;
        }

        match self.owner {
            NavigationOwner::Grid => grid_action(key)
                .map(Dispatch::Grid)
                .unwrap_or(Dispatch::Ignored),
            NavigationOwner::Offering => offering_key(key)
                .map(Dispatch::Offering)
                .unwrap_or(Dispatch::Ignored),
            NavigationOwner::None | NavigationOwner::Filters => Dispatch::Ignored,
        }
    }

    fn handle_escape(&mut self, ctx: &DispatchContext) -> Dispatch {
        if self.help_open {
            self.help_open = false;
            return Dispatch::Handled;
        }
        if self.filters.is_active() {
            self.exit_filters();
            return Dispatch::Handled;
        }
        if ctx.typing {
            return Dispatch::Command(Command::BlurInput);
        }
        if ctx.search_has_text {
            return Dispatch::Command(Command::ClearSearch);
        }
        if !ctx.modal_open && self.owner == NavigationOwner::Offering {
            return Dispatch::Offering(OfferingKey::Escape);
        }
        Dispatch::Ignored
    }
}

fn is_help_toggle(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('?') => true,
        KeyCode::Char('/') => key.modifiers.contains(KeyModifiers::SHIFT),
        _ => false,
    }
}

fn global_command(key: &KeyEvent, ctrl: bool, alt: bool) -> Option<Command> {
    let KeyCode::Char(ch) = key.code else {
        return None;
    };
    if ctrl {
        return match ch {
            'b' => Some(Command::ToggleSidebar),
            'k' => Some(Command::OpenPalette),
            _ => None,
        };
    }
    if alt {
        return match ch {
            '1' => Some(Command::ToggleSeason(Season::Spring)),
            '2' => Some(Command::ToggleSeason(Season::Summer)),
            '3' => Some(Command::ToggleSeason(Season::Fall)),
            '4' => Some(Command::ToggleSeason(Season::Winter)),
            _ => None,
        };
    }
    match ch {
        'H' => Some(Command::GoHome),
        'S' => Some(Command::GoSaveSlots),
        'T' => Some(Command::GoTemple),
        '/' => Some(Command::FocusSearch),
        'q' => Some(Command::Quit),
        '0' => Some(Command::OpenCategory(9)),
        '1'..='9' => Some(Command::OpenCategory(ch as usize - '1' as usize)),
        _ => None,
    }
}

fn grid_action(key: &KeyEvent) -> Option<GridAction> {
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => GridAction::Up,
        KeyCode::Down | KeyCode::Char('j') => GridAction::Down,
        KeyCode::Left | KeyCode::Char('h') => GridAction::Left,
        KeyCode::Right | KeyCode::Char('l') => GridAction::Right,
        KeyCode::Home => GridAction::First,
        KeyCode::End => GridAction::Last,
        KeyCode::Enter | KeyCode::Char(' ') => GridAction::Select,
        KeyCode::Char('i') => GridAction::Details,
        KeyCode::Char('+' | '=') => GridAction::HeartsChange(1),
        KeyCode::Char('-') => GridAction::HeartsChange(-1),
        KeyCode::Char('o') => GridAction::ToggleOffered,
        _ => return None,
    };
    Some(action)
}

fn offering_key(key: &KeyEvent) -> Option<OfferingKey> {
    let key = match key.code {
        KeyCode::Up | KeyCode::Char('k') => OfferingKey::Up,
        KeyCode::Down | KeyCode::Char('j') => OfferingKey::Down,
        KeyCode::Left | KeyCode::Char('h') => OfferingKey::Left,
        KeyCode::Right | KeyCode::Char('l') => OfferingKey::Right,
        KeyCode::Enter | KeyCode::Char(' ') => OfferingKey::Activate,
        KeyCode::Char('o') => OfferingKey::ToggleOffered,
        _ => return None,
    };
    Some(key)
}
