use std::ops::Range;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::catalog::{Catalog, CatalogEntry, Category, CategoryKind, EntryLocation, Item, Season};
use crate::config::Config;
use crate::nav::dispatch::GridSurface;
use crate::nav::filters::RovingFilterNavigator;
use crate::nav::focus::FocusState;
use crate::nav::focus_trap::{FocusTrap, FocusTrapStack, TrapOutcome};
use crate::nav::grid::{GridAction, GridCallbacks, GridNavigator};
use crate::nav::interaction::{InteractionMode, InteractionModeDetector};
use crate::nav::offering::{
    OFFERING_COLUMNS, OfferingCallbacks, OfferingKey, OfferingNavigator, OfferingSummary,
};
use crate::nav::{
    Command, Dispatch, DispatchContext, FocusHandle, FocusTarget, KeyboardDispatchHub,
    ModalPresence, PageKind, Scroller,
};
use crate::search;
use crate::store::ProgressBackend;
use crate::store::json_store::JsonStore;
use crate::store::schema::{SlotProgress, UiStateData};
use crate::ui::components::detail_dialog;
use crate::ui::components::offering_list::{
    ITEM_INDENT, ITEM_WIDTH, OfferingRow, focus_row, offering_rows, scroll_offset,
};
use crate::ui::layout::{self, AppLayout, CategoryLayout};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::{DEFAULT_THEME, Theme};

/// Filter chip indices 0-3 are the seasons, in `Season::ALL` order.
pub const FILTER_HIDE_COMPLETED: u32 = 10;
pub const FILTER_CLEAR: u32 = 11;

/// Terminal rows taken by one grid cell.
pub const CELL_HEIGHT: u16 = 2;

pub const CONTROL_COLLECT: &str = "collect";
pub const CONTROL_OFFER: &str = "offer";
pub const CONTROL_HEARTS_UP: &str = "hearts-up";
pub const CONTROL_HEARTS_DOWN: &str = "hearts-down";
pub const CONTROL_CLOSE: &str = "close";
const PALETTE_QUERY: FocusTarget = FocusTarget::Control("palette-query");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    SaveSlots,
    Temple,
    Category(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HomeEntry {
    SaveSlots,
    Temple,
    Category(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Surface,
    Search,
    Filters,
}

pub fn filter_label(index: u32) -> &'static str {
    match index {
        FILTER_HIDE_COMPLETED => "Hide completed",
        FILTER_CLEAR => "Clear",
        other => Season::from_filter_index(other)
            .map(Season::label)
            .unwrap_or("?"),
    }
}

/// The item details dialog. Indices point into the category's `items`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetailView {
    pub category: usize,
    pub item: usize,
}

/// Buttons of the details dialog, in Tab order.
pub fn detail_controls(kind: CategoryKind, item: &Item) -> Vec<&'static str> {
    let mut controls = Vec::new();
    if kind == CategoryKind::Npc && item.max_hearts.is_some() {
        controls.extend([CONTROL_HEARTS_UP, CONTROL_HEARTS_DOWN]);
    } else {
        controls.push(CONTROL_COLLECT);
    }
    if kind == CategoryKind::TempleRequirements {
        controls.push(CONTROL_OFFER);
    }
    controls.push(CONTROL_CLOSE);
    controls
}

/// Command palette: one query over every page and item in the catalog.
pub struct Palette {
    pub query: LineInput,
    entries: Vec<CatalogEntry>,
    results: Vec<usize>,
    selected: usize,
}

impl Palette {
    fn new(catalog: &Catalog) -> Self {
        let entries = catalog.entries();
        let results = (0..entries.len()).collect();
        Self {
            query: LineInput::default(),
            entries,
            results,
            selected: 0,
        }
    }

    fn refresh(&mut self) {
        self.results = search::rank_indices(&self.entries, self.query.value(), |entry| {
            entry.name.as_str()
        });
        self.selected = 0;
    }

    pub fn results(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.results.iter().map(|&i| &self.entries[i])
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.results.get(self.selected).map(|&i| &self.entries[i])
    }

    fn move_selection(&mut self, forward: bool) {
        if self.results.is_empty() {
            return;
        }
        self.selected = if forward {
            (self.selected + 1).min(self.results.len() - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }
}

/// Which rows of the grid are on screen. Keeps the focused cell visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridViewport {
    pub first_row: usize,
    pub rows: usize,
    pub columns: usize,
}

impl Default for GridViewport {
    fn default() -> Self {
        Self {
            first_row: 0,
            rows: 1,
            columns: 1,
        }
    }
}

impl GridViewport {
    fn resize(&mut self, columns: usize, rows: usize) {
        self.columns = columns.max(1);
        self.rows = rows.max(1);
    }

    /// Item positions drawn for a list of `item_count` cells.
    pub fn visible_range(&self, item_count: usize) -> Range<usize> {
        let start = (self.first_row * self.columns).min(item_count);
        let end = ((self.first_row + self.rows) * self.columns).min(item_count);
        start..end
    }
}

impl Scroller for GridViewport {
    fn scroll_to_index(&mut self, index: usize) {
        let row = index / self.columns.max(1);
        if row < self.first_row {
            self.first_row = row;
        } else if row >= self.first_row + self.rows {
            self.first_row = row + 1 - self.rows;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotSummary {
    pub slot: u8,
    pub done: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Grid activations on a category page, applied to the slot's progress.
/// `visible` maps grid positions to item indices.
struct ProgressEditor<'a> {
    category: &'a Category,
    visible: &'a [usize],
    progress: &'a mut SlotProgress,
    changed: bool,
    details: Option<usize>,
}

impl ProgressEditor<'_> {
    fn item(&self, index: usize) -> Option<&Item> {
        let category = self.category;
        self.visible
            .get(index)
            .and_then(|&item| category.items.get(item))
    }
}

impl GridCallbacks for ProgressEditor<'_> {
    fn on_select(&mut self, index: usize) {
        let category = self.category;
        let Some(&item_index) = self.visible.get(index) else {
            return;
        };
        if category.kind == CategoryKind::Npc {
            self.details = Some(item_index);
            return;
        }
        let item = &category.items[item_index];
        let collected = self.progress.toggle_collected(&item.id);
        tracing::debug!(item = %item.id, collected, "collected toggled");
        self.changed = true;
    }

    fn on_details(&mut self, index: usize) {
        self.details = self.visible.get(index).copied();
    }

    fn on_hearts_change(&mut self, index: usize, delta: i8) {
        let category = self.category;
        let Some(item) = self
            .visible
            .get(index)
            .and_then(|&item| category.items.get(item))
        else {
            return;
        };
        if let Some(max) = item.max_hearts {
            let hearts = self.progress.change_hearts(&item.id, delta, max);
            tracing::debug!(item = %item.id, hearts, "hearts changed");
            self.changed = true;
        }
    }

    fn on_toggle_offered(&mut self, index: usize) {
        if self.category.kind != CategoryKind::TempleRequirements {
            return;
        }
        let Some(id) = self.item(index).map(|item| item.id.clone()) else {
            return;
        };
        self.progress.toggle_offered(&id);
        self.changed = true;
    }
}

struct OfferingEditor<'a> {
    category: &'a Category,
    progress: &'a mut SlotProgress,
    changed: bool,
}

impl OfferingCallbacks for OfferingEditor<'_> {
    fn on_toggle_offered(&mut self, offering: usize, item: usize) {
        let Some(item) = self
            .category
            .offerings
            .get(offering)
            .and_then(|o| o.items.get(item))
        else {
            return;
        };
        let offered = self.progress.toggle_offered(&item.id);
        tracing::debug!(item = %item.id, offered, "offering toggled");
        self.changed = true;
    }
}

fn offering_summaries(category: &Category) -> Vec<OfferingSummary> {
    category
        .offerings
        .iter()
        .map(|o| OfferingSummary::new(o.slug.clone(), o.items.len()))
        .collect()
}

fn step_cursor(cursor: &mut usize, len: usize, forward: bool) {
    if len == 0 {
        *cursor = 0;
    } else if forward {
        *cursor = (*cursor + 1).min(len - 1);
    } else {
        *cursor = cursor.saturating_sub(1);
    }
}

pub struct App {
    pub catalog: Catalog,
    pub config: Config,
    pub theme: Theme,
    pub page: Page,
    pub hub: KeyboardDispatchHub,
    pub focus: FocusState,
    pub traps: FocusTrapStack,
    pub grid: Option<GridNavigator>,
    /// Item indices of the current category that pass filters and search,
    /// in display order.
    pub visible: Vec<usize>,
    pub offerings: OfferingNavigator,
    pub viewport: GridViewport,
    pub search: LineInput,
    pub palette: Option<Palette>,
    pub detail: Option<DetailView>,
    pub ui: UiStateData,
    pub progress: SlotProgress,
    pub slot: u8,
    pub slot_summaries: Vec<SlotSummary>,
    pub home_cursor: usize,
    pub slot_cursor: usize,
    pub temple_cursor: usize,
    pub status: Option<Status>,
    pub should_quit: bool,
    store: Option<JsonStore>,
    remote: Option<Box<dyn ProgressBackend>>,
    ui_dirty: bool,
    progress_dirty: bool,
    last_focus: Option<FocusTarget>,
    screen: Rect,
    grid_area: Rect,
    altar_area: Rect,
}

impl App {
    /// `store` keeps view state and (without `remote`) slot progress. With
    /// neither, nothing is persisted.
    pub fn new(
        config: Config,
        store: Option<JsonStore>,
        remote: Option<Box<dyn ProgressBackend>>,
        slot: Option<u8>,
    ) -> anyhow::Result<Self> {
        let catalog = Catalog::bundled()?;
        let theme = Theme::load(&config.theme)
            .or_else(|| {
                tracing::warn!(theme = %config.theme, "unknown theme, using default");
                Theme::load(DEFAULT_THEME)
            })
            .ok_or_else(|| anyhow::anyhow!("bundled theme {DEFAULT_THEME} missing"))?;

        let mut ui = store
            .as_ref()
            .map(JsonStore::load_ui_state)
            .unwrap_or_default();
        ui.focus_memory.set_limit(config.focus_memory_limit);
        ui.focus_memory.retain_known(catalog.slugs());

        let slot = slot
            .or(ui.active_slot)
            .unwrap_or(config.default_slot)
            .clamp(1, config.slot_count.max(1));

        let hub = KeyboardDispatchHub::new(
            RovingFilterNavigator::new(Duration::from_millis(config.filter_settle_ms)),
            InteractionModeDetector::new(config.pointer_threshold),
        );

        let mut app = Self {
            catalog,
            config,
            theme,
            page: Page::Home,
            hub,
            focus: FocusState::new(),
            traps: FocusTrapStack::new(),
            grid: None,
            visible: Vec::new(),
            offerings: OfferingNavigator::new(),
            viewport: GridViewport::default(),
            search: LineInput::default(),
            palette: None,
            detail: None,
            ui,
            progress: SlotProgress::default(),
            slot,
            slot_summaries: Vec::new(),
            home_cursor: 0,
            slot_cursor: 0,
            temple_cursor: 0,
            status: None,
            should_quit: false,
            store,
            remote,
            ui_dirty: false,
            progress_dirty: false,
            last_focus: None,
            screen: Rect::default(),
            grid_area: Rect::default(),
            altar_area: Rect::default(),
        };
        app.load_slot(slot);
        app.open_page(Page::Home);
        Ok(app)
    }

    fn backend(&self) -> Option<&dyn ProgressBackend> {
        if let Some(remote) = &self.remote {
            return Some(remote.as_ref());
        }
        self.store.as_ref().map(|store| store as &dyn ProgressBackend)
    }

    pub fn backend_label(&self) -> &'static str {
        self.backend().map(|b| b.label()).unwrap_or("memory")
    }

    pub fn page_kind(&self) -> PageKind {
        match self.page {
            Page::Home => PageKind::Home,
            Page::SaveSlots => PageKind::SaveSlots,
            Page::Temple => PageKind::TempleOverview,
            Page::Category(ci) if self.catalog.categories[ci].is_altar() => PageKind::Altar,
            Page::Category(_) => PageKind::Grid,
        }
    }

    pub fn current_category(&self) -> Option<&Category> {
        match self.page {
            Page::Category(ci) => self.catalog.category(ci),
            _ => None,
        }
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.hub.interaction_mode()
    }

    pub fn home_entries(&self) -> Vec<HomeEntry> {
        let mut entries = vec![HomeEntry::SaveSlots, HomeEntry::Temple];
        entries.extend((0..self.catalog.len()).map(HomeEntry::Category));
        entries
    }

    pub fn altar_indices(&self) -> Vec<usize> {
        self.catalog.altars().map(|(i, _)| i).collect()
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: true,
        });
    }

    // --- slots and persistence ---

    fn load_slot(&mut self, slot: u8) {
        let loaded = match self.backend() {
            Some(backend) => backend
                .load_progress(slot)
                .map(|progress| (progress, backend.label())),
            None => Ok((SlotProgress::default(), "memory")),
        };
        match loaded {
            Ok((progress, backend)) => {
                tracing::info!(slot, backend, "slot loaded");
                self.progress = progress;
            }
            Err(e) => {
                tracing::warn!(slot, error = %e, "slot load failed");
                self.progress = SlotProgress::default();
                self.set_error(format!("Slot {slot}: {e}"));
            }
        }
        self.slot = slot;
        self.ui.active_slot = Some(slot);
        self.ui_dirty = true;
        self.progress_dirty = false;
        self.refresh_visible();
    }

    pub fn switch_slot(&mut self, slot: u8) {
        if slot == self.slot || slot == 0 || slot > self.config.slot_count {
            return;
        }
        self.flush_progress();
        self.load_slot(slot);
        if self.status.as_ref().is_none_or(|s| !s.is_error) {
            self.set_status(format!("Switched to slot {slot}"));
        }
        self.refresh_slot_summaries();
    }

    fn summarize(&self, slot: u8, progress: &SlotProgress) -> SlotSummary {
        SlotSummary {
            slot,
            done: self
                .catalog
                .categories
                .iter()
                .map(|c| progress.completion(c).0)
                .sum(),
            updated_at: progress.updated_at,
            error: None,
        }
    }

    fn refresh_slot_summaries(&mut self) {
        let mut summaries = Vec::new();
        for slot in 1..=self.config.slot_count {
            if slot == self.slot {
                summaries.push(self.summarize(slot, &self.progress));
                continue;
            }
            let loaded = match self.backend() {
                Some(backend) => backend.load_progress(slot),
                None => Ok(SlotProgress::default()),
            };
            summaries.push(match loaded {
                Ok(progress) => self.summarize(slot, &progress),
                Err(e) => SlotSummary {
                    slot,
                    done: 0,
                    updated_at: None,
                    error: Some(e.to_string()),
                },
            });
        }
        self.slot_summaries = summaries;
    }

    pub fn total_items(&self) -> usize {
        self.catalog.categories.iter().map(Category::total_items).sum()
    }

    fn flush_ui(&mut self) {
        if !self.ui_dirty && !self.ui.focus_memory.is_dirty() {
            return;
        }
        if let Some(store) = &self.store
            && let Err(e) = store.save_ui_state(&self.ui)
        {
            tracing::warn!(error = %e, "saving ui state failed");
        }
        self.ui_dirty = false;
        self.ui.focus_memory.mark_clean();
    }

    fn flush_progress(&mut self) {
        if !self.progress_dirty {
            return;
        }
        self.progress_dirty = false;
        let result = match self.backend() {
            Some(backend) => backend.save_progress(self.slot, &self.progress),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(slot = self.slot, error = %e, "saving progress failed");
            self.set_error(format!("Save failed: {e}"));
        }
    }

    /// Write whatever changed since the last flush.
    pub fn flush(&mut self) {
        self.flush_ui();
        self.flush_progress();
    }

    /// Periodic housekeeping. Returns true when the filter toolbar exited
    /// on its own and the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        let exited = self.hub.tick(now);
        if exited {
            self.settle_focus(now);
        }
        self.flush();
        self.report_background_failures();
        exited
    }

    fn report_background_failures(&mut self) {
        let failures = self.backend().map(|b| b.take_failures()).unwrap_or_default();
        if let Some(e) = failures.last() {
            self.set_error(format!("Save failed: {e}"));
        }
    }

    // --- pages ---

    fn close_modals(&mut self) {
        while self.traps.pop(&mut self.focus) {}
        self.palette = None;
        self.detail = None;
    }

    pub fn open_page(&mut self, page: Page) {
        self.close_modals();
        self.hub.unregister_grid();
        self.hub.exit_filters();
        self.grid = None;
        self.offerings = OfferingNavigator::new();
        self.visible.clear();
        self.search.clear();
        self.focus.blur();
        self.viewport.first_row = 0;
        self.page = page;

        match page {
            Page::SaveSlots => {
                self.slot_cursor = usize::from(self.slot.saturating_sub(1));
                self.refresh_slot_summaries();
            }
            Page::Category(ci) => self.mount_category(ci),
            Page::Home | Page::Temple => {}
        }
        self.sync_filters();
        self.focus_surface();
        tracing::debug!(?page, "page opened");
    }

    fn mount_category(&mut self, ci: usize) {
        let category = &self.catalog.categories[ci];
        let slug = category.slug.clone();
        if category.is_altar() {
            let summaries = offering_summaries(category);
            self.offerings.sync_category(&slug);
            self.offerings.sync_offerings(&summaries);
            self.hub.register_grid(GridSurface::Offering);
            return;
        }
        self.refresh_visible();
        let grid = GridNavigator::restore(
            &slug,
            self.visible.len(),
            self.viewport.columns,
            &self.ui.focus_memory,
        );
        if let Some(index) = grid.focused() {
            self.viewport.scroll_to_index(index);
        }
        self.grid = Some(grid);
        self.hub.register_grid(GridSurface::Grid);
    }

    fn open_home_entry(&mut self, entry: HomeEntry) {
        match entry {
            HomeEntry::SaveSlots => self.open_page(Page::SaveSlots),
            HomeEntry::Temple => self.open_page(Page::Temple),
            HomeEntry::Category(ci) => self.open_page(Page::Category(ci)),
        }
    }

    /// Recompute `visible` from filters and the search query.
    fn refresh_visible(&mut self) {
        let Page::Category(ci) = self.page else {
            self.visible.clear();
            return;
        };
        let category = &self.catalog.categories[ci];
        if category.is_altar() {
            self.visible.clear();
            return;
        }
        let seasons: Vec<Season> = self.ui.season_filters.iter().copied().collect();
        let hide_completed = self.ui.hide_completed;
        let candidates: Vec<usize> = category
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.in_any_season(&seasons))
            .filter(|(_, item)| !(hide_completed && self.progress.is_complete(category.kind, item)))
            .map(|(i, _)| i)
            .collect();
        let ranked = search::rank_indices(&candidates, self.search.value(), |&i| {
            category.items[i].name.as_str()
        });
        self.visible = ranked.into_iter().map(|pos| candidates[pos]).collect();

        if let Some(grid) = self.grid.as_mut() {
            grid.set_item_count(self.visible.len(), &mut self.ui.focus_memory);
            if let Some(index) = grid.focused() {
                self.viewport.scroll_to_index(index);
            }
        }
    }

    // --- filters ---

    /// Chips shown on the current page, in toolbar order.
    pub fn visible_filters(&self) -> Vec<u32> {
        let Some(category) = self.current_category() else {
            return Vec::new();
        };
        if category.is_altar() {
            return Vec::new();
        }
        let mut filters = Vec::new();
        if category.has_seasonal_items() {
            filters.extend(Season::ALL.iter().map(|s| s.filter_index()));
        }
        filters.push(FILTER_HIDE_COMPLETED);
        if self.ui.any_filter_on() {
            filters.push(FILTER_CLEAR);
        }
        filters
    }

    pub fn is_filter_on(&self, index: u32) -> bool {
        match index {
            FILTER_HIDE_COMPLETED => self.ui.hide_completed,
            FILTER_CLEAR => false,
            other => Season::from_filter_index(other)
                .is_some_and(|season| self.ui.season_filters.contains(&season)),
        }
    }

    fn sync_filters(&mut self) {
        let visible = self.visible_filters();
        self.hub.sync_filters(&visible, &mut self.focus);
    }

    fn filters_changed(&mut self) {
        self.ui_dirty = true;
        self.refresh_visible();
        self.sync_filters();
    }

    fn toggle_season(&mut self, season: Season) {
        if !self.ui.season_filters.remove(&season) {
            self.ui.season_filters.insert(season);
        }
        tracing::debug!(season = season.label(), "season filter toggled");
        self.filters_changed();
    }

    fn toggle_hide_completed(&mut self) {
        self.ui.hide_completed = !self.ui.hide_completed;
        self.filters_changed();
    }

    fn clear_filters(&mut self) {
        if !self.ui.any_filter_on() {
            return;
        }
        self.ui.season_filters.clear();
        self.ui.hide_completed = false;
        self.filters_changed();
        self.set_status("Filters cleared");
    }

    fn press_filter(&mut self, index: u32) {
        match index {
            FILTER_HIDE_COMPLETED => self.toggle_hide_completed(),
            FILTER_CLEAR => self.clear_filters(),
            other => {
                if let Some(season) = Season::from_filter_index(other) {
                    self.toggle_season(season);
                }
            }
        }
    }

    // --- focus ---

    /// Where focus belongs on the page's navigable surface.
    fn surface_target(&self) -> Option<FocusTarget> {
        match self.page_kind() {
            PageKind::Grid => self
                .grid
                .as_ref()
                .and_then(GridNavigator::focused)
                .map(FocusTarget::GridItem),
            PageKind::Altar => {
                let has_offerings = self
                    .current_category()
                    .is_some_and(|c| !c.offerings.is_empty());
                if !has_offerings {
                    return None;
                }
                let state = self.offerings.state();
                Some(match state.focused_item_index {
                    Some(item) => FocusTarget::OfferingItem {
                        offering: state.focused_offering_index,
                        item,
                    },
                    None => FocusTarget::Offering(state.focused_offering_index),
                })
            }
            _ => None,
        }
    }

    fn focus_surface(&mut self) {
        match self.surface_target() {
            Some(target) => self.focus.move_focus_to(target),
            None => self.focus.blur(),
        }
    }

    fn focus_search(&mut self) {
        if self.page_kind() == PageKind::Grid {
            self.hub.exit_filters();
            self.focus.move_focus_to(FocusTarget::SearchInput);
        }
    }

    /// Bring focus back in line with navigator state after a key or click,
    /// and tell the filter toolbar where focus went.
    fn settle_focus(&mut self, now: Instant) {
        if !self.traps.is_any_modal_open() {
            let keep = match self.focus.focused() {
                Some(FocusTarget::SearchInput) => self.page_kind() == PageKind::Grid,
                Some(target) if target.is_filter() => self.hub.filters().is_active(),
                _ => false,
            };
            if !keep {
                self.focus_surface();
            }
        }
        let current = self.focus.focused();
        if current != self.last_focus {
            self.last_focus = current;
            self.hub.focus_changed(current, now);
        }
    }

    fn cycle_region(&mut self, forward: bool) {
        let kind = self.page_kind();
        if !kind.is_grid_capable() {
            return;
        }
        let mut regions = vec![Region::Surface];
        if kind == PageKind::Grid {
            regions.push(Region::Search);
        }
        if !self.hub.filters().is_empty() {
            regions.push(Region::Filters);
        }
        let current = match self.focus.focused() {
            Some(FocusTarget::SearchInput) => Region::Search,
            Some(target) if target.is_filter() && self.hub.filters().is_active() => Region::Filters,
            _ => Region::Surface,
        };
        let n = regions.len();
        let pos = regions.iter().position(|r| *r == current).unwrap_or(0);
        let next = if forward {
            regions[(pos + 1) % n]
        } else {
            regions[(pos + n - 1) % n]
        };
        match next {
            Region::Surface => {
                self.hub.exit_filters();
                self.focus_surface();
            }
            Region::Search => self.focus_search(),
            Region::Filters => self.hub.activate_filters(&mut self.focus),
        }
    }

    // --- input ---

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.hub.is_help_open() {
            self.dispatch_key(key);
        } else if self.palette.is_some() {
            self.handle_palette_key(key);
        } else if self.detail.is_none() || !self.handle_detail_key(key) {
            self.dispatch_key(key);
        }
        self.settle_focus(now);
    }

    fn dispatch_key(&mut self, key: KeyEvent) {
        let ctx = DispatchContext {
            page: self.page_kind(),
            modal_open: self.traps.is_any_modal_open(),
            typing: self.focus.is_typing(),
            search_has_text: !self.search.is_empty(),
        };
        let dispatch = self.hub.handle_key(&key, &ctx, &mut self.focus);
        tracing::trace!(?dispatch, "key dispatched");
        match dispatch {
            Dispatch::Ignored if ctx.typing => self.handle_search_key(key),
            Dispatch::Ignored if !ctx.modal_open => self.handle_page_key(key),
            Dispatch::Ignored | Dispatch::Handled => {}
            Dispatch::Command(command) => self.apply_command(command),
            Dispatch::Grid(action) => self.apply_grid_action(action),
            Dispatch::Offering(key) => self.apply_offering_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match self.search.handle(key) {
            InputResult::Changed => self.refresh_visible(),
            InputResult::Submit => self.focus_surface(),
            InputResult::Continue | InputResult::Cancel => {}
        }
    }

    /// List pages (home, slots, temple) move a simple cursor.
    fn handle_page_key(&mut self, key: KeyEvent) {
        let forward = match key.code {
            KeyCode::Down | KeyCode::Char('j') => Some(true),
            KeyCode::Up | KeyCode::Char('k') => Some(false),
            _ => None,
        };
        let activate = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
        match self.page {
            Page::Home => {
                let entries = self.home_entries();
                if let Some(forward) = forward {
                    step_cursor(&mut self.home_cursor, entries.len(), forward);
                } else if activate && let Some(entry) = entries.get(self.home_cursor).copied() {
                    self.open_home_entry(entry);
                }
            }
            Page::SaveSlots => {
                let len = usize::from(self.config.slot_count);
                if let Some(forward) = forward {
                    step_cursor(&mut self.slot_cursor, len, forward);
                } else if activate && let Ok(slot) = u8::try_from(self.slot_cursor + 1) {
                    self.switch_slot(slot);
                }
            }
            Page::Temple => {
                let altars = self.altar_indices();
                if let Some(forward) = forward {
                    step_cursor(&mut self.temple_cursor, altars.len(), forward);
                } else if activate && let Some(&ci) = altars.get(self.temple_cursor) {
                    self.open_page(Page::Category(ci));
                }
            }
            Page::Category(_) => {}
        }
    }

    fn apply_command(&mut self, command: Command) {
        tracing::debug!(?command, "command");
        match command {
            Command::Quit => self.should_quit = true,
            Command::BlurInput => self.focus_surface(),
            Command::ClearSearch => {
                self.search.clear();
                self.refresh_visible();
            }
            Command::GoHome => self.open_page(Page::Home),
            Command::GoSaveSlots => self.open_page(Page::SaveSlots),
            Command::GoTemple => self.open_page(Page::Temple),
            Command::FocusSearch => self.focus_search(),
            Command::ToggleSidebar => {
                self.ui.sidebar_open = !self.ui.sidebar_open;
                self.ui_dirty = true;
            }
            Command::OpenPalette => self.open_palette(),
            Command::OpenCategory(ci) if ci < self.catalog.len() => {
                self.open_page(Page::Category(ci));
            }
            Command::OpenCategory(ci) => self.set_status(format!("No category {}", ci + 1)),
            Command::ToggleSeason(season) => {
                if self.page_kind() == PageKind::Grid {
                    self.toggle_season(season);
                }
            }
            Command::ClearFilters => self.clear_filters(),
            Command::PressFilter(index) => self.press_filter(index),
            Command::CycleRegion { forward } => self.cycle_region(forward),
        }
    }

    fn apply_grid_action(&mut self, action: GridAction) {
        let Page::Category(ci) = self.page else {
            return;
        };
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let mut editor = ProgressEditor {
            category: &self.catalog.categories[ci],
            visible: &self.visible,
            progress: &mut self.progress,
            changed: false,
            details: None,
        };
        grid.dispatch(
            action,
            &mut editor,
            &mut self.ui.focus_memory,
            &mut self.viewport,
        );
        let ProgressEditor {
            changed, details, ..
        } = editor;
        if changed {
            self.item_changed();
        }
        if let Some(item) = details {
            self.open_detail(ci, item);
        }
    }

    fn apply_offering_key(&mut self, key: OfferingKey) {
        let Page::Category(ci) = self.page else {
            return;
        };
        let category = &self.catalog.categories[ci];
        let summaries = offering_summaries(category);
        let mut editor = OfferingEditor {
            category,
            progress: &mut self.progress,
            changed: false,
        };
        self.offerings
            .handle(key, &summaries, &self.traps, &mut editor);
        if editor.changed {
            self.progress_dirty = true;
        }
    }

    /// Progress changed under the grid; a hidden-completed view may shrink.
    fn item_changed(&mut self) {
        self.progress_dirty = true;
        if self.ui.hide_completed {
            self.refresh_visible();
        }
    }

    // --- item details dialog ---

    fn open_detail(&mut self, category: usize, item: usize) {
        let Some(item_ref) = self
            .catalog
            .category(category)
            .and_then(|c| c.items.get(item))
        else {
            return;
        };
        let controls = detail_controls(self.catalog.categories[category].kind, item_ref)
            .into_iter()
            .map(FocusTarget::Control)
            .collect();
        self.traps.push(controls, None, &mut self.focus);
        self.detail = Some(DetailView { category, item });
    }

    fn close_detail(&mut self) {
        if self.detail.take().is_some() {
            self.traps.pop(&mut self.focus);
        }
    }

    pub fn detail_control(&self) -> Option<&'static str> {
        match self.traps.top().and_then(FocusTrap::current) {
            Some(FocusTarget::Control(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns true when the dialog consumed the key.
    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        match self.traps.handle_key(&key, &mut self.focus) {
            TrapOutcome::CloseRequested => {
                self.close_detail();
                true
            }
            TrapOutcome::Handled => true,
            TrapOutcome::Ignored => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.activate_detail_control();
                    true
                }
                KeyCode::Char('+' | '=') => {
                    self.detail_hearts(1);
                    true
                }
                KeyCode::Char('-') => {
                    self.detail_hearts(-1);
                    true
                }
                _ => false,
            },
        }
    }

    fn activate_detail_control(&mut self) {
        let Some(view) = self.detail else {
            return;
        };
        let Some(control) = self.detail_control() else {
            return;
        };
        let category = &self.catalog.categories[view.category];
        let Some(item) = category.items.get(view.item) else {
            return;
        };
        match control {
            CONTROL_CLOSE => self.close_detail(),
            CONTROL_HEARTS_UP => self.detail_hearts(1),
            CONTROL_HEARTS_DOWN => self.detail_hearts(-1),
            CONTROL_COLLECT => {
                self.progress.toggle_collected(&item.id);
                self.item_changed();
            }
            CONTROL_OFFER => {
                self.progress.toggle_offered(&item.id);
                self.item_changed();
            }
            _ => {}
        }
    }

    fn detail_hearts(&mut self, delta: i8) {
        let Some(view) = self.detail else {
            return;
        };
        let category = &self.catalog.categories[view.category];
        let Some(item) = category.items.get(view.item) else {
            return;
        };
        if let Some(max) = item.max_hearts {
            self.progress.change_hearts(&item.id, delta, max);
            self.item_changed();
        }
    }

    // --- command palette ---

    fn open_palette(&mut self) {
        if self.palette.is_some() {
            return;
        }
        self.hub.exit_filters();
        self.traps.push(vec![PALETTE_QUERY], None, &mut self.focus);
        self.palette = Some(Palette::new(&self.catalog));
    }

    fn close_palette(&mut self) {
        if self.palette.take().is_some() {
            self.traps.pop(&mut self.focus);
        }
    }

    fn handle_palette_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        let Some(palette) = self.palette.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Up => palette.move_selection(false),
            KeyCode::Down => palette.move_selection(true),
            KeyCode::Char('p') if ctrl => palette.move_selection(false),
            KeyCode::Char('n') if ctrl => palette.move_selection(true),
            KeyCode::Tab | KeyCode::BackTab => {
                self.traps.handle_key(&key, &mut self.focus);
            }
            _ => match palette.query.handle(key) {
                InputResult::Changed => palette.refresh(),
                InputResult::Submit => {
                    let entry = palette.selected_entry().cloned();
                    self.close_palette();
                    if let Some(entry) = entry {
                        self.jump_to(entry);
                    }
                }
                InputResult::Cancel => self.close_palette(),
                InputResult::Continue => {}
            },
        }
    }

    /// Open the entry's page and put focus on it, revealing it first when
    /// filters or a collapsed offering hide it.
    pub fn jump_to(&mut self, entry: CatalogEntry) {
        tracing::info!(name = %entry.name, "palette jump");
        self.open_page(Page::Category(entry.category));
        match entry.location {
            EntryLocation::Page => {}
            EntryLocation::Item(item) => self.reveal_grid_item(item, &entry.name),
            EntryLocation::OfferingItem { offering, item } => {
                let summaries = offering_summaries(&self.catalog.categories[entry.category]);
                self.offerings.reveal(&summaries, offering, item);
                self.focus_surface();
            }
        }
    }

    fn reveal_grid_item(&mut self, item: usize, name: &str) {
        if !self.visible.contains(&item) && self.ui.any_filter_on() {
            self.clear_filters();
            self.set_status(format!("Filters cleared to show {name}"));
        }
        let Some(position) = self.visible.iter().position(|&v| v == item) else {
            return;
        };
        if let Some(grid) = self.grid.as_mut() {
            grid.focus_index(position, &mut self.ui.focus_memory, &mut self.viewport);
        }
        self.focus_surface();
    }

    // --- pointer and geometry ---

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::Moved => {
                self.hub.pointer_moved(mouse.column, mouse.row);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.hub.pointer_pressed(mouse.column, mouse.row);
                if self.hub.is_help_open() {
                    self.hub.close_help();
                } else if self.detail.is_some() {
                    self.click_detail(mouse.column, mouse.row);
                } else if self.traps.is_any_modal_open() {
                    return;
                } else if self.page_kind() == PageKind::Altar {
                    self.click_offering(mouse.column, mouse.row);
                } else if let Some(position) = self.grid_position_at(mouse.column, mouse.row)
                    && let Some(grid) = self.grid.as_mut()
                {
                    grid.focus_index(position, &mut self.ui.focus_memory, &mut self.viewport);
                    self.focus_surface();
                }
            }
            _ => {}
        }
        self.settle_focus(now);
    }

    /// A click on one of the dialog's buttons focuses and presses it.
    fn click_detail(&mut self, column: u16, row: u16) {
        let Some(view) = self.detail else {
            return;
        };
        let category = &self.catalog.categories[view.category];
        let Some(item) = category.items.get(view.item) else {
            return;
        };
        let controls = detail_controls(category.kind, item);
        let area = detail_dialog::dialog_area(self.screen);
        let Some(control) = detail_dialog::button_at(&controls, area, column, row) else {
            return;
        };
        let focused = self
            .traps
            .top_mut()
            .is_some_and(|trap| trap.focus_control(FocusTarget::Control(control), &mut self.focus));
        if focused {
            self.activate_detail_control();
        }
    }

    /// Header clicks expand or collapse an offering; item clicks focus the item.
    fn click_offering(&mut self, column: u16, row: u16) {
        let area = self.altar_area;
        if column < area.x || column >= area.right() || row < area.y || row >= area.bottom() {
            return;
        }
        let Page::Category(ci) = self.page else {
            return;
        };
        let category = &self.catalog.categories[ci];
        let rows = offering_rows(category, self.offerings.state());
        let scroll = scroll_offset(focus_row(&rows, self.offerings.state()), area.height);
        let Some(&hit) = rows.get(scroll + usize::from(row - area.y)) else {
            return;
        };
        let summaries = offering_summaries(category);
        match hit {
            OfferingRow::Header(offering) => {
                let slug = &category.offerings[offering].slug;
                self.offerings.toggle_expanded(&summaries, slug);
            }
            OfferingRow::Items { offering, first } => {
                let offset = column - area.x;
                if offset < ITEM_INDENT {
                    return;
                }
                let column_index = usize::from((offset - ITEM_INDENT) / ITEM_WIDTH);
                if column_index < OFFERING_COLUMNS {
                    self.offerings.reveal(&summaries, offering, first + column_index);
                }
            }
        }
        self.focus_surface();
    }

    fn grid_position_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.grid_area;
        if self.grid.is_none()
            || column < area.x
            || column >= area.right()
            || row < area.y
            || row >= area.bottom()
        {
            return None;
        }
        let cell_column = usize::from((column - area.x) / self.config.cell_width.max(1));
        if cell_column >= self.viewport.columns {
            return None;
        }
        let cell_row = usize::from((row - area.y) / CELL_HEIGHT) + self.viewport.first_row;
        let position = cell_row * self.viewport.columns + cell_column;
        (position < self.visible.len()).then_some(position)
    }

    /// Recompute grid geometry for a terminal of `area`. Called before
    /// every draw so key handling always sees the on-screen column count.
    pub fn update_geometry(&mut self, area: Rect) {
        let layout = AppLayout::new(area, self.ui.sidebar_open);
        let regions = CategoryLayout::new(layout.main);
        self.screen = area;
        self.grid_area = regions.grid;
        self.altar_area = regions.altar_list();
        let columns = layout::grid_columns(regions.grid.width, self.config.cell_width);
        let rows = usize::from((regions.grid.height / CELL_HEIGHT).max(1));
        self.viewport.resize(columns, rows);
        if let Some(grid) = self.grid.as_mut() {
            grid.set_column_count(columns);
            if let Some(index) = grid.focused() {
                self.viewport.scroll_to_index(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavigationOwner;
    use crate::nav::offering::OfferingLevel;
    use crate::store::StoreError;
    use tempfile::TempDir;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    fn make_test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut app = App::new(Config::default(), Some(store), None, None).unwrap();
        app.update_geometry(SCREEN);
        (dir, app)
    }

    fn chord(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(KeyEvent::new(code, modifiers), Instant::now());
    }

    fn press(app: &mut App, code: KeyCode) {
        chord(app, code, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn open_fish(app: &mut App) {
        press(app, KeyCode::Char('1'));
        app.update_geometry(SCREEN);
    }

    fn click(app: &mut App, column: u16, row: u16, now: Instant) {
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(mouse, now);
    }

    #[test]
    fn test_starts_on_home_with_default_slot() {
        let (_dir, app) = make_test_app();
        assert_eq!(app.page, Page::Home);
        assert_eq!(app.slot, 1);
        assert_eq!(app.hub.owner(), NavigationOwner::None);
        assert_eq!(app.focus.focused(), None);
        assert_eq!(app.home_entries().len(), 2 + app.catalog.len());
    }

    #[test]
    fn test_home_cursor_opens_entries() {
        let (_dir, mut app) = make_test_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.page, Page::Category(0));

        press(&mut app, KeyCode::Char('T'));
        assert_eq!(app.page, Page::Temple);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.page, Page::Category(app.altar_indices()[0]));
    }

    #[test]
    fn test_digit_opens_category_with_first_item_focused() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        assert_eq!(app.page, Page::Category(0));
        assert_eq!(app.page_kind(), PageKind::Grid);
        assert_eq!(app.hub.owner(), NavigationOwner::Grid);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
        assert_eq!(app.visible.len(), app.catalog.categories[0].items.len());
        // 94 columns beside the sidebar fit three 24-wide cells
        assert_eq!(app.grid.as_ref().unwrap().column_count(), 3);
    }

    #[test]
    fn test_select_toggles_collected_and_tick_persists() {
        let (dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert!(app.progress.collected.contains("fish-catfish"));

        app.tick(Instant::now());
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let saved = store.load_progress(1).unwrap();
        assert!(saved.collected.contains("fish-catfish"));
        assert_eq!(store.load_ui_state().focus_memory.get("fish"), Some(1));
    }

    #[test]
    fn test_grid_focus_restored_when_returning() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(4)));

        press(&mut app, KeyCode::Char('H'));
        assert_eq!(app.page, Page::Home);
        assert!(app.grid.is_none());

        open_fish(&mut app);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(4)));
    }

    #[test]
    fn test_search_narrows_grid_and_enter_returns_to_it() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.focus.focused(), Some(FocusTarget::SearchInput));

        // typing never triggers shortcuts
        type_text(&mut app, "tuna");
        assert_eq!(app.page, Page::Category(0));
        assert_eq!(app.visible, vec![5]);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
    }

    #[test]
    fn test_escape_blurs_then_clears_search() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "zzz");
        assert!(app.visible.is_empty());
        assert_eq!(app.focus.focused(), Some(FocusTarget::SearchInput));

        press(&mut app, KeyCode::Esc);
        assert!(!app.focus.is_typing());
        assert_eq!(app.search.value(), "zzz");

        press(&mut app, KeyCode::Esc);
        assert!(app.search.is_empty());
        assert_eq!(app.visible.len(), 14);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
    }

    #[test]
    fn test_filter_toolbar_presses_season_chip() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        assert_eq!(app.visible_filters(), vec![0, 1, 2, 3, FILTER_HIDE_COMPLETED]);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.hub.owner(), NavigationOwner::Filters);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Filter(0)));

        press(&mut app, KeyCode::Enter);
        assert!(app.is_filter_on(Season::Spring.filter_index()));
        let fish = &app.catalog.categories[0];
        assert!(
            app.visible
                .iter()
                .all(|&i| fish.items[i].seasons.is_empty()
                    || fish.items[i].seasons.contains(&Season::Spring))
        );
        assert!(app.visible_filters().contains(&FILTER_CLEAR));
        // focus stayed on the chip while the grid shrank underneath
        assert_eq!(app.focus.focused(), Some(FocusTarget::Filter(0)));

        press(&mut app, KeyCode::Char('F'));
        assert!(!app.ui.any_filter_on());
        assert!(!app.visible_filters().contains(&FILTER_CLEAR));
    }

    #[test]
    fn test_hide_completed_drops_collected_items() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::End);
        assert_eq!(
            app.focus.focused(),
            Some(FocusTarget::Filter(FILTER_HIDE_COMPLETED))
        );
        press(&mut app, KeyCode::Enter);
        assert!(app.ui.hide_completed);
        assert!(!app.visible.contains(&0));
        assert_eq!(app.visible.len(), 13);
    }

    #[test]
    fn test_tab_cycles_surface_search_filters() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus.focused(), Some(FocusTarget::SearchInput));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Filter(0)));
        assert!(app.hub.filters().is_active());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
        assert!(!app.hub.filters().is_active());
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Filter(0)));
    }

    #[test]
    fn test_pointer_blur_exits_filters_after_settle() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Char('f'));
        assert!(app.hub.filters().is_active());

        let now = Instant::now();
        let grid = app.grid_area;
        click(&mut app, grid.x + 1, grid.y, now);
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
        assert_eq!(app.interaction_mode(), InteractionMode::Mouse);
        assert!(app.hub.filters().is_active());

        assert!(app.tick(now + Duration::from_millis(150)));
        assert!(!app.hub.filters().is_active());
        assert_eq!(app.hub.owner(), NavigationOwner::Grid);
    }

    #[test]
    fn test_click_focuses_cell_under_pointer() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        let grid = app.grid_area;
        click(&mut app, grid.x + 25, grid.y + CELL_HEIGHT, Instant::now());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(4)));
        // outside the grid nothing moves
        click(&mut app, 0, 0, Instant::now());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(4)));
    }

    #[test]
    fn test_npc_details_dialog_traps_and_restores_focus() {
        let (_dir, mut app) = make_test_app();
        press(&mut app, KeyCode::Char('6'));
        assert_eq!(app.current_category().unwrap().kind, CategoryKind::Npc);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.detail, Some(DetailView { category: 5, item: 0 }));
        assert_eq!(app.detail_control(), Some(CONTROL_HEARTS_UP));

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.progress.hearts("npc-abigail"), 2);

        // grid keys are inert under the dialog
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.detail_control(), Some(CONTROL_HEARTS_DOWN));

        press(&mut app, KeyCode::Esc);
        assert!(app.detail.is_none());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
    }

    #[test]
    fn test_altar_offering_toggle() {
        let (_dir, mut app) = make_test_app();
        press(&mut app, KeyCode::Char('8'));
        assert_eq!(app.page_kind(), PageKind::Altar);
        assert_eq!(app.hub.owner(), NavigationOwner::Offering);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Offering(0)));
        assert!(app.visible_filters().is_empty());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.offerings.level(), OfferingLevel::Items);
        assert_eq!(
            app.focus.focused(),
            Some(FocusTarget::OfferingItem {
                offering: 0,
                item: 0
            })
        );
        press(&mut app, KeyCode::Enter);
        let first = &app.catalog.categories[7].offerings[0].items[0].id;
        assert!(app.progress.offered.contains(first));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.offerings.level(), OfferingLevel::Offerings);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Offering(0)));
    }

    #[test]
    fn test_clicks_on_altar_headers_and_items() {
        let (_dir, mut app) = make_test_app();
        press(&mut app, KeyCode::Char('8'));
        let list = app.altar_area;
        let now = Instant::now();

        // second header, one row below the first
        click(&mut app, list.x + 4, list.y + 1, now);
        assert!(app.offerings.is_expanded("summer-crops"));
        assert_eq!(app.offerings.level(), OfferingLevel::Offerings);
        assert_eq!(app.focus.focused(), Some(FocusTarget::Offering(1)));

        // its second item row, right-hand column: item 3
        let right_column = list.x + ITEM_INDENT + ITEM_WIDTH + 1;
        click(&mut app, right_column, list.y + 3, now);
        assert_eq!(app.offerings.level(), OfferingLevel::Items);
        assert_eq!(
            app.focus.focused(),
            Some(FocusTarget::OfferingItem {
                offering: 1,
                item: 3
            })
        );

        // collapsing the header that holds item focus drops back to level one
        click(&mut app, list.x + 4, list.y + 1, now);
        assert_eq!(app.offerings.level(), OfferingLevel::Offerings);
        assert!(!app.offerings.is_expanded("summer-crops"));
        assert_eq!(app.focus.focused(), Some(FocusTarget::Offering(1)));
    }

    #[test]
    fn test_click_presses_detail_buttons() {
        let (_dir, mut app) = make_test_app();
        press(&mut app, KeyCode::Char('6'));
        press(&mut app, KeyCode::Enter);
        assert!(app.detail.is_some());

        let area = detail_dialog::dialog_area(SCREEN);
        let controls = [CONTROL_HEARTS_UP, CONTROL_HEARTS_DOWN, CONTROL_CLOSE];
        let button_row = area.bottom() - 2;
        let find = |control: &str| {
            (area.x..area.right())
                .find(|&column| detail_dialog::button_at(&controls, area, column, button_row) == Some(control))
                .unwrap()
        };
        let now = Instant::now();

        click(&mut app, find(CONTROL_HEARTS_DOWN), button_row, now);
        assert_eq!(app.detail_control(), Some(CONTROL_HEARTS_DOWN));
        assert_eq!(app.progress.hearts("npc-abigail"), 0);

        click(&mut app, find(CONTROL_HEARTS_UP), button_row, now);
        click(&mut app, find(CONTROL_HEARTS_UP), button_row, now);
        assert_eq!(app.progress.hearts("npc-abigail"), 2);

        // clicks off the buttons change nothing
        click(&mut app, area.x + 2, area.y + 2, now);
        assert!(app.detail.is_some());

        click(&mut app, find(CONTROL_CLOSE), button_row, now);
        assert!(app.detail.is_none());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
    }

    #[test]
    fn test_click_dismisses_help() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.hub.is_help_open());

        let grid = app.grid_area;
        click(&mut app, grid.x + 25, grid.y, Instant::now());
        assert!(!app.hub.is_help_open());
        // the dismissing click does not also land on the grid
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
    }

    struct FailingQueue {
        failed: std::cell::Cell<bool>,
    }

    impl ProgressBackend for FailingQueue {
        fn label(&self) -> &'static str {
            "remote"
        }

        fn load_progress(&self, _slot: u8) -> Result<SlotProgress, StoreError> {
            Ok(SlotProgress::default())
        }

        fn save_progress(&self, _slot: u8, _progress: &SlotProgress) -> Result<(), StoreError> {
            self.failed.set(true);
            Ok(())
        }

        fn take_failures(&self) -> Vec<StoreError> {
            if self.failed.replace(false) {
                vec![StoreError::Status {
                    status: 500,
                    url: "http://tracker.test/api/slots/1/progress".to_string(),
                }]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_tick_reports_background_save_failure() {
        let remote = FailingQueue {
            failed: std::cell::Cell::new(false),
        };
        let mut app = App::new(Config::default(), None, Some(Box::new(remote)), None).unwrap();
        app.update_geometry(SCREEN);
        app.tick(Instant::now());
        assert!(app.status.as_ref().is_none_or(|s| !s.is_error));

        open_fish(&mut app);
        press(&mut app, KeyCode::Enter);
        app.tick(Instant::now());
        let status = app.status.clone().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("500"));
    }

    #[test]
    fn test_palette_jump_reveals_offering_item() {
        let (_dir, mut app) = make_test_app();
        chord(&mut app, KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert!(app.palette.is_some());
        assert!(app.traps.is_any_modal_open());

        type_text(&mut app, "sturgeon");
        assert_eq!(
            app.palette.as_ref().unwrap().selected_entry().unwrap().name,
            "Sturgeon"
        );
        press(&mut app, KeyCode::Enter);

        assert!(app.palette.is_none());
        assert_eq!(app.page, Page::Category(8));
        assert_eq!(
            app.focus.focused(),
            Some(FocusTarget::OfferingItem {
                offering: 1,
                item: 3
            })
        );
    }

    #[test]
    fn test_palette_jump_clears_filters_hiding_target() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Enter);
        chord(&mut app, KeyCode::Char('2'), KeyModifiers::ALT);
        assert!(app.ui.season_filters.contains(&Season::Summer));
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        assert!(app.ui.hide_completed);
        assert!(!app.visible.contains(&0));

        chord(&mut app, KeyCode::Char('k'), KeyModifiers::CONTROL);
        type_text(&mut app, "sunfish");
        press(&mut app, KeyCode::Enter);

        assert!(!app.ui.any_filter_on());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(0)));
        assert!(app.status.as_ref().unwrap().text.contains("Sunfish"));
    }

    #[test]
    fn test_palette_escape_restores_focus() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Right);
        chord(&mut app, KeyCode::Char('k'), KeyModifiers::CONTROL);
        type_text(&mut app, "q");
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.palette.is_none());
        assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(1)));
    }

    #[test]
    fn test_slot_switch_keeps_slots_apart() {
        let (dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('S'));
        assert_eq!(app.page, Page::SaveSlots);
        assert_eq!(app.slot_summaries.len(), 3);
        assert_eq!(app.slot_summaries[0].done, 1);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.slot, 2);
        assert!(app.progress.collected.is_empty());

        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(store.load_progress(1).unwrap().collected.contains("fish-sunfish"));
        app.flush();
        assert_eq!(store.load_ui_state().active_slot, Some(2));
    }

    #[test]
    fn test_help_overlay_swallows_keys_until_closed() {
        let (_dir, mut app) = make_test_app();
        open_fish(&mut app);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.hub.is_help_open());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(!app.hub.is_help_open());
        assert_eq!(app.page, Page::Category(0));
    }

    #[test]
    fn test_viewport_keeps_focus_visible() {
        let mut viewport = GridViewport {
            first_row: 0,
            rows: 2,
            columns: 3,
        };
        viewport.scroll_to_index(7);
        assert_eq!(viewport.first_row, 1);
        assert_eq!(viewport.visible_range(14), 3..9);
        viewport.scroll_to_index(1);
        assert_eq!(viewport.first_row, 0);
        assert_eq!(viewport.visible_range(4), 0..4);
    }
}
