use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, CategoryKind, Item, Season};
use crate::nav::memory::FocusMemory;

const SCHEMA_VERSION: u32 = 1;

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything the player has done in one save slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotProgress {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub collected: BTreeSet<String>,
    #[serde(default)]
    pub hearts: BTreeMap<String, u8>,
    #[serde(default)]
    pub offered: BTreeSet<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SlotProgress {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            collected: BTreeSet::new(),
            hearts: BTreeMap::new(),
            offered: BTreeSet::new(),
            updated_at: None,
        }
    }
}

impl SlotProgress {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Returns the new state.
    pub fn toggle_collected(&mut self, id: &str) -> bool {
        let now_collected = !self.collected.remove(id);
        if now_collected {
            self.collected.insert(id.to_string());
        }
        self.touch();
        now_collected
    }

    /// Returns the new state.
    pub fn toggle_offered(&mut self, id: &str) -> bool {
        let now_offered = !self.offered.remove(id);
        if now_offered {
            self.offered.insert(id.to_string());
        }
        self.touch();
        now_offered
    }

    pub fn hearts(&self, id: &str) -> u8 {
        self.hearts.get(id).copied().unwrap_or(0)
    }

    /// Apply `delta` clamped to `0..=max`. Returns the new heart count.
    pub fn change_hearts(&mut self, id: &str, delta: i8, max: u8) -> u8 {
        let current = i16::from(self.hearts(id));
        let next = (current + i16::from(delta)).clamp(0, i16::from(max)) as u8;
        if next == 0 {
            self.hearts.remove(id);
        } else {
            self.hearts.insert(id.to_string(), next);
        }
        self.touch();
        next
    }

    pub fn is_complete(&self, kind: CategoryKind, item: &Item) -> bool {
        match (kind, item.max_hearts) {
            (CategoryKind::Npc, Some(max)) => self.hearts(&item.id) >= max,
            (CategoryKind::TempleRequirements | CategoryKind::Altar, _) => {
                self.offered.contains(&item.id)
            }
            _ => self.collected.contains(&item.id),
        }
    }

    /// (complete, total) over every item on a category page.
    pub fn completion(&self, category: &Category) -> (usize, usize) {
        let done = match category.kind {
            CategoryKind::Altar => category
                .offerings
                .iter()
                .flat_map(|o| o.items.iter())
                .filter(|item| self.is_complete(category.kind, item))
                .count(),
            kind => category
                .items
                .iter()
                .filter(|item| self.is_complete(kind, item))
                .count(),
        };
        (done, category.total_items())
    }
}

fn default_sidebar_open() -> bool {
    true
}

/// View state that survives restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiStateData {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
    #[serde(default)]
    pub season_filters: BTreeSet<Season>,
    #[serde(default)]
    pub hide_completed: bool,
    #[serde(default)]
    pub focus_memory: FocusMemory,
    #[serde(default)]
    pub active_slot: Option<u8>,
}

impl Default for UiStateData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sidebar_open: default_sidebar_open(),
            season_filters: BTreeSet::new(),
            hide_completed: false,
            focus_memory: FocusMemory::default(),
            active_slot: None,
        }
    }
}

impl UiStateData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn any_filter_on(&self) -> bool {
        self.hide_completed || !self.season_filters.is_empty()
    }
}
