use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use shrinetrack::app::{App, Page};
use shrinetrack::config::Config;
use shrinetrack::nav::{FocusHandle, FocusTarget};
use shrinetrack::store::json_store::JsonStore;
use shrinetrack::store::schema::SlotProgress;
use shrinetrack::store::{ProgressBackend, StoreError};
use tempfile::TempDir;

const SCREEN: Rect = Rect {
    x: 0,
    y: 0,
    width: 120,
    height: 40,
};

fn open_app(dir: &TempDir) -> App {
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let mut app = App::new(Config::default(), Some(store), None, None).unwrap();
    app.update_geometry(SCREEN);
    app
}

fn chord(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    app.handle_key(KeyEvent::new(code, modifiers), Instant::now());
    app.update_geometry(SCREEN);
}

fn press(app: &mut App, code: KeyCode) {
    chord(app, code, KeyModifiers::NONE);
}

#[test]
fn test_progress_and_focus_survive_restart() {
    let dir = TempDir::new().unwrap();
    let catfish = {
        let mut app = open_app(&dir);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        app.flush();
        app.catalog.categories[0].items[1].id.clone()
    };

    let mut app = open_app(&dir);
    assert!(app.progress.collected.contains(&catfish));
    press(&mut app, KeyCode::Char('1'));
    assert_eq!(app.focus.focused(), Some(FocusTarget::GridItem(1)));
}

#[test]
fn test_slots_keep_separate_progress() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir);
    let sunfish = app.catalog.categories[0].items[0].id.clone();

    app.switch_slot(2);
    press(&mut app, KeyCode::Char('1'));
    press(&mut app, KeyCode::Enter);
    assert!(app.progress.collected.contains(&sunfish));

    app.switch_slot(1);
    assert!(!app.progress.collected.contains(&sunfish));
    let slot_two = app.slot_summaries.iter().find(|s| s.slot == 2).unwrap();
    assert_eq!(slot_two.done, 1);
    assert!(slot_two.updated_at.is_some());

    // the active slot is remembered across restarts
    app.switch_slot(2);
    app.flush();
    drop(app);
    let app = open_app(&dir);
    assert_eq!(app.slot, 2);
    assert!(app.progress.collected.contains(&sunfish));
}

#[test]
fn test_villager_hearts_clamp_at_maximum() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir);
    press(&mut app, KeyCode::Char('6'));
    let villagers = &app.catalog.categories[5];
    let first = villagers.items[0].clone();
    let max = first.max_hearts.unwrap();

    for _ in 0..usize::from(max) + 3 {
        press(&mut app, KeyCode::Char('+'));
    }
    assert_eq!(app.progress.hearts(&first.id), max);
    let (done, _) = app.progress.completion(&app.catalog.categories[5]);
    assert_eq!(done, 1);

    press(&mut app, KeyCode::Char('-'));
    assert_eq!(app.progress.hearts(&first.id), max - 1);
}

#[test]
fn test_sidebar_preference_persists() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir);
    assert!(app.ui.sidebar_open);
    chord(&mut app, KeyCode::Char('b'), KeyModifiers::CONTROL);
    assert!(!app.ui.sidebar_open);
    app.tick(Instant::now());
    drop(app);

    let app = open_app(&dir);
    assert!(!app.ui.sidebar_open);
}

#[test]
fn test_corrupt_slot_file_starts_fresh() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("slot-1.json"), "{ not json").unwrap();
    let mut app = open_app(&dir);
    assert_eq!(app.progress.collected.len(), 0);

    press(&mut app, KeyCode::Char('1'));
    press(&mut app, KeyCode::Enter);
    app.flush();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    assert_eq!(store.load_progress(1).unwrap().collected.len(), 1);
}

/// In-memory stand-in for the tracker API.
#[derive(Clone, Default)]
struct FakeRemote {
    slots: Rc<RefCell<BTreeMap<u8, SlotProgress>>>,
    offline: bool,
}

impl ProgressBackend for FakeRemote {
    fn label(&self) -> &'static str {
        "remote"
    }

    fn load_progress(&self, slot: u8) -> Result<SlotProgress, StoreError> {
        if self.offline {
            return Err(StoreError::Status {
                status: 503,
                url: format!("http://tracker.test/slots/{slot}"),
            });
        }
        Ok(self.slots.borrow().get(&slot).cloned().unwrap_or_default())
    }

    fn save_progress(&self, slot: u8, progress: &SlotProgress) -> Result<(), StoreError> {
        self.slots.borrow_mut().insert(slot, progress.clone());
        Ok(())
    }
}

#[test]
fn test_remote_backend_takes_progress_and_local_keeps_view_state() {
    let dir = TempDir::new().unwrap();
    let remote = FakeRemote::default();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let mut app = App::new(
        Config::default(),
        Some(store),
        Some(Box::new(remote.clone())),
        Some(1),
    )
    .unwrap();
    app.update_geometry(SCREEN);
    assert_eq!(app.backend_label(), "remote");

    press(&mut app, KeyCode::Char('1'));
    press(&mut app, KeyCode::Enter);
    app.flush();

    assert_eq!(remote.slots.borrow()[&1].collected.len(), 1);
    assert!(!dir.path().join("slot-1.json").exists());
    assert!(dir.path().join("ui_state.json").exists());
}

#[test]
fn test_unreachable_remote_reports_error_and_keeps_running() {
    let remote = FakeRemote {
        offline: true,
        ..FakeRemote::default()
    };
    let mut app = App::new(Config::default(), None, Some(Box::new(remote)), None).unwrap();
    app.update_geometry(SCREEN);
    let status = app.status.clone().unwrap();
    assert!(status.is_error);
    assert!(status.text.contains("503"));
    assert_eq!(app.progress, SlotProgress::default());

    press(&mut app, KeyCode::Char('1'));
    assert_eq!(app.page, Page::Category(0));
}
