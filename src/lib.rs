//! Keyboard-first terminal tracker for collectibles, villager hearts and
//! temple offerings. The binary in `main.rs` draws it; everything it needs
//! lives here so integration tests and benches can drive it directly.

pub mod app;
pub mod catalog;
pub mod config;
pub mod event;
pub mod nav;
pub mod search;
pub mod store;
pub mod ui;
