pub mod detail_dialog;
pub mod filter_bar;
pub mod help_overlay;
pub mod item_grid;
pub mod menu;
pub mod offering_list;
pub mod palette_view;
pub mod progress_bar;
pub mod sidebar;
pub mod temple_overview;
