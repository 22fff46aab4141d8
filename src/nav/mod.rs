pub mod dispatch;
pub mod filters;
pub mod focus;
pub mod focus_trap;
pub mod grid;
pub mod interaction;
pub mod memory;
pub mod offering;

pub use dispatch::{Command, Dispatch, DispatchContext, KeyboardDispatchHub, NavigationOwner, PageKind};
pub use focus::{FocusHandle, FocusTarget, ModalPresence, Scroller};
pub use interaction::InteractionMode;
