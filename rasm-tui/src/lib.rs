//! Terminal UI for rasm - slider controls, widgets, and themes
//!
//! Sliders implement the control side of a binding; widgets draw them in
//! the vintage CRT style.

mod app;
mod control;
mod theme;
pub mod widgets;

pub use app::{App, AppState, MessageType};
pub use control::{SliderBank, SliderControl, SliderEntry, SliderSnapshot};
pub use theme::{Theme, CRT_AMBER, CRT_GREEN, CYBERPUNK};
pub use widgets::{HelpWidget, SliderWidget, StatusBarWidget};
