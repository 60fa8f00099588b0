//! UI Widgets for rasm

mod slider;
pub mod status_bar;

pub use slider::SliderWidget;
pub use status_bar::{HelpWidget, StatusBarWidget};
