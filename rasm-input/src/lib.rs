//! Modal keyboard input handling for rasm

mod commands;
mod modal;

pub use commands::{Command, Mode};
pub use modal::InputHandler;
