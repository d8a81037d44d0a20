//! Front-end components and the view they render into.

pub mod console;
pub mod dialog;
pub mod frontend;
pub mod launcher;
pub mod status;
pub mod view;

pub use console::{Action, ConsoleSink};
pub use dialog::{ConfigDialog, DialogState};
pub use frontend::Frontend;
pub use launcher::AppLauncher;
pub use status::{StatusKind, StatusMirror};
pub use view::{Document, ElementId, ViewBindings};
