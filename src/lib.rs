//! et-launcher: front-end for the EmComm Tools launcher host.
//!
//! The front-end renders the operator's configuration form, the host's mode
//! and active radio, app launcher buttons and a console log, and keeps them
//! in sync with a host process over a typed command/event bridge.
//!
//! # Architecture
//!
//! - **Bridge** ([`bridge`]): versioned command/event envelopes, an
//!   in-process channel, and an NDJSON stdio transport to a host process.
//! - **Dispatcher** ([`bridge::dispatcher`]): owns the long-lived host event
//!   subscriptions.
//! - **View** ([`ui::view`]): the element document and the typed bindings
//!   every component writes through.
//! - **Components** ([`ui`]): console sink, configuration dialog, status
//!   mirrors and app launcher, composed by [`ui::Frontend`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod launcher_dirs;
pub mod logging;
pub mod terminal;
pub mod ui;

pub use config::{LauncherConfig, UiVariant};
pub use error::{LauncherError, Result};
pub use ui::Frontend;
