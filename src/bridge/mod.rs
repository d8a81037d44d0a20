//! Command/event bridge between the front-end and the launcher host.

pub mod channel;
pub mod client;
pub mod contract;
pub mod dispatcher;
pub mod stdio;

pub use client::{Bridge, HostClient};
pub use contract::{CommandName, EventName, HostEvent, UserConfig};
pub use dispatcher::{EventDispatcher, Subscription};
