//! Process-backed elaborator channel.
//!
//! Spawns the configured elaborator binary and speaks the framed wire
//! protocol over its stdio. [`ProcessChannel`] implements the
//! [`Channel`](crate::Channel) and [`ProcessLifecycle`](crate::ProcessLifecycle)
//! traits, so the client core never depends on a real process directly;
//! tests substitute scripted channels instead.

mod config;
mod process;
mod state;
mod transport;

pub use config::ElabConfig;
pub use process::ProcessChannel;
