//! Integration test common infrastructure.
//!
//! Provides a harness that runs the gatebot binary against a temporary
//! configuration and builders for console events.

pub mod bot;
pub mod events;

#[allow(unused_imports)]
pub use bot::TestBot;
#[allow(unused_imports)]
pub use events::{direct_event, guild_event};
