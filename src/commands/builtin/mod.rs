//! Commands that ship with the bot.

mod administration;
mod fun;
mod gates;
mod system;
mod utility;

use chrono::{DateTime, Utc};

use super::RegistryBuilder;
use crate::error::RegistryError;

pub use gates::register_gates;

/// Register every built-in command.
///
/// `started` is the process start time reported by `uptime`.
pub fn register_all(
    builder: &mut RegistryBuilder<'_>,
    started: DateTime<Utc>,
) -> Result<(), RegistryError> {
    utility::register(builder, started)?;
    fun::register(builder)?;
    administration::register(builder)?;
    system::register(builder)?;
    Ok(())
}
