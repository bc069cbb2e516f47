//! Command declarations.
//!
//! A command is a static [`CommandDescriptor`] (name, triggers, gates, help
//! text) plus a [`CommandBody`]. The [`CommandRegistry`] turns descriptors
//! into [`Command`]s at startup, instantiating each gate once.

pub mod builtin;
pub mod registry;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatch::ExecutionContext;
use crate::error::CommandResult;
use crate::middleware::Middleware;

pub use registry::{CommandRegistry, RegistryBuilder};

/// Help and i18n grouping of commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Administration,
    Fun,
    Utility,
    System,
}

impl Category {
    /// Lowercase key used as the first segment of command translation keys.
    pub fn key(self) -> &'static str {
        match self {
            Self::Administration => "administration",
            Self::Fun => "fun",
            Self::Utility => "utility",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The code that runs once every gate passed.
#[async_trait]
pub trait CommandBody: Send + Sync {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult;
}

/// Declaration of a command before registration.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub category: Category,
    pub triggers: Vec<String>,
    pub description: String,
    pub usage: Vec<String>,
    pub gates: Vec<String>,
}

impl CommandDescriptor {
    /// A descriptor whose only trigger is `name`.
    pub fn new(name: &'static str, category: Category) -> Self {
        Self {
            name,
            category,
            triggers: vec![name.to_ascii_lowercase()],
            description: String::new(),
            usage: Vec::new(),
            gates: Vec::new(),
        }
    }

    pub fn alias(mut self, trigger: &str) -> Self {
        self.triggers.push(trigger.to_ascii_lowercase());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn usage(mut self, line: &str) -> Self {
        self.usage.push(line.to_string());
        self
    }

    /// Append a gate specification. Gates run in the order they are added.
    pub fn gate(mut self, spec: &str) -> Self {
        self.gates.push(spec.to_string());
        self
    }
}

/// A registered command with its gates instantiated.
pub struct Command {
    pub name: &'static str,
    pub category: Category,
    pub triggers: Vec<String>,
    pub description: String,
    pub usage: Vec<String>,
    gate_specs: Vec<String>,
    gates: Vec<Arc<dyn Middleware>>,
    body: Arc<dyn CommandBody>,
    uses: AtomicU64,
}

impl Command {
    pub(crate) fn new(
        descriptor: CommandDescriptor,
        gates: Vec<Arc<dyn Middleware>>,
        body: Arc<dyn CommandBody>,
    ) -> Self {
        Self {
            name: descriptor.name,
            category: descriptor.category,
            triggers: descriptor.triggers,
            description: descriptor.description,
            usage: descriptor.usage,
            gate_specs: descriptor.gates,
            gates,
            body,
            uses: AtomicU64::new(0),
        }
    }

    /// Gates in declared order.
    pub fn gates(&self) -> &[Arc<dyn Middleware>] {
        &self.gates
    }

    pub fn gate_specs(&self) -> &[String] {
        &self.gate_specs
    }

    pub fn body(&self) -> &Arc<dyn CommandBody> {
        &self.body
    }

    /// Count one dispatch that reached this command's gates.
    pub fn record_use(&self) {
        self.uses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uses(&self) -> u64 {
        self.uses.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("triggers", &self.triggers)
            .field("gates", &self.gate_specs)
            .finish_non_exhaustive()
    }
}
