//! Command registry.
//!
//! Built once at startup and shared read-only across dispatches. Every
//! trigger maps to exactly one command; registering a trigger twice fails.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{Command, CommandBody, CommandDescriptor};
use crate::error::RegistryError;
use crate::middleware::MiddlewareFactory;

/// Lookup table from trigger to command.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
    triggers: HashMap<String, Arc<Command>>,
}

impl CommandRegistry {
    pub fn builder(factory: &MiddlewareFactory) -> RegistryBuilder<'_> {
        RegistryBuilder {
            factory,
            registry: Self::default(),
        }
    }

    /// The command registered for `trigger`, compared case-insensitively.
    pub fn resolve(&self, trigger: &str) -> Option<&Arc<Command>> {
        self.triggers.get(&trigger.to_lowercase())
    }

    /// Commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get command usage statistics.
    pub fn command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .commands
            .iter()
            .map(|cmd| (cmd.name, cmd.uses()))
            .filter(|(_, count)| *count > 0) // Only include used commands
            .collect();

        // Sort by usage count (descending), then by name for stable output
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats
    }
}

/// Collects commands and checks triggers for collisions.
pub struct RegistryBuilder<'f> {
    factory: &'f MiddlewareFactory,
    registry: CommandRegistry,
}

impl RegistryBuilder<'_> {
    /// Instantiate the descriptor's gates and register its triggers.
    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        body: Arc<dyn CommandBody>,
    ) -> Result<&mut Self, RegistryError> {
        for trigger in &descriptor.triggers {
            if let Some(existing) = self.registry.triggers.get(trigger) {
                return Err(RegistryError::DuplicateTrigger {
                    trigger: trigger.clone(),
                    command: descriptor.name,
                    existing: existing.name,
                });
            }
        }
        let mut seen = std::collections::HashSet::new();
        for trigger in &descriptor.triggers {
            if !seen.insert(trigger.as_str()) {
                return Err(RegistryError::DuplicateTrigger {
                    trigger: trigger.clone(),
                    command: descriptor.name,
                    existing: descriptor.name,
                });
            }
        }

        let gates = descriptor
            .gates
            .iter()
            .map(|spec| self.factory.build(descriptor.name, spec))
            .collect::<Result<Vec<_>, _>>()?;

        let command = Arc::new(Command::new(descriptor, gates, body));
        for trigger in &command.triggers {
            self.registry
                .triggers
                .insert(trigger.clone(), Arc::clone(&command));
        }
        debug!(
            command = command.name,
            triggers = ?command.triggers,
            gates = ?command.gate_specs(),
            "Registered command"
        );
        self.registry.commands.push(command);
        Ok(self)
    }

    pub fn build(self) -> CommandRegistry {
        self.registry
    }
}
