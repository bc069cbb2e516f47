//! Command gates.
//!
//! A gate is a [`Middleware`] that decides whether a dispatch may proceed to
//! the next gate and eventually the command body. Commands declare gates as
//! short textual specifications:
//!
//! ```text
//! permission:moderator
//! require:user,text.manage_messages
//! require:bot,text.manage_messages,text.read_message_history
//! throttle:channel,1,5
//! official-guild
//! guild-only
//! ```
//!
//! Specifications are parsed into a [`GateSpec`] and instantiated by the
//! [`MiddlewareFactory`] once, when the command registry is built. An invalid
//! or unknown specification aborts startup.

pub mod guild;
pub mod permission;
pub mod require;
pub mod throttle;

use async_trait::async_trait;
use gatebot_model::{Capabilities, Capability, GuildId};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::ExecutionContext;
use crate::error::{GateSpecError, RegistryError};
use crate::security::{PermissionLevel, ThrottleGate, ThrottleScope};

pub use guild::{GuildOnlyMiddleware, OfficialGuildMiddleware};
pub use permission::PermissionMiddleware;
pub use require::{RequireMiddleware, RequireTarget};
pub use throttle::ThrottleMiddleware;

/// A gate's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next gate, or the command body after the last one.
    Continue,
    /// Stop the dispatch. The gate has already sent any feedback.
    Halt,
}

/// One gate in a command's stack.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in logs and the `gate` metric label.
    fn name(&self) -> &'static str;

    /// Decide whether the dispatch continues.
    async fn handle(&self, ctx: &ExecutionContext) -> Flow;

    /// One line for the help command describing what the gate requires.
    fn help_description(&self) -> Option<String> {
        None
    }
}

/// A parsed gate specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateSpec {
    Permission(PermissionLevel),
    Require {
        target: RequireTarget,
        capabilities: Capabilities,
    },
    Throttle {
        scope: ThrottleScope,
        limit: u32,
        window: Duration,
    },
    OfficialGuild,
    GuildOnly,
    /// A gate looked up by name in the factory's custom table.
    Custom { name: String, args: Vec<String> },
}

fn positive<T: FromStr + Default + PartialOrd>(raw: &str) -> Result<T, GateSpecError> {
    match raw.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(GateSpecError::InvalidNumber(raw.to_string())),
    }
}

fn expect_args(name: &str, args: &[String], expected: usize) -> Result<(), GateSpecError> {
    match args.len() {
        0 if expected > 0 => Err(GateSpecError::MissingArguments(name.to_string())),
        n if n != expected => Err(GateSpecError::ArgumentCount {
            gate: name.to_string(),
            expected,
            found: n,
        }),
        _ => Ok(()),
    }
}

impl FromStr for GateSpec {
    type Err = GateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        let (name, args) = match spec.split_once(':') {
            Some((name, args)) => (
                name.trim().to_ascii_lowercase(),
                args.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>(),
            ),
            None => (spec.to_ascii_lowercase(), Vec::new()),
        };
        if name.is_empty() {
            return Err(GateSpecError::Empty);
        }

        match name.as_str() {
            "permission" => {
                expect_args(&name, &args, 1)?;
                Ok(Self::Permission(args[0].parse()?))
            }
            "require" => {
                if args.len() < 2 {
                    return Err(GateSpecError::MissingArguments(name.clone()));
                }
                let target = args[0].parse()?;
                let capabilities = args[1..]
                    .iter()
                    .map(|c| c.parse::<Capability>())
                    .collect::<Result<Capabilities, _>>()?;
                Ok(Self::Require {
                    target,
                    capabilities,
                })
            }
            "throttle" => {
                expect_args(&name, &args, 3)?;
                Ok(Self::Throttle {
                    scope: args[0].parse()?,
                    limit: positive::<u32>(&args[1])?,
                    window: Duration::from_secs(positive::<u64>(&args[2])?),
                })
            }
            "official-guild" | "guild-only" => {
                if !args.is_empty() {
                    return Err(GateSpecError::UnexpectedArguments(name.clone()));
                }
                Ok(if name == "guild-only" {
                    Self::GuildOnly
                } else {
                    Self::OfficialGuild
                })
            }
            _ => Ok(Self::Custom {
                name: name.clone(),
                args,
            }),
        }
    }
}

/// Builds a custom gate from its specification arguments.
pub type CustomGateBuilder =
    Arc<dyn Fn(&[String]) -> Result<Arc<dyn Middleware>, GateSpecError> + Send + Sync>;

/// Turns gate specifications into gate instances.
pub struct MiddlewareFactory {
    throttle: Arc<ThrottleGate>,
    official_guilds: Arc<HashSet<GuildId>>,
    custom: HashMap<String, CustomGateBuilder>,
}

impl MiddlewareFactory {
    pub fn new(throttle: Arc<ThrottleGate>, official_guilds: HashSet<GuildId>) -> Self {
        Self {
            throttle,
            official_guilds: Arc::new(official_guilds),
            custom: HashMap::new(),
        }
    }

    /// Make `name` usable in gate specifications.
    pub fn register_custom<F>(&mut self, name: &str, builder: F)
    where
        F: Fn(&[String]) -> Result<Arc<dyn Middleware>, GateSpecError> + Send + Sync + 'static,
    {
        self.custom
            .insert(name.to_ascii_lowercase(), Arc::new(builder));
    }

    /// Parse and instantiate one of `command`'s gate specifications.
    pub fn build(
        &self,
        command: &'static str,
        spec: &str,
    ) -> Result<Arc<dyn Middleware>, RegistryError> {
        let invalid = |source: GateSpecError| RegistryError::InvalidGate {
            command,
            spec: spec.to_string(),
            source,
        };
        let parsed: GateSpec = spec.parse().map_err(invalid)?;

        let gate: Arc<dyn Middleware> = match parsed {
            GateSpec::Permission(required) => Arc::new(PermissionMiddleware::new(required)),
            GateSpec::Require {
                target,
                capabilities,
            } => Arc::new(RequireMiddleware::new(target, capabilities)),
            GateSpec::Throttle {
                scope,
                limit,
                window,
            } => Arc::new(ThrottleMiddleware::new(
                Arc::clone(&self.throttle),
                scope,
                limit,
                window,
            )),
            GateSpec::OfficialGuild => {
                Arc::new(OfficialGuildMiddleware::new(Arc::clone(&self.official_guilds)))
            }
            GateSpec::GuildOnly => Arc::new(GuildOnlyMiddleware),
            GateSpec::Custom { name, args } => {
                let builder = self
                    .custom
                    .get(&name)
                    .ok_or_else(|| RegistryError::UnknownGate {
                        command,
                        gate: name.clone(),
                    })?;
                builder(&args).map_err(invalid)?
            }
        };
        Ok(gate)
    }
}
