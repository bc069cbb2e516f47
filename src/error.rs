//! Unified error handling for gatebot.
//!
//! Command bodies return [`CommandError`]; the dispatcher turns whatever
//! escapes a command into a [`Failure`] at its single catch boundary.
//! Startup-time problems with command declarations are [`RegistryError`]s.

use gatebot_model::ModelError;
use thiserror::Error;

use crate::platform::PlatformError;

// ============================================================================
// Command Errors (command bodies)
// ============================================================================

/// Errors a command body may return.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The platform rejected an action the command attempted.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The caller supplied arguments the command cannot use.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Platform(e) => e.error_code(),
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command bodies.
pub type CommandResult = Result<(), CommandError>;

// ============================================================================
// Failure classification (dispatcher boundary)
// ============================================================================

/// How a failed command invocation is reported.
#[derive(Debug)]
pub enum Failure {
    /// The platform refused an action for lack of permission.
    InsufficientExternalPermission(PlatformError),
    /// The command rejected its arguments.
    InvalidArguments(String),
    /// Anything else, including panics.
    Unexpected {
        /// Metric label for the failure class.
        class: &'static str,
        detail: String,
    },
}

impl Failure {
    /// Classify an error returned by a command body.
    pub fn classify(err: CommandError) -> Self {
        match err {
            CommandError::Platform(e @ PlatformError::MissingCapability(_)) => {
                Self::InsufficientExternalPermission(e)
            }
            CommandError::InvalidArguments(reason) => Self::InvalidArguments(reason),
            other => Self::Unexpected {
                class: other.error_code(),
                detail: format!("{other:#}"),
            },
        }
    }

    /// Classify a panic payload caught around a command body.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Unexpected {
            class: "panic",
            detail,
        }
    }

    /// Metric label for the failure class.
    pub fn class(&self) -> &'static str {
        match self {
            Self::InsufficientExternalPermission(_) => "insufficient_external_permission",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Unexpected { class, .. } => *class,
        }
    }
}

// ============================================================================
// Gate specification and registry errors (startup)
// ============================================================================

/// A textual gate specification that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateSpecError {
    #[error("empty gate specification")]
    Empty,

    #[error("gate `{0}` requires arguments")]
    MissingArguments(String),

    #[error("gate `{0}` takes no arguments")]
    UnexpectedArguments(String),

    #[error("gate `{gate}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        gate: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown permission level `{0}`")]
    InvalidPermissionLevel(String),

    #[error("require target must be `user` or `bot`, got `{0}`")]
    InvalidRequireTarget(String),

    #[error(transparent)]
    Capability(#[from] ModelError),

    #[error("unknown throttle scope `{0}`")]
    InvalidThrottleScope(String),

    #[error("expected a positive number, got `{0}`")]
    InvalidNumber(String),
}

/// Errors raised while building the command registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("trigger `{trigger}` of `{command}` is already registered by `{existing}`")]
    DuplicateTrigger {
        trigger: String,
        command: &'static str,
        existing: &'static str,
    },

    #[error("command `{command}` declares invalid gate `{spec}`: {source}")]
    InvalidGate {
        command: &'static str,
        spec: String,
        #[source]
        source: GateSpecError,
    },

    #[error("command `{command}` declares unknown gate `{gate}`")]
    UnknownGate { command: &'static str, gate: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatebot_model::Capability;

    #[test]
    fn missing_capability_is_external_permission() {
        let err = CommandError::Platform(PlatformError::MissingCapability(
            Capability::ManageMessages,
        ));
        let failure = Failure::classify(err);
        assert!(matches!(failure, Failure::InsufficientExternalPermission(_)));
        assert_eq!(failure.class(), "insufficient_external_permission");
    }

    #[test]
    fn other_errors_are_unexpected() {
        let failure = Failure::classify(CommandError::Internal(anyhow::anyhow!("boom")));
        assert_eq!(failure.class(), "internal_error");

        let failure = Failure::classify(CommandError::Platform(PlatformError::Unavailable(
            "gateway".into(),
        )));
        assert_eq!(failure.class(), "platform_unavailable");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("kaboom");
        match Failure::from_panic(payload.as_ref()) {
            Failure::Unexpected { class, detail } => {
                assert_eq!(class, "panic");
                assert_eq!(detail, "kaboom");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
