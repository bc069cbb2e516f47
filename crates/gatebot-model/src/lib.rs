//! # gatebot-model
//!
//! Platform data model shared by the gatebot dispatch pipeline and its
//! platform adapters.
//!
//! ## Features
//!
//! - Snowflake id newtypes for guilds, channels, users, roles and messages
//! - Capability sets with the platform's dotted permission names
//! - Guild, member, channel and user snapshots as delivered by the gateway
//! - Inbound message events and outbound feedback messages
//! - Argument tokenizing with quoted segments and mention parsing
//!
//! ## Quick Start
//!
//! ```rust
//! use gatebot_model::{Capabilities, Capability, split_arguments};
//!
//! let caps: Capabilities = "text.send_messages,text.embed_links".parse().unwrap();
//! assert!(caps.contains(Capability::EmbedLinks));
//!
//! let args = split_arguments(r#"!repeat "hello world" again"#);
//! assert_eq!(args, vec!["!repeat", "hello world", "again"]);
//! ```
//!
//! Enable the `serde` feature to (de)serialize every type; capability sets
//! serialize as lists of dotted names and ids as plain integers.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod args;
pub mod capability;
pub mod entity;
pub mod error;
pub mod id;
pub mod message;
pub mod outbound;

pub use self::args::{parse_user_mention, split_arguments};
pub use self::capability::{Capabilities, Capability};
pub use self::entity::{Channel, ChannelKind, Guild, Member, Role, User};
pub use self::error::ModelError;
pub use self::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
pub use self::message::{InboundMessage, ShardInfo};
pub use self::outbound::{OutboundMessage, Tone};
