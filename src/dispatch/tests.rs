//! Dispatch scenarios against a recording fake client.

use async_trait::async_trait;
use gatebot_model::{
    Capabilities, Capability, Channel, ChannelId, ChannelKind, Guild, GuildId, InboundMessage,
    Member, MessageId, OutboundMessage, ShardInfo, Tone, User, UserId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use super::*;
use crate::commands::{Category, CommandBody, CommandDescriptor, builtin};
use crate::data::memory::MemoryStore;
use crate::data::{PlayerProfile, VerificationState};
use crate::error::{CommandError, CommandResult, GateSpecError};
use crate::middleware::{Flow, Middleware, MiddlewareFactory};
use crate::platform::PlatformError;
use crate::platform::outbox::OutboundAction;
use crate::security::ThrottleGate;

const BOT: u64 = 100;
const ADMIN: u64 = 7;
const OWNER: u64 = 999;
const GUILD: u64 = 1;
const CHANNEL: u64 = 10;

// ============================================================================
// Fixture
// ============================================================================

struct FakeClient {
    capabilities: Mutex<Capabilities>,
    history: Mutex<Vec<MessageId>>,
    deny_deletes: AtomicBool,
    deleted: Mutex<Vec<MessageId>>,
}

impl FakeClient {
    fn new() -> Self {
        Self {
            capabilities: Mutex::new(Capabilities::all()),
            history: Mutex::new(Vec::new()),
            deny_deletes: AtomicBool::new(false),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    fn bot_user(&self) -> User {
        user(BOT, "gatebot", true)
    }

    async fn self_capabilities(&self, _channel: ChannelId) -> Result<Capabilities, PlatformError> {
        Ok(*self.capabilities.lock())
    }

    async fn send_message(
        &self,
        _channel: ChannelId,
        _message: OutboundMessage,
    ) -> Result<MessageId, PlatformError> {
        Ok(MessageId(1))
    }

    async fn delete_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        if self.deny_deletes.load(Ordering::SeqCst) {
            return Err(PlatformError::MissingCapability(Capability::ManageMessages));
        }
        self.deleted.lock().push(message);
        Ok(())
    }

    async fn message_history(
        &self,
        _channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError> {
        Ok(self.history.lock().iter().take(limit).copied().collect())
    }
}

/// Gate that logs its label and returns a fixed verdict.
struct RecordingGate {
    name: &'static str,
    label: String,
    verdict: Flow,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Middleware for RecordingGate {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, _ctx: &ExecutionContext) -> Flow {
        self.log.lock().push(self.label.clone());
        self.verdict
    }
}

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// Body that logs the arguments it was invoked with.
struct ProbeBody {
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CommandBody for ProbeBody {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push("body".into());
        self.seen.lock().push(ctx.arguments().to_vec());
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(CommandError::Internal(anyhow::anyhow!("database on fire"))),
            Behaviour::Panic => panic!("probe exploded"),
        }
    }
}

struct Harness {
    dispatcher: Dispatcher,
    client: Arc<FakeClient>,
    store: Arc<MemoryStore>,
    outbound: mpsc::UnboundedReceiver<OutboundAction>,
    log: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Harness {
    /// Built-in commands plus `probe` (gated by `probe_gates`), `broken`
    /// and `explode`.
    fn new(probe_gates: &[&str]) -> Self {
        crate::metrics::init();

        let client = Arc::new(FakeClient::new());
        let store = Arc::new(MemoryStore::new([UserId(ADMIN)]));
        let languages = Arc::new(crate::i18n::Languages::embedded("en_US").unwrap());
        let permissions = Arc::new(PermissionResolver::new(HashSet::from([UserId(ADMIN)])));
        let (outbox, outbound) = Outbox::channel();

        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut factory = MiddlewareFactory::new(
            Arc::new(ThrottleGate::new()),
            HashSet::from([GuildId(GUILD)]),
        );
        builtin::register_gates(&mut factory);
        for (gate, verdict) in [("pass", Flow::Continue), ("halt", Flow::Halt)] {
            let log = Arc::clone(&log);
            factory.register_custom(gate, move |args: &[String]| {
                let label = args
                    .first()
                    .cloned()
                    .ok_or_else(|| GateSpecError::MissingArguments(gate.to_string()))?;
                Ok(Arc::new(RecordingGate {
                    name: gate,
                    label,
                    verdict,
                    log: Arc::clone(&log),
                }) as Arc<dyn Middleware>)
            });
        }

        let probe = |behaviour| {
            Arc::new(ProbeBody {
                behaviour,
                calls: Arc::clone(&calls),
                seen: Arc::clone(&seen),
                log: Arc::clone(&log),
            })
        };
        let mut builder = CommandRegistry::builder(&factory);
        builtin::register_all(&mut builder, chrono::Utc::now()).unwrap();
        let mut descriptor = CommandDescriptor::new("probe", Category::Utility);
        for gate in probe_gates {
            descriptor = descriptor.gate(gate);
        }
        builder.register(descriptor, probe(Behaviour::Succeed)).unwrap();
        builder
            .register(
                CommandDescriptor::new("broken", Category::Fun),
                probe(Behaviour::Fail),
            )
            .unwrap();
        builder
            .register(
                CommandDescriptor::new("explode", Category::Fun),
                probe(Behaviour::Panic),
            )
            .unwrap();
        let registry = Arc::new(builder.build());

        let services = Arc::new(Services {
            client: Arc::clone(&client) as Arc<dyn ChatClient>,
            store: Arc::clone(&store) as Arc<dyn DataStore>,
            languages,
            permissions,
            outbox,
            settings: DispatchSettings {
                default_prefix: "!".into(),
                bot_user_id: UserId(BOT),
                feedback: FeedbackConfig::default(),
            },
        });

        Self {
            dispatcher: Dispatcher::new(services, registry),
            client,
            store,
            outbound,
            log,
            calls,
            seen,
        }
    }

    async fn send(&self, message: InboundMessage) -> DispatchOutcome {
        self.dispatcher.process(Arc::new(message)).await
    }

    /// Outbound actions queued so far.
    fn drain(&mut self) -> Vec<OutboundAction> {
        let mut actions = Vec::new();
        while let Ok(action) = self.outbound.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Content and tone of every queued send.
    fn sent(&mut self) -> Vec<(Tone, String, Option<Duration>)> {
        self.drain()
            .into_iter()
            .map(|a| match a {
                OutboundAction::Send {
                    message,
                    delete_after,
                    ..
                } => (message.tone, message.content, delete_after),
            })
            .collect()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn user(id: u64, name: &str, bot: bool) -> User {
    User {
        id: UserId(id),
        name: name.into(),
        bot,
    }
}

fn guild_message(author: u64, capabilities: Capabilities, content: &str) -> InboundMessage {
    let author = user(author, &format!("user{author}"), false);
    InboundMessage {
        id: MessageId(5000),
        content: content.into(),
        member: Some(Member {
            user: author.clone(),
            nickname: None,
            roles: Vec::new(),
            capabilities,
        }),
        author,
        guild: Some(Guild {
            id: GuildId(GUILD),
            name: "Test Guild".into(),
            owner_id: UserId(OWNER),
            roles: Vec::new(),
        }),
        channel: Channel {
            id: ChannelId(CHANNEL),
            name: "general".into(),
            kind: ChannelKind::Text,
        },
        mentions: Vec::new(),
        mentions_everyone: false,
        shard: ShardInfo { id: 0, total: 1 },
    }
}

fn direct_message(author: u64, content: &str) -> InboundMessage {
    InboundMessage {
        member: None,
        guild: None,
        channel: Channel {
            id: ChannelId(20),
            name: String::new(),
            kind: ChannelKind::Private,
        },
        ..guild_message(author, Capabilities::empty(), content)
    }
}

// ============================================================================
// Middleware stack properties
// ============================================================================

#[tokio::test]
async fn test_zero_gates_invoke_body_once() {
    let h = Harness::new(&[]);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!probe")).await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert!(outcome.is_handled());
    assert_eq!(h.calls(), 1);
}

#[tokio::test]
async fn test_gates_run_in_order_until_one_halts() {
    let h = Harness::new(&["pass:a", "pass:b", "halt:c", "pass:d"]);
    let before = crate::metrics::counter_value(&crate::metrics::GATE_REJECTIONS, &["halt"]);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!probe")).await;

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(*h.log.lock(), vec!["a", "b", "c"]);
    assert_eq!(h.calls(), 0);
    let after = crate::metrics::counter_value(&crate::metrics::GATE_REJECTIONS, &["halt"]);
    assert!(after > before);
}

#[tokio::test]
async fn test_all_gates_pass_then_body_runs_last() {
    let h = Harness::new(&["pass:a", "pass:b"]);

    assert!(h.dispatcher.dispatch(Arc::new(guild_message(1, Capabilities::empty(), "!probe"))).await);
    assert_eq!(*h.log.lock(), vec!["a", "b", "body"]);
}

#[tokio::test]
async fn test_stack_reports_rejecting_position() {
    let h = Harness::new(&["pass:a", "halt:b", "pass:c"]);
    let registry = Arc::clone(h.dispatcher.registry());
    let command = Arc::clone(registry.resolve("probe").unwrap());
    let ctx = ExecutionContext::new(
        Arc::new(guild_message(1, Capabilities::empty(), "!probe")),
        Default::default(),
        Invocation {
            command: Arc::clone(&command),
            prefix: "!".into(),
            mentionable: false,
            alias_arguments: Vec::new(),
            user_arguments: Vec::new(),
            remainder: String::new(),
        },
        h.dispatcher.services().languages.default_bundle().clone(),
        Arc::clone(h.dispatcher.services()),
        registry,
    );

    let ran = AtomicBool::new(false);
    let outcome = MiddlewareStack::new(command.gates())
        .run(&ctx, || async { ran.store(true, Ordering::SeqCst) })
        .await;

    assert_eq!(
        outcome,
        StackOutcome::Rejected {
            gate: "halt",
            position: 2
        }
    );
    assert!(!ran.load(Ordering::SeqCst));
}

// ============================================================================
// Candidate and capability checks
// ============================================================================

#[tokio::test]
async fn test_non_candidates_are_ignored_silently() {
    let mut h = Harness::new(&[]);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "probe without prefix")).await,
        DispatchOutcome::NotCandidate
    );
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!nosuchcommand")).await,
        DispatchOutcome::UnknownCommand
    );
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!")).await,
        DispatchOutcome::UnknownCommand
    );
    assert_eq!(h.calls(), 0);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_bot_authors_are_ignored() {
    let h = Harness::new(&[]);
    let mut message = guild_message(55, Capabilities::empty(), "!probe");
    message.author.bot = true;

    assert_eq!(h.send(message).await, DispatchOutcome::BotAuthor);
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_missing_embed_capability_warns_in_plain_text() {
    let mut h = Harness::new(&[]);
    *h.client.capabilities.lock() = Capabilities::empty().with(Capability::SendMessages);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!probe")).await;

    assert_eq!(outcome, DispatchOutcome::MissingCapabilities);
    assert!(!outcome.is_handled());
    assert_eq!(h.calls(), 0);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    let (tone, content, expiry) = &sent[0];
    assert_eq!(*tone, Tone::Plain);
    assert!(content.contains("Embed Links"));
    assert_eq!(*expiry, Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn test_no_send_capability_aborts_silently() {
    let mut h = Harness::new(&[]);
    *h.client.capabilities.lock() = Capabilities::empty().with(Capability::EmbedLinks);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!probe")).await;

    assert_eq!(outcome, DispatchOutcome::MissingCapabilities);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_direct_messages_skip_capability_check() {
    let h = Harness::new(&[]);
    *h.client.capabilities.lock() = Capabilities::empty();

    assert_eq!(h.send(direct_message(1, "!probe")).await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_store_failure_is_not_handled() {
    let mut h = Harness::new(&[]);
    h.store.set_unavailable(true);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::StoreUnavailable
    );
    assert_eq!(h.calls(), 0);
    assert!(h.drain().is_empty());
}

// ============================================================================
// Resolution and arguments
// ============================================================================

#[tokio::test]
async fn test_quoted_arguments_and_case_insensitive_triggers() {
    let h = Harness::new(&[]);

    h.send(guild_message(1, Capabilities::empty(), r#"!PROBE "two words" three"#)).await;

    assert_eq!(*h.seen.lock(), vec![vec!["two words".to_string(), "three".into()]]);
}

#[tokio::test]
async fn test_guild_prefix_and_alias_arguments() {
    let mut h = Harness::new(&[]);
    h.store.insert_guild(
        GuildId(GUILD),
        GuildSettings {
            prefix: Some("?".into()),
            aliases: HashMap::from([("Shout".into(), "repeat HEY".into()), ("p".into(), "probe fixed".into())]),
            ..Default::default()
        },
    );

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::NotCandidate
    );
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "?p user args")).await,
        DispatchOutcome::Completed
    );
    assert_eq!(
        *h.seen.lock(),
        vec![vec!["fixed".to_string(), "user".into(), "args".into()]]
    );

    h.send(guild_message(1, Capabilities::empty(), "?shout  you  there")).await;
    let sent = h.sent();
    assert_eq!(sent.last().map(|s| s.1.as_str()), Some("HEY you  there"));
}

#[tokio::test]
async fn test_bot_mention_invokes_and_is_dropped_from_mentions() {
    let mut h = Harness::new(&[]);
    let mut message = guild_message(1, Capabilities::empty(), "<@!100> userid <@42>");
    message.mentions = vec![user(BOT, "gatebot", true), user(42, "alice", false)];

    assert_eq!(h.send(message).await, DispatchOutcome::Completed);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("**alice**"));
    assert!(sent[0].1.contains("`42`"));
}

#[tokio::test]
async fn test_mention_of_someone_else_is_not_a_candidate() {
    let h = Harness::new(&[]);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "<@42> uptime")).await,
        DispatchOutcome::NotCandidate
    );
}

// ============================================================================
// Gates
// ============================================================================

#[tokio::test]
async fn test_moderator_gate_rejects_default_caller_once() {
    let mut h = Harness::new(&["permission:moderator"]);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!probe anything")).await;

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(h.calls(), 0);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Tone::Error);
    assert!(sent[0].1.contains("**Moderator**"));
    assert_eq!(sent[0].2, Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn test_permission_gate_passes_at_or_above_level() {
    let h = Harness::new(&["permission:moderator"]);
    h.store.insert_guild(
        GuildId(GUILD),
        GuildSettings {
            admin_users: vec![UserId(3)],
            ..Default::default()
        },
    );

    let manager = Capabilities::empty().with(Capability::ManageServer);
    assert_eq!(h.send(guild_message(2, manager, "!probe")).await, DispatchOutcome::Completed);
    assert_eq!(
        h.send(guild_message(3, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
    assert_eq!(
        h.send(guild_message(OWNER, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
    assert_eq!(h.calls(), 3);
}

#[tokio::test]
async fn test_throttle_notifies_once_per_window() {
    let mut h = Harness::new(&["throttle:channel,1,5"]);

    assert_eq!(h.send(guild_message(1, Capabilities::empty(), "!probe")).await, DispatchOutcome::Completed);
    assert_eq!(h.send(guild_message(2, Capabilities::empty(), "!probe")).await, DispatchOutcome::Rejected);
    assert_eq!(h.send(guild_message(3, Capabilities::empty(), "!probe")).await, DispatchOutcome::Rejected);

    assert_eq!(h.calls(), 1);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.starts_with("Too many attempts"));
    assert_eq!(sent[0].2, Some(Duration::from_secs(10)));
}

#[tokio::test]
async fn test_guild_only_rejects_direct_messages() {
    let mut h = Harness::new(&["guild-only"]);

    assert_eq!(h.send(direct_message(1, "!probe")).await, DispatchOutcome::Rejected);
    assert!(h.sent()[0].1.contains("only be used in a server"));
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_official_guild_gate() {
    let mut h = Harness::new(&["official-guild"]);
    let mut elsewhere = guild_message(1, Capabilities::empty(), "!probe");
    if let Some(guild) = elsewhere.guild.as_mut() {
        guild.id = GuildId(2);
    }

    assert_eq!(h.send(elsewhere.clone()).await, DispatchOutcome::Rejected);
    assert_eq!(h.sent()[0].2, Some(Duration::from_secs(45)));

    elsewhere.author.id = UserId(ADMIN);
    assert_eq!(h.send(elsewhere).await, DispatchOutcome::Completed);
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
    assert_eq!(h.send(direct_message(1, "!probe")).await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_require_user_capabilities() {
    let mut h = Harness::new(&["require:user,text.manage_messages"]);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Rejected
    );
    assert!(h.sent()[0].1.contains("`text.manage_messages`"));

    let moderator = Capabilities::empty().with(Capability::ManageMessages);
    assert_eq!(h.send(guild_message(1, moderator, "!probe")).await, DispatchOutcome::Completed);
    assert_eq!(
        h.send(guild_message(ADMIN, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
    let admin = Capabilities::empty().with(Capability::Administrator);
    assert_eq!(h.send(guild_message(1, admin, "!probe")).await, DispatchOutcome::Completed);
    assert_eq!(h.send(direct_message(1, "!probe")).await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_require_bot_capabilities() {
    let mut h = Harness::new(&["require:bot,text.manage_messages"]);
    *h.client.capabilities.lock() = Capabilities::empty()
        .with(Capability::SendMessages)
        .with(Capability::EmbedLinks);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Rejected
    );
    assert!(h.sent()[0].1.starts_with("I'm missing"));
    assert_eq!(h.send(direct_message(1, "!probe")).await, DispatchOutcome::Completed);
}

// ============================================================================
// Failure classification
// ============================================================================

#[tokio::test]
async fn test_unexpected_failure_is_contained_and_counted() {
    let mut h = Harness::new(&[]);
    let before = crate::metrics::counter_value(&crate::metrics::COMMAND_ERRORS, &["fun", "internal_error"]);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!broken")).await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    assert!(!outcome.is_handled());
    let after = crate::metrics::counter_value(&crate::metrics::COMMAND_ERRORS, &["fun", "internal_error"]);
    assert!(after > before);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("`broken`"));

    // The pipeline keeps serving.
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_panics_are_contained() {
    let h = Harness::new(&[]);
    let before = crate::metrics::counter_value(&crate::metrics::COMMAND_EXCEPTIONS, &["panic"]);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!explode")).await,
        DispatchOutcome::Failed
    );
    assert!(crate::metrics::counter_value(&crate::metrics::COMMAND_EXCEPTIONS, &["panic"]) > before);
    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!probe")).await,
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_platform_refusal_is_external_permission() {
    let mut h = Harness::new(&[]);
    *h.client.history.lock() = vec![MessageId(5000), MessageId(4999), MessageId(4998)];
    h.client.deny_deletes.store(true, Ordering::SeqCst);
    let moderator = Capabilities::empty().with(Capability::ManageMessages);

    let outcome = h.send(guild_message(1, moderator, "!purge 2")).await;

    assert_eq!(outcome, DispatchOutcome::ExternalPermission);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Tone::Error);
    assert!(sent[0].1.starts_with("Error:"));
}

#[tokio::test]
async fn test_purge_deletes_history() {
    let mut h = Harness::new(&[]);
    *h.client.history.lock() = vec![MessageId(5000), MessageId(4999), MessageId(4998), MessageId(4997)];
    let moderator = Capabilities::empty().with(Capability::ManageMessages);

    assert_eq!(
        h.send(guild_message(1, moderator, "!clear 2")).await,
        DispatchOutcome::Completed
    );
    assert_eq!(
        *h.client.deleted.lock(),
        vec![MessageId(5000), MessageId(4999), MessageId(4998)]
    );
    assert!(h.sent()[0].1.contains("**2**"));
}

#[tokio::test]
async fn test_invalid_arguments_show_usage() {
    let mut h = Harness::new(&[]);

    let outcome = h.send(guild_message(1, Capabilities::empty(), "!echo")).await;

    assert_eq!(outcome, DispatchOutcome::InvalidArguments);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Usage: `!repeat <text>`"));
}

// ============================================================================
// Built-ins and localisation
// ============================================================================

#[tokio::test]
async fn test_stats_requires_bot_admin() {
    let mut h = Harness::new(&[]);
    h.send(guild_message(1, Capabilities::empty(), "!probe")).await;

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!stats")).await,
        DispatchOutcome::Rejected
    );
    h.drain();

    assert_eq!(
        h.send(direct_message(ADMIN, "!stats")).await,
        DispatchOutcome::Completed
    );
    let sent = h.sent();
    assert!(sent[0].1.contains("`probe`: 1"));
}

#[tokio::test]
async fn test_help_lists_gate_requirements() {
    let mut h = Harness::new(&[]);

    h.send(guild_message(1, Capabilities::empty(), "!help purge")).await;
    let text = h.sent().remove(0).1;

    assert!(text.contains("Triggers: purge, clear"));
    assert!(text.contains("Usage: `!purge <amount>`"));
    assert!(text.contains("Only available in servers"));
    assert!(text.contains("per channel"));
}

#[tokio::test]
async fn test_guild_locale_with_fallback() {
    let mut h = Harness::new(&["permission:administrator"]);
    h.store.insert_guild(
        GuildId(GUILD),
        GuildSettings {
            locale: Some("nl_NL".into()),
            ..Default::default()
        },
    );

    h.send(guild_message(1, Capabilities::empty(), "!probe")).await;
    assert!(h.sent()[0].1.contains("**Beheerder**"));

    // Missing from nl_NL, served from en_US.
    h.send(guild_message(1, Capabilities::empty(), "!echo")).await;
    assert!(h.sent()[0].1.starts_with("Tell me what to repeat."));
}

#[tokio::test]
async fn test_invalid_argument_text_is_not_reinterpolated() {
    let mut h = Harness::new(&[]);

    assert_eq!(
        h.send(guild_message(1, Capabilities::empty(), "!userid {1}")).await,
        DispatchOutcome::InvalidArguments
    );
    let text = h.sent().remove(0).1;
    assert!(text.starts_with("`{1}` is not a user"), "{text}");
    assert!(text.contains("Usage: `!userid [@user | id]`"));
}

#[tokio::test]
async fn test_profile_requires_linked_account() {
    let mut h = Harness::new(&[]);

    assert_eq!(
        h.send(guild_message(3, Capabilities::empty(), "!profile")).await,
        DispatchOutcome::Rejected
    );
    assert!(h.sent()[0].1.contains("link your account"));

    h.store.insert_player(PlayerProfile {
        user: UserId(3),
        guild: GuildId(GUILD),
        experience: 42,
    });
    h.store.insert_verification(VerificationState {
        user: UserId(3),
        verified: true,
        linked_account: Some("user3#main".into()),
    });
    assert_eq!(
        h.send(guild_message(3, Capabilities::empty(), "!rank")).await,
        DispatchOutcome::Completed
    );
    let (tone, text, _) = h.sent().remove(0);
    assert_eq!(tone, Tone::Info);
    assert_eq!(text, "**user3** has **42** experience. Linked account: `user3#main`.");
}

#[tokio::test]
async fn test_bot_admin_skips_account_link() {
    let mut h = Harness::new(&[]);
    assert_eq!(
        h.send(guild_message(ADMIN, Capabilities::empty(), "!profile")).await,
        DispatchOutcome::Completed
    );
    assert!(h.sent()[0].1.contains("Linked account: `-`"));
}
