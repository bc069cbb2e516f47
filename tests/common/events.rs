//! Console event builders.

use serde_json::{Value, json};

/// A message from `author` in channel 10 of guild 1 (owned by user 999).
///
/// `bot_capabilities` overrides what the bot may do in the channel.
pub fn guild_event(
    id: u64,
    author: u64,
    content: &str,
    member_capabilities: &[&str],
    bot_capabilities: Option<&[&str]>,
) -> Value {
    let user = json!({ "id": author, "name": format!("user{author}") });
    json!({
        "message": {
            "id": id,
            "content": content,
            "author": user,
            "member": { "user": user, "capabilities": member_capabilities },
            "guild": { "id": 1, "name": "Test Guild", "owner_id": 999 },
            "channel": { "id": 10, "name": "general", "kind": "text" },
            "shard": { "id": 0, "total": 1 }
        },
        "bot_capabilities": bot_capabilities,
    })
}

/// A direct message from `author`.
pub fn direct_event(id: u64, author: u64, content: &str) -> Value {
    json!({
        "message": {
            "id": id,
            "content": content,
            "author": { "id": author, "name": format!("user{author}") },
            "channel": { "id": 20, "kind": "private" }
        }
    })
}
