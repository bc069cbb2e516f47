//! Integration tests for startup and shutdown.

mod common;

use common::TestBot;

#[tokio::test]
async fn test_exits_cleanly_at_end_of_input() {
    let bot = TestBot::new().expect("Failed to write config");

    let output = bot.run(&[]).await.expect("Bot run failed");

    assert!(output.success, "bot exited with failure: {}", output.stderr);
    assert!(output.actions.is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let bot = TestBot::from_toml(
        r#"
[bot]
bot_user_id = 0
default_prefix = ""
metrics_port = 0
"#,
    )
    .expect("Failed to write config");

    let output = bot.run(&[]).await.expect("Bot run failed");

    assert!(!output.success);
    assert!(output.stderr.contains("configuration error"));
}

#[tokio::test]
async fn test_malformed_events_are_skipped() {
    let bot = TestBot::new().expect("Failed to write config");

    let output = bot
        .run(&[
            serde_json::json!({ "not": "an event" }),
            common::guild_event(5000, 1, "!uptime", &[], None),
        ])
        .await
        .expect("Bot run failed");

    assert!(output.success);
    assert_eq!(output.sends().len(), 1);
}
