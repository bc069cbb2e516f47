//! Argument tokenizing.

use crate::id::UserId;

/// Split message content into whitespace separated arguments.
///
/// A segment enclosed in double quotes is kept as one argument with the
/// quotes removed. An unterminated quote runs to the end of the input.
pub fn split_arguments(content: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in content.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }
    args
}

/// Parse a `<@id>` or `<@!id>` user mention.
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    inner.parse::<u64>().ok().map(UserId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split_arguments("  a   b\tc "), vec!["a", "b", "c"]);
        assert!(split_arguments("   ").is_empty());
    }

    #[test]
    fn keeps_quoted_segments_together() {
        assert_eq!(
            split_arguments(r#"say "two words" and "" more"#),
            vec!["say", "two words", "and", "", "more"]
        );
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(split_arguments(r#"a "b c"#), vec!["a", "b c"]);
    }

    #[test]
    fn parses_mentions() {
        assert_eq!(parse_user_mention("<@42>"), Some(UserId(42)));
        assert_eq!(parse_user_mention("<@!42>"), Some(UserId(42)));
        assert_eq!(parse_user_mention("<#42>"), None);
        assert_eq!(parse_user_mention("@42"), None);
    }
}
