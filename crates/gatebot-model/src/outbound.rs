//! Outbound messages.

/// Visual tone of a feedback message.
///
/// Anything other than [`Tone::Plain`] renders as an embed with the tone's
/// accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Tone {
    /// Plain text, no embed.
    #[default]
    Plain,
    /// Neutral information.
    Info,
    /// The action succeeded.
    Success,
    /// Something needs attention.
    Warning,
    /// The action failed.
    Error,
}

impl Tone {
    /// Embed accent colour as `0xRRGGBB`, or `None` for plain text.
    pub const fn color(self) -> Option<u32> {
        match self {
            Tone::Plain => None,
            Tone::Info => Some(0x3498DB),
            Tone::Success => Some(0x2ECC71),
            Tone::Warning => Some(0xF39C12),
            Tone::Error => Some(0xE74C3C),
        }
    }

    /// Whether sending requires the embed capability.
    pub const fn is_embed(self) -> bool {
        !matches!(self, Tone::Plain)
    }
}

/// A message the bot wants to post.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutboundMessage {
    /// Body text.
    pub content: String,
    /// Rendering tone.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tone: Tone,
}

impl OutboundMessage {
    /// Message with an explicit tone.
    pub fn new(tone: Tone, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tone,
        }
    }

    /// Plain-text message.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(Tone::Plain, content)
    }
}
